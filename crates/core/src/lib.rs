pub mod config;
pub mod journal;
pub mod knowledge;
pub mod records;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LlmProvider, LoadOptions};
pub use journal::{InMemorySink, JournalError, JsonlJournal, RecordSink};
pub use knowledge::{KnowledgeBase, KnowledgeError};
pub use records::{FeedbackRecord, JournalRecord, LeadRecord};
