use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use frontdesk_agent::providers::{backend_from_config, ProviderError};
use frontdesk_agent::tools::default_registry;
use frontdesk_agent::{AgentRuntime, ContextAssembler, ConversationLoop};
use frontdesk_core::config::{AppConfig, ConfigError, LoadOptions};
use frontdesk_core::journal::{JournalError, JsonlJournal, RecordSink};
use frontdesk_core::knowledge::{KnowledgeBase, KnowledgeError};

pub struct Application {
    pub config: AppConfig,
    pub knowledge: KnowledgeBase,
    pub journal: JsonlJournal,
    pub runtime: Arc<AgentRuntime>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("knowledge loading failed: {0}")]
    Knowledge(#[from] KnowledgeError),
    #[error("journal initialization failed: {0}")]
    Journal(#[from] JournalError),
    #[error("backend initialization failed: {0}")]
    Provider(#[from] ProviderError),
}

pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config)
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    let knowledge =
        KnowledgeBase::load(&config.knowledge.summary_path, &config.knowledge.document_path)?;
    info!(
        event_name = "system.bootstrap.knowledge_loaded",
        correlation_id = "bootstrap",
        summary_bytes = knowledge.summary.len(),
        document_bytes = knowledge.document.len(),
        "business knowledge loaded"
    );

    let journal = JsonlJournal::open(&config.journal.dir)?;
    info!(
        event_name = "system.bootstrap.journal_ready",
        correlation_id = "bootstrap",
        journal_dir = %journal.dir().display(),
        "append-only journal ready"
    );

    let sink: Arc<dyn RecordSink> = Arc::new(journal.clone());
    let backend = backend_from_config(&config.llm)?;
    info!(
        event_name = "system.bootstrap.backend_selected",
        correlation_id = "bootstrap",
        backend = backend.name(),
        model = %config.llm.effective_model(),
        "model backend selected"
    );

    let conversation =
        ConversationLoop::new(backend, default_registry(sink.clone()), config.llm.max_tool_rounds);
    let assembler = ContextAssembler::new(&config.business.name, knowledge.clone());
    let runtime = Arc::new(AgentRuntime::new(
        assembler,
        conversation,
        sink,
        &config.business.lead_followup,
    ));

    Ok(Application { config, knowledge, journal, runtime })
}

#[cfg(test)]
mod tests {
    use frontdesk_core::config::{ConfigOverrides, LoadOptions};
    use tempfile::TempDir;

    use crate::bootstrap::bootstrap;

    fn options_with_key(dir: &TempDir, api_key: Option<&str>) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                journal_dir: Some(dir.path().join("logs").to_string_lossy().into_owned()),
                summary_path: Some(dir.path().join("summary.txt").to_string_lossy().into_owned()),
                document_path: Some(dir.path().join("about.pdf").to_string_lossy().into_owned()),
                llm_api_key: api_key.map(str::to_string),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[test]
    fn bootstrap_fails_fast_without_an_api_key() {
        let dir = TempDir::new().expect("temp dir");

        let result = bootstrap(options_with_key(&dir, None));

        let message = match result {
            Ok(_) => panic!("bootstrap should fail without a credential"),
            Err(error) => error.to_string(),
        };
        assert!(message.contains("llm.api_key"), "unexpected error: {message}");
    }

    #[test]
    fn bootstrap_succeeds_with_missing_knowledge_files() {
        let dir = TempDir::new().expect("temp dir");

        let app = bootstrap(options_with_key(&dir, Some("sk-test")))
            .expect("missing knowledge files should not block startup");

        assert!(app.knowledge.is_empty());
        assert!(app.journal.dir().is_dir(), "journal directory should be created");
    }
}
