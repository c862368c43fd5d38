use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use frontdesk_core::journal::JsonlJournal;
use frontdesk_core::knowledge::KnowledgeBase;

#[derive(Clone)]
pub struct HealthState {
    knowledge: KnowledgeBase,
    journal: JsonlJournal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub knowledge: HealthCheck,
    pub journal: HealthCheck,
    pub checked_at: String,
}

pub fn router(knowledge: KnowledgeBase, journal: JsonlJournal) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { knowledge, journal })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let knowledge = knowledge_check(&state.knowledge);
    let journal = journal_check(&state.journal);
    let ready = knowledge.status == "ready" && journal.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "frontdesk-server runtime initialized".to_string(),
        },
        knowledge,
        journal,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

fn knowledge_check(knowledge: &KnowledgeBase) -> HealthCheck {
    if knowledge.is_empty() {
        HealthCheck {
            status: "degraded",
            detail: "knowledge context is empty; answers will lack business detail".to_string(),
        }
    } else {
        HealthCheck {
            status: "ready",
            detail: format!(
                "knowledge loaded ({} summary bytes, {} document bytes)",
                knowledge.summary.len(),
                knowledge.document.len()
            ),
        }
    }
}

fn journal_check(journal: &JsonlJournal) -> HealthCheck {
    if journal.dir().is_dir() {
        HealthCheck {
            status: "ready",
            detail: format!("journal directory ready at `{}`", journal.dir().display()),
        }
    } else {
        HealthCheck {
            status: "degraded",
            detail: format!("journal directory `{}` is missing", journal.dir().display()),
        }
    }
}
