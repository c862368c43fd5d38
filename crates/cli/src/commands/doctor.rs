use frontdesk_core::config::{AppConfig, LoadOptions};
use frontdesk_core::journal::JsonlJournal;
use frontdesk_core::knowledge::KnowledgeBase;
use serde::Serialize;

use crate::commands::CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { 1 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_knowledge(&config));
            checks.push(check_journal(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(DoctorCheck {
                name: "knowledge_readability",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
            checks.push(DoctorCheck {
                name: "journal_writability",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_knowledge(config: &AppConfig) -> DoctorCheck {
    match KnowledgeBase::load(&config.knowledge.summary_path, &config.knowledge.document_path) {
        Ok(knowledge) if knowledge.is_empty() => DoctorCheck {
            name: "knowledge_readability",
            status: CheckStatus::Pass,
            details: "knowledge files are missing; the assistant will run with empty context"
                .to_string(),
        },
        Ok(knowledge) => DoctorCheck {
            name: "knowledge_readability",
            status: CheckStatus::Pass,
            details: format!(
                "knowledge loaded ({} summary bytes, {} document bytes)",
                knowledge.summary.len(),
                knowledge.document.len()
            ),
        },
        Err(error) => DoctorCheck {
            name: "knowledge_readability",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn check_journal(config: &AppConfig) -> DoctorCheck {
    match JsonlJournal::open(&config.journal.dir) {
        Ok(journal) => DoctorCheck {
            name: "journal_writability",
            status: CheckStatus::Pass,
            details: format!("journal directory ready at `{}`", journal.dir().display()),
        },
        Err(error) => DoctorCheck {
            name: "journal_writability",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
