use std::env;
use std::sync::{Mutex, OnceLock};

use frontdesk_cli::commands::{config, doctor};
use serde_json::Value;
use tempfile::TempDir;

const MANAGED_VARS: &[&str] = &[
    "FRONTDESK_LLM_API_KEY",
    "FRONTDESK_LLM_PROVIDER",
    "FRONTDESK_LLM_MODEL",
    "FRONTDESK_JOURNAL_DIR",
    "FRONTDESK_KNOWLEDGE_SUMMARY_PATH",
    "FRONTDESK_KNOWLEDGE_DOCUMENT_PATH",
];

#[test]
fn doctor_fails_without_an_api_key() {
    with_env(&[], || {
        let result = doctor::run(true);
        assert_eq!(result.exit_code, 1, "expected config validation failure");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["overall_status"], "fail");
        assert_eq!(payload["checks"][0]["name"], "config_validation");
        assert_eq!(payload["checks"][0]["status"], "fail");
        assert_eq!(payload["checks"][1]["status"], "skipped");
        assert_eq!(payload["checks"][2]["status"], "skipped");
    });
}

#[test]
fn doctor_passes_with_valid_env() {
    let dir = TempDir::new().expect("temp dir");
    let journal_dir = dir.path().join("logs").to_string_lossy().into_owned();
    let summary_path = dir.path().join("summary.txt").to_string_lossy().into_owned();
    let document_path = dir.path().join("about.pdf").to_string_lossy().into_owned();

    with_env(
        &[
            ("FRONTDESK_LLM_API_KEY", "sk-test"),
            ("FRONTDESK_JOURNAL_DIR", &journal_dir),
            ("FRONTDESK_KNOWLEDGE_SUMMARY_PATH", &summary_path),
            ("FRONTDESK_KNOWLEDGE_DOCUMENT_PATH", &document_path),
        ],
        || {
            let result = doctor::run(true);
            assert_eq!(result.exit_code, 0, "expected all checks to pass: {}", result.output);

            let payload = parse_payload(&result.output);
            assert_eq!(payload["overall_status"], "pass");
            let checks = payload["checks"].as_array().expect("checks array");
            assert_eq!(checks.len(), 3);
            assert!(checks.iter().all(|check| check["status"] == "pass"));
        },
    );
}

#[test]
fn doctor_human_output_lists_every_check() {
    let dir = TempDir::new().expect("temp dir");
    let journal_dir = dir.path().join("logs").to_string_lossy().into_owned();
    let summary_path = dir.path().join("summary.txt").to_string_lossy().into_owned();
    let document_path = dir.path().join("about.pdf").to_string_lossy().into_owned();

    with_env(
        &[
            ("FRONTDESK_LLM_API_KEY", "sk-test"),
            ("FRONTDESK_JOURNAL_DIR", &journal_dir),
            ("FRONTDESK_KNOWLEDGE_SUMMARY_PATH", &summary_path),
            ("FRONTDESK_KNOWLEDGE_DOCUMENT_PATH", &document_path),
        ],
        || {
            let result = doctor::run(false);

            assert!(result.output.contains("config_validation"));
            assert!(result.output.contains("knowledge_readability"));
            assert!(result.output.contains("journal_writability"));
            assert!(result.output.contains("- [ok]"));
        },
    );
}

#[test]
fn config_redacts_the_api_key_and_names_its_source() {
    with_env(&[("FRONTDESK_LLM_API_KEY", "sk-secret-value")], || {
        let output = config::run();

        assert!(!output.contains("sk-secret-value"), "secret must not be printed: {output}");
        assert!(output.contains("llm.api_key = sk-***"));
        assert!(output.contains("env (FRONTDESK_LLM_API_KEY)"));
    });
}

#[test]
fn config_attributes_untouched_fields_to_defaults() {
    with_env(&[("FRONTDESK_LLM_API_KEY", "sk-test"), ("FRONTDESK_LLM_MODEL", "demo-model")], || {
        let output = config::run();

        assert!(output.contains("llm.model = demo-model (source: env (FRONTDESK_LLM_MODEL))"));
        assert!(output.contains("server.port = 8080 (source: default)"));
        assert!(output.contains("llm.provider = OpenAi (source: default)"));
    });
}

fn with_env(vars: &[(&str, &str)], test: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard = match ENV_LOCK.get_or_init(|| Mutex::new(())).lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };

    for var in MANAGED_VARS {
        env::remove_var(var);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(test));

    for var in MANAGED_VARS {
        env::remove_var(var);
    }

    if let Err(panic) = outcome {
        std::panic::resume_unwind(panic);
    }
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("doctor --json output should be valid JSON")
}
