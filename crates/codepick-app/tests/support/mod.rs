use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use codepick_app::App;
use codepick_core::catalog::FileCatalog;
use codepick_core::config::{
    CatalogConfig, CatalogSourceKind, CodepickConfig, EngineConfig, SinkKind, SubmitConfig,
};
use codepick_core::engine::{EngineError, GenerationEngine};
use codepick_core::entry::{CandidateCode, CatalogMatch};
use codepick_core::submission::{
    BillingReport, SubmissionReceipt, SubmissionSink, SubmitError,
};

pub static ENV_LOCK: Mutex<()> = Mutex::new(());

#[derive(Default)]
pub struct ScriptedEngine {
    results: Mutex<VecDeque<Result<Vec<CandidateCode>, EngineError>>>,
    reports: Mutex<Vec<String>>,
}

impl ScriptedEngine {
    pub fn new(results: Vec<Result<Vec<CandidateCode>, EngineError>>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            reports: Mutex::new(Vec::new()),
        }
    }

    pub fn reports(&self) -> Vec<String> {
        self.reports.lock().expect("reports lock").clone()
    }
}

impl GenerationEngine for ScriptedEngine {
    fn generate(&self, report: &str) -> Result<Vec<CandidateCode>, EngineError> {
        self.reports
            .lock()
            .expect("reports lock")
            .push(report.to_string());
        self.results
            .lock()
            .expect("results lock")
            .pop_front()
            .unwrap_or_else(|| {
                Err(EngineError::Status {
                    status: 599,
                    body: "missing scripted result".to_string(),
                })
            })
    }
}

#[derive(Default)]
pub struct RecordingSink {
    submitted: Mutex<Vec<BillingReport>>,
}

impl RecordingSink {
    pub fn submitted(&self) -> Vec<BillingReport> {
        self.submitted.lock().expect("submitted lock").clone()
    }
}

impl SubmissionSink for RecordingSink {
    fn submit(&self, report: &BillingReport) -> Result<SubmissionReceipt, SubmitError> {
        self.submitted
            .lock()
            .expect("submitted lock")
            .push(report.clone());
        Ok(SubmissionReceipt::Logged)
    }
}

pub fn catalog_row(code: &str, name: &str) -> CatalogMatch {
    CatalogMatch {
        code: code.to_string(),
        name: name.to_string(),
        description: None,
    }
}

pub fn test_config() -> CodepickConfig {
    CodepickConfig {
        version: 1,
        engine: EngineConfig {
            url: "http://127.0.0.1:9/generate".to_string(),
            timeout_secs: 5,
        },
        catalog: CatalogConfig {
            source: CatalogSourceKind::File,
            url: None,
            path: Some(PathBuf::from("/unused/catalog.jsonl")),
            limit: 20,
            timeout_secs: 10,
        },
        submit: SubmitConfig {
            sink: SinkKind::Log,
            output_dir: None,
        },
    }
}

pub fn app_with(
    engine: Arc<ScriptedEngine>,
    rows: Vec<CatalogMatch>,
    sink: Arc<RecordingSink>,
) -> App {
    App::with_parts(
        test_config(),
        engine,
        Arc::new(FileCatalog::from_rows(rows)),
        sink,
    )
}

pub fn write_valid_config(home: &Path, catalog_path: &Path) {
    let config_dir = home.join(".config").join("codepick");
    fs::create_dir_all(&config_dir).expect("create config dir");
    fs::write(
        config_dir.join("config.toml"),
        format!(
            r#"
version = 1

[engine]
url = "http://127.0.0.1:9/generate"

[catalog]
source = "file"
path = "{}"
"#,
            catalog_path.display()
        ),
    )
    .expect("write config");
}
