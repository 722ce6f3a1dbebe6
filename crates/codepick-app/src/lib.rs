mod generation;
mod lookup;
mod report;
mod submit;

use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use codepick_core::catalog::{CatalogLookup, LookupOutcome, lookup, open_catalog};
use codepick_core::config::{
    CodepickConfig, load_config, parse_catalog_source, resolve_config_path,
};
use codepick_core::doctor::{DoctorReport, run_doctor};
use codepick_core::engine::{GenerationEngine, HttpGenerationEngine};
use codepick_core::submission::{SubmissionSink, sink_from_config};

pub use generation::{
    CANCELED_MESSAGE, EngineGenerationRunner, GenerationEvent, GenerationHandle,
    GenerationRunner, GenerationSession, GenerationState, GenerationUpdate,
};
pub use lookup::{CatalogLookupRunner, LookupEvent, LookupRunner, LookupSession};
pub use report::{ReportError, ensure_report_ready, load_report};
pub use submit::{CodeSpec, CodeSpecError, SuggestResult};

pub struct App {
    config: CodepickConfig,
    engine: Arc<dyn GenerationEngine>,
    catalog: Arc<dyn CatalogLookup>,
    sink: Arc<dyn SubmissionSink>,
}

impl App {
    pub fn from_config(config: CodepickConfig) -> Result<Self> {
        let engine = HttpGenerationEngine::new(config.engine.url.clone(), config.engine.timeout())
            .context("failed to build generation engine client")?;

        let source = parse_catalog_source(&config.catalog)?;
        let catalog = open_catalog(&source).context("failed to open code catalog")?;
        let sink = sink_from_config(&config.submit);

        Ok(Self {
            config,
            engine: Arc::new(engine),
            catalog: Arc::from(catalog),
            sink: Arc::from(sink),
        })
    }

    pub fn with_parts(
        config: CodepickConfig,
        engine: Arc<dyn GenerationEngine>,
        catalog: Arc<dyn CatalogLookup>,
        sink: Arc<dyn SubmissionSink>,
    ) -> Self {
        Self {
            config,
            engine,
            catalog,
            sink,
        }
    }

    pub fn config(&self) -> &CodepickConfig {
        &self.config
    }

    pub fn lookup_limit(&self) -> usize {
        self.config.catalog.limit
    }

    pub fn generation_session(&self) -> GenerationSession {
        GenerationSession::new(Arc::new(EngineGenerationRunner::new(Arc::clone(
            &self.engine,
        ))))
    }

    pub fn lookup_session(&self) -> LookupSession {
        LookupSession::new(
            Arc::new(CatalogLookupRunner::new(Arc::clone(&self.catalog))),
            self.lookup_limit(),
        )
    }

    pub fn search(&self, query: &str) -> LookupOutcome {
        lookup(self.catalog.as_ref(), query, self.lookup_limit())
    }
}

pub fn doctor() -> Result<DoctorReport> {
    Ok(run_doctor())
}

pub fn ensure_config_ready() -> Result<CodepickConfig> {
    let config_path = resolve_config_path().context("failed to resolve config path")?;

    if !config_path.exists() {
        bail!(
            "missing config at {}\nCreate ~/.config/codepick/config.toml and see README.md for setup instructions.",
            config_path.display()
        );
    }

    load_config(&config_path).map_err(|error| {
        anyhow!(
            "invalid config at {}: {error}\nFix the config and retry. See README.md for setup instructions.",
            config_path.display()
        )
    })
}
