use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::config::{
    CatalogSource, CodepickConfig, SinkKind, load_config, parse_catalog_source,
    resolve_config_path, validate_url,
};

const CHECK_CONFIG_PATH: &str = "config path resolves";
const CHECK_CONFIG_EXISTS: &str = "config file exists";
const CHECK_CONFIG_VALID: &str = "config parses and validates";
const CHECK_ENGINE_URL: &str = "engine url is well formed";
const CHECK_CATALOG: &str = "catalog source is usable";
const CHECK_OUTPUT_DIR: &str = "submission output is writable";

const CONFIG_DEPENDENT: &[&str] = &[CHECK_ENGINE_URL, CHECK_CATALOG, CHECK_OUTPUT_DIR];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    Pass,
    Fail,
}

impl fmt::Display for CheckState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Fail => write!(f, "FAIL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctorCheck {
    pub name: String,
    pub state: CheckState,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctorReport {
    pub checks: Vec<DoctorCheck>,
}

impl DoctorReport {
    pub fn has_failures(&self) -> bool {
        self.checks
            .iter()
            .any(|check| check.state == CheckState::Fail)
    }

    pub fn summary(&self) -> String {
        let passed = self
            .checks
            .iter()
            .filter(|check| check.state == CheckState::Pass)
            .count();
        let failed = self.checks.len().saturating_sub(passed);
        format!("{passed} passed, {failed} failed")
    }
}

pub fn run_doctor() -> DoctorReport {
    run_doctor_for(resolve_config_path())
}

pub fn run_doctor_for(config_path: anyhow::Result<PathBuf>) -> DoctorReport {
    let mut checks = Vec::new();

    let config_path = match config_path {
        Ok(path) => {
            checks.push(pass_check(CHECK_CONFIG_PATH, path.display().to_string()));
            path
        }
        Err(error) => {
            checks.push(fail_check(CHECK_CONFIG_PATH, error.to_string()));
            push_skipped_checks(
                &mut checks,
                &[CHECK_CONFIG_EXISTS, CHECK_CONFIG_VALID],
                "config path could not be resolved",
            );
            push_skipped_checks(
                &mut checks,
                CONFIG_DEPENDENT,
                "config path could not be resolved",
            );
            return DoctorReport { checks };
        }
    };

    if !config_path.exists() {
        checks.push(fail_check(
            CHECK_CONFIG_EXISTS,
            format!("expected at {}", config_path.display()),
        ));
        push_skipped_checks(&mut checks, &[CHECK_CONFIG_VALID], "config file is missing");
        push_skipped_checks(&mut checks, CONFIG_DEPENDENT, "config file is missing");
        return DoctorReport { checks };
    }

    checks.push(pass_check(
        CHECK_CONFIG_EXISTS,
        format!("found at {}", config_path.display()),
    ));

    match load_config(&config_path) {
        Ok(config) => {
            checks.push(pass_check(CHECK_CONFIG_VALID, "config is valid"));
            checks.extend(check_loaded_config(&config));
        }
        Err(error) => {
            checks.push(fail_check(CHECK_CONFIG_VALID, error.to_string()));
            push_skipped_checks(&mut checks, CONFIG_DEPENDENT, "config is invalid");
        }
    }

    DoctorReport { checks }
}

fn check_loaded_config(config: &CodepickConfig) -> Vec<DoctorCheck> {
    vec![
        match validate_url("engine.url", &config.engine.url) {
            Ok(()) => pass_check(CHECK_ENGINE_URL, config.engine.url.clone()),
            Err(error) => fail_check(CHECK_ENGINE_URL, error.to_string()),
        },
        check_catalog(config),
        check_output_dir(config),
    ]
}

fn check_catalog(config: &CodepickConfig) -> DoctorCheck {
    match parse_catalog_source(&config.catalog) {
        Ok(CatalogSource::Http { url, .. }) => pass_check(CHECK_CATALOG, format!("http {url}")),
        Ok(CatalogSource::File { path }) => check_catalog_file(&path),
        Err(error) => fail_check(CHECK_CATALOG, error.to_string()),
    }
}

fn check_catalog_file(path: &Path) -> DoctorCheck {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(error) => {
            return fail_check(
                CHECK_CATALOG,
                format!("cannot open {}: {error}", path.display()),
            );
        }
    };

    let first_line = BufReader::new(file)
        .lines()
        .map_while(Result::ok)
        .find(|line| !line.trim().is_empty());

    match first_line {
        None => fail_check(CHECK_CATALOG, format!("{} has no entries", path.display())),
        Some(line) => match serde_json::from_str::<serde_json::Value>(&line) {
            Ok(value) if value.get("code").is_some() => {
                pass_check(CHECK_CATALOG, format!("file {}", path.display()))
            }
            Ok(_) => fail_check(
                CHECK_CATALOG,
                format!("first entry in {} has no code", path.display()),
            ),
            Err(error) => fail_check(
                CHECK_CATALOG,
                format!("first entry in {} is not JSON: {error}", path.display()),
            ),
        },
    }
}

fn check_output_dir(config: &CodepickConfig) -> DoctorCheck {
    match (config.submit.sink, config.submit.output_dir.as_ref()) {
        (SinkKind::Log, _) => pass_check(CHECK_OUTPUT_DIR, "log sink configured"),
        (SinkKind::Directory, Some(dir)) if dir.is_dir() => {
            pass_check(CHECK_OUTPUT_DIR, format!("directory {}", dir.display()))
        }
        (SinkKind::Directory, Some(dir)) => fail_check(
            CHECK_OUTPUT_DIR,
            format!("directory {} does not exist", dir.display()),
        ),
        (SinkKind::Directory, None) => fail_check(CHECK_OUTPUT_DIR, "output_dir is not set"),
    }
}

fn pass_check(name: &str, details: impl Into<String>) -> DoctorCheck {
    DoctorCheck {
        name: name.to_string(),
        state: CheckState::Pass,
        details: details.into(),
    }
}

fn fail_check(name: &str, details: impl Into<String>) -> DoctorCheck {
    DoctorCheck {
        name: name.to_string(),
        state: CheckState::Fail,
        details: details.into(),
    }
}

fn skipped_check(name: &str, reason: &str) -> DoctorCheck {
    fail_check(name, format!("skipped: {reason}"))
}

fn push_skipped_checks(checks: &mut Vec<DoctorCheck>, names: &[&str], reason: &str) {
    checks.extend(
        names
            .iter()
            .copied()
            .map(|name| skipped_check(name, reason)),
    );
}
