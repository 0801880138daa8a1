use std::{env, path::PathBuf, time::Duration};

use crate::{
    BACKEND_DIR_ENV, BACKEND_STOP_TIMEOUT_ENV, BACKEND_STOP_TIMEOUT_MAX_MS,
    DEFAULT_PYTHON_INTERPRETER, DESKTOP_MODE_ENV, DEVELOPMENT_BACKEND_PORT, LEGACY_MODE_ENV,
    PRODUCTION_BACKEND_PORT, PYTHON_INTERPRETER_ENV,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BuildMode {
    Development,
    Production,
}

impl BuildMode {
    pub(crate) fn is_development(self) -> bool {
        self == Self::Development
    }

    pub(crate) fn backend_port(self) -> u16 {
        match self {
            Self::Development => DEVELOPMENT_BACKEND_PORT,
            Self::Production => PRODUCTION_BACKEND_PORT,
        }
    }

    pub(crate) fn backend_base_url(self) -> String {
        format!("http://localhost:{}", self.backend_port())
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

pub(crate) fn parse_build_mode(raw: &str) -> Option<BuildMode> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "development" | "dev" => Some(BuildMode::Development),
        "production" | "prod" => Some(BuildMode::Production),
        _ => None,
    }
}

/// Settings read once from the process environment at startup.
#[derive(Debug, Clone)]
pub(crate) struct ShellConfig {
    pub(crate) mode: BuildMode,
    pub(crate) backend_dir: Option<PathBuf>,
    pub(crate) python_interpreter: String,
    pub(crate) stop_timeout: Option<Duration>,
}

impl ShellConfig {
    pub(crate) fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mode = [DESKTOP_MODE_ENV, LEGACY_MODE_ENV]
            .into_iter()
            .find_map(|key| lookup(key).as_deref().and_then(parse_build_mode))
            .unwrap_or_else(default_build_mode);

        let backend_dir = lookup(BACKEND_DIR_ENV)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);

        let python_interpreter = lookup(PYTHON_INTERPRETER_ENV)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_PYTHON_INTERPRETER.to_string());

        let stop_timeout = parse_stop_timeout(lookup(BACKEND_STOP_TIMEOUT_ENV).as_deref());

        Self {
            mode,
            backend_dir,
            python_interpreter,
            stop_timeout,
        }
    }
}

fn default_build_mode() -> BuildMode {
    if tauri::is_dev() {
        BuildMode::Development
    } else {
        BuildMode::Production
    }
}

pub(crate) fn parse_stop_timeout(raw: Option<&str>) -> Option<Duration> {
    let millis = raw?.trim().parse::<u64>().ok()?;
    if millis == 0 {
        return None;
    }
    Some(Duration::from_millis(millis.min(BACKEND_STOP_TIMEOUT_MAX_MS)))
}
