pub(crate) const MAIN_WINDOW_LABEL: &str = "main";
pub(crate) const MAIN_WINDOW_WIDTH: f64 = 1200.0;
pub(crate) const MAIN_WINDOW_HEIGHT: f64 = 800.0;
pub(crate) const DEV_SERVER_URLS: [&str; 2] = ["http://localhost:5174", "http://localhost:5173"];
pub(crate) const DEV_SERVER_PROBE_TIMEOUT_MS: u64 = 400;
pub(crate) const PRODUCTION_INDEX_DOCUMENT: &str = "index.html";

pub(crate) const DEVELOPMENT_BACKEND_PORT: u16 = 8001;
pub(crate) const PRODUCTION_BACKEND_PORT: u16 = 8000;
pub(crate) const BACKEND_TOKEN_ENV: &str = "DETECTOR_STARTUP_TOKEN";
pub(crate) const BACKEND_PORT_ENV: &str = "DETECTOR_BACKEND_PORT";
pub(crate) const BACKEND_DEV_SCRIPT: &str = "app/main.py";
pub(crate) const DEFAULT_PYTHON_INTERPRETER: &str = "python";
#[cfg(target_os = "windows")]
pub(crate) const PACKAGED_BACKEND_EXECUTABLE: &str = "fastapi-backend.exe";
#[cfg(not(target_os = "windows"))]
pub(crate) const PACKAGED_BACKEND_EXECUTABLE: &str = "fastapi-backend";
pub(crate) const BACKEND_EXIT_POLL_INTERVAL_MS: u64 = 250;
pub(crate) const BACKEND_STOP_POLL_INTERVAL_MS: u64 = 100;

pub(crate) const STARTUP_TOKEN_SALT: &str = "detector-desktop-startup:";
pub(crate) const STARTUP_TOKEN_HEX_LEN: usize = 16;

pub(crate) const DESKTOP_MODE_ENV: &str = "DETECTOR_DESKTOP_MODE";
pub(crate) const LEGACY_MODE_ENV: &str = "NODE_ENV";
pub(crate) const BACKEND_DIR_ENV: &str = "DETECTOR_BACKEND_DIR";
pub(crate) const PYTHON_INTERPRETER_ENV: &str = "DETECTOR_PYTHON";
pub(crate) const BACKEND_STOP_TIMEOUT_ENV: &str = "DETECTOR_BACKEND_STOP_TIMEOUT_MS";
pub(crate) const BACKEND_STOP_TIMEOUT_MAX_MS: u64 = 60_000;

pub(crate) const DESKTOP_LOG_DIR: &str = "logs";
pub(crate) const DESKTOP_LOG_FILE: &str = "main.log";
pub(crate) const DESKTOP_LOG_MAX_BYTES: u64 = 5 * 1024 * 1024;

#[cfg(target_os = "windows")]
pub(crate) const CREATE_NO_WINDOW: u32 = 0x0800_0000;
