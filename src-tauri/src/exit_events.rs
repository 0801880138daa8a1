use std::sync::Arc;
use tauri::{AppHandle, ExitRequestApi, Manager};

use crate::{
    backend_supervisor::BackendSupervisor, logging::DesktopLogger, main_window::WindowManager,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExitRequestDecision {
    KeepRunningWithoutWindows,
    AllowExit,
}

/// `code` is `None` when the request comes from the last window closing.
pub(crate) fn decide_exit_request(
    code: Option<i32>,
    keep_alive_without_windows: bool,
) -> ExitRequestDecision {
    if code.is_none() && keep_alive_without_windows {
        ExitRequestDecision::KeepRunningWithoutWindows
    } else {
        ExitRequestDecision::AllowExit
    }
}

fn log_info(app_handle: &AppHandle, message: &str) {
    if let Some(logger) = app_handle.try_state::<Arc<DesktopLogger>>() {
        logger.info(message);
    }
}

fn stop_backend(app_handle: &AppHandle) {
    let Some(supervisor) = app_handle.try_state::<BackendSupervisor>() else {
        return;
    };
    if let Some(pid) = supervisor.pid() {
        log_info(app_handle, &format!("stopping backend process {pid} before quit"));
    }
    supervisor.stop();
}

pub(crate) fn handle_exit_requested(
    app_handle: &AppHandle,
    code: Option<i32>,
    api: &ExitRequestApi,
) {
    match decide_exit_request(code, cfg!(target_os = "macos")) {
        ExitRequestDecision::KeepRunningWithoutWindows => {
            log_info(app_handle, "all windows closed; keeping app alive in background");
            api.prevent_exit();
        }
        ExitRequestDecision::AllowExit => {
            log_info(app_handle, "exit requested");
            stop_backend(app_handle);
        }
    }
}

pub(crate) fn handle_exit_event(app_handle: &AppHandle) {
    if let Some(windows) = app_handle.try_state::<WindowManager>() {
        windows.destroy();
    }
    stop_backend(app_handle);
}

/// Recreates the main window when it is gone and focuses it otherwise.
pub(crate) fn ensure_main_window(app_handle: &AppHandle) {
    let Some(windows) = app_handle.try_state::<WindowManager>() else {
        return;
    };
    if let Err(error) = windows.create(app_handle) {
        if let Some(logger) = app_handle.try_state::<Arc<DesktopLogger>>() {
            logger.error(&format!("failed to recreate main window: {error}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closing_last_window_quits_where_background_mode_is_not_idiomatic() {
        assert_eq!(decide_exit_request(None, false), ExitRequestDecision::AllowExit);
    }

    #[test]
    fn closing_last_window_keeps_running_where_background_mode_is_idiomatic() {
        assert_eq!(
            decide_exit_request(None, true),
            ExitRequestDecision::KeepRunningWithoutWindows
        );
    }

    #[test]
    fn explicit_exit_is_always_allowed() {
        assert_eq!(decide_exit_request(Some(0), true), ExitRequestDecision::AllowExit);
        assert_eq!(decide_exit_request(Some(1), false), ExitRequestDecision::AllowExit);
    }
}
