#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ShutdownAction {
    ForceKillTree { pid: u32 },
    Terminate { pid: u32 },
    MissingPid,
}

pub(crate) fn resolve_shutdown_action(pid: Option<u32>, posix_signals: bool) -> ShutdownAction {
    match (pid.filter(|pid| *pid != 0), posix_signals) {
        (None, _) => ShutdownAction::MissingPid,
        (Some(pid), true) => ShutdownAction::Terminate { pid },
        (Some(pid), false) => ShutdownAction::ForceKillTree { pid },
    }
}

pub(crate) fn host_shutdown_action(pid: Option<u32>) -> ShutdownAction {
    resolve_shutdown_action(pid, cfg!(unix))
}

#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
pub(crate) fn taskkill_args(pid: u32) -> Vec<String> {
    vec![
        "/pid".to_string(),
        pid.to_string(),
        "/f".to_string(),
        "/t".to_string(),
    ]
}

/// Issues the action without waiting for the target to exit.
pub(crate) fn execute_shutdown_action(action: ShutdownAction) -> Result<(), String> {
    match action {
        ShutdownAction::ForceKillTree { pid } => force_kill_tree(pid),
        ShutdownAction::Terminate { pid } => send_terminate_signal(pid),
        ShutdownAction::MissingPid => Err("Backend process id is unavailable.".to_string()),
    }
}

#[cfg(target_os = "windows")]
fn force_kill_tree(pid: u32) -> Result<(), String> {
    use std::os::windows::process::CommandExt;
    use std::process::{Command, Stdio};

    Command::new("taskkill")
        .args(taskkill_args(pid))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .creation_flags(crate::CREATE_NO_WINDOW)
        .spawn()
        .map(|_| ())
        .map_err(|error| format!("Failed to run taskkill for pid {pid}: {error}"))
}

#[cfg(unix)]
fn force_kill_tree(pid: u32) -> Result<(), String> {
    send_signal(pid, libc::SIGKILL)
}

#[cfg(unix)]
fn send_terminate_signal(pid: u32) -> Result<(), String> {
    send_signal(pid, libc::SIGTERM)
}

#[cfg(not(unix))]
fn send_terminate_signal(pid: u32) -> Result<(), String> {
    force_kill_tree(pid)
}

#[cfg(unix)]
fn send_signal(pid: u32, signal: libc::c_int) -> Result<(), String> {
    let raw_pid = libc::pid_t::try_from(pid)
        .map_err(|_| format!("Process id {pid} is out of range for this platform."))?;
    // SAFETY: kill(2) has no memory-safety preconditions.
    let result = unsafe { libc::kill(raw_pid, signal) };
    if result == 0 {
        Ok(())
    } else {
        Err(format!(
            "Failed to send signal {signal} to pid {pid}: {}",
            std::io::Error::last_os_error()
        ))
    }
}
