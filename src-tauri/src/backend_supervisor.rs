use std::{
    io::{BufRead, BufReader, Read},
    path::Path,
    process::{Child, ExitStatus},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard,
    },
    thread,
    time::{Duration, Instant},
};

use crate::{
    app_config::ShellConfig,
    launch_plan::{self, build_command, build_debug_command},
    logging::{DesktopLogger, LogArg, LogLevel},
    process_control::{self, ShutdownAction},
    startup_token, LaunchPlan, BACKEND_EXIT_POLL_INTERVAL_MS, BACKEND_STOP_POLL_INTERVAL_MS,
};

#[derive(Debug)]
struct SupervisedProcess {
    generation: u64,
    pid: Option<u32>,
    child: Child,
}

type ProcessSlot = Arc<Mutex<Option<SupervisedProcess>>>;

fn lock_slot(
    slot: &Mutex<Option<SupervisedProcess>>,
) -> MutexGuard<'_, Option<SupervisedProcess>> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn describe_exit_status(status: &ExitStatus) -> String {
    status
        .code()
        .map(|code| code.to_string())
        .unwrap_or_else(|| "none (terminated by signal)".to_string())
}

/// Owns the single backend child process for the lifetime of the shell.
#[derive(Debug)]
pub(crate) struct BackendSupervisor {
    config: ShellConfig,
    logger: Arc<DesktopLogger>,
    process: ProcessSlot,
    generation: AtomicU64,
}

impl BackendSupervisor {
    pub(crate) fn new(config: ShellConfig, logger: Arc<DesktopLogger>) -> Self {
        Self {
            config,
            logger,
            process: Arc::new(Mutex::new(None)),
            generation: AtomicU64::new(0),
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        lock_slot(&self.process).is_some()
    }

    pub(crate) fn pid(&self) -> Option<u32> {
        lock_slot(&self.process)
            .as_ref()
            .and_then(|process| process.pid)
    }

    pub(crate) fn start(&self, resource_dir: Option<&Path>) -> bool {
        if self.is_running() {
            self.logger
                .warn("backend start skipped: a backend process is already running");
            return false;
        }

        let token = startup_token::generate_startup_token();
        let plan = match launch_plan::resolve_launch_plan(&self.config, resource_dir, &token) {
            Ok(plan) => plan,
            Err(error) => {
                self.logger
                    .error(&format!("Failed to resolve backend launch: {error}"));
                return false;
            }
        };
        self.logger.info(&format!(
            "starting backend in {} mode on port {}",
            plan.mode.as_str(),
            plan.mode.backend_port()
        ));
        self.start_with_plan(&plan)
    }

    pub(crate) fn start_with_plan(&self, plan: &LaunchPlan) -> bool {
        let mut slot = lock_slot(&self.process);
        if slot.is_some() {
            self.logger
                .warn("backend start skipped: a backend process is already running");
            return false;
        }

        let debug_command = build_debug_command(plan);
        self.logger.log(
            LogLevel::Info,
            &[
                LogArg::Text("launching backend:"),
                LogArg::structured(&debug_command),
            ],
        );

        let mut child = match build_command(plan).spawn() {
            Ok(child) => child,
            Err(error) => {
                self.logger.log(
                    LogLevel::Error,
                    &[
                        LogArg::Text("Failed to start backend process:"),
                        LogArg::Error(&error),
                    ],
                );
                return false;
            }
        };

        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let pid = Some(child.id()).filter(|pid| *pid != 0);
        self.logger.info(&format!(
            "backend process started with pid {}",
            pid.map(|pid| pid.to_string())
                .unwrap_or_else(|| "unknown".to_string())
        ));

        if let Some(stdout) = child.stdout.take() {
            self.spawn_stream_forwarder(stdout, "stdout", LogLevel::Info);
        }
        if let Some(stderr) = child.stderr.take() {
            self.spawn_stream_forwarder(stderr, "stderr", LogLevel::Error);
        }

        *slot = Some(SupervisedProcess {
            generation,
            pid,
            child,
        });
        drop(slot);

        self.spawn_exit_watcher(generation);
        true
    }

    fn spawn_stream_forwarder<R>(&self, stream: R, stream_name: &'static str, level: LogLevel)
    where
        R: Read + Send + 'static,
    {
        let logger = Arc::clone(&self.logger);
        let prefix = format!("backend {stream_name}:");
        let spawn_result = thread::Builder::new()
            .name(format!("backend-{stream_name}"))
            .spawn(move || {
                let mut reader = BufReader::new(stream);
                let mut chunk = Vec::new();
                loop {
                    chunk.clear();
                    match reader.read_until(b'\n', &mut chunk) {
                        Ok(0) => return,
                        Ok(_) => {
                            while matches!(chunk.last(), Some(b'\n' | b'\r')) {
                                chunk.pop();
                            }
                            logger.log(level, &[LogArg::Text(&prefix), LogArg::Bytes(&chunk)]);
                        }
                        Err(error) => {
                            logger.error(&format!(
                                "Failed to read backend {stream_name}: {error}"
                            ));
                            return;
                        }
                    }
                }
            });
        if let Err(error) = spawn_result {
            self.logger.error(&format!(
                "Failed to spawn backend {stream_name} reader: {error}"
            ));
        }
    }

    fn spawn_exit_watcher(&self, generation: u64) {
        let slot = Arc::clone(&self.process);
        let logger = Arc::clone(&self.logger);
        let spawn_result = thread::Builder::new()
            .name("backend-exit-watcher".to_string())
            .spawn(move || loop {
                {
                    let mut guard = lock_slot(&slot);
                    let Some(process) = guard.as_mut() else {
                        return;
                    };
                    if process.generation != generation {
                        return;
                    }
                    match process.child.try_wait() {
                        Ok(Some(status)) => {
                            *guard = None;
                            drop(guard);
                            logger.log(
                                LogLevel::Info,
                                &[
                                    LogArg::Text("backend process exited with code"),
                                    LogArg::display(&describe_exit_status(&status)),
                                ],
                            );
                            return;
                        }
                        Ok(None) => {}
                        Err(error) => {
                            drop(guard);
                            logger.error(&format!(
                                "Failed to poll backend process status: {error}"
                            ));
                            return;
                        }
                    }
                }
                thread::sleep(Duration::from_millis(BACKEND_EXIT_POLL_INTERVAL_MS));
            });
        if let Err(error) = spawn_result {
            self.logger
                .error(&format!("Failed to spawn backend exit watcher: {error}"));
        }
    }

    pub(crate) fn stop(&self) {
        self.stop_with(process_control::host_shutdown_action);
    }

    fn stop_with<F>(&self, resolve_action: F)
    where
        F: FnOnce(Option<u32>) -> ShutdownAction,
    {
        let Some(mut process) = lock_slot(&self.process).take() else {
            return;
        };

        let action = resolve_action(process.pid);
        if action == ShutdownAction::MissingPid {
            self.logger
                .error("Cannot stop backend process: process id is unavailable");
            return;
        }

        self.logger.info(&format!("stopping backend process: {action:?}"));
        if let Err(error) = process_control::execute_shutdown_action(action) {
            self.logger
                .error(&format!("Failed to stop backend process: {error}"));
        }

        if let Some(timeout) = self.config.stop_timeout {
            self.wait_for_exit_or_kill(&mut process.child, timeout);
        }
    }

    fn wait_for_exit_or_kill(&self, child: &mut Child, timeout: Duration) {
        let deadline = Instant::now() + timeout;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    self.logger.info(&format!(
                        "backend process exited with code {} after stop request",
                        describe_exit_status(&status)
                    ));
                    return;
                }
                Ok(None) if Instant::now() >= deadline => {
                    self.logger.warn(&format!(
                        "backend process did not exit within {}ms; forcing kill",
                        timeout.as_millis()
                    ));
                    if let Err(error) = child.kill() {
                        self.logger
                            .error(&format!("Failed to force kill backend process: {error}"));
                        return;
                    }
                    match child.wait() {
                        Ok(status) => self.logger.info(&format!(
                            "backend process exited with code {} after forced kill",
                            describe_exit_status(&status)
                        )),
                        Err(error) => self.logger.error(&format!(
                            "Failed to reap backend process after forced kill: {error}"
                        )),
                    }
                    return;
                }
                Ok(None) => thread::sleep(Duration::from_millis(BACKEND_STOP_POLL_INTERVAL_MS)),
                Err(error) => {
                    self.logger
                        .error(&format!("Failed to poll backend process during stop: {error}"));
                    return;
                }
            }
        }
    }
}
