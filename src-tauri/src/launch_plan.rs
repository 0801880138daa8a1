use std::{
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use crate::{
    app_config::{BuildMode, ShellConfig},
    LaunchPlan, BACKEND_DEV_SCRIPT, BACKEND_PORT_ENV, BACKEND_TOKEN_ENV,
    PACKAGED_BACKEND_EXECUTABLE,
};

pub(crate) fn backend_env_overlay(token: &str, port: u16) -> Vec<(String, String)> {
    vec![
        (BACKEND_TOKEN_ENV.to_string(), token.to_string()),
        (BACKEND_PORT_ENV.to_string(), port.to_string()),
        ("PYTHONUNBUFFERED".to_string(), "1".to_string()),
        ("PYTHONIOENCODING".to_string(), "utf-8".to_string()),
    ]
}

pub(crate) fn workspace_root_dir() -> PathBuf {
    let candidate = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("..");
    candidate.canonicalize().unwrap_or(candidate)
}

pub(crate) fn default_backend_dir() -> PathBuf {
    workspace_root_dir().join("backend")
}

pub(crate) fn resolve_launch_plan(
    config: &ShellConfig,
    resource_dir: Option<&Path>,
    token: &str,
) -> Result<LaunchPlan, String> {
    let envs = backend_env_overlay(token, config.mode.backend_port());
    match config.mode {
        BuildMode::Development => {
            let backend_dir = config
                .backend_dir
                .clone()
                .unwrap_or_else(default_backend_dir);
            Ok(resolve_dev_launch(
                &config.python_interpreter,
                backend_dir,
                envs,
            ))
        }
        BuildMode::Production => {
            let resource_dir = resource_dir.ok_or_else(|| {
                "Packaged resource directory is unavailable; cannot locate backend executable."
                    .to_string()
            })?;
            Ok(resolve_packaged_launch(resource_dir, envs))
        }
    }
}

fn resolve_dev_launch(
    interpreter: &str,
    backend_dir: PathBuf,
    envs: Vec<(String, String)>,
) -> LaunchPlan {
    LaunchPlan {
        cmd: PathBuf::from(interpreter),
        args: vec![BACKEND_DEV_SCRIPT.to_string()],
        cwd: Some(backend_dir),
        envs,
        mode: BuildMode::Development,
    }
}

fn resolve_packaged_launch(resource_dir: &Path, envs: Vec<(String, String)>) -> LaunchPlan {
    LaunchPlan {
        cmd: resource_dir.join(PACKAGED_BACKEND_EXECUTABLE),
        args: Vec::new(),
        cwd: None,
        envs,
        mode: BuildMode::Production,
    }
}

pub(crate) fn build_debug_command(plan: &LaunchPlan) -> Vec<String> {
    let mut parts = vec![plan.cmd.to_string_lossy().to_string()];
    parts.extend(plan.args.clone());
    parts
}

pub(crate) fn build_command(plan: &LaunchPlan) -> Command {
    let mut command = Command::new(&plan.cmd);
    command
        .args(&plan.args)
        .envs(plan.envs.iter().map(|(key, value)| (key, value)))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(cwd) = &plan.cwd {
        command.current_dir(cwd);
    }

    #[cfg(target_os = "windows")]
    {
        use std::os::windows::process::CommandExt;
        command.creation_flags(crate::CREATE_NO_WINDOW);
    }

    command
}
