use std::{
    env,
    path::{Path, PathBuf},
};
use tauri::{AppHandle, Manager};

use crate::AppInfo;

pub(crate) fn build_app_info(name: &str, version: &str, app_path: &Path) -> AppInfo {
    AppInfo {
        version: version.to_string(),
        name: name.to_string(),
        app_path: app_path.to_string_lossy().to_string(),
    }
}

fn resolve_app_path(app_handle: &AppHandle) -> PathBuf {
    app_handle
        .path()
        .resource_dir()
        .ok()
        .or_else(|| {
            env::current_exe()
                .ok()
                .and_then(|exe| exe.parent().map(Path::to_path_buf))
        })
        .unwrap_or_default()
}

#[tauri::command]
pub(crate) fn get_app_info(app_handle: AppHandle) -> AppInfo {
    let package_info = app_handle.package_info();
    build_app_info(
        &package_info.name,
        &package_info.version.to_string(),
        &resolve_app_path(&app_handle),
    )
}
