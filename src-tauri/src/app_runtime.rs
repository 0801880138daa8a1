use std::sync::Arc;
use tauri::{Manager, RunEvent};

use crate::{
    app_config::ShellConfig, backend_supervisor::BackendSupervisor, exit_events,
    logging::DesktopLogger, main_window::WindowManager,
};

pub(crate) fn run() {
    let config = ShellConfig::from_env();

    tauri::Builder::default()
        .plugin(tauri_plugin_single_instance::init(|app, _args, _cwd| {
            exit_events::ensure_main_window(app);
        }))
        .invoke_handler(tauri::generate_handler![
            crate::desktop_bridge_commands::get_app_info,
        ])
        .setup(move |app| {
            let app_handle = app.handle().clone();

            let app_data_dir = app_handle.path().app_data_dir().ok();
            let logger = Arc::new(DesktopLogger::initialize(
                config.mode,
                app_data_dir.as_deref(),
            ));
            logger.info(&format!(
                "desktop shell starting in {} mode",
                config.mode.as_str()
            ));
            if let Some(log_path) = logger.log_path() {
                logger.info(&format!("desktop log path: {}", log_path.display()));
            }
            app.manage(Arc::clone(&logger));

            let supervisor = BackendSupervisor::new(config.clone(), Arc::clone(&logger));
            let resource_dir = app_handle.path().resource_dir().ok();
            if !supervisor.start(resource_dir.as_deref()) {
                logger.warn("backend is unavailable until the next application start");
            }
            app.manage(supervisor);

            app.manage(WindowManager::new(config.mode, Arc::clone(&logger)));
            exit_events::ensure_main_window(&app_handle);
            Ok(())
        })
        .build(tauri::generate_context!())
        .expect("error while building tauri application")
        .run(|app_handle, event| match event {
            RunEvent::ExitRequested { code, api, .. } => {
                exit_events::handle_exit_requested(app_handle, code, &api);
            }
            RunEvent::Exit => {
                exit_events::handle_exit_event(app_handle);
            }
            #[cfg(target_os = "macos")]
            RunEvent::Reopen { .. } => {
                exit_events::ensure_main_window(app_handle);
            }
            _ => {}
        });
}
