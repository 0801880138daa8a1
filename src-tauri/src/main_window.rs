use std::{
    net::{TcpStream, ToSocketAddrs},
    path::PathBuf,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};
use tauri::{AppHandle, Manager, WebviewUrl, WebviewWindow, WebviewWindowBuilder, WindowEvent};
use url::Url;

use crate::{
    app_config::BuildMode, desktop_bridge, logging::DesktopLogger, DEV_SERVER_PROBE_TIMEOUT_MS,
    DEV_SERVER_URLS, MAIN_WINDOW_HEIGHT, MAIN_WINDOW_LABEL, MAIN_WINDOW_WIDTH,
    PRODUCTION_INDEX_DOCUMENT,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ContentSource {
    DevServer(Url),
    Bundled(PathBuf),
}

impl ContentSource {
    fn into_webview_url(self) -> WebviewUrl {
        match self {
            Self::DevServer(url) => WebviewUrl::External(url),
            Self::Bundled(path) => WebviewUrl::App(path),
        }
    }
}

/// Picks the first reachable dev server; the last candidate is used when none answer.
pub(crate) fn select_dev_server_url<F>(candidates: &[&str], is_reachable: F) -> Result<Url, String>
where
    F: Fn(&Url) -> bool,
{
    let parsed = candidates
        .iter()
        .map(|raw| {
            Url::parse(raw).map_err(|error| format!("Invalid dev server URL {raw}: {error}"))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let fallback = parsed
        .last()
        .cloned()
        .ok_or_else(|| "No dev server URL configured.".to_string())?;
    Ok(parsed
        .into_iter()
        .find(|url| is_reachable(url))
        .unwrap_or(fallback))
}

pub(crate) fn is_dev_server_reachable(url: &Url, timeout: Duration) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    let port = url.port_or_known_default().unwrap_or(80);
    let addrs = match (host, port).to_socket_addrs() {
        Ok(addrs) => addrs.collect::<Vec<_>>(),
        Err(_) => return false,
    };
    addrs
        .iter()
        .any(|address| TcpStream::connect_timeout(address, timeout).is_ok())
}

pub(crate) fn resolve_content_source<F>(
    mode: BuildMode,
    is_reachable: F,
) -> Result<ContentSource, String>
where
    F: Fn(&Url) -> bool,
{
    match mode {
        BuildMode::Development => {
            select_dev_server_url(&DEV_SERVER_URLS, is_reachable).map(ContentSource::DevServer)
        }
        BuildMode::Production => Ok(ContentSource::Bundled(PathBuf::from(
            PRODUCTION_INDEX_DOCUMENT,
        ))),
    }
}

/// Owns the single main window.
pub(crate) struct WindowManager {
    mode: BuildMode,
    logger: Arc<DesktopLogger>,
    window: Mutex<Option<WebviewWindow>>,
}

impl WindowManager {
    pub(crate) fn new(mode: BuildMode, logger: Arc<DesktopLogger>) -> Self {
        Self {
            mode,
            logger,
            window: Mutex::new(None),
        }
    }

    fn lock_window(&self) -> MutexGuard<'_, Option<WebviewWindow>> {
        self.window
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn create(&self, app_handle: &AppHandle) -> Result<(), String> {
        if let Some(window) = self.lock_window().as_ref() {
            if let Err(error) = window.set_focus() {
                self.logger
                    .warn(&format!("failed to focus existing main window: {error}"));
            }
            return Ok(());
        }

        let probe_timeout = Duration::from_millis(DEV_SERVER_PROBE_TIMEOUT_MS);
        let source = resolve_content_source(self.mode, |url| {
            is_dev_server_reachable(url, probe_timeout)
        })?;
        self.logger
            .info(&format!("loading main window content from {source:?}"));

        let bridge_script =
            desktop_bridge::build_desktop_bridge_script(&self.mode.backend_base_url());
        let window = WebviewWindowBuilder::new(
            app_handle,
            MAIN_WINDOW_LABEL,
            source.into_webview_url(),
        )
        .title(app_handle.package_info().name.clone())
        .inner_size(MAIN_WINDOW_WIDTH, MAIN_WINDOW_HEIGHT)
        .initialization_script(&bridge_script)
        .build()
        .map_err(|error| format!("Failed to create main window: {error}"))?;

        if let Err(error) = window.remove_menu() {
            self.logger
                .warn(&format!("failed to remove main window menu: {error}"));
        }

        #[cfg(debug_assertions)]
        {
            if self.mode.is_development() {
                window.open_devtools();
            }
        }

        let event_app_handle = app_handle.clone();
        window.on_window_event(move |event| {
            if let WindowEvent::Destroyed = event {
                if let Some(manager) = event_app_handle.try_state::<WindowManager>() {
                    manager.clear();
                }
            }
        });

        *self.lock_window() = Some(window);
        Ok(())
    }

    pub(crate) fn destroy(&self) {
        let Some(window) = self.lock_window().take() else {
            return;
        };
        if let Err(error) = window.destroy() {
            self.logger
                .error(&format!("failed to destroy main window: {error}"));
        }
    }

    fn clear(&self) {
        if self.lock_window().take().is_some() {
            self.logger.info("main window closed");
        }
    }
}
