/// Preload script installed into every page of the main window. It exposes a
/// frozen `window.detectorDesktop` object and nothing else from the host.
pub(crate) fn build_desktop_bridge_script(backend_url: &str) -> String {
    let backend_url_literal =
        serde_json::to_string(backend_url).unwrap_or_else(|_| "\"\"".to_string());
    format!(
        r#"(function () {{
  if (window.detectorDesktop) {{
    return;
  }}
  const invoke = (command, args) => window.__TAURI_INTERNALS__.invoke(command, args || {{}});
  Object.defineProperty(window, "detectorDesktop", {{
    value: Object.freeze({{
      isDesktop: true,
      backendUrl: {backend_url_literal},
      getAppInfo: () => invoke("get_app_info"),
    }}),
    writable: false,
    configurable: false,
  }});
}})();"#
    )
}
