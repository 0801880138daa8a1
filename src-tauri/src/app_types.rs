use std::path::PathBuf;

use crate::app_config::BuildMode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LaunchPlan {
    pub(crate) cmd: PathBuf,
    pub(crate) args: Vec<String>,
    pub(crate) cwd: Option<PathBuf>,
    pub(crate) envs: Vec<(String, String)>,
    pub(crate) mode: BuildMode,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AppInfo {
    pub(crate) version: String,
    pub(crate) name: String,
    pub(crate) app_path: String,
}

#[cfg(test)]
mod tests {
    use super::AppInfo;

    #[test]
    fn app_info_serializes_with_camel_case_keys() {
        let info = AppInfo {
            version: "1.2.0".to_string(),
            name: "Detector".to_string(),
            app_path: "/opt/detector".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&info).unwrap(),
            serde_json::json!({
                "version": "1.2.0",
                "name": "Detector",
                "appPath": "/opt/detector",
            })
        );
    }
}
