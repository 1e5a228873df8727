use serde::{Deserialize, Serialize};

/// Top-level settings; missing sections and fields fall back to defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct AppSettings {
    pub general: GeneralSettings,
    pub liveness: LivenessSettings,
    pub audit: AuditSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeneralSettings {
    /// Title of the folder used by `scratch-add`.
    pub scratch_folder_title: String,
    /// Directory exports are written to; the working directory when unset.
    pub export_dir: Option<String>,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            scratch_folder_title: "Scratch".to_string(),
            export_dir: None,
        }
    }
}

/// An executable name that counts as "the browser is running".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessMatcher {
    pub executable: String,
    pub display_name: String,
}

impl ProcessMatcher {
    pub fn new(executable: &str, display_name: &str) -> Self {
        Self {
            executable: executable.to_string(),
            display_name: display_name.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LivenessSettings {
    pub processes: Vec<ProcessMatcher>,
}

impl Default for LivenessSettings {
    fn default() -> Self {
        Self {
            processes: vec![
                ProcessMatcher::new("librewolf", "LibreWolf"),
                ProcessMatcher::new("librewolf-bin", "LibreWolf"),
                ProcessMatcher::new("firefox", "Firefox"),
                ProcessMatcher::new("firefox-bin", "Firefox"),
                ProcessMatcher::new("firefox-esr", "Firefox ESR"),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AuditSettings {
    pub workers: usize,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub max_redirects: usize,
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            workers: 10,
            timeout_secs: 5,
            user_agent: format!("marksmith/{}", env!("CARGO_PKG_VERSION")),
            max_redirects: 10,
        }
    }
}
