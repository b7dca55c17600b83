use serde::{Deserialize, Serialize};

use crate::coordination::DEFAULT_WINDOW;
use crate::graph::DEFAULT_RUN_FOLDER;

/// Optional generator settings, read from `slngen.yaml` / `slngen.json` in
/// the build root. Every field has a default so the file may be absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Target platform name written into project configurations.
    pub platform: String,
    /// Explicit engine command (e.g. `meson` or `python3 /opt/meson.py`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meson: Option<String>,
    /// Rendezvous window for target build steps.
    pub coordination_window_ms: u64,
    /// Ignore peer markers older than this; unset means never.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker_ttl_secs: Option<u64>,
    /// Overrides the project's descriptive name as the solution name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution_name: Option<String>,
    /// Folder holding the synthetic run steps.
    pub run_folder: String,
    /// Coordination scratch directory, relative to the build root unless absolute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scratch_dir: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            platform: "x64".to_string(),
            meson: None,
            coordination_window_ms: DEFAULT_WINDOW.as_millis() as u64,
            marker_ttl_secs: None,
            solution_name: None,
            run_folder: DEFAULT_RUN_FOLDER.to_string(),
            scratch_dir: None,
        }
    }
}
