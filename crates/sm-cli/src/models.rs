use serde::{Deserialize, Serialize};
use sm_core::SkinMenuError;

pub(crate) const BUILD_REPORT_SCHEMA: &str = "skinmenu-report.v1";
pub(crate) const DEFAULT_OUTPUT_FILE: &str = "script-skinshortcuts-includes.xml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BuildReport {
    pub(crate) schema_version: String,
    pub(crate) output: String,
    pub(crate) includes: usize,
    pub(crate) variables: usize,
    pub(crate) diagnostics: Vec<SkinMenuError>,
}
