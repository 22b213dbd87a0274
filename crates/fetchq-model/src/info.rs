use serde::{Deserialize, Serialize};

/// Version metadata served by a module proxy for `{module}/@v/{version}.info`.
///
/// Field names follow the proxy protocol (`Version`, `Time`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VersionInfo {
    pub version: String,
    /// Commit time in RFC 3339, when the proxy knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

impl VersionInfo {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            time: None,
        }
    }
}
