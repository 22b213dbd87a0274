use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    FETCH_ROUTE_PREFIX, ModelError, ModelResult, VERSION_SEPARATOR,
    domain::{ModulePath, Suffix, Version},
};

/// A `(module path, version)` pair identifying one unit of fetch work.
///
/// This is what the in-process queue carries: the suffix only matters for
/// deduplication on the distributed backend.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleVersion {
    pub module_path: ModulePath,
    pub version: Version,
}

impl ModuleVersion {
    pub fn new(module_path: impl Into<ModulePath>, version: impl Into<Version>) -> Self {
        Self {
            module_path: module_path.into(),
            version: version.into(),
        }
    }

    /// Route of the push-delivery callback for this module version.
    ///
    /// Format: `/fetch/{module_path}/@v/{version}`.
    pub fn fetch_route(&self) -> String {
        format!(
            "{FETCH_ROUTE_PREFIX}/{}{VERSION_SEPARATOR}{}",
            self.module_path, self.version
        )
    }

    /// Parse the tail of a fetch route (`{module_path}/@v/{version}`).
    ///
    /// A leading `/` is tolerated. The module path may contain slashes, the version may not.
    pub fn from_route_path(path: &str) -> ModelResult<Self> {
        let trimmed = path.trim_start_matches('/');
        let (module_path, version) = trimmed
            .rsplit_once(VERSION_SEPARATOR)
            .ok_or_else(|| ModelError::InvalidRoute(path.to_string()))?;

        if module_path.trim().is_empty() || version.trim().is_empty() || version.contains('/') {
            return Err(ModelError::InvalidRoute(path.to_string()));
        }
        Ok(Self::new(module_path, version))
    }
}

impl fmt::Display for ModuleVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.module_path, self.version)
    }
}

/// Request to schedule one fetch.
///
/// Created per call, immutable, and discarded once handed to a queue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchRequest {
    #[serde(flatten)]
    pub target: ModuleVersion,
    /// Optional task-name suffix. Empty means "deduplicate normally".
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub suffix: Suffix,
}

impl FetchRequest {
    pub fn new(module_path: impl Into<ModulePath>, version: impl Into<Version>) -> Self {
        Self {
            target: ModuleVersion::new(module_path, version),
            suffix: Suffix::new(),
        }
    }

    /// Attach a suffix that bypasses time-bucket deduplication.
    pub fn with_suffix(mut self, suffix: impl Into<Suffix>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn module_path(&self) -> &str {
        &self.target.module_path
    }

    pub fn version(&self) -> &str {
        &self.target.version
    }
}
