use std::collections::HashMap;

use async_trait::async_trait;
use fetchq_core::{FetchError, ModuleStore};
use fetchq_model::{ModuleVersion, VersionInfo};
use tokio::sync::RwLock;

/// Process-local [`ModuleStore`] keyed by module path and version.
#[derive(Debug, Default)]
pub struct MemoryStore {
    versions: RwLock<HashMap<ModuleVersion, VersionInfo>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.versions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.versions.read().await.is_empty()
    }
}

#[async_trait]
impl ModuleStore for MemoryStore {
    async fn insert(&self, module_path: &str, info: VersionInfo) -> Result<(), FetchError> {
        let key = ModuleVersion::new(module_path, info.version.clone());
        self.versions.write().await.insert(key, info);
        Ok(())
    }

    async fn get(
        &self,
        module_path: &str,
        version: &str,
    ) -> Result<Option<VersionInfo>, FetchError> {
        let key = ModuleVersion::new(module_path, version);
        Ok(self.versions.read().await.get(&key).cloned())
    }
}
