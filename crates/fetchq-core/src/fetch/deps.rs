use std::{fmt, sync::Arc};

use async_trait::async_trait;
use fetchq_model::VersionInfo;

use crate::fetch::{FetchError, ModuleProxy, ModuleStore, ProxyHandle, StoreHandle};

/// External collaborators handed to every processing invocation.
#[derive(Clone)]
pub struct FetchDeps {
    proxy: ProxyHandle,
    store: StoreHandle,
}

impl FetchDeps {
    pub fn new(proxy: ProxyHandle, store: StoreHandle) -> Self {
        Self { proxy, store }
    }

    /// Module proxy client.
    pub fn proxy(&self) -> &ProxyHandle {
        &self.proxy
    }

    /// Persistence layer.
    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    pub fn with_proxy(mut self, proxy: ProxyHandle) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn with_store(mut self, store: StoreHandle) -> Self {
        self.store = store;
        self
    }
}

impl Default for FetchDeps {
    fn default() -> Self {
        Self {
            proxy: Arc::new(NoProxy),
            store: Arc::new(NoStore),
        }
    }
}

impl fmt::Debug for FetchDeps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchDeps")
            .field("proxy", &"<handle>")
            .field("store", &"<handle>")
            .finish()
    }
}

/// Proxy placeholder that fails every lookup.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProxy;

#[async_trait]
impl ModuleProxy for NoProxy {
    async fn info(&self, module_path: &str, version: &str) -> Result<VersionInfo, FetchError> {
        Err(FetchError::Proxy(format!(
            "no module proxy configured for {module_path}@{version}"
        )))
    }
}

/// Store placeholder that keeps nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoStore;

#[async_trait]
impl ModuleStore for NoStore {
    async fn insert(&self, _: &str, _: VersionInfo) -> Result<(), FetchError> {
        Ok(())
    }

    async fn get(&self, _: &str, _: &str) -> Result<Option<VersionInfo>, FetchError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn default_deps_fail_proxy_lookups() {
        let deps = FetchDeps::default();

        let err = deps.proxy().info("example.com/foo", "v1.0.0").await.unwrap_err();
        assert!(matches!(err, FetchError::Proxy(ref m) if m.contains("example.com/foo@v1.0.0")));
    }

    #[tokio::test]
    async fn default_store_accepts_and_forgets() {
        let deps = FetchDeps::default();

        deps.store()
            .insert("example.com/foo", VersionInfo::new("v1.0.0"))
            .await
            .unwrap();
        let got = deps.store().get("example.com/foo", "v1.0.0").await.unwrap();
        assert!(got.is_none());
    }

    #[test]
    fn debug_hides_handles() {
        let s = format!("{:?}", FetchDeps::default());
        assert_eq!(s, r#"FetchDeps { proxy: "<handle>", store: "<handle>" }"#);
    }
}
