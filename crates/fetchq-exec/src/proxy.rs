use std::time::Duration;

use async_trait::async_trait;
use fetchq_core::{FetchError, ModuleProxy};
use fetchq_model::VersionInfo;
use reqwest::StatusCode;
use tracing::{debug, instrument};

use crate::ExecError;

/// Per-request limit of proxy lookups.
const PROXY_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Module proxy client speaking the `{module}/@v/{version}.info` protocol.
#[derive(Clone, Debug)]
pub struct HttpModuleProxy {
    client: reqwest::Client,
    base: String,
}

impl HttpModuleProxy {
    /// Client for the proxy rooted at `base` (e.g. `https://proxy.golang.org`).
    pub fn new(base: impl Into<String>) -> Result<Self, ExecError> {
        let base = base.into();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ExecError::InvalidProxyUrl(base));
        }
        let client = reqwest::Client::builder()
            .timeout(PROXY_REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base: base.trim_end_matches('/').to_string(),
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn info_url(&self, module_path: &str, version: &str) -> String {
        format!(
            "{}/{}/@v/{}.info",
            self.base,
            escape_path(module_path),
            escape_path(version)
        )
    }
}

/// Case-encode a module path or version for proxy URLs.
///
/// Every upper-case ASCII letter becomes `!` followed by its lower-case form,
/// so paths stay distinct on case-insensitive file systems.
pub fn escape_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for c in path.chars() {
        if c.is_ascii_uppercase() {
            out.push('!');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[async_trait]
impl ModuleProxy for HttpModuleProxy {
    #[instrument(level = "debug", skip(self))]
    async fn info(&self, module_path: &str, version: &str) -> Result<VersionInfo, FetchError> {
        let url = self.info_url(module_path, version);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Proxy(e.to_string()))?;

        let status = resp.status();
        match status {
            StatusCode::NOT_FOUND | StatusCode::GONE => {
                debug!(%url, %status, "module version unknown to proxy");
                Err(FetchError::NotFound(format!("{module_path}@{version}")))
            }
            s if s.is_success() => resp
                .json::<VersionInfo>()
                .await
                .map_err(|e| FetchError::Proxy(format!("decode {url}: {e}"))),
            s => Err(FetchError::Proxy(format!("{url} returned {s}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_lowercases_with_bang() {
        assert_eq!(escape_path("github.com/Azure/azure-sdk"), "github.com/!azure/azure-sdk");
        assert_eq!(escape_path("example.com/foo"), "example.com/foo");
        assert_eq!(escape_path("v1.0.0-RC1"), "v1.0.0-!r!c1");
    }

    #[test]
    fn info_url_escapes_both_parts() {
        let proxy = HttpModuleProxy::new("https://proxy.example.com/").unwrap();
        assert_eq!(
            proxy.info_url("github.com/BurntSushi/toml", "v1.2.0"),
            "https://proxy.example.com/github.com/!burnt!sushi/toml/@v/v1.2.0.info"
        );
    }

    #[test]
    fn non_http_base_is_rejected() {
        assert!(matches!(
            HttpModuleProxy::new("proxy.example.com"),
            Err(ExecError::InvalidProxyUrl(_))
        ));
    }
}
