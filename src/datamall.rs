use crate::config::DataMallConfig;
use log::warn;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use std::time::Duration;

#[derive(thiserror::Error, Debug)]
pub enum DataMallError {
    /// Network level failure, connect or read timeout included. Retryable by
    /// the caller, never retried here.
    #[error("datamall unreachable: {0}")]
    Unavailable(#[source] reqwest::Error),
    /// The datamall answered with a non-2xx status.
    #[error("datamall answered with status {0}")]
    Status(StatusCode),
    /// The datamall answered 2xx but the body did not decode.
    #[error("datamall answered with an undecodable body: {0}")]
    Malformed(#[source] reqwest::Error),
}

/// Shared HTTP client for the LTA DataMall. Built once per process and cloned
/// into every caller so pagination and live arrival queries reuse the same
/// connection pool.
#[derive(Debug, Clone)]
pub struct DataMallClient {
    client: reqwest::Client,
    base_url: String,
}

impl DataMallClient {
    pub fn new(config: &DataMallConfig) -> anyhow::Result<DataMallClient> {
        let mut default_headers = HeaderMap::new();
        let mut account_key = HeaderValue::from_str(&config.account_key)?;
        account_key.set_sensitive(true);
        default_headers.insert("AccountKey", account_key);

        let client = reqwest::ClientBuilder::new()
            .use_rustls_tls()
            .user_agent("tembusu")
            .default_headers(default_headers)
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .deflate(true)
            .gzip(true)
            .brotli(true)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()?;

        Ok(DataMallClient {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// One GET against a datamall endpoint, decoded into `T`.
    pub async fn fetch_page<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, DataMallError> {
        let response = self
            .client
            .get(self.endpoint_url(path))
            .query(query)
            .send()
            .await
            .map_err(DataMallError::Unavailable)?;

        let status = response.status();
        if !status.is_success() {
            warn!("datamall {} answered {}", path, status);
            return Err(DataMallError::Status(status));
        }

        response.json::<T>().await.map_err(|e| {
            if e.is_decode() {
                DataMallError::Malformed(e)
            } else {
                DataMallError::Unavailable(e)
            }
        })
    }
}
