use anyhow::Context;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://datamall2.mytransport.sg";

/// Settings for talking to the LTA DataMall. The account key comes from the
/// `ACCOUNT_KEY` environment variable, everything else has defaults sized to
/// the datamall's observed behaviour: it answers in tens of milliseconds, so
/// connects fail fast and reads get a longer timeout.
#[derive(Debug, Clone)]
pub struct DataMallConfig {
    pub account_key: String,
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl DataMallConfig {
    pub fn new(account_key: String) -> DataMallConfig {
        DataMallConfig {
            account_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(2),
            request_timeout: Duration::from_secs(5),
        }
    }

    pub fn from_env() -> anyhow::Result<DataMallConfig> {
        let account_key =
            std::env::var("ACCOUNT_KEY").context("ACCOUNT_KEY must be set in the environment")?;

        let mut config = DataMallConfig::new(account_key);

        if let Ok(base_url) = std::env::var("DATAMALL_BASE_URL") {
            config.base_url = base_url;
        }

        Ok(config)
    }
}
