use serde::Deserialize;

use crate::source::dominos::DEFAULT_HOST;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub store_id: String,
    pub order_key: String,

    #[serde(default = "default_tracker_host")]
    pub tracker_host: String,
    #[serde(default = "default_poll_secs")]
    pub poll_secs: u64,

    // Optional JSONL log of every snapshot
    #[serde(default)]
    pub snapshot_jsonl_path: Option<String>,
}

fn default_tracker_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_poll_secs() -> u64 {
    10
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let c = config::Config::builder()
            .add_source(config::Environment::default())
            .build()?;
        Ok(c.try_deserialize()?)
    }
}
