use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct NodeConfig {
    pub network: Option<String>,
    pub protocol: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub path_prefix: Option<String>,
}
impl NodeConfig {
    fn example() -> NodeConfig {
        NodeConfig {
            network: Some("mainnet".into()),
            protocol: Some("http".into()),
            host: Some("127.0.0.1".into()),
            port: Some(8732),
            path_prefix: Some(String::new()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct SyncConfig {
    pub fetch_concurrency: Option<usize>,
    pub accounts_fetch_concurrency: Option<usize>,
    pub batch_size: Option<usize>,
    pub idle_interval: Option<u64>,
    pub fee_window: Option<usize>,
    pub max_attempts: Option<u32>,
    pub request_timeout: Option<u64>,
}
impl SyncConfig {
    fn example() -> SyncConfig {
        SyncConfig {
            fetch_concurrency: Some(5),
            accounts_fetch_concurrency: Some(5),
            batch_size: Some(500),
            idle_interval: Some(5),
            fee_window: Some(1000),
            max_attempts: Some(3),
            request_timeout: Some(30),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ConfigFile {
    pub data: Option<PathBuf>,
    pub node: NodeConfig,
    pub sync: SyncConfig,
}

impl ConfigFile {
    pub fn example() -> ConfigFile {
        ConfigFile {
            data: Some("lorre.db".into()),
            node: NodeConfig::example(),
            sync: SyncConfig::example(),
        }
    }
}
