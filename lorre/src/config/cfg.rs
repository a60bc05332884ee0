use std::{path::PathBuf, time::Duration};

use sqlx::{sqlite, SqlitePool};

use super::{Cli, ConfigFile};

#[derive(Clone, Debug)]
pub struct Config {
    pub cli: Cli,
    pub file: ConfigFile,
}

impl Config {
    pub fn new(cli: Cli, file: ConfigFile) -> Self {
        Self { cli, file }
    }

    /// `{protocol}://{host}:{port}{path_prefix}/chains/main/`
    pub fn node_base_url(&self) -> String {
        let protocol = self
            .file
            .node
            .protocol
            .clone()
            .unwrap_or_else(|| "http".to_string());
        let host = self
            .file
            .node
            .host
            .clone()
            .unwrap_or_else(|| "127.0.0.1".to_string());
        let port = self.file.node.port.unwrap_or(8732);
        let mut prefix = self.file.node.path_prefix.clone().unwrap_or_default();
        if !prefix.is_empty() && !prefix.starts_with('/') {
            prefix.insert(0, '/');
        }
        let prefix = prefix.trim_end_matches('/').to_string();
        format!("{protocol}://{host}:{port}{prefix}/chains/main/")
    }

    pub fn network(&self) -> String {
        self.file
            .node
            .network
            .clone()
            .unwrap_or_else(|| "mainnet".to_string())
    }

    pub async fn sqlite(&self) -> anyhow::Result<sqlite::SqlitePool> {
        let db = self.data();

        // SQLx doesn't seem to like it if a db file does not already exist, so let's create an empty one
        if !tokio::fs::try_exists(&db).await? {
            tokio::fs::OpenOptions::new()
                .write(true)
                .create(true)
                .open(&db)
                .await?;
        }

        Ok(SqlitePool::connect(&format!("sqlite:{}", db.to_string_lossy())).await?)
    }

    fn data(&self) -> PathBuf {
        self.file.data.clone().unwrap_or_else(|| "lorre.db".into())
    }

    pub fn fetch_concurrency(&self) -> usize {
        self.file.sync.fetch_concurrency.unwrap_or(5).max(1)
    }

    pub fn accounts_fetch_concurrency(&self) -> usize {
        self.file
            .sync
            .accounts_fetch_concurrency
            .unwrap_or(5)
            .max(1)
    }

    pub fn batch_size(&self) -> usize {
        self.file.sync.batch_size.unwrap_or(500).max(1)
    }

    pub fn idle_interval(&self) -> Duration {
        Duration::from_secs(self.file.sync.idle_interval.unwrap_or(5))
    }

    pub fn fee_window(&self) -> usize {
        self.file.sync.fee_window.unwrap_or(1000)
    }

    pub fn max_attempts(&self) -> u32 {
        self.file.sync.max_attempts.unwrap_or(3).max(1)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.file.sync.request_timeout.unwrap_or(30))
    }
}
