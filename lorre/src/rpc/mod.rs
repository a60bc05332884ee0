use std::sync::Arc;

use anyhow::{anyhow, Context};
use tokio::sync::Semaphore;

use crate::config::Config;

/// HTTP client for the node RPC. Paths are relative to
/// `{protocol}://{host}:{port}{path_prefix}/chains/main/`.
#[derive(Clone)]
pub struct NodeClient {
    http: reqwest::Client,
    base_url: String,
}

impl NodeClient {
    pub fn new(config: &Config) -> anyhow::Result<NodeClient> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(NodeClient {
            http,
            base_url: config.node_base_url(),
        })
    }

    /// Single GET. Non-2xx statuses are errors carrying a body excerpt.
    pub async fn get(&self, path: &str) -> anyhow::Result<String> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let excerpt: String = body.chars().take(256).collect();
            return Err(anyhow!("GET {url} returned {status}: {excerpt}"));
        }
        Ok(body)
    }

    /// Issues one GET per input with at most `concurrency` in flight,
    /// preserving the pairing (and order) between inputs and bodies. Any
    /// failure fails the whole batch.
    pub async fn batched_get<I>(
        &self,
        inputs: Vec<I>,
        to_path: impl Fn(&I) -> String,
        concurrency: usize,
    ) -> anyhow::Result<Vec<(I, String)>>
    where
        I: Send + 'static,
    {
        let results = self.batched_try_get(inputs, to_path, concurrency).await?;
        results
            .into_iter()
            .map(|(input, result)| result.map(|body| (input, body)))
            .collect()
    }

    /// Like `batched_get`, but individual request failures are returned
    /// per-input instead of failing the batch. Used where the caller maps a
    /// failed fetch to a neutral value (checkpointed accounts that no longer
    /// resolve, for instance).
    pub async fn batched_try_get<I>(
        &self,
        inputs: Vec<I>,
        to_path: impl Fn(&I) -> String,
        concurrency: usize,
    ) -> anyhow::Result<Vec<(I, anyhow::Result<String>)>>
    where
        I: Send + 'static,
    {
        let limiter = Arc::new(Semaphore::new(concurrency.max(1)));

        let mut tasks = Vec::with_capacity(inputs.len());
        for input in inputs {
            let path = to_path(&input);
            let limiter = limiter.clone();
            let client = self.clone();
            tasks.push((
                input,
                tokio::spawn(async move {
                    let _permit = limiter
                        .acquire_owned()
                        .await
                        .map_err(|_| anyhow!("request limiter closed"))?;
                    client.get(&path).await
                }),
            ));
        }

        let mut results = Vec::with_capacity(tasks.len());
        for (input, task) in tasks {
            results.push((input, task.await?));
        }
        Ok(results)
    }
}
