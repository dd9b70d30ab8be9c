//! HTTP client for the Sigsum log API

use crate::ascii;
use crate::proof::{CosignedTreeHead, InclusionProof};
use bt_transparency::{Error, Result};
use std::time::Duration;

/// A client for one Sigsum log instance
pub struct LogClient {
    origin: String,
    client: reqwest::Client,
}

impl LogClient {
    /// Create a client for a log origin URL
    pub fn new(origin: &str) -> Result<Self> {
        url::Url::parse(origin).map_err(|e| Error::Parse(format!("invalid log origin: {}", e)))?;

        let client = reqwest::Client::builder()
            .user_agent("boot-transparency")
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(29))
            .no_gzip()
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            origin: origin.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Fetch the latest cosigned tree head
    pub async fn get_tree_head(&self) -> Result<CosignedTreeHead> {
        let text = self.get("get-tree-head").await?;

        let sections = ascii::sections(&text);
        match sections.first() {
            Some(lines) => CosignedTreeHead::from_ascii_lines(lines),
            None => Err(Error::Parse("empty tree head response".to_string())),
        }
    }

    /// Fetch the inclusion proof of a leaf under a tree size
    pub async fn get_inclusion_proof(
        &self,
        tree_size: u64,
        leaf_hash: &[u8; 32],
    ) -> Result<InclusionProof> {
        let path = format!("get-inclusion-proof/{}/{}", tree_size, hex::encode(leaf_hash));
        let text = self.get(&path).await?;

        let sections = ascii::sections(&text);
        match sections.first() {
            Some(lines) => InclusionProof::from_ascii_lines(lines),
            None => Err(Error::Parse("empty inclusion proof response".to_string())),
        }
    }

    async fn get(&self, path: &str) -> Result<String> {
        let url = format!("{}/{}", self.origin, path);
        tracing::debug!(%url, "fetching from log");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::Network(format!(
                "log request {} failed: {}",
                url,
                response.status()
            )));
        }

        response.text().await.map_err(|e| Error::Network(e.to_string()))
    }
}
