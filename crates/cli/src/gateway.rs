//! Thin HTTP client for a node's wallet-facing routes.

use anyhow::{bail, Context, Result};
use powchain_core::{Block, ChainSnapshot, TransactionRequest};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_GATEWAY: &str = "http://127.0.0.1:5000";

#[derive(Debug, Deserialize)]
struct AmountResponse {
    amount: f32,
}

/// A node reached over HTTP.
pub struct Gateway {
    http: Client,
    base: String,
}

impl Gateway {
    pub fn new(base: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base: base.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// `POST /transactions`; true if the node accepted it.
    pub async fn submit(&self, request: &TransactionRequest) -> Result<bool> {
        let response = self
            .http
            .post(self.url("/transactions"))
            .json(request)
            .send()
            .await
            .with_context(|| format!("failed to reach {}", self.base))?;
        Ok(response.status() == StatusCode::CREATED)
    }

    /// `GET /amount`
    pub async fn amount(&self, address: &str) -> Result<f32> {
        let response = self
            .http
            .get(self.url("/amount"))
            .query(&[("blockchain_address", address)])
            .send()
            .await
            .with_context(|| format!("failed to reach {}", self.base))?;
        if !response.status().is_success() {
            bail!("node answered with status {}", response.status());
        }
        let body: AmountResponse = response.json().await.context("malformed amount response")?;
        Ok(body.amount)
    }

    /// `GET /mine`; true if a block was mined.
    pub async fn mine(&self) -> Result<bool> {
        let response = self
            .http
            .get(self.url("/mine"))
            .send()
            .await
            .with_context(|| format!("failed to reach {}", self.base))?;
        Ok(response.status().is_success())
    }

    /// `GET /chain`
    pub async fn chain(&self) -> Result<Vec<Block>> {
        let response = self
            .http
            .get(self.url("/chain"))
            .send()
            .await
            .with_context(|| format!("failed to reach {}", self.base))?;
        if !response.status().is_success() {
            bail!("node answered with status {}", response.status());
        }
        let snapshot: ChainSnapshot = response.json().await.context("malformed chain response")?;
        Ok(snapshot.chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_strips_trailing_slash() {
        let gateway = Gateway::new("http://127.0.0.1:5001/").unwrap();
        assert_eq!(gateway.url("/chain"), "http://127.0.0.1:5001/chain");

        let gateway = Gateway::new(DEFAULT_GATEWAY).unwrap();
        assert_eq!(gateway.url("/mine"), "http://127.0.0.1:5000/mine");
    }

    #[tokio::test]
    async fn test_unreachable_gateway_is_error() {
        let gateway = Gateway::new("http://127.0.0.1:9").unwrap();
        assert!(gateway.amount("alice").await.is_err());
    }
}
