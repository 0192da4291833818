//! HTTP client for the peer protocol.
//!
//! Every call is a single attempt bounded by the configured timeout. Callers
//! decide what a failure means; the ledger logs it and moves on.

use async_trait::async_trait;
use powchain_core::{Block, ChainSnapshot, TransactionRequest};
use reqwest::{Client, Method, StatusCode};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when talking to a peer.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("peer answered with status {0}")]
    Status(StatusCode),

    #[error("peer {0} is unknown")]
    UnknownPeer(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Upper bound on a single request, connect included.
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(5),
        }
    }
}

/// The calls a node makes against its peers.
#[async_trait]
pub trait PeerClient: Send + Sync {
    /// `GET /chain`
    async fn fetch_chain(&self, peer: &str) -> Result<Vec<Block>>;

    /// `DELETE /transactions`
    async fn clear_transactions(&self, peer: &str) -> Result<()>;

    /// `PUT /transactions`
    async fn put_transaction(&self, peer: &str, request: &TransactionRequest) -> Result<()>;

    /// `PUT /consensus`
    async fn request_consensus(&self, peer: &str) -> Result<()>;
}

/// [`PeerClient`] over HTTP with JSON bodies.
#[derive(Debug, Clone)]
pub struct HttpPeerClient {
    http_client: Client,
}

impl HttpPeerClient {
    /// Create a client with the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.request_timeout)
            .build()?;
        Ok(Self { http_client })
    }

    fn url(peer: &str, path: &str) -> String {
        format!("http://{peer}{path}")
    }

    async fn send_empty(&self, method: Method, peer: &str, path: &str) -> Result<()> {
        let response = self
            .http_client
            .request(method, Self::url(peer, path))
            .send()
            .await?;
        ensure_success(response.status())
    }
}

fn ensure_success(status: StatusCode) -> Result<()> {
    if status.is_success() {
        Ok(())
    } else {
        Err(ClientError::Status(status))
    }
}

#[async_trait]
impl PeerClient for HttpPeerClient {
    async fn fetch_chain(&self, peer: &str) -> Result<Vec<Block>> {
        let response = self
            .http_client
            .get(Self::url(peer, "/chain"))
            .send()
            .await?;
        ensure_success(response.status())?;
        let snapshot: ChainSnapshot = response.json().await?;
        Ok(snapshot.chain)
    }

    async fn clear_transactions(&self, peer: &str) -> Result<()> {
        self.send_empty(Method::DELETE, peer, "/transactions").await
    }

    async fn put_transaction(&self, peer: &str, request: &TransactionRequest) -> Result<()> {
        let response = self
            .http_client
            .put(Self::url(peer, "/transactions"))
            .json(request)
            .send()
            .await?;
        ensure_success(response.status())
    }

    async fn request_consensus(&self, peer: &str) -> Result<()> {
        self.send_empty(Method::PUT, peer, "/consensus").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_format() {
        assert_eq!(
            HttpPeerClient::url("127.0.0.1:5001", "/chain"),
            "http://127.0.0.1:5001/chain"
        );
    }

    #[test]
    fn test_non_success_status_is_error() {
        assert!(ensure_success(StatusCode::OK).is_ok());
        assert!(ensure_success(StatusCode::CREATED).is_ok());
        assert!(matches!(
            ensure_success(StatusCode::INTERNAL_SERVER_ERROR),
            Err(ClientError::Status(StatusCode::INTERNAL_SERVER_ERROR))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_peer_is_transport_error() {
        let client = HttpPeerClient::new(ClientConfig {
            request_timeout: Duration::from_millis(200),
        })
        .unwrap();

        // Port 9 (discard) on localhost is not expected to run an HTTP server.
        let result = client.fetch_chain("127.0.0.1:9").await;
        assert!(matches!(result, Err(ClientError::Transport(_))));
    }
}
