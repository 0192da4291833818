//! HTTP API for a powchain node.
//!
//! Routes mirror the peer protocol: peers call `GET /chain`,
//! `PUT /transactions`, `DELETE /transactions` and `PUT /consensus` on each
//! other; wallets use `POST /transactions`, `GET /amount` and `GET /mine`.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use powchain_chain::{spawn_mining_loop, Ledger};
use powchain_core::{ChainSnapshot, Transaction, TransactionRequest};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    ledger: Arc<Ledger>,
    public_key: String,
    mining_started: Arc<AtomicBool>,
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new(ledger: Arc<Ledger>, public_key: String, shutdown: CancellationToken) -> Self {
        Self {
            ledger,
            public_key,
            mining_started: Arc::new(AtomicBool::new(false)),
            shutdown,
        }
    }

    /// Start the periodic miner unless it is already running.
    ///
    /// Returns false if it was already started.
    pub fn start_mining(&self) -> bool {
        if self.mining_started.swap(true, Ordering::SeqCst) {
            return false;
        }
        let period = self.ledger.config().mining_interval;
        spawn_mining_loop(
            Arc::clone(&self.ledger),
            period.max(Duration::from_millis(1)),
            self.shutdown.child_token(),
        );
        true
    }
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: &'static str,
}

#[derive(Debug, Serialize)]
struct TransactionsResponse {
    transactions: Vec<Transaction>,
    length: usize,
}

#[derive(Debug, Deserialize)]
struct AmountQuery {
    blockchain_address: Option<String>,
}

#[derive(Debug, Serialize)]
struct AmountResponse {
    amount: f32,
}

#[derive(Debug, Serialize)]
struct WalletResponse {
    blockchain_address: String,
    public_key: String,
}

fn message(status: StatusCode, message: &'static str) -> Response {
    (status, Json(MessageResponse { message })).into_response()
}

fn success(status: StatusCode) -> Response {
    message(status, "success")
}

fn fail() -> Response {
    message(StatusCode::BAD_REQUEST, "fail")
}

/// Build the node's router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(get_chain))
        .route("/chain", get(get_chain))
        .route(
            "/transactions",
            get(get_transactions)
                .post(create_transaction)
                .put(add_transaction)
                .delete(clear_transactions),
        )
        .route("/mine", get(mine))
        .route("/mine/start", get(start_mining))
        .route("/amount", get(get_amount))
        .route("/consensus", axum::routing::put(consensus))
        .route("/wallet", get(get_wallet))
        .with_state(state)
}

async fn get_chain(State(state): State<AppState>) -> Json<ChainSnapshot> {
    Json(ChainSnapshot::from(state.ledger.chain()))
}

async fn get_transactions(State(state): State<AppState>) -> Json<TransactionsResponse> {
    let transactions = state.ledger.pending_transactions();
    Json(TransactionsResponse {
        length: transactions.len(),
        transactions,
    })
}

async fn create_transaction(
    State(state): State<AppState>,
    body: Result<Json<TransactionRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(e) => {
            warn!(error = %e, "malformed transaction body");
            return fail();
        }
    };
    if state.ledger.create_transaction(&request).await {
        success(StatusCode::CREATED)
    } else {
        fail()
    }
}

async fn add_transaction(
    State(state): State<AppState>,
    body: Result<Json<TransactionRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(e) => {
            warn!(error = %e, "malformed transaction body");
            return fail();
        }
    };
    if state.ledger.add_request(&request) {
        success(StatusCode::OK)
    } else {
        fail()
    }
}

async fn clear_transactions(State(state): State<AppState>) -> Response {
    state.ledger.clear_pending();
    success(StatusCode::OK)
}

async fn mine(State(state): State<AppState>) -> Response {
    if state.ledger.mine().await {
        success(StatusCode::OK)
    } else {
        fail()
    }
}

async fn start_mining(State(state): State<AppState>) -> Response {
    if state.start_mining() {
        info!("periodic mining started on request");
    }
    success(StatusCode::OK)
}

async fn get_amount(State(state): State<AppState>, Query(query): Query<AmountQuery>) -> Response {
    match query.blockchain_address {
        Some(address) if !address.is_empty() => {
            let amount = state.ledger.balance_of(&address);
            Json(AmountResponse { amount }).into_response()
        }
        _ => fail(),
    }
}

async fn consensus(State(state): State<AppState>) -> Response {
    let replaced = state.ledger.resolve_conflicts().await;
    info!(replaced, "consensus requested");
    success(StatusCode::OK)
}

async fn get_wallet(State(state): State<AppState>) -> Json<WalletResponse> {
    Json(WalletResponse {
        blockchain_address: state.ledger.address().to_string(),
        public_key: state.public_key.clone(),
    })
}
