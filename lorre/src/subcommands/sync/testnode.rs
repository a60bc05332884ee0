//! An in-process node for end-to-end sync tests: serves just enough of the
//! chain RPC surface from a mutable in-memory chain.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

const BASE_TIMESTAMP: i64 = 1_530_619_288;

#[derive(Clone)]
pub struct TestBlock {
    pub level: i64,
    pub hash: String,
    pub predecessor: String,
    pub operations: Value,
}

impl TestBlock {
    pub fn new(level: i64, hash: &str, predecessor: &str) -> TestBlock {
        TestBlock {
            level,
            hash: hash.to_string(),
            predecessor: predecessor.to_string(),
            operations: json!([[], [], [], []]),
        }
    }
}

#[derive(Default)]
struct Inner {
    chain: Vec<TestBlock>,
    balances: HashMap<String, i64>,
    requests: Vec<String>,
}

#[derive(Clone, Default)]
pub struct TestNode {
    inner: Arc<Mutex<Inner>>,
}

impl TestNode {
    pub fn with_chain(chain: Vec<TestBlock>) -> TestNode {
        let node = TestNode::default();
        node.inner.lock().unwrap().chain = chain;
        node
    }

    pub fn extend(&self, block: TestBlock) {
        self.inner.lock().unwrap().chain.push(block);
    }

    pub fn replace_chain(&self, chain: Vec<TestBlock>) {
        self.inner.lock().unwrap().chain = chain;
    }

    pub fn set_balance(&self, account: &str, balance: i64) {
        self.inner
            .lock()
            .unwrap()
            .balances
            .insert(account.to_string(), balance);
    }

    pub fn request_log(&self) -> Vec<String> {
        self.inner.lock().unwrap().requests.clone()
    }

    pub fn clear_request_log(&self) {
        self.inner.lock().unwrap().requests.clear();
    }

    pub async fn start(self) -> SocketAddr {
        let app = Router::new()
            .route("/chains/main/blocks/:id", get(block))
            .route("/chains/main/blocks/:id/operations", get(operations))
            .route(
                "/chains/main/blocks/:id/context/contracts/:account",
                get(contract),
            )
            .route(
                "/chains/main/blocks/:id/context/delegates/:pkh",
                get(delegate),
            )
            .route("/chains/main/blocks/:id/helpers/baking_rights", get(baking))
            .route(
                "/chains/main/blocks/:id/helpers/endorsing_rights",
                get(endorsing),
            )
            .route("/chains/main/blocks/:id/votes/current_quorum", get(quorum))
            .route(
                "/chains/main/blocks/:id/votes/current_proposal",
                get(proposal),
            )
            .route("/chains/main/blocks/:id/votes/proposals", get(proposals))
            .route("/chains/main/blocks/:id/votes/listings", get(listings))
            .route("/chains/main/blocks/:id/votes/ballot_list", get(ballots))
            .with_state(self);

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::Server::from_tcp(listener)
                .unwrap()
                .serve(app.into_make_service())
                .await
                .unwrap();
        });
        addr
    }

    fn log(&self, path: String) {
        self.inner.lock().unwrap().requests.push(path);
    }

    /// `head`, a bare hash, or `hash~offset` (offset steps toward genesis).
    fn resolve(&self, id: &str) -> Option<TestBlock> {
        let inner = self.inner.lock().unwrap();
        if id == "head" {
            return inner.chain.last().cloned();
        }
        let (hash, offset) = match id.split_once('~') {
            Some((hash, offset)) => (hash, offset.parse::<usize>().ok()?),
            None => (id, 0),
        };
        let idx = inner.chain.iter().position(|b| b.hash == hash)?;
        idx.checked_sub(offset).map(|i| inner.chain[i].clone())
    }

    fn balance(&self, account: &str) -> i64 {
        *self
            .inner
            .lock()
            .unwrap()
            .balances
            .get(account)
            .unwrap_or(&1000)
    }
}

/// A one-transaction operation group in node JSON form.
pub fn tx_group(
    hash: &str,
    branch: &str,
    source: &str,
    destination: &str,
    fee: i64,
    amount: i64,
) -> Value {
    json!({
        "protocol": "PsTest",
        "chain_id": "NetTest",
        "hash": hash,
        "branch": branch,
        "signature": "sigTest",
        "contents": [{
            "kind": "transaction",
            "source": source,
            "fee": fee.to_string(),
            "counter": "1",
            "gas_limit": "10100",
            "storage_limit": "0",
            "amount": amount.to_string(),
            "destination": destination,
            "metadata": {
                "operation_result": {"status": "applied", "consumed_gas": "10100"}
            }
        }]
    })
}

fn block_json(block: &TestBlock) -> Value {
    let timestamp = OffsetDateTime::from_unix_timestamp(BASE_TIMESTAMP + block.level)
        .unwrap()
        .format(&Rfc3339)
        .unwrap();
    json!({
        "protocol": "PsTest",
        "chain_id": "NetTest",
        "hash": block.hash,
        "header": {
            "level": block.level,
            "proto": 1,
            "predecessor": block.predecessor,
            "timestamp": timestamp,
            "fitness": ["00"],
            "priority": 0
        },
        "metadata": {
            "baker": "tz1baker",
            "voting_period_kind": "proposal",
            "level": {
                "level": block.level,
                "cycle": 0,
                "voting_period": 0
            }
        }
    })
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "block not found").into_response()
}

async fn block(State(node): State<TestNode>, Path(id): Path<String>) -> Response {
    node.log(format!("blocks/{id}"));
    match node.resolve(&id) {
        Some(block) => Json(block_json(&block)).into_response(),
        None => not_found(),
    }
}

async fn operations(State(node): State<TestNode>, Path(id): Path<String>) -> Response {
    node.log(format!("blocks/{id}/operations"));
    match node.resolve(&id) {
        Some(block) => Json(block.operations).into_response(),
        None => not_found(),
    }
}

async fn contract(
    State(node): State<TestNode>,
    Path((id, account)): Path<(String, String)>,
) -> Response {
    node.log(format!("blocks/{id}/context/contracts/{account}"));
    if node.resolve(&id).is_none() {
        return not_found();
    }
    Json(json!({
        "manager": "tz1mgr",
        "balance": node.balance(&account).to_string(),
        "spendable": true,
        "counter": "1"
    }))
    .into_response()
}

async fn delegate(
    State(node): State<TestNode>,
    Path((id, pkh)): Path<(String, String)>,
) -> Response {
    node.log(format!("blocks/{id}/context/delegates/{pkh}"));
    if node.resolve(&id).is_none() {
        return not_found();
    }
    Json(json!({
        "balance": "5000000",
        "frozen_balance": "1000000",
        "staking_balance": "4000000",
        "delegated_balance": "0",
        "deactivated": false,
        "grace_period": 10
    }))
    .into_response()
}

async fn baking(State(node): State<TestNode>, Path(id): Path<String>) -> Response {
    match node.resolve(&id) {
        Some(block) => Json(json!([
            {"level": block.level, "delegate": "tz1baker", "priority": 0}
        ]))
        .into_response(),
        None => not_found(),
    }
}

async fn endorsing(State(node): State<TestNode>, Path(id): Path<String>) -> Response {
    match node.resolve(&id) {
        Some(block) => Json(json!([
            {"level": block.level, "delegate": "tz1baker", "slots": [0, 1]}
        ]))
        .into_response(),
        None => not_found(),
    }
}

async fn quorum(State(node): State<TestNode>, Path(id): Path<String>) -> Response {
    match node.resolve(&id) {
        Some(_) => Json(json!(7291)).into_response(),
        None => not_found(),
    }
}

async fn proposal(State(node): State<TestNode>, Path(id): Path<String>) -> Response {
    match node.resolve(&id) {
        Some(_) => Json(Value::Null).into_response(),
        None => not_found(),
    }
}

async fn proposals(State(node): State<TestNode>, Path(id): Path<String>) -> Response {
    match node.resolve(&id) {
        Some(_) => Json(json!([])).into_response(),
        None => not_found(),
    }
}

async fn listings(State(node): State<TestNode>, Path(id): Path<String>) -> Response {
    match node.resolve(&id) {
        Some(_) => Json(json!([{"pkh": "tz1baker", "rolls": 5}])).into_response(),
        None => not_found(),
    }
}

async fn ballots(State(node): State<TestNode>, Path(id): Path<String>) -> Response {
    match node.resolve(&id) {
        Some(_) => Json(json!([])).into_response(),
        None => not_found(),
    }
}
