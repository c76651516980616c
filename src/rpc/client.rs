use crate::config::NodeConfig;
use crate::errors::{RpcError, RpcResult};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// RPC method names used by the engine
pub mod methods {
    pub const GET_NETWORK_INFO: &str = "getnetworkinfo";
    pub const CREATE_RAW_TRANSACTION: &str = "createrawtransaction";
    pub const SIGN_RAW_TRANSACTION_WITH_KEY: &str = "signrawtransactionwithkey";
    pub const DECODE_RAW_TRANSACTION: &str = "decoderawtransaction";
    pub const GET_RAW_TRANSACTION: &str = "getrawtransaction";
    pub const GET_MEMPOOL_ENTRY: &str = "getmempoolentry";
    pub const SEND_RAW_TRANSACTION: &str = "sendrawtransaction";
}

/// A single-call JSON-RPC interface to a Bitcoin node
///
/// The engine only ever talks to the node through this trait, so any
/// transport (or an in-memory stand-in) can drive it.
#[allow(async_fn_in_trait)]
pub trait NodeRpc {
    /// Perform one RPC call and return the raw `result` member
    async fn call(&self, method: &str, params: Vec<Value>) -> RpcResult<Value>;

    /// Perform one RPC call and decode the `result` member into `T`
    async fn call_as<T: DeserializeOwned>(&self, method: &str, params: Vec<Value>) -> RpcResult<T> {
        let result = self.call(method, params).await?;
        serde_json::from_value(result).map_err(|e| {
            RpcError::DeserialisationFailed(format!("{} returned unexpected data: {}", method, e))
        })
    }
}

#[derive(Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Vec<Value>,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Value,
}

/// JSON-RPC 2.0 client for Bitcoin Core over HTTP with basic authentication
///
/// Every call is a single attempt bounded by `timeout_seconds`; there is no
/// retry and no connection pooling beyond what `reqwest` does internally.
pub struct NodeClient {
    http: reqwest::Client,
    config: NodeConfig,
    next_id: AtomicU64,
}

impl NodeClient {
    pub fn new(config: NodeConfig) -> RpcResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .no_proxy()
            .build()
            .map_err(|e| {
                RpcError::ConnectionFailed(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            http,
            config,
            next_id: AtomicU64::new(0),
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    fn transport_error(&self, method: &str, err: reqwest::Error) -> RpcError {
        if err.is_timeout() {
            RpcError::Timeout {
                timeout_seconds: self.config.timeout_seconds,
                method: method.to_string(),
            }
        } else {
            RpcError::ConnectionFailed(format!(
                "Failed to connect to Bitcoin node at {} - check host/port: {}",
                self.config.endpoint(),
                err
            ))
        }
    }
}

/// Build a `Rejected` error from the node's `error` payload
fn rejection(method: &str, payload: &Value) -> RpcError {
    let code = payload.get("code").and_then(Value::as_i64);
    let message = payload
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| payload.to_string());

    RpcError::Rejected {
        method: method.to_string(),
        code,
        message,
    }
}

impl NodeRpc for NodeClient {
    async fn call(&self, method: &str, params: Vec<Value>) -> RpcResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        debug!("RPC request #{} {} to {}", id, method, self.config.endpoint());

        let response = self
            .http
            .post(self.config.url())
            .basic_auth(&self.config.username, Some(&self.config.password))
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(method, e))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            warn!("Node at {} rejected RPC credentials", self.config.endpoint());
            return Err(RpcError::ConnectionFailed(format!(
                "Bitcoin node at {} rejected the RPC credentials (HTTP {})",
                self.config.endpoint(),
                status.as_u16()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(method, e))?;

        let envelope: JsonRpcResponse = serde_json::from_str(&body).map_err(|e| {
            RpcError::InvalidResponse(format!(
                "HTTP {} for {} was not a JSON-RPC response: {}",
                status.as_u16(),
                method,
                e
            ))
        })?;

        if !envelope.error.is_null() {
            debug!("RPC request #{} {} rejected: {}", id, method, envelope.error);
            return Err(rejection(method, &envelope.error));
        }

        Ok(envelope.result)
    }
}
