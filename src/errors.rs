use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Application-wide error type for the command-line front end
#[derive(Error, Debug)]
pub enum AppError {
    /// RBF engine operations
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Bitcoin node RPC operations outside the engine
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    /// Configuration issues
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation/parsing
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Node client error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RpcError {
    /// Node unreachable, connection refused/reset, or credentials rejected
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Request did not complete within the configured timeout
    #[error("Request timeout: {timeout_seconds}s for {method}")]
    Timeout { timeout_seconds: u64, method: String },

    /// Node answered with a non-null `error` member
    #[error("RPC call rejected: {method} - {message}")]
    Rejected {
        method: String,
        code: Option<i64>,
        message: String,
    },

    /// Response body was not a JSON-RPC envelope
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// `result` member did not have the expected shape
    #[error("Deserialisation failed: {0}")]
    DeserialisationFailed(String),
}

impl RpcError {
    /// Whether the failure happened before the node could answer
    pub fn is_transport(&self) -> bool {
        matches!(self, RpcError::ConnectionFailed(_) | RpcError::Timeout { .. })
    }

    /// Whether the node's answer (if any) says nothing about the request
    ///
    /// A body that is not JSON-RPC usually comes from a proxy in front of the
    /// node, so it is treated like a transport failure when probing status.
    pub fn is_inconclusive(&self) -> bool {
        self.is_transport() || matches!(self, RpcError::InvalidResponse(_))
    }
}

/// Engine error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error(transparent)]
    Rpc(#[from] RpcError),

    /// An operation that talks to the node was invoked before `connect`
    #[error("Not connected to a Bitcoin node")]
    NotConnected,

    /// Node reported the signature incomplete (usually a wrong key)
    #[error("Failed to sign transaction: {0}")]
    Signing(String),

    /// Operation invoked out of its required order
    #[error("{0}")]
    Sequence(String),

    /// Broadcast attempted without both legs built
    #[error("Chain not fully created: {missing} transaction missing")]
    IncompleteChain { missing: &'static str },

    /// Inputs or node data make the requested transaction impossible
    #[error("Chain build error: {0}")]
    ChainBuild(String),
}

/// Coarse error kinds exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    ConnectionError,
    RpcError,
    SigningError,
    SequenceError,
    IncompleteChainError,
    ChainBuildError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::ConnectionError => "ConnectionError",
            ErrorKind::RpcError => "RpcError",
            ErrorKind::SigningError => "SigningError",
            ErrorKind::SequenceError => "SequenceError",
            ErrorKind::IncompleteChainError => "IncompleteChainError",
            ErrorKind::ChainBuildError => "ChainBuildError",
        };
        f.write_str(name)
    }
}

/// How a caller should react to an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorClass {
    /// Caller bug: operations invoked in the wrong order or with bad inputs
    Precondition,
    /// I/O failure; the same call may succeed later
    Transient,
    /// The node refused the request; repeating it will not help
    Rejected,
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Rpc(e) if e.is_transport() => ErrorKind::ConnectionError,
            EngineError::Rpc(_) => ErrorKind::RpcError,
            EngineError::NotConnected | EngineError::Sequence(_) => ErrorKind::SequenceError,
            EngineError::Signing(_) => ErrorKind::SigningError,
            EngineError::IncompleteChain { .. } => ErrorKind::IncompleteChainError,
            EngineError::ChainBuild(_) => ErrorKind::ChainBuildError,
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            EngineError::Rpc(e) if e.is_transport() => ErrorClass::Transient,
            EngineError::Rpc(_) | EngineError::Signing(_) => ErrorClass::Rejected,
            EngineError::NotConnected
            | EngineError::Sequence(_)
            | EngineError::IncompleteChain { .. }
            | EngineError::ChainBuild(_) => ErrorClass::Precondition,
        }
    }
}

/// Application-wide result type
pub type AppResult<T> = Result<T, AppError>;

/// Result type for node client operations
pub type RpcResult<T> = Result<T, RpcError>;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidData(format!("JSON error: {}", err))
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}
