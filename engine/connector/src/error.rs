//! Connector-level structural failures (spec §7): conditions that are not
//! compiler diagnostics and are surfaced up the call stack as a distinct
//! error kind instead of being accumulated.

/// Conditions a [`crate::SchemaConnector`] implementation (or the DDL
/// processor driving it) can raise.
#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    #[error("connector `{provider}` does not implement `{operation}`")]
    NotImplemented { provider: &'static str, operation: &'static str },

    #[error("failed to connect to the target database: {0}")]
    Connection(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("DDL statement failed: {statement}: {message}")]
    Ddl { statement: String, message: String },

    #[error("type `{0}` has no physical representation for this vendor")]
    UnknownType(String),
}

pub type ConnectorResult<T> = Result<T, ConnectorError>;
