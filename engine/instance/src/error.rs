//! Structural failures the Instance Engine raises (spec §7): attempting to
//! read the physical name of something that was never realized, or a
//! failure surfaced by the connector while applying a plan.

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("`{0}` is not realized and has no physical name")]
    NotRealized(String),

    #[error(transparent)]
    Connector(#[from] schema_connector::ConnectorError),
}

pub type EngineResult<T> = Result<T, EngineError>;
