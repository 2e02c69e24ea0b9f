#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Diagnostics(String),
    #[error(transparent)]
    Engine(#[from] instance_engine::EngineError),
    #[error(transparent)]
    Upgrade(#[from] upgrade_engine::UpgradeError),
    #[error(transparent)]
    Connector(#[from] schema_connector::ConnectorError),
}

pub type CliResult<T> = Result<T, CliError>;
