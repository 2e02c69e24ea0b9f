#[derive(Debug, thiserror::Error)]
pub enum UpgradeError {
    #[error("table `{table}` changed schema from `{old_schema}` to `{new_schema}`, which is not supported")]
    SchemaChanged { table: String, old_schema: String, new_schema: String },
    #[error(transparent)]
    Instance(#[from] instance_engine::EngineError),
    #[error(transparent)]
    Connector(#[from] schema_connector::ConnectorError),
}

pub type UpgradeResult<T> = Result<T, UpgradeError>;
