//! The serial DDL processor (spec §4.5, §5): batches a single rendered
//! statement at a time, fans out to sub-processors in declaration order,
//! then invokes the backend. Sub-processors form a strict tree, never a
//! cycle.

use crate::ddl::DdlOperation;
use crate::error::ConnectorResult;
use crate::SchemaConnector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementOutcome {
    Applied,
    Ignored,
}

pub struct DdlProcessor<'c> {
    connector: &'c dyn SchemaConnector,
    ignore_exceptions: bool,
    sub_processors: Vec<DdlProcessor<'c>>,
}

impl<'c> DdlProcessor<'c> {
    pub fn new(connector: &'c dyn SchemaConnector, ignore_exceptions: bool) -> Self {
        DdlProcessor {
            connector,
            ignore_exceptions,
            sub_processors: Vec::new(),
        }
    }

    /// Attach a sub-processor. Every statement this processor buffers is
    /// also fanned out to `sub` before the backend is invoked.
    pub fn attach(&mut self, sub: DdlProcessor<'c>) {
        self.sub_processors.push(sub);
    }

    pub fn process(&mut self, op: &DdlOperation) -> ConnectorResult<StatementOutcome> {
        let statement = self.connector.render(op)?;

        for sub in &mut self.sub_processors {
            sub.process(op)?;
        }

        match self.connector.execute(&statement) {
            Ok(()) => {
                tracing::info!(statement = %statement, "ddl statement applied");
                Ok(StatementOutcome::Applied)
            }
            Err(err) if self.ignore_exceptions => {
                tracing::debug!(statement = %statement, error = %err, "ddl statement failed, ignoring");
                Ok(StatementOutcome::Ignored)
            }
            Err(err) => {
                tracing::error!(statement = %statement, error = %err, "ddl statement failed");
                Err(err)
            }
        }
    }
}
