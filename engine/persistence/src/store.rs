//! A stand-in for the `venus_core.sys_parameter` row (spec §6). The real
//! row access goes through a `schema_connector::SchemaConnector`; this
//! trait keeps the persistence crate itself free of any one vendor's
//! query syntax, the same way `SchemaConnector` isolates DDL rendering.

use crate::error::PersistenceResult;
use crate::snapshot::{decode, encode, SourceSnapshot};

pub const PARSED_SCHEMA_KEY: &str = "parsed_schema";

pub trait SysParameterStore {
    fn load_parameter(&self, param_key: &str) -> Option<Vec<u8>>;
    fn store_parameter(&mut self, param_key: &str, value: Vec<u8>);
}

pub fn save_parsed_schema(store: &mut dyn SysParameterStore, db: &sdl::ParserDatabase) -> PersistenceResult<()> {
    let bytes = encode(&SourceSnapshot::capture(db))?;
    store.store_parameter(PARSED_SCHEMA_KEY, bytes);
    Ok(())
}

pub fn load_parsed_schema(store: &dyn SysParameterStore) -> PersistenceResult<Option<SourceSnapshot>> {
    match store.load_parameter(PARSED_SCHEMA_KEY) {
        Some(bytes) => Ok(Some(decode(&bytes)?)),
        None => Ok(None),
    }
}

/// An in-process store for tests and single-process embeddings.
#[derive(Debug, Default)]
pub struct InMemoryParameterStore {
    values: rustc_hash::FxHashMap<String, Vec<u8>>,
}

impl SysParameterStore for InMemoryParameterStore {
    fn load_parameter(&self, param_key: &str) -> Option<Vec<u8>> {
        self.values.get(param_key).cloned()
    }

    fn store_parameter(&mut self, param_key: &str, value: Vec<u8>) {
        self.values.insert(param_key.to_string(), value);
    }
}
