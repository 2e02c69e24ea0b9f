//! The portable, gzip-compressed binary blob spec §6 describes: every
//! source file that went into a compilation, captured verbatim so the
//! Parse Aggregator can reconstitute an equivalent `ParserDatabase` later
//! without the original files on disk.

use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};

use crate::error::PersistenceResult;
use crate::loader::OwnedSourceLoader;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSnapshot {
    /// Package paths that were passed to `aggregate` as top-level sources;
    /// everything else in `sources` was pulled in transitively via `use`.
    pub top_level: Vec<String>,
    /// `(path, contents)`, in the order schemas were first loaded. The
    /// built-in `core` schema is never captured; `aggregate` injects it
    /// fresh on every call.
    pub sources: Vec<(String, String)>,
}

impl SourceSnapshot {
    pub fn capture(db: &sdl::ParserDatabase) -> Self {
        let mut top_level = Vec::new();
        let mut sources = Vec::new();
        for (_, schema) in db.schemas() {
            let name = schema.source.name().to_string();
            if name.starts_with("<builtin>/") {
                continue;
            }
            if schema.top_level {
                top_level.push(name.clone());
            }
            sources.push((name, schema.source.as_str().to_string()));
        }
        SourceSnapshot { top_level, sources }
    }

    /// Re-run the Parse Aggregator over the captured sources (spec §6,
    /// "The loader reads the row and reconstitutes the parse result").
    pub fn reconstitute(&self) -> Result<sdl::ParserDatabase, sdl::Diagnostics> {
        let loader = OwnedSourceLoader::new(self.sources.iter().cloned());
        let top_paths: Vec<std::path::PathBuf> = self.top_level.iter().map(std::path::PathBuf::from).collect();
        sdl::aggregate(&top_paths, &[], &loader)
    }
}

/// bincode-serialize then gzip-compress (spec §6).
pub fn encode(snapshot: &SourceSnapshot) -> PersistenceResult<Vec<u8>> {
    let raw = bincode::serialize(snapshot)?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&raw)?;
    Ok(encoder.finish()?)
}

/// Inverse of [`encode`].
pub fn decode(bytes: &[u8]) -> PersistenceResult<SourceSnapshot> {
    let mut decoder = GzDecoder::new(bytes);
    let mut raw = Vec::new();
    decoder.read_to_end(&mut raw)?;
    Ok(bincode::deserialize(&raw)?)
}
