//! An owned-string counterpart to `parser_database::MapSourceLoader`, for
//! sources that arrived over the wire rather than as `'static` test
//! literals (spec §6, "Persistence").

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustc_hash::FxHashMap;

#[derive(Debug, Default, Clone)]
pub struct OwnedSourceLoader {
    files: FxHashMap<String, Arc<str>>,
}

impl OwnedSourceLoader {
    pub fn new(files: impl IntoIterator<Item = (String, String)>) -> Self {
        OwnedSourceLoader {
            files: files.into_iter().map(|(k, v)| (k, Arc::from(v))).collect(),
        }
    }
}

impl sdl::SourceLoader for OwnedSourceLoader {
    fn locate(&self, package_name: &str, _search_path: &[PathBuf]) -> Option<PathBuf> {
        self.files.contains_key(package_name).then(|| PathBuf::from(package_name))
    }

    fn read(&self, path: &Path) -> Option<sdl::SourceFile> {
        let key = path.to_string_lossy().to_string();
        self.files.get(&key).map(|contents| sdl::SourceFile::new_allocated(key.clone(), contents.clone()))
    }
}
