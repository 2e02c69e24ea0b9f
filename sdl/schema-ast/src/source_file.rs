use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
enum Contents {
    Static(&'static str),
    Owned(Arc<str>),
}

/// A cheaply-clonable handle to the text of one source file.
///
/// Mirrors the teacher's `psl::parser_database::SourceFile`: callers can
/// hand in either a `'static` string embedded in a test, or an owned
/// allocation read from disk.
#[derive(Clone)]
pub struct SourceFile {
    name: Arc<str>,
    contents: Contents,
}

impl SourceFile {
    pub fn new_static(name: impl Into<Arc<str>>, contents: &'static str) -> Self {
        SourceFile {
            name: name.into(),
            contents: Contents::Static(contents),
        }
    }

    pub fn new_allocated(name: impl Into<Arc<str>>, contents: Arc<str>) -> Self {
        SourceFile {
            name: name.into(),
            contents: Contents::Owned(contents),
        }
    }

    pub fn as_str(&self) -> &str {
        match &self.contents {
            Contents::Static(s) => s,
            Contents::Owned(s) => s,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceFile").field("name", &self.name).finish()
    }
}

impl AsRef<str> for SourceFile {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
