//! Compiler diagnostics: errors, warnings and notices accumulated by the
//! semantic compiler, rendered in a GNU-style one-line format.
//!
//! `"FILE":LINE:COL:{E|W|N}CODE:PATH:MESSAGE`

mod position;

pub use position::SourcePosition;

use std::fmt;

/// Severity of a single diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
    Notice,
}

impl Severity {
    fn letter(self) -> char {
        match self {
            Severity::Error => 'E',
            Severity::Warning => 'W',
            Severity::Notice => 'N',
        }
    }
}

/// A stable 5-digit diagnostic code of the form `PPSS` + a checksum-free
/// discriminator digit: two digits for the compiler phase, two for the
/// step within that phase, one for the diagnostic's ordinal within the
/// step (spec §6, "Diagnostics format").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code(pub u8, pub u8, pub u8);

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}{:02}{:01}", self.0, self.1, self.2)
    }
}

/// A single compiler message.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: Code,
    pub file: String,
    pub position: SourcePosition,
    /// Dotted definition path the message pertains to, e.g. `a.t.f`.
    pub path: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\"{}\":{}:{}:{}{}:{}:{}",
            self.file,
            self.position.line,
            self.position.column,
            self.severity.letter(),
            self.code,
            self.path,
            self.message
        )
    }
}

/// Accumulates diagnostics for a single compiler phase or run.
///
/// Diagnostics never unwind computation; a phase consults
/// [`Diagnostics::should_abort`] after it finishes to decide whether the
/// pipeline continues (spec §7).
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    messages: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_error(&mut self, code: Code, file: impl Into<String>, position: SourcePosition, path: impl Into<String>, message: impl Into<String>) {
        self.messages.push(Diagnostic {
            severity: Severity::Error,
            code,
            file: file.into(),
            position,
            path: path.into(),
            message: message.into(),
        });
    }

    pub fn push_warning(&mut self, code: Code, file: impl Into<String>, position: SourcePosition, path: impl Into<String>, message: impl Into<String>) {
        self.messages.push(Diagnostic {
            severity: Severity::Warning,
            code,
            file: file.into(),
            position,
            path: path.into(),
            message: message.into(),
        });
    }

    pub fn push_notice(&mut self, code: Code, file: impl Into<String>, position: SourcePosition, path: impl Into<String>, message: impl Into<String>) {
        self.messages.push(Diagnostic {
            severity: Severity::Notice,
            code,
            file: file.into(),
            position,
            path: path.into(),
            message: message.into(),
        });
    }

    pub fn append(&mut self, other: &mut Diagnostics) {
        self.messages.append(&mut other.messages);
    }

    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn has_warnings(&self) -> bool {
        self.messages.iter().any(|d| d.severity == Severity::Warning)
    }

    /// Whether the compiler pipeline must stop after the phase that
    /// produced this set of diagnostics (spec §4.3: any error, or any
    /// warning in strict mode).
    pub fn should_abort(&self, strict: bool) -> bool {
        self.has_errors() || (strict && self.has_warnings())
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.messages.iter().filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.messages.iter().filter(|d| d.severity == Severity::Warning)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.messages.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, d) in self.messages.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{d}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_gnu_style() {
        let d = Diagnostic {
            severity: Severity::Error,
            code: Code(1, 2, 3),
            file: "a.sdl".into(),
            position: SourcePosition { line: 4, column: 5 },
            path: "a.t.f".into(),
            message: "boom".into(),
        };
        assert_eq!(d.to_string(), "\"a.sdl\":4:5:E01023:a.t.f:boom");
    }

    #[test]
    fn strict_mode_aborts_on_warning_only() {
        let mut diags = Diagnostics::new();
        diags.push_warning(Code(3, 7, 1), "a.sdl", SourcePosition { line: 1, column: 1 }, "a.t", "unused deletion");
        assert!(!diags.should_abort(false));
        assert!(diags.should_abort(true));
    }

    #[test]
    fn error_always_aborts() {
        let mut diags = Diagnostics::new();
        diags.push_error(Code(1, 1, 1), "a.sdl", SourcePosition { line: 1, column: 1 }, "a", "dup");
        assert!(diags.should_abort(false));
    }
}
