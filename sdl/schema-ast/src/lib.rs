//! The AST Model and the narrow concrete-syntax-parser collaborator
//! (spec §2 "AST Model", §4.1 mentions files, §6 "Schema language").
//!
//! This crate owns exactly one source file's parse tree. Combining many
//! files into one compilation (imports, duplicate detection, back-refs) is
//! the Parse Aggregator, implemented one layer up in `parser-database`.

pub mod ast;
mod parser;
mod source_file;

pub use ast::{
    DefId, DefinitionAst, DefinitionKind, DeletionAst, ItemAst, ItemId, LiteralAst, Modifier, ModifierSet, NameKind,
    NameRefAst, PropertyAst, RenameAst, SchemaAst, Span, UseAst, ValueAst,
};
pub use parser::parse;
pub use source_file::SourceFile;
