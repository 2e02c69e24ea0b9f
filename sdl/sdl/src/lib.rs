//! Public facade over the SDL toolchain. Downstream crates (the CLI, the
//! Instance and Upgrade Engines) depend on `sdl` rather than reaching into
//! `sdl-core`/`parser-database`/`schema-ast` directly, mirroring how the
//! teacher's `psl` crate fronts `psl-core`.

pub use diagnostics::{Code, Diagnostic, Diagnostics, Severity};
pub use schema_ast::{self, parse, DefId, DefinitionKind, ItemAst, ItemId, LiteralAst, Modifier, NameKind, PropertyAst, SchemaAst, SourceFile, ValueAst};
pub use parser_database::{self, aggregate, FsSourceLoader, GlobalId, MapSourceLoader, ParserDatabase, SchemaIdx, SourceLoader};

pub use sdl_core::{
    bind, compile, effective_property, find_properties, literal_bool, literal_str, path_of, BindResult, Compiler, DefAttrs, EffectiveProperty, GenericTypeMap, RefAction, RefKey, ReqLevel,
    TypeRequirements, ValidatedSchema, VendorTypeMap,
};
