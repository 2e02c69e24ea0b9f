//! The Parse Aggregator (spec §4.1): loads a set of top-level schema files
//! plus their transitive imports, resolving each `use` against a search
//! path, detecting duplicates, and publishing the flat, back-referenced
//! set of loaded schemas.

use crate::ids::SchemaIdx;
use crate::loader::SourceLoader;
use crate::ParserDatabase;
use diagnostics::{Code, Diagnostics, SourcePosition};
use rustc_hash::FxHashMap;
use schema_ast::{SchemaAst, SourceFile};
use std::collections::VecDeque;
use std::path::PathBuf;

/// One schema loaded and parsed during aggregation.
#[derive(Debug)]
pub struct LoadedSchema {
    pub source: SourceFile,
    pub ast: SchemaAst,
    pub package_name: String,
    /// Was this one of the caller-supplied top-level sources (as opposed
    /// to a schema pulled in transitively through a `use`)?
    pub top_level: bool,
    /// Parallel to `ast.uses`: the schema each import resolved to, or
    /// `None` if resolution failed (in which case aggregation as a whole
    /// fails with a location diagnostic).
    pub use_targets: Vec<Option<SchemaIdx>>,
}

const BUILTIN_SCHEMAS: &[(&str, &str)] = &[("<builtin>/core.sdl", "schema core {\n}\n")];

struct QueueItem {
    path: PathBuf,
    top_level: bool,
    preloaded: Option<SourceFile>,
}

/// Run the Parse Aggregator over `top_level_paths`, searching `search_path`
/// (plus, for each file, that file's own directory) for imports.
pub fn aggregate(
    top_level_paths: &[PathBuf],
    search_path: &[PathBuf],
    loader: &dyn SourceLoader,
) -> Result<ParserDatabase, Diagnostics> {
    let mut diags = Diagnostics::new();
    let mut schemas: Vec<LoadedSchema> = Vec::new();
    let mut raw_targets: Vec<Vec<Option<PathBuf>>> = Vec::new();
    let mut loaded_by_path: FxHashMap<PathBuf, SchemaIdx> = FxHashMap::default();
    let mut queue: VecDeque<QueueItem> = VecDeque::new();

    for (key, src) in BUILTIN_SCHEMAS {
        queue.push_back(QueueItem {
            path: PathBuf::from(key),
            top_level: false,
            preloaded: Some(SourceFile::new_static(*key, src)),
        });
    }
    for p in top_level_paths {
        queue.push_back(QueueItem {
            path: p.clone(),
            top_level: true,
            preloaded: None,
        });
    }

    while let Some(item) = queue.pop_front() {
        if loaded_by_path.contains_key(&item.path) {
            continue;
        }

        let source = match item.preloaded {
            Some(s) => s,
            None => match loader.read(&item.path) {
                Some(s) => s,
                None => {
                    diags.push_error(
                        Code(0, 1, 1),
                        item.path.display().to_string(),
                        SourcePosition::default(),
                        "",
                        "schema file could not be located",
                    );
                    return Err(diags);
                }
            },
        };

        let ast = match schema_ast::parse(&source) {
            Ok(ast) => ast,
            Err(mut parse_diags) => {
                diags.append(&mut parse_diags);
                return Err(diags);
            }
        };

        let package_name = ast.root().name.clone();
        let idx = SchemaIdx(schemas.len() as u32);

        let mut augmented_search: Vec<PathBuf> = Vec::with_capacity(search_path.len() + 1);
        if let Some(parent) = item.path.parent() {
            if !parent.as_os_str().is_empty() {
                augmented_search.push(parent.to_path_buf());
            }
        }
        augmented_search.extend_from_slice(search_path);

        let mut targets_for_this_schema = Vec::with_capacity(ast.uses.len());
        for u in &ast.uses {
            match loader.locate(&u.path, &augmented_search) {
                Some(target_path) => {
                    if !loaded_by_path.contains_key(&target_path) {
                        queue.push_back(QueueItem {
                            path: target_path.clone(),
                            top_level: false,
                            preloaded: None,
                        });
                    }
                    targets_for_this_schema.push(Some(target_path));
                }
                None => {
                    diags.push_error(
                        Code(0, 1, 2),
                        source.name(),
                        u.span.start,
                        "",
                        format!("cannot locate schema `{}`", u.path),
                    );
                    targets_for_this_schema.push(None);
                }
            }
        }

        loaded_by_path.insert(item.path.clone(), idx);
        raw_targets.push(targets_for_this_schema);
        schemas.push(LoadedSchema {
            source,
            ast,
            package_name,
            top_level: item.top_level,
            use_targets: Vec::new(),
        });
    }

    if diags.has_errors() {
        return Err(diags);
    }

    for (schema, targets) in schemas.iter_mut().zip(raw_targets.into_iter()) {
        schema.use_targets = targets
            .into_iter()
            .map(|p| p.and_then(|p| loaded_by_path.get(&p).copied()))
            .collect();
    }

    for schema in &schemas {
        for (u, target_idx) in schema.ast.uses.iter().zip(schema.use_targets.iter()) {
            if let Some(idx) = target_idx {
                let target = &schemas[idx.index()];
                if target.package_name != u.path {
                    diags.push_error(
                        Code(0, 2, 1),
                        schema.source.name(),
                        u.span.start,
                        &u.path,
                        format!(
                            "`use {}` resolved to a schema declared as `{}`",
                            u.path, target.package_name
                        ),
                    );
                }
            }
        }
    }

    let mut first_occurrence: FxHashMap<String, usize> = FxHashMap::default();
    for (i, schema) in schemas.iter().enumerate() {
        if let Some(&first) = first_occurrence.get(&schema.package_name) {
            diags.push_error(
                Code(0, 3, 1),
                schema.source.name(),
                SourcePosition::default(),
                &schema.package_name,
                format!(
                    "duplicate package name `{}` (first declared in \"{}\")",
                    schema.package_name,
                    schemas[first].source.name()
                ),
            );
        } else {
            first_occurrence.insert(schema.package_name.clone(), i);
        }
    }

    if diags.has_errors() {
        return Err(diags);
    }

    let package_index = first_occurrence
        .into_iter()
        .map(|(name, i)| (name, SchemaIdx(i as u32)))
        .collect();

    Ok(ParserDatabase::new(schemas, package_index))
}
