//! The static half of the Name Resolver (spec §4.2, `bind_static`).
//!
//! `bind_static` only ever consults syntactic containment and `use`
//! imports — nothing that the Semantic Compiler derives later (effective
//! members, final implementors). The dynamic half (`bind`) needs those
//! and therefore lives one layer up, in `sdl-core`, built on top of the
//! primitives here.

use crate::ids::{GlobalId, SchemaIdx};
use crate::ParserDatabase;
use schema_ast::{DefinitionKind, NameKind, NameRefAst};

fn kind_matches(kind: DefinitionKind, filter: Option<NameKind>) -> bool {
    match filter {
        None => true,
        Some(NameKind::Schema) => kind == DefinitionKind::Schema,
        Some(NameKind::FieldSet) => kind == DefinitionKind::FieldSet,
        Some(NameKind::Field) => kind == DefinitionKind::Field,
        Some(NameKind::Index) => kind == DefinitionKind::Index,
        // A "Property" kind filter doesn't match any Definition variant;
        // properties are not part of the definition arena (spec §3: they
        // are a distinct category). Resolving a property by dotted name is
        // not supported by this resolver.
        Some(NameKind::Property) => false,
    }
}

fn named_child(db: &ParserDatabase, container: GlobalId, name: &str, filter: Option<NameKind>) -> Option<GlobalId> {
    db.static_children(container)
        .find(|child| db.def(*child).name == name && kind_matches(db.def(*child).kind, filter))
}

/// If `segments` begins with the dotted components of `package_name`,
/// return how many leading segments that consumed.
fn strip_package_prefix(segments: &[String], package_name: &str) -> Option<usize> {
    let parts: Vec<&str> = package_name.split('.').collect();
    if segments.len() < parts.len() {
        return None;
    }
    if segments.iter().take(parts.len()).map(String::as_str).eq(parts) {
        Some(parts.len())
    } else {
        None
    }
}

/// Resolve the first segment (or, for a full package-name prefix match, the
/// first several segments) of a name by searching the imports of
/// `origin_schema`: by alias, then by the imported schema's full package
/// name. Finally, tolerate the origin schema's own package name as a
/// prefix (with a caller-surfaced warning, since referring to your own
/// package by name is redundant but not ambiguous).
fn bind_via_imports(db: &ParserDatabase, origin_schema: SchemaIdx, segments: &[String]) -> Option<(GlobalId, usize, bool)> {
    let schema = db.schema(origin_schema);
    for (u, target) in schema.ast.uses.iter().zip(schema.use_targets.iter()) {
        let Some(target_idx) = target else { continue };
        if let Some(alias) = &u.alias {
            if segments.first().map(String::as_str) == Some(alias.as_str()) {
                return Some((db.schema_root(*target_idx), 1, false));
            }
        }
        let target_package = &db.schema(*target_idx).package_name;
        if let Some(consumed) = strip_package_prefix(segments, target_package) {
            return Some((db.schema_root(*target_idx), consumed, false));
        }
    }

    // Tolerate the origin schema's own package name as a self-prefix.
    if let Some(consumed) = strip_package_prefix(segments, &schema.package_name) {
        return Some((db.schema_root(origin_schema), consumed, true));
    }

    None
}

/// `bind_static(origin, name)` from spec §4.2.
///
/// Returns the path of intermediate nodes terminating at the target, plus
/// whether a "tolerated own-package-prefix" warning should be raised by
/// the caller (the resolver itself does not own diagnostics).
pub fn bind_static(db: &ParserDatabase, origin: GlobalId, name: &NameRefAst) -> Option<BindStaticResult> {
    if name.segments.is_empty() {
        return None;
    }

    let mut warn_self_prefix = false;
    let mut path = Vec::new();
    let mut remaining: &[String] = &name.segments;

    let mut cursor = if name.absolute {
        let root = db.schema_root(origin.schema);
        let single_filter = if name.segments.len() == 1 { name.kind_filter } else { None };
        let target = named_child(db, root, &name.segments[0], single_filter)?;
        remaining = &name.segments[1..];
        path.push(target);
        target
    } else {
        // search containment upwards from origin
        let mut found = None;
        let mut current = Some(origin);
        while let Some(c) = current {
            let single_filter = if name.segments.len() == 1 { name.kind_filter } else { None };
            if let Some(target) = named_child(db, c, &name.segments[0], single_filter) {
                found = Some(target);
                break;
            }
            current = db.parent(c);
        }

        match found {
            Some(target) => {
                remaining = &name.segments[1..];
                path.push(target);
                target
            }
            None => {
                let (target, consumed, warn) = bind_via_imports(db, origin.schema, &name.segments)?;
                warn_self_prefix = warn;
                remaining = &name.segments[consumed..];
                path.push(target);
                target
            }
        }
    };

    for (i, seg) in remaining.iter().enumerate() {
        let is_last = i == remaining.len() - 1;
        let filter = if is_last { name.kind_filter } else { None };
        let next = named_child(db, cursor, seg, filter)?;
        path.push(next);
        cursor = next;
    }

    if !kind_matches(db.def(cursor).kind, name.kind_filter) {
        return None;
    }

    Some(BindStaticResult {
        path,
        warn_self_prefix,
    })
}

pub struct BindStaticResult {
    /// Intermediate nodes traversed, ending with the resolved target.
    pub path: Vec<GlobalId>,
    /// `true` if resolution only succeeded by tolerating the origin
    /// schema's own package name as a redundant prefix.
    pub warn_self_prefix: bool,
}

impl BindStaticResult {
    pub fn target(&self) -> GlobalId {
        *self.path.last().expect("path always has at least one element")
    }
}

/// All containers from `origin` up to (and including) its schema root, in
/// upward order. Shared with the dynamic binder in `sdl-core`.
pub fn containers_from(db: &ParserDatabase, origin: GlobalId) -> Vec<GlobalId> {
    let mut out = vec![origin];
    let mut current = origin;
    while let Some(parent) = db.parent(current) {
        out.push(parent);
        current = parent;
    }
    out
}
