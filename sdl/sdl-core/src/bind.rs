//! The dynamic half of the Name Resolver, `bind(origin, name)` (spec §4.2).
//!
//! Unlike `parser_database::bind_static`, each container's candidate list
//! here is its *effective member* list (inherited members merged with
//! local declarations, minus deletions) rather than raw AST children, and
//! every container stepped through mid-path is first substituted by its
//! final implementor - an inherited name should be looked up where it is
//! concretely implemented, not on the abstract declaration that merely
//! names it.

use crate::compiler::Compiler;
use parser_database::{bind_static, GlobalId};
use schema_ast::{DefinitionKind, NameKind, NameRefAst};

pub struct BindResult {
    pub path: Vec<GlobalId>,
    /// `true` if resolution only succeeded by tolerating the origin
    /// schema's own package name as a redundant prefix (spec §4.2) -
    /// callers must surface this as a warning themselves.
    pub warn_self_prefix: bool,
}

impl BindResult {
    pub fn target(&self) -> GlobalId {
        *self.path.last().expect("path always has at least one element")
    }
}

fn kind_matches(kind: DefinitionKind, filter: Option<NameKind>) -> bool {
    match filter {
        None => true,
        Some(NameKind::Schema) => kind == DefinitionKind::Schema,
        Some(NameKind::FieldSet) => kind == DefinitionKind::FieldSet,
        Some(NameKind::Field) => kind == DefinitionKind::Field,
        Some(NameKind::Index) => kind == DefinitionKind::Index,
        Some(NameKind::Property) => false,
    }
}

fn dynamic_child(c: &Compiler, container: GlobalId, name: &str, filter: Option<NameKind>) -> Option<GlobalId> {
    let target = *c.attrs(container).effective_members.get(name)?;
    kind_matches(c.db.def(target).kind, filter).then_some(target)
}

fn consumed_for_first_hop(c: &Compiler, first: GlobalId) -> usize {
    if first == c.db.schema_root(first.schema) {
        c.db.schema(first.schema).package_name.split('.').count()
    } else {
        1
    }
}

pub fn bind(c: &Compiler, origin: GlobalId, name: &NameRefAst) -> Option<BindResult> {
    if name.segments.is_empty() {
        return None;
    }

    let mut path = Vec::new();
    let mut warn_self_prefix = false;
    let remaining: &[String];
    let mut cursor;

    if name.absolute {
        let root = c.db.schema_root(origin.schema);
        let single_filter = if name.segments.len() == 1 { name.kind_filter } else { None };
        let target = dynamic_child(c, root, &name.segments[0], single_filter)?;
        remaining = &name.segments[1..];
        path.push(target);
        cursor = c.attrs(target).final_implementor();
    } else {
        let mut found = None;
        let mut current = Some(origin);
        while let Some(cont) = current {
            let single_filter = if name.segments.len() == 1 { name.kind_filter } else { None };
            if let Some(t) = dynamic_child(c, cont, &name.segments[0], single_filter) {
                found = Some(t);
                break;
            }
            current = c.db.parent(cont);
        }

        match found {
            Some(target) => {
                remaining = &name.segments[1..];
                path.push(target);
                cursor = c.attrs(target).final_implementor();
            }
            None => {
                let static_result = bind_static(c.db, origin, name)?;
                warn_self_prefix = static_result.warn_self_prefix;
                let first = static_result.path[0];
                let consumed = consumed_for_first_hop(c, first);
                remaining = &name.segments[consumed.min(name.segments.len())..];
                path.push(first);
                cursor = c.attrs(first).final_implementor();
            }
        }
    }

    for (i, seg) in remaining.iter().enumerate() {
        let is_last = i == remaining.len() - 1;
        let filter = if is_last { name.kind_filter } else { None };
        let next = dynamic_child(c, cursor, seg, filter)?;
        path.push(next);
        cursor = c.attrs(next).final_implementor();
    }

    if !kind_matches(c.db.def(*path.last().unwrap()).kind, name.kind_filter) {
        return None;
    }

    if name.indirection {
        let last = path.pop().unwrap();
        path.push(c.attrs(last).final_implementor());
    }

    Some(BindResult { path, warn_self_prefix })
}
