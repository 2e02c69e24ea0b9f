//! Helpers for reading reserved properties off a [`DefinitionAst`] (spec
//! §3, "Property").

use parser_database::{GlobalId, ParserDatabase};
use schema_ast::{ItemAst, LiteralAst, PropertyAst, ValueAst};

pub const RESERVED_PROPERTY_NAMES: &[&str] = &[
    "ancestors",
    "implements",
    "references",
    "fields",
    "unique",
    "cluster",
    "type",
    "size",
    "precision",
    "notnull",
    "immutable",
    "default",
    "reqlevel",
    "ondelete",
    "onupdate",
    "guid",
    "language",
    "check",
];

pub fn is_reserved_property_name(name: &str) -> bool {
    RESERVED_PROPERTY_NAMES.contains(&name)
}

/// Every property named `name` directly declared on `id`, paired with its
/// position in `id`'s item list (used to key resolved name-reference
/// targets).
pub fn find_properties<'db>(db: &'db ParserDatabase, id: GlobalId, name: &str) -> Vec<(usize, &'db PropertyAst)> {
    let schema = db.schema(id.schema);
    db.def(id)
        .items
        .iter()
        .enumerate()
        .filter_map(|(i, item_id)| match schema.ast.item(*item_id) {
            ItemAst::Property(p) if p.name == name => Some((i, p)),
            _ => None,
        })
        .collect()
}

pub fn find_property<'db>(db: &'db ParserDatabase, id: GlobalId, name: &str) -> Option<(usize, &'db PropertyAst)> {
    find_properties(db, id, name).into_iter().next()
}

pub fn has_modifier(db: &ParserDatabase, id: GlobalId, m: schema_ast::Modifier) -> bool {
    db.def(id).modifiers.contains(m)
}

/// Whether `id` itself deletes the property `name` (as opposed to a
/// sub-definition of that name - deletions share one namespace per spec
/// §3, "Property").
fn deletes_property(db: &ParserDatabase, id: GlobalId, name: &str) -> bool {
    let schema = db.schema(id.schema);
    db.def(id).items.iter().any(|item_id| matches!(schema.ast.item(*item_id), ItemAst::Deletion(d) if d.name == name))
}

/// A reserved property as seen by `id`, after applying inheritance: `id`'s
/// own declaration wins; failing that, `id` inherits the nearest
/// declaring ancestor's property, unless `id` itself deletes the name.
pub enum EffectiveProperty<'db> {
    Local(GlobalId, usize, &'db PropertyAst),
    Inherited(GlobalId, usize, &'db PropertyAst),
    Deleted,
    Absent,
}

pub fn effective_property<'c, 'db>(compiler: &'c crate::compiler::Compiler<'db>, id: GlobalId, name: &str) -> EffectiveProperty<'db> {
    if let Some((item_index, prop)) = find_property(compiler.db, id, name) {
        return EffectiveProperty::Local(id, item_index, prop);
    }
    if deletes_property(compiler.db, id, name) {
        return EffectiveProperty::Deleted;
    }
    for &ancestor in &compiler.attrs(id).ancestors {
        match effective_property(compiler, ancestor, name) {
            EffectiveProperty::Local(o, i, p) | EffectiveProperty::Inherited(o, i, p) => return EffectiveProperty::Inherited(o, i, p),
            EffectiveProperty::Deleted => return EffectiveProperty::Deleted,
            EffectiveProperty::Absent => continue,
        }
    }
    EffectiveProperty::Absent
}

pub fn literal_str(v: &ValueAst) -> Option<&str> {
    match v {
        ValueAst::Literal(LiteralAst::Str(s)) => Some(s.as_str()),
        _ => None,
    }
}

pub fn literal_bool(v: &ValueAst) -> Option<bool> {
    match v {
        ValueAst::Literal(LiteralAst::Bool(b)) => Some(*b),
        _ => None,
    }
}

pub fn is_all_token(v: &ValueAst) -> bool {
    matches!(v, ValueAst::Literal(LiteralAst::All))
}

/// The dotted, readable path of a definition, built by walking parents up
/// to (and including) its schema's package name. Used only for
/// diagnostics; never for identity.
pub fn path_of(db: &ParserDatabase, id: GlobalId) -> String {
    let mut segments = vec![db.def(id).name.clone()];
    let mut current = id;
    while let Some(parent) = db.parent(current) {
        if db.parent(parent).is_none() {
            // parent is the schema root; its name is the full package name
            segments.push(db.def(parent).name.clone());
            break;
        }
        segments.push(db.def(parent).name.clone());
        current = parent;
    }
    segments.reverse();
    segments.join(".")
}
