//! Phase 7 - shape and property validation (spec §4.3).

use crate::compiler::Compiler;
use crate::model::{RefAction, ReqLevel};
use crate::properties::{find_properties, literal_bool, literal_str};
use diagnostics::Code;
use parser_database::GlobalId;
use rustc_hash::FxHashMap;
use schema_ast::{DefinitionKind, ItemAst, LiteralAst, Modifier, ValueAst};

#[derive(Clone, Copy)]
enum Shape {
    Int,
    Str,
    Bool,
    NameRef,
    ReqLevelToken,
    ActionToken,
    Any,
}

const PROPERTY_SHAPES: &[(&str, usize, usize, Shape)] = &[
    ("unique", 1, 1, Shape::Bool),
    ("cluster", 1, 1, Shape::NameRef),
    ("type", 1, 1, Shape::Str),
    ("size", 1, 1, Shape::Int),
    ("precision", 1, 1, Shape::Int),
    ("notnull", 1, 1, Shape::Bool),
    ("immutable", 1, 1, Shape::Bool),
    ("default", 1, 1, Shape::Any),
    ("reqlevel", 1, 1, Shape::ReqLevelToken),
    ("ondelete", 1, 1, Shape::ActionToken),
    ("onupdate", 1, 1, Shape::ActionToken),
    ("guid", 1, 1, Shape::Str),
    ("language", 1, 1, Shape::Str),
];

pub fn run(c: &mut Compiler) {
    let all = c.all_defs();

    for &id in &all {
        check_shape_rules(c, id);
        check_property_schemas(c, id);
        check_notnull_ondelete(c, id);
        check_cluster(c, id);
    }
    check_guids(c, &all);
}

/// Realized top-level fieldsets must have a field; non-top-level realized
/// fieldsets should; top-level fields should not be `required`; realized
/// top-level fieldsets should not have non-top-level specifications.
fn check_shape_rules(c: &mut Compiler, id: GlobalId) {
    let kind = c.db.def(id).kind;
    let toplevel = c.attrs(id).toplevel;
    let realized = c.attrs(id).realized;

    if kind == DefinitionKind::FieldSet && realized {
        let has_field = c.attrs(id).effective_members.values().any(|m| c.db.def(*m).kind == DefinitionKind::Field);
        if !has_field {
            if toplevel {
                c.error(Code(7, 1, 1), id, "realized top-level fieldset has no fields");
            } else {
                c.warning(Code(7, 1, 2), id, "realized fieldset has no fields");
            }
        }
        if toplevel {
            let specs = c.attrs(id).specifications.clone();
            for s in specs {
                if s != id && !c.attrs(s).toplevel {
                    c.warning(Code(7, 1, 3), id, format!("realized top-level fieldset has non-top-level specification `{}`", c.path_of(s)));
                }
            }
        }
    }

    if kind == DefinitionKind::Field && toplevel && c.db.def(id).modifiers.contains(Modifier::Required) {
        c.warning(Code(7, 1, 4), id, "top-level field should not carry `required`");
    }
}

fn check_property_schemas(c: &mut Compiler, id: GlobalId) {
    let schema = c.db.schema(id.schema);
    for item_id in c.db.def(id).items.clone() {
        let ItemAst::Property(prop) = schema.ast.item(item_id) else { continue };
        let Some(&(_, min, max, shape)) = PROPERTY_SHAPES.iter().find(|(n, ..)| *n == prop.name) else {
            continue;
        };
        if prop.values.len() < min || prop.values.len() > max {
            c.error(Code(7, 5, 1), id, format!("`{}` expects {}..={} argument(s), found {}", prop.name, min, max, prop.values.len()));
            continue;
        }
        for v in &prop.values {
            if !matches_shape(v, shape) {
                c.error(Code(7, 5, 2), id, format!("`{}` argument has the wrong type", prop.name));
            }
        }
    }
}

fn matches_shape(v: &ValueAst, shape: Shape) -> bool {
    match shape {
        Shape::Int => matches!(v, ValueAst::Literal(LiteralAst::Int(_))),
        Shape::Str => literal_str(v).is_some(),
        Shape::Bool => literal_bool(v).is_some(),
        Shape::NameRef => matches!(v, ValueAst::NameRef(_)),
        Shape::ReqLevelToken => literal_str(v).and_then(ReqLevel::parse).is_some(),
        Shape::ActionToken => literal_str(v).and_then(RefAction::parse).is_some(),
        Shape::Any => true,
    }
}

/// `notnull true` is incompatible with `ondelete setnull` / `onupdate setnull`.
fn check_notnull_ondelete(c: &mut Compiler, id: GlobalId) {
    let notnull = find_properties(c.db, id, "notnull")
        .into_iter()
        .next()
        .and_then(|(_, p)| p.values.first())
        .and_then(literal_bool)
        .unwrap_or(false);
    if !notnull {
        return;
    }
    for prop_name in ["ondelete", "onupdate"] {
        if let Some((_, p)) = find_properties(c.db, id, prop_name).into_iter().next() {
            if p.values.first().and_then(literal_str).and_then(RefAction::parse) == Some(RefAction::SetNull) {
                c.error(Code(7, 6, 1), id, format!("`notnull true` is incompatible with `{prop_name} setnull`"));
            }
        }
    }
}

/// `cluster` points to an index at the same level.
fn check_cluster(c: &mut Compiler, id: GlobalId) {
    let Some((item_index, prop)) = find_properties(c.db, id, "cluster").into_iter().next() else {
        return;
    };
    let Some(target) = c.resolved_ref_value(id, item_index, 0) else {
        return;
    };
    if c.db.def(target).kind != DefinitionKind::Index {
        c.error(Code(7, 7, 1), id, "`cluster` must reference an index");
        return;
    }
    if c.db.parent(target) != c.db.parent(id) {
        c.error(Code(7, 7, 2), id, "`cluster` index must be at the same level");
    }
    let _ = prop;
}

/// GUID required on all schemas and all self-realized top-level
/// fieldsets; GUIDs are globally unique.
fn check_guids(c: &mut Compiler, all: &[GlobalId]) {
    let mut seen: FxHashMap<String, GlobalId> = FxHashMap::default();
    for &id in all {
        let kind = c.db.def(id).kind;
        let needs_guid = kind == DefinitionKind::Schema
            || (kind == DefinitionKind::FieldSet && c.attrs(id).toplevel && c.attrs(id).realized && c.attrs(id).final_implementor() == id);
        if !needs_guid {
            continue;
        }
        match find_properties(c.db, id, "guid").into_iter().next() {
            None => {
                c.error(Code(7, 8, 1), id, "missing required `guid` property");
            }
            Some((_, p)) => {
                if let Some(guid) = p.values.first().and_then(literal_str) {
                    if let Some(prev) = seen.insert(guid.to_string(), id) {
                        c.error(Code(7, 8, 2), id, format!("duplicate GUID `{guid}` (also used by `{}`)", c.path_of(prev)));
                    }
                }
            }
        }
    }
}
