//! Phase 4 - remaining name binding, dynamic (spec §4.3).

use crate::bind::bind;
use crate::compiler::Compiler;
use crate::properties::{effective_property, find_properties, EffectiveProperty};
use diagnostics::Code;
use parser_database::GlobalId;
use schema_ast::{DefinitionKind, ItemAst, LiteralAst, NameKind, ValueAst};

const SPECIAL_PROPERTIES: &[&str] = &["implements", "ancestors", "references", "fields", "check"];

pub fn run(c: &mut Compiler) {
    let all = c.all_defs();

    for &id in &all {
        if c.db.def(id).kind == DefinitionKind::Field {
            bind_references(c, id);
        }
    }
    for &id in &all {
        if c.db.def(id).kind == DefinitionKind::Index {
            bind_index_fields(c, id);
        }
    }
    for &id in &all {
        if c.db.def(id).kind == DefinitionKind::Constraint {
            bind_check(c, id);
        }
    }
    for &id in &all {
        bind_remaining_properties(c, id);
    }
}

/// (a) `references` has at most one argument, kind-filtered FieldSet; an
/// explicit `none` argument is the universal reference and removes any
/// inherited target; (c) the referenced fieldset's final implementor must
/// be top-level.
fn bind_references(c: &mut Compiler, field: GlobalId) {
    let prop = match effective_property(c, field, "references") {
        EffectiveProperty::Local(owner, item_index, p) | EffectiveProperty::Inherited(owner, item_index, p) => Some((owner, item_index, p.clone())),
        EffectiveProperty::Deleted | EffectiveProperty::Absent => None,
    };
    let Some((owner, item_index, prop)) = prop else {
        return;
    };
    if prop.values.len() > 1 {
        c.error(Code(4, 1, 1), field, "`references` takes at most one argument");
        return;
    }
    let Some(value) = prop.values.first() else {
        c.attrs_mut(field).has_empty_references = true;
        return;
    };
    match value {
        ValueAst::Literal(LiteralAst::None) => {
            c.attrs_mut(field).is_universal_reference = true;
        }
        ValueAst::NameRef(name_ref) => {
            let mut filtered = name_ref.clone();
            filtered.kind_filter = Some(NameKind::FieldSet);
            let Some(result) = bind(c, owner, &filtered) else {
                c.error(Code(4, 1, 2), field, format!("cannot resolve `references` target `{}`", name_ref.text()));
                return;
            };
            if result.warn_self_prefix {
                c.warning(Code(4, 1, 5), field, format!("`references` target `{}` only resolved by tolerating the declaring schema's own package name as a prefix", name_ref.text()));
            }
            let target = result.target();
            let final_target = c.attrs(target).final_implementor();
            if !c.attrs(final_target).toplevel {
                c.error(Code(4, 1, 4), field, format!("`references` target `{}`'s final implementor must be top-level", name_ref.text()));
                return;
            }
            c.resolved.insert((owner, item_index, 0), target);
            c.attrs_mut(field).references_target = Some(target);
        }
        _ => {
            c.error(Code(4, 1, 3), field, "`references` argument must be a dotted name or `none`");
        }
    }
}

/// (d) index `fields` arguments must be dotted names to fields or
/// fieldsets, textually contained in the owning fieldset, no duplicates.
fn bind_index_fields(c: &mut Compiler, index: GlobalId) {
    let Some(owning_fieldset) = c.db.parent(index) else { return };
    let Some((item_index, prop)) = find_properties(c.db, index, "fields").into_iter().next() else {
        c.error(Code(4, 4, 1), index, "index is missing a `fields` property");
        return;
    };
    let mut resolved = Vec::new();
    for (value_index, v) in prop.values.iter().enumerate() {
        let ValueAst::NameRef(name_ref) = v else {
            c.error(Code(4, 4, 2), index, "`fields` arguments must be dotted names");
            continue;
        };
        let Some(result) = bind(c, owning_fieldset, name_ref) else {
            c.error(Code(4, 4, 3), index, format!("cannot resolve index field `{}`", name_ref.text()));
            continue;
        };
        if result.warn_self_prefix {
            c.warning(Code(4, 4, 7), index, format!("index field `{}` only resolved by tolerating the declaring schema's own package name as a prefix", name_ref.text()));
        }
        let target = result.target();
        if !matches!(c.db.def(target).kind, DefinitionKind::Field | DefinitionKind::FieldSet) {
            c.error(Code(4, 4, 4), index, format!("`{}` is not a field or fieldset", name_ref.text()));
            continue;
        }
        if !c.db.statically_contains(owning_fieldset, target) {
            c.error(Code(4, 4, 5), index, format!("`{}` is not contained in the owning fieldset", name_ref.text()));
            continue;
        }
        if resolved.contains(&target) {
            c.error(Code(4, 4, 6), index, format!("duplicate index field `{}`", name_ref.text()));
            continue;
        }
        c.resolved.insert((index, item_index, value_index), target);
        resolved.push(target);
    }
    c.attrs_mut(index).index_fields = resolved;
}

/// (e) `constraint.check` must be present and non-empty; dotted-name
/// arguments within must resolve to fields contained by the owning
/// fieldset.
fn bind_check(c: &mut Compiler, constraint: GlobalId) {
    let Some(owning_fieldset) = c.db.parent(constraint) else { return };
    let Some((item_index, prop)) = find_properties(c.db, constraint, "check").into_iter().next() else {
        c.error(Code(4, 5, 1), constraint, "`constraint` is missing a `check` property");
        return;
    };
    if prop.values.is_empty() {
        c.error(Code(4, 5, 2), constraint, "`check` must be non-empty");
        return;
    }
    let mut refs = Vec::new();
    for (value_index, v) in prop.values.iter().enumerate() {
        let ValueAst::NameRef(name_ref) = v else { continue };
        let Some(result) = bind(c, owning_fieldset, name_ref) else {
            c.error(Code(4, 5, 3), constraint, format!("cannot resolve `check` field reference `{}`", name_ref.text()));
            continue;
        };
        if result.warn_self_prefix {
            c.warning(Code(4, 5, 5), constraint, format!("`check` field reference `{}` only resolved by tolerating the declaring schema's own package name as a prefix", name_ref.text()));
        }
        let target = result.target();
        if c.db.def(target).kind != DefinitionKind::Field || !c.db.statically_contains(owning_fieldset, target) {
            c.error(Code(4, 5, 4), constraint, format!("`check` reference `{}` is not a field contained by the owning fieldset", name_ref.text()));
            continue;
        }
        c.resolved.insert((constraint, item_index, value_index), target);
        refs.push(target);
    }
    c.attrs_mut(constraint).check_field_refs = refs;
}

/// (b) every remaining dotted-name occurrence (`cluster`, `default`, and
/// any future reserved property carrying a name reference).
fn bind_remaining_properties(c: &mut Compiler, id: GlobalId) {
    let schema = c.db.schema(id.schema);
    let item_ids = c.db.def(id).items.clone();
    for (item_index, item_id) in item_ids.iter().enumerate() {
        let ItemAst::Property(prop) = schema.ast.item(*item_id) else { continue };
        if SPECIAL_PROPERTIES.contains(&prop.name.as_str()) {
            continue;
        }
        for (value_index, v) in prop.values.iter().enumerate() {
            let ValueAst::NameRef(name_ref) = v else { continue };
            if c.resolved.contains_key(&(id, item_index, value_index)) {
                continue;
            }
            match bind(c, id, name_ref) {
                Some(result) => {
                    if result.warn_self_prefix {
                        c.warning(Code(4, 2, 2), id, format!("`{}` in `{}` only resolved by tolerating the declaring schema's own package name as a prefix", name_ref.text(), prop.name));
                    }
                    c.resolved.insert((id, item_index, value_index), result.target());
                }
                None => {
                    c.error(Code(4, 2, 1), id, format!("cannot resolve `{}` in `{}`", name_ref.text(), prop.name));
                }
            }
        }
    }
}
