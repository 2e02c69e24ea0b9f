//! Phase 1 - per-definition lexical validation (spec §4.3).

use crate::compiler::Compiler;
use crate::properties::{find_properties, is_reserved_property_name};
use diagnostics::Code;
use parser_database::{bind_static, GlobalId};
use rustc_hash::{FxHashMap, FxHashSet};
use schema_ast::{DefinitionKind, ItemAst, Modifier, NameKind, ValueAst};

pub const RESERVED_KEYWORDS: &[&str] = &[
    "schema", "fieldset", "field", "index", "constraint", "property", "abstract", "final", "required", "true", "false",
    "none", "all", "use", "as", "delete", "rename", "id",
];

/// `target`'s implements candidates, gathered across the whole
/// compilation, keyed by the thing being implemented.
#[derive(Default)]
pub struct Phase1Output {
    pub implements_candidates: FxHashMap<GlobalId, Vec<GlobalId>>,
}

fn kind_filter_for(kind: DefinitionKind) -> Option<NameKind> {
    match kind {
        DefinitionKind::Schema => Some(NameKind::Schema),
        DefinitionKind::FieldSet => Some(NameKind::FieldSet),
        DefinitionKind::Field => Some(NameKind::Field),
        DefinitionKind::Index => Some(NameKind::Index),
        DefinitionKind::Constraint => None,
    }
}

pub fn run(c: &mut Compiler) -> Phase1Output {
    check_uses(c);
    let mut out = Phase1Output::default();
    for id in c.all_defs() {
        check_names_in_container(c, id);
        check_modifier_exclusivity(c, id);
    }
    for id in c.all_defs() {
        if let Some(targets) = flatten_and_bind_implements(c, id) {
            for t in targets {
                out.implements_candidates.entry(t).or_default().push(id);
            }
        }
    }
    detect_implements_cycles(c, &out.implements_candidates);
    out
}

/// (a) `use` statements: no self-target, each resolved schema used at
/// most once per file.
fn check_uses(c: &mut Compiler) {
    for (idx, schema) in c.db.schemas() {
        let mut seen = FxHashSet::default();
        for (u, target) in schema.ast.uses.iter().zip(schema.use_targets.iter()) {
            let Some(target_idx) = target else { continue };
            if *target_idx == idx {
                c.diags.push_error(
                    Code(1, 1, 1),
                    schema.source.name(),
                    u.span.start,
                    &schema.package_name,
                    format!("schema `{}` cannot `use` itself", schema.package_name),
                );
            }
            if !seen.insert(*target_idx) {
                c.diags.push_error(
                    Code(1, 1, 2),
                    schema.source.name(),
                    u.span.start,
                    &schema.package_name,
                    format!("schema `{}` is used more than once", u.path),
                );
            }
        }
    }
}

/// (b), (c), (d): identifier shape, reserved-name collisions, duplicate
/// names and alias collisions within one container.
fn check_names_in_container(c: &mut Compiler, id: GlobalId) {
    let mut seen_names: FxHashMap<String, GlobalId> = FxHashMap::default();
    let schema = c.db.schema(id.schema);
    for item_id in &c.db.def(id).items {
        match schema.ast.item(*item_id) {
            ItemAst::Definition(child) => {
                let child_id = GlobalId::new(id.schema, *child);
                let name = &c.db.def(child_id).name;
                check_identifier_shape(c, child_id, name, false);
                if let Some(prev) = seen_names.insert(name.clone(), child_id) {
                    c.error(
                        Code(1, 2, 1),
                        child_id,
                        format!("duplicate name `{name}` (also declared at {})", c.path_of(prev)),
                    );
                }
            }
            ItemAst::Property(p) => {
                check_identifier_shape(c, id, &p.name, true);
            }
            ItemAst::Deletion(_) | ItemAst::Rename(_) => {}
        }
    }
}

fn check_identifier_shape(c: &mut Compiler, id: GlobalId, name: &str, is_property: bool) {
    if name.contains('.') {
        c.error(Code(1, 2, 2), id, format!("name `{name}` may not contain `.`"));
    }
    if RESERVED_KEYWORDS.contains(&name) {
        c.error(Code(1, 2, 3), id, format!("`{name}` is a reserved keyword and cannot be used as a name"));
    }
    if is_reserved_property_name(name) && !is_property {
        c.error(
            Code(1, 2, 4),
            id,
            format!("`{name}` is a reserved property name and cannot be used for a definition"),
        );
    }
}

/// (e) `abstract` and `final` are mutually exclusive.
fn check_modifier_exclusivity(c: &mut Compiler, id: GlobalId) {
    let modifiers = c.db.def(id).modifiers;
    if modifiers.contains(Modifier::Abstract) && modifiers.contains(Modifier::Final) {
        c.error(Code(1, 5, 1), id, "`abstract` and `final` are mutually exclusive");
    }
}

/// (f) flatten the `implements` argument list (expanding the `all` token
/// into this declaration's own raw `ancestors` arguments), then (g)
/// statically bind and validate each argument.
fn flatten_and_bind_implements(c: &mut Compiler, id: GlobalId) -> Option<Vec<GlobalId>> {
    let (item_index, implements) = find_properties(c.db, id, "implements").into_iter().next()?;
    let own_kind = c.db.def(id).kind;
    let own_kind_filter = kind_filter_for(own_kind);

    let raw_ancestors: Vec<ValueAst> = find_properties(c.db, id, "ancestors")
        .into_iter()
        .flat_map(|(_, p)| p.values.clone())
        .collect();

    let mut flattened: Vec<ValueAst> = Vec::new();
    for v in &implements.values {
        if matches!(v, ValueAst::Literal(schema_ast::LiteralAst::All)) {
            flattened.extend(raw_ancestors.iter().cloned());
        } else {
            flattened.push(v.clone());
        }
    }

    let mut targets = Vec::new();
    for (value_index, v) in flattened.iter().enumerate() {
        let ValueAst::NameRef(name_ref) = v else {
            c.error(Code(1, 6, 1), id, "`implements` arguments must be dotted names, not literals");
            continue;
        };
        if name_ref.indirection {
            c.error(Code(1, 6, 2), id, "`implements` arguments may not use `=` indirection");
            continue;
        }
        let mut name_ref = name_ref.clone();
        name_ref.kind_filter = name_ref.kind_filter.or(own_kind_filter);

        let Some(result) = bind_static(c.db, id, &name_ref) else {
            c.error(Code(1, 7, 1), id, format!("cannot resolve `implements` target `{}`", name_ref.text()));
            continue;
        };
        if result.warn_self_prefix {
            c.warning(Code(1, 7, 5), id, format!("`implements` target `{}` only resolved by tolerating the declaring schema's own package name as a prefix", name_ref.text()));
        }
        let target = result.target();
        if c.db.def(target).kind != own_kind {
            c.error(
                Code(1, 7, 2),
                id,
                format!("`implements` target `{}` is not a {}", name_ref.text(), own_kind.as_str()),
            );
            continue;
        }
        if target == id {
            c.error(Code(1, 7, 3), id, "a declaration cannot implement itself");
            continue;
        }
        if c.db.statically_contains(target, id) || c.db.statically_contains(id, target) {
            c.error(
                Code(1, 7, 4),
                id,
                format!("`implements` target `{}` statically contains (or is contained by) the declarer", name_ref.text()),
            );
            continue;
        }
        c.resolved.insert((id, item_index, value_index), target);
        targets.push(target);
    }
    Some(targets)
}

/// (h) no cycles in the implements relation. `candidates` maps a target to
/// everything that (candidately) implements it; walking `target ->
/// implementor -> ...` must never revisit a node.
fn detect_implements_cycles(c: &mut Compiler, candidates: &FxHashMap<GlobalId, Vec<GlobalId>>) {
    let mut reported: FxHashSet<GlobalId> = FxHashSet::default();
    for &start in candidates.keys() {
        let mut stack_set = FxHashSet::default();
        let mut path = Vec::new();
        if has_cycle_from(start, candidates, &mut stack_set, &mut path) {
            for &node in &path {
                if reported.insert(node) {
                    c.error(Code(1, 8, 1), node, "cycle detected in the `implements` relation");
                }
            }
        }
    }
}

fn has_cycle_from(
    node: GlobalId,
    candidates: &FxHashMap<GlobalId, Vec<GlobalId>>,
    stack_set: &mut FxHashSet<GlobalId>,
    path: &mut Vec<GlobalId>,
) -> bool {
    if stack_set.contains(&node) {
        return true;
    }
    stack_set.insert(node);
    path.push(node);
    if let Some(next) = candidates.get(&node) {
        for &n in next {
            if has_cycle_from(n, candidates, stack_set, path) {
                return true;
            }
        }
    }
    path.pop();
    stack_set.remove(&node);
    false
}
