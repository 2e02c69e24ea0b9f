//! Phase 3 - inheritance graph (spec §4.3).

use crate::compiler::Compiler;
use crate::phase1::Phase1Output;
use crate::properties::find_properties;
use diagnostics::Code;
use indexmap::IndexMap;
use parser_database::{bind_static, GlobalId};
use rustc_hash::{FxHashMap, FxHashSet};
use schema_ast::{DefinitionKind, ItemAst, NameKind, ValueAst};

fn kind_filter_for(kind: DefinitionKind) -> Option<NameKind> {
    match kind {
        DefinitionKind::Schema => Some(NameKind::Schema),
        DefinitionKind::FieldSet => Some(NameKind::FieldSet),
        DefinitionKind::Field => Some(NameKind::Field),
        DefinitionKind::Index => Some(NameKind::Index),
        DefinitionKind::Constraint => None,
    }
}

pub fn run(c: &mut Compiler, phase1: &Phase1Output) {
    let all = c.all_defs();
    let mut raw_ancestors: FxHashMap<GlobalId, Vec<GlobalId>> = FxHashMap::default();

    // (a), (c) bind each `ancestors` element, substituting final
    // implementors for indirected elements; reject an implementor that
    // itself uses indirection in its ancestors.
    for &id in &all {
        let Some((item_index, prop)) = find_properties(c.db, id, "ancestors").into_iter().next() else {
            continue;
        };
        let own_kind = c.db.def(id).kind;
        let own_kind_filter = kind_filter_for(own_kind);
        let mut resolved = Vec::new();
        let mut has_indirection = false;
        for (value_index, v) in prop.values.iter().enumerate() {
            let ValueAst::NameRef(name_ref) = v else {
                c.error(Code(3, 1, 1), id, "`ancestors` arguments must be dotted names, not literals");
                continue;
            };
            let mut filtered = name_ref.clone();
            filtered.kind_filter = filtered.kind_filter.or(own_kind_filter);
            let Some(bound) = bind_static(c.db, id, &filtered) else {
                c.error(Code(3, 1, 2), id, format!("cannot resolve ancestor `{}`", name_ref.text()));
                continue;
            };
            if bound.warn_self_prefix {
                c.warning(Code(3, 1, 5), id, format!("ancestor `{}` only resolved by tolerating the declaring schema's own package name as a prefix", name_ref.text()));
            }
            let mut target = bound.target();
            if c.db.def(target).kind != own_kind {
                c.error(Code(3, 1, 3), id, format!("ancestor `{}` is not a {}", name_ref.text(), own_kind.as_str()));
                continue;
            }
            if target == id || c.db.statically_contains(target, id) || c.db.statically_contains(id, target) {
                c.error(Code(3, 1, 4), id, format!("ancestor `{}` is self or statically contains/contained by the declarer", name_ref.text()));
                continue;
            }
            if name_ref.indirection {
                has_indirection = true;
                target = c.attrs(target).final_implementor();
            }
            c.resolved.insert((id, item_index, value_index), target);
            resolved.push(target);
        }
        if has_indirection && phase1.implements_candidates.values().any(|v| v.contains(&id)) {
            c.error(Code(3, 3, 1), id, "a declaration using `=` indirection in `ancestors` may not itself `implements`");
        }
        raw_ancestors.insert(id, resolved);
    }

    // (b) no cycles in the ancestor relation.
    detect_cycles(c, &raw_ancestors);

    // (d) declared-order ancestor list (already built above) plus
    // descendants.
    for (&id, ancestors) in &raw_ancestors {
        c.attrs_mut(id).ancestors = ancestors.clone();
    }
    for (&id, ancestors) in &raw_ancestors {
        for &a in ancestors {
            c.attrs_mut(a).descendants.insert(id);
        }
    }

    // (e) connected components of the (undirected) inheritance graph; no
    // two members may statically contain each other.
    check_inheritance_classes(c, &raw_ancestors, &all);

    // (f) materialize effective members, (g) warn on unused deletions.
    let mut cache: FxHashMap<GlobalId, IndexMap<String, GlobalId>> = FxHashMap::default();
    for &id in &all {
        compute_effective_members(c, id, &mut cache, &mut FxHashSet::default());
    }
    for (id, members) in cache {
        c.attrs_mut(id).effective_members = members;
    }
}

fn detect_cycles(c: &mut Compiler, ancestors: &FxHashMap<GlobalId, Vec<GlobalId>>) {
    let mut reported = FxHashSet::default();
    for &start in ancestors.keys() {
        let mut stack_set = FxHashSet::default();
        let mut path = Vec::new();
        if has_cycle(start, ancestors, &mut stack_set, &mut path) {
            for node in path {
                if reported.insert(node) {
                    c.error(Code(3, 2, 1), node, "cycle detected in the `ancestors` relation");
                }
            }
        }
    }
}

fn has_cycle(node: GlobalId, ancestors: &FxHashMap<GlobalId, Vec<GlobalId>>, stack_set: &mut FxHashSet<GlobalId>, path: &mut Vec<GlobalId>) -> bool {
    if stack_set.contains(&node) {
        return true;
    }
    stack_set.insert(node);
    path.push(node);
    if let Some(next) = ancestors.get(&node) {
        for &n in next {
            if has_cycle(n, ancestors, stack_set, path) {
                return true;
            }
        }
    }
    path.pop();
    stack_set.remove(&node);
    false
}

fn check_inheritance_classes(c: &mut Compiler, ancestors: &FxHashMap<GlobalId, Vec<GlobalId>>, all: &[GlobalId]) {
    let mut component: FxHashMap<GlobalId, usize> = FxHashMap::default();
    let mut classes: Vec<Vec<GlobalId>> = Vec::new();
    for &id in all {
        if component.contains_key(&id) {
            continue;
        }
        let mut members = Vec::new();
        let mut stack = vec![id];
        let class_idx = classes.len();
        while let Some(n) = stack.pop() {
            if component.insert(n, class_idx).is_some() {
                continue;
            }
            members.push(n);
            if let Some(next) = ancestors.get(&n) {
                stack.extend(next.iter().copied());
            }
            for (&other, list) in ancestors.iter() {
                if list.contains(&n) && !component.contains_key(&other) {
                    stack.push(other);
                }
            }
        }
        classes.push(members);
    }

    for members in &classes {
        for (i, &a) in members.iter().enumerate() {
            for &b in members.iter().skip(i + 1) {
                if c.db.statically_contains(a, b) || c.db.statically_contains(b, a) {
                    c.error(Code(3, 5, 1), a, format!("`{}` and `{}` are in the same inheritance class but statically contain each other", c.path_of(a), c.path_of(b)));
                }
            }
        }
    }
}

fn compute_effective_members(
    c: &mut Compiler,
    id: GlobalId,
    cache: &mut FxHashMap<GlobalId, IndexMap<String, GlobalId>>,
    in_progress: &mut FxHashSet<GlobalId>,
) -> IndexMap<String, GlobalId> {
    if let Some(m) = cache.get(&id) {
        return m.clone();
    }
    if !in_progress.insert(id) {
        // Cycle already reported by `detect_cycles`; return an empty set
        // rather than recursing forever.
        return IndexMap::new();
    }

    let mut members = IndexMap::new();
    for &ancestor in &c.attrs(id).ancestors.clone() {
        let inherited = compute_effective_members(c, ancestor, cache, in_progress);
        for (name, def) in inherited {
            members.insert(name, def);
        }
    }

    let schema = c.db.schema(id.schema);
    let mut deletions_used: FxHashSet<String> = FxHashSet::default();
    for item_id in c.db.def(id).items.clone() {
        match schema.ast.item(item_id) {
            ItemAst::Definition(child) => {
                let child_id = GlobalId::new(id.schema, *child);
                members.insert(c.db.def(child_id).name.clone(), child_id);
            }
            ItemAst::Deletion(del) => {
                if members.shift_remove(&del.name).is_some() {
                    deletions_used.insert(del.name.clone());
                } else {
                    c.warning(Code(3, 7, 1), id, format!("deletion of `{}` removed nothing", del.name));
                }
            }
            ItemAst::Rename(_) | ItemAst::Property(_) => {}
        }
    }

    in_progress.remove(&id);
    cache.insert(id, members.clone());
    members
}
