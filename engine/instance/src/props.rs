//! Effective reserved-property reads for DDL generation (spec §4.5).
//!
//! `sdl_core::effective_property` needs a live `Compiler`, which no longer
//! exists once `sdl::compile` has returned a `ValidatedSchema` (mirrors
//! `cli::types::effective_property`). These walk `ValidatedSchema::attrs`
//! directly, stopping at the first ancestor that declares the property.

use sdl::{GlobalId, RefAction, ValidatedSchema};

fn effective_property<'db>(validated: &ValidatedSchema<'db>, id: GlobalId, name: &str) -> Option<&'db sdl::PropertyAst> {
    if let Some((_, prop)) = sdl::find_properties(validated.db, id, name).into_iter().next() {
        return Some(prop);
    }
    validated.attrs(id).ancestors.iter().find_map(|&ancestor| effective_property(validated, ancestor, name))
}

/// The effective `notnull` property of `field_id`, defaulting to `false`
/// when absent (mirrors `sdl_core::phase7::check_notnull_ondelete`).
pub fn effective_notnull(validated: &ValidatedSchema<'_>, field_id: GlobalId) -> bool {
    effective_property(validated, field_id, "notnull")
        .and_then(|p| p.values.first())
        .and_then(sdl::literal_bool)
        .unwrap_or(false)
}

/// The effective `ondelete`/`onupdate` property of `field_id`, defaulting
/// to `RefAction::NoAction` when absent or unparseable.
pub fn effective_ref_action(validated: &ValidatedSchema<'_>, field_id: GlobalId, prop_name: &str) -> RefAction {
    effective_property(validated, field_id, prop_name)
        .and_then(|p| p.values.first())
        .and_then(sdl::literal_str)
        .and_then(RefAction::parse)
        .unwrap_or(RefAction::NoAction)
}
