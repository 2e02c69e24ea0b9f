//! Derived attributes of the Definition model (spec §3, "Definition").
//!
//! AST nodes themselves never change shape after parsing; everything a
//! compiler phase learns about a definition lives here, keyed by its
//! [`GlobalId`], and is populated monotonically as phases 1-8 run.

use indexmap::IndexMap;
use parser_database::GlobalId;
use rustc_hash::FxHashSet;

#[derive(Debug, Clone, Default)]
pub struct DefAttrs {
    /// The declaration (if any) whose `implements` names this one.
    pub direct_implementor: Option<GlobalId>,
    /// Transitive terminus of the direct-implementor chain. Self when
    /// nothing implements this declaration. `None` only before phase 2
    /// runs.
    pub final_implementor: Option<GlobalId>,
    /// Reflexive-transitive set of declarations sharing this final
    /// implementor (phase 2e).
    pub specifications: Vec<GlobalId>,
    /// Declared-order ancestor list, with implementation-indirected
    /// elements substituted by their final implementor (phase 3d).
    pub ancestors: Vec<GlobalId>,
    /// Everything that (directly or transitively) lists this declaration
    /// as an ancestor (phase 3d).
    pub descendants: FxHashSet<GlobalId>,
    /// Name-keyed, order-preserving merge of inherited and local members
    /// (phase 3f).
    pub effective_members: IndexMap<String, GlobalId>,
    pub realized: bool,
    /// Whether this declaration sits directly inside a schema.
    pub toplevel: bool,

    /// (Fields only.) Resolved target of the field's effective
    /// `references` property, `None` when the field carries no reference
    /// at all or an explicit universal (`none`) reference.
    pub references_target: Option<GlobalId>,
    /// (Fields only.) Whether the effective `references` is the explicit
    /// `none` marker (a runtime-tagged universal reference) rather than
    /// simply absent.
    pub is_universal_reference: bool,
    /// (Fields only.) Whether the effective `references` was declared with
    /// zero arguments - a "remove reference" operation distinct from never
    /// declaring `references` at all (spec §9 open question (a)). Checked
    /// against realization in phase 6, once realization is known.
    pub has_empty_references: bool,
    /// (Indexes only.) Resolved `fields` members, declared order.
    pub index_fields: Vec<GlobalId>,
    /// (Constraints only.) Fields named by dotted-name arguments embedded
    /// in `check`.
    pub check_field_refs: Vec<GlobalId>,
}

impl DefAttrs {
    pub fn final_implementor(&self) -> GlobalId {
        self.final_implementor.expect("final_implementor is set before phase 2 returns")
    }

    pub fn is_self_implementor(&self) -> bool {
        self.direct_implementor.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReqLevel {
    Required,
    Desired,
    Optional,
}

impl ReqLevel {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "required" => Some(ReqLevel::Required),
            "desired" => Some(ReqLevel::Desired),
            "optional" => Some(ReqLevel::Optional),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefAction {
    Cascade,
    SetNull,
    NoAction,
}

impl RefAction {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cascade" => Some(RefAction::Cascade),
            "setnull" => Some(RefAction::SetNull),
            "noaction" => Some(RefAction::NoAction),
            _ => None,
        }
    }
}

/// The compiled, validated view of a whole parse result: everything
/// `compile()` hands back once phases 1-8 all pass without aborting.
pub struct ValidatedSchema<'db> {
    pub db: &'db parser_database::ParserDatabase,
    pub(crate) attrs: rustc_hash::FxHashMap<GlobalId, DefAttrs>,
    pub(crate) resolved: rustc_hash::FxHashMap<crate::compiler::RefKey, GlobalId>,
    pub diagnostics: diagnostics::Diagnostics,
}

impl<'db> ValidatedSchema<'db> {
    pub fn attrs(&self, id: GlobalId) -> &DefAttrs {
        &self.attrs[&id]
    }

    /// The target a specific `ValueAst::NameRef` resolved to, looked up by
    /// its owning definition, item position and value position.
    pub fn resolved_ref(&self, owner: GlobalId, item_index: usize, value_index: usize) -> Option<GlobalId> {
        self.resolved.get(&(owner, item_index, value_index)).copied()
    }

    pub fn is_realized(&self, id: GlobalId) -> bool {
        self.attrs(id).realized
    }
}
