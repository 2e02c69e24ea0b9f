//! The narrow vendor collaborator the Semantic Compiler needs for phase 8
//! (spec §4.3, "vendor-specific checks") and that the Instance/Upgrade
//! Engines reuse for physical type mapping (spec §4.4, §4.5).

/// What a logical type demands from the fields that use it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TypeRequirements {
    pub needs_size: bool,
    pub needs_precision: bool,
}

/// A vendor's logical-to-physical type map. Implemented once per target
/// database in `engine/connector`.
pub trait VendorTypeMap {
    fn resolve(&self, logical_name: &str) -> Option<TypeRequirements>;

    /// Maximum identifier length this vendor accepts (spec §4.4).
    fn max_identifier_length(&self) -> usize {
        63
    }
}

/// A permissive type map accepting a fixed, small vocabulary. Useful for
/// tests and as a fallback when no vendor is wired up.
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericTypeMap;

impl VendorTypeMap for GenericTypeMap {
    fn resolve(&self, logical_name: &str) -> Option<TypeRequirements> {
        match logical_name {
            "integer" | "bigint" | "boolean" | "text" | "date" | "timestamp" | "blob" => Some(TypeRequirements::default()),
            "varchar" => Some(TypeRequirements { needs_size: true, needs_precision: false }),
            "numeric" | "decimal" => Some(TypeRequirements {
                needs_size: true,
                needs_precision: true,
            }),
            _ => None,
        }
    }
}
