//! Physical Naming (spec §4.4): a deterministic, length-bounded mapping
//! from a logical path to an identifier safe for the target vendor.

use base64::alphabet::Alphabet;
use base64::engine::{GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use sha2::{Digest, Sha256};

/// `_` and `$` stand in for the usual `-`/`+` and `_`/`/` base64 digits,
/// matching the mangling scheme the instance engine was ported from.
fn mangling_alphabet() -> Alphabet {
    Alphabet::new("ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_$").expect("64 distinct symbols")
}

fn mangling_engine() -> GeneralPurpose {
    GeneralPurpose::new(&mangling_alphabet(), GeneralPurposeConfig::new().with_encode_padding(false))
}

/// Parameters describing one target vendor's identifier rules.
#[derive(Debug, Clone, Copy)]
pub struct NamingScheme {
    pub separator: char,
    pub max_identifier_length: usize,
}

impl Default for NamingScheme {
    fn default() -> Self {
        NamingScheme {
            separator: '.',
            max_identifier_length: 63,
        }
    }
}

impl NamingScheme {
    /// Mangle an already-joined logical path into a physical identifier
    /// (spec §4.4, steps 2-3).
    pub fn mangle_joined(&self, joined: &str) -> String {
        if joined.chars().count() <= self.max_identifier_length {
            return joined.to_string();
        }

        let keep = self.max_identifier_length.saturating_sub(8);
        let truncated: String = joined.chars().take(keep).collect();

        let digest = Sha256::digest(joined.as_bytes());
        let encoded = mangling_engine().encode(digest);
        let suffix: String = encoded.chars().take(6).collect();

        format!("{truncated}__{suffix}")
    }

    /// Join `parts` with the vendor separator, then mangle (spec §4.4,
    /// step 1).
    pub fn mangle(&self, parts: &[&str]) -> String {
        let joined = parts.join(&self.separator.to_string());
        self.mangle_joined(&joined)
    }

    pub fn schema_name(&self, package_parts: &[&str]) -> String {
        self.mangle(package_parts)
    }

    pub fn table_name(&self, schema: &str, table_local: &str) -> String {
        self.mangle(&[schema, table_local])
    }

    pub fn field_name(&self, table: &str, field_path: &[&str]) -> String {
        let mut parts = vec![table];
        parts.extend_from_slice(field_path);
        self.mangle(&parts)
    }

    /// `pk$<tablename>` (spec §4.4).
    pub fn primary_key_name(&self, table: &str) -> String {
        self.mangle_joined(&format!("pk${table}"))
    }

    /// `<table>$<index>$<field refpath...>` (spec §4.4).
    pub fn index_name(&self, table: &str, index_local: &str, field_refpaths: &[&str]) -> String {
        let mut joined = format!("{table}${index_local}");
        for f in field_refpaths {
            joined.push('$');
            joined.push_str(f);
        }
        self.mangle_joined(&joined)
    }

    /// `<table>$<constraint>` (spec §4.4).
    pub fn constraint_name(&self, table: &str, constraint_local: &str) -> String {
        self.mangle_joined(&format!("{table}${constraint_local}"))
    }

    /// `fk$<table>$<field path...>` (spec §4.4).
    pub fn foreign_key_name(&self, table: &str, field_path: &[&str]) -> String {
        let mut joined = format!("fk${table}");
        for f in field_path {
            joined.push('$');
            joined.push_str(f);
        }
        self.mangle_joined(&joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_names_pass_through() {
        let scheme = NamingScheme::default();
        assert_eq!(scheme.table_name("a", "t"), "a.t");
    }

    #[test]
    fn long_names_are_truncated_and_hashed() {
        let scheme = NamingScheme {
            separator: '.',
            max_identifier_length: 16,
        };
        let long_name = scheme.table_name("a_very_long_schema_name", "a_very_long_table_name");
        assert!(long_name.chars().count() <= 16);
        assert!(long_name.contains("__"));
    }

    #[test]
    fn mangling_is_deterministic() {
        let scheme = NamingScheme {
            separator: '.',
            max_identifier_length: 10,
        };
        let a = scheme.mangle(&["schema", "table", "field"]);
        let b = scheme.mangle(&["schema", "table", "field"]);
        assert_eq!(a, b);
    }

    #[test]
    fn specialized_constructors_follow_the_documented_shapes() {
        let scheme = NamingScheme::default();
        assert_eq!(scheme.primary_key_name("t"), "pk$t");
        assert_eq!(scheme.foreign_key_name("t", &["f"]), "fk$t$f");
        assert_eq!(scheme.index_name("t", "idx", &["f"]), "t$idx$f");
        assert_eq!(scheme.constraint_name("t", "c"), "t$c");
    }
}
