use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use std::fmt;

/// Duplicate-detection key of one operation: 128 lowercase hex chars of a
/// SHA-512 digest. Opaque outside this module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The fields that identify an operation. Construction order is fixed;
/// both the fresh-import hash and an existing record's re-hash go through
/// [`compute`], so the two code paths cannot drift apart.
#[derive(Debug, Clone, Copy)]
pub struct FingerprintFields<'a> {
    pub op_type: &'a str,
    pub account_slug: &'a str,
    pub type_display: &'a str,
    pub details: &'a str,
    pub date: NaiveDate,
    pub amount_in_cents: i64,
}

/// Deterministic digest over the canonical byte encoding of the fields.
/// Identical inputs yield identical digests across runs and platforms.
pub fn compute(fields: &FingerprintFields<'_>) -> Fingerprint {
    Fingerprint(sha512_hex(&canonical_bytes(fields)))
}

/// Canonical encoding: each field as `<decimal byte length>:<UTF-8 bytes>`,
/// in fixed order. The length prefix means a delimiter character occurring
/// inside `details` cannot make two distinct rows encode identically.
///
/// The date contributes its ISO form, so the same transaction re-exported
/// under a different date layout still hashes to the same digest.
fn canonical_bytes(fields: &FingerprintFields<'_>) -> Vec<u8> {
    let date = fields.date.format("%Y-%m-%d").to_string();
    let amount = fields.amount_in_cents.to_string();
    let parts: [&str; 6] = [
        fields.op_type,
        fields.account_slug,
        fields.type_display,
        fields.details,
        &date,
        &amount,
    ];

    let mut out = Vec::with_capacity(parts.iter().map(|p| p.len() + 8).sum());
    for part in parts {
        out.extend_from_slice(part.len().to_string().as_bytes());
        out.push(b':');
        out.extend_from_slice(part.as_bytes());
    }
    out
}

/// SHA-512 of a byte slice as a lowercase hex string (128 chars).
fn sha512_hex(data: &[u8]) -> String {
    let mut hasher = Sha512::new();
    hasher.update(data);
    hasher.finalize().iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields<'a>(
        op_type: &'a str,
        slug: &'a str,
        type_display: &'a str,
        details: &'a str,
        ymd: (i32, u32, u32),
        cents: i64,
    ) -> FingerprintFields<'a> {
        FingerprintFields {
            op_type,
            account_slug: slug,
            type_display,
            details,
            date: NaiveDate::from_ymd_opt(ymd.0, ymd.1, ymd.2).unwrap(),
            amount_in_cents: cents,
        }
    }

    #[test]
    fn sha512_hex_known_vector() {
        // SHA-512 of empty bytes is a known constant.
        assert_eq!(
            sha512_hex(b""),
            "cf83e1357eefb8bdf1542850d66d8007d620e4050b5715dc83f4a921d36ce9ce\
             47d0d13c5d85f2b0ff8318d2877eec2f63b931bd47417a81a538327af927da3e"
        );
    }

    #[test]
    fn digest_is_deterministic() {
        let f = fields("debit", "acct1", "Groceries", "SUPERMARKET", (2024, 3, 12), 4530);
        assert_eq!(compute(&f), compute(&f));
    }

    #[test]
    fn digest_is_lowercase_hex_128() {
        let fp = compute(&fields("debit", "a", "b", "c", (2024, 1, 1), 1));
        assert_eq!(fp.as_str().len(), 128);
        assert!(fp.as_str().chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn every_field_is_significant() {
        let base = fields("debit", "acct1", "Groceries", "SUPERMARKET", (2024, 3, 12), 4530);
        let variants = [
            fields("credit", "acct1", "Groceries", "SUPERMARKET", (2024, 3, 12), 4530),
            fields("debit", "acct2", "Groceries", "SUPERMARKET", (2024, 3, 12), 4530),
            fields("debit", "acct1", "Restaurant", "SUPERMARKET", (2024, 3, 12), 4530),
            fields("debit", "acct1", "Groceries", "SUPERMARKEX", (2024, 3, 12), 4530),
            fields("debit", "acct1", "Groceries", "SUPERMARKET", (2024, 3, 13), 4530),
            fields("debit", "acct1", "Groceries", "SUPERMARKET", (2024, 3, 12), 4531),
        ];
        let reference = compute(&base);
        for v in &variants {
            assert_ne!(compute(v), reference);
        }
    }

    #[test]
    fn separator_inside_a_field_cannot_collide() {
        // Under naive `_`-joined concatenation both of these would build the
        // string "debit_x_acct1_...". The length prefixes keep them apart.
        let a = fields("debit_x", "acct1", "t", "d", (2024, 1, 1), 100);
        let b = fields("debit", "x_acct1", "t", "d", (2024, 1, 1), 100);
        assert_ne!(compute(&a), compute(&b));
    }

    #[test]
    fn shifting_bytes_between_adjacent_fields_cannot_collide() {
        let a = fields("debit", "acct1", "ab", "cd", (2024, 1, 1), 100);
        let b = fields("debit", "acct1", "abc", "d", (2024, 1, 1), 100);
        assert_ne!(compute(&a), compute(&b));
    }

    #[test]
    fn date_contributes_canonical_form() {
        // The same calendar date reaches the digest identically no matter
        // which layout the export used; only the parsed value matters.
        use crate::date::normalize_date;

        let from_dmy = normalize_date("12/03/2024", "DD/MM/YYYY".parse().unwrap()).unwrap();
        let from_ymd = normalize_date("2024-03-12", "YYYY-MM-DD".parse().unwrap()).unwrap();
        let a = compute(&FingerprintFields {
            date: from_dmy,
            ..fields("debit", "acct1", "t", "d", (2024, 1, 1), 100)
        });
        let b = compute(&FingerprintFields {
            date: from_ymd,
            ..fields("debit", "acct1", "t", "d", (2024, 1, 1), 100)
        });
        assert_eq!(a, b);
    }

    #[test]
    fn negative_amounts_hash_distinctly() {
        let pos = fields("debit", "acct1", "t", "d", (2024, 1, 1), 4530);
        let neg = fields("debit", "acct1", "t", "d", (2024, 1, 1), -4530);
        assert_ne!(compute(&pos), compute(&neg));
    }
}
