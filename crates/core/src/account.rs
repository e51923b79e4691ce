use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountId(pub i64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A bank account as this engine sees it: the slug is an identity input to
/// the fingerprint, the currency code is display context. Everything else
/// about accounts lives with the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankAccount {
    pub id: Option<AccountId>,
    pub name: String,
    pub slug: String,
    pub currency: String,
}

impl BankAccount {
    pub fn new(name: &str, currency: &str) -> Self {
        BankAccount {
            id: None,
            name: name.to_string(),
            slug: slugify(name),
            currency: currency.to_string(),
        }
    }
}

/// Lowercase alphanumeric words joined by `-`.
fn slugify(name: &str) -> String {
    name.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
