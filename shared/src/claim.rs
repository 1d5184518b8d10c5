use serde::{Deserialize, Serialize};

/// Request identifier whose claims carry no type label at all.
pub const NORMAL: &str = "normal";

/// A claim record as served by the game server's web API.
///
/// Only `Type` is interpreted; every other field is carried through as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(flatten)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl Claim {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            attributes: serde_json::Map::new(),
        }
    }

    pub fn is_of_type(&self, requested: &str) -> bool {
        is_claim_of_type(&self.kind, requested)
    }
}

/// Prefix match on the claim's type label.
///
/// The backend matches `type` anywhere in the label, so a notify claim whose
/// label mentions "reset" would otherwise show up under both views.
pub fn is_claim_of_type(kind: &str, requested: &str) -> bool {
    if kind.starts_with(requested) {
        return true;
    }

    // Normal claims have an empty label.
    requested == NORMAL && kind.is_empty()
}

/// Drops the backend's false positives, keeping the original order.
pub fn refine_claims(claims: Vec<Claim>, requested: &str) -> Vec<Claim> {
    claims
        .into_iter()
        .filter(|claim| claim.is_of_type(requested))
        .collect()
}
