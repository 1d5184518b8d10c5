use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Pseudo-type served by its own endpoint; never sent to the claims query.
pub const RESET_REGION: &str = "resetregion";

/// Claim types known to the dashboard, in the order its views list them.
///
/// Requests are plain strings on the wire, so this enum is a naming aid only.
/// Unknown identifiers are passed through to the backend untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimType {
    HostileFree,
    Notify,
    Command,
    Leveled,
    Reversed,
    Normal,
    Timed,
    Portal,
    OpenHours,
    PlayerLevel,
    LcbFree,
    AntiBlock,
    Reset,
    ProBlock,
    LandClaim,
}

impl ClaimType {
    pub const ALL: [ClaimType; 15] = [
        Self::HostileFree,
        Self::Notify,
        Self::Command,
        Self::Leveled,
        Self::Reversed,
        Self::Normal,
        Self::Timed,
        Self::Portal,
        Self::OpenHours,
        Self::PlayerLevel,
        Self::LcbFree,
        Self::AntiBlock,
        Self::Reset,
        Self::ProBlock,
        Self::LandClaim,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::HostileFree => "hostilefree",
            Self::Notify => "notify",
            Self::Command => "command",
            Self::Leveled => "leveled",
            Self::Reversed => "reversed",
            Self::Normal => "normal",
            Self::Timed => "timed",
            Self::Portal => "portal",
            Self::OpenHours => "openhours",
            Self::PlayerLevel => "playerlevel",
            Self::LcbFree => "lcbfree",
            Self::AntiBlock => "antiblock",
            Self::Reset => "reset",
            Self::ProBlock => "problock",
            Self::LandClaim => "landclaim",
        }
    }
}

impl AsRef<str> for ClaimType {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ClaimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownClaimType(pub String);

impl fmt::Display for UnknownClaimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown claim type `{}`", self.0)
    }
}

impl std::error::Error for UnknownClaimType {}

impl FromStr for ClaimType {
    type Err = UnknownClaimType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownClaimType(s.to_string()))
    }
}
