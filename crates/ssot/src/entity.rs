//! The canonical (SSOT) entity set.

use serde::{Deserialize, Serialize};

/// Canonical entity kinds every source platform is normalized into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SsotEntity {
    Person,
    Location,
    CallGroup,
    AutoAttendant,
}

impl SsotEntity {
    pub const ALL: [SsotEntity; 4] = [
        SsotEntity::Person,
        SsotEntity::Location,
        SsotEntity::CallGroup,
        SsotEntity::AutoAttendant,
    ];

    /// Snake-case name used as the mapping-table key and canonical field root.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SsotEntity::Person => "person",
            SsotEntity::Location => "location",
            SsotEntity::CallGroup => "call_group",
            SsotEntity::AutoAttendant => "auto_attendant",
        }
    }
}

impl std::fmt::Display for SsotEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SsotEntity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SsotEntity::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| format!("'{s}' is not an SSOT entity type"))
    }
}
