//! The closed set of counter kinds.

use serde::{Deserialize, Serialize};

/// Statistic a counter channel displays.
///
/// The set is closed on purpose: every kind carries an exhaustive mapping
/// to a display label and an evaluation rule, so adding a variant without
/// wiring both is a compile error. The serde strings are the wire form
/// used in snapshots and command choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CounterKind {
    Members,
    Bots,
    Roles,
    OnlineMembers,
    OnlineBots,
    OfflineMembers,
    OfflineBots,
}

/// Parse error for [`CounterKind::from_str`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown counter kind: {0}")]
pub struct UnknownKind(pub String);

impl CounterKind {
    pub const ALL: [Self; 7] = [
        Self::Members,
        Self::Bots,
        Self::Roles,
        Self::OnlineMembers,
        Self::OnlineBots,
        Self::OfflineMembers,
        Self::OfflineBots,
    ];

    /// Wire name, as stored in snapshots and offered as a command choice.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Members => "members",
            Self::Bots => "bots",
            Self::Roles => "roles",
            Self::OnlineMembers => "online-members",
            Self::OnlineBots => "online-bots",
            Self::OfflineMembers => "offline-members",
            Self::OfflineBots => "offline-bots",
        }
    }

    /// Display label the channel name is built from. Unique per kind.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Members => "Total Members",
            Self::Bots => "Bots",
            Self::Roles => "Members with Roles",
            Self::OnlineMembers => "Online Members",
            Self::OnlineBots => "Online Bots",
            Self::OfflineMembers => "Offline Members",
            Self::OfflineBots => "Offline Bots",
        }
    }
}

impl std::fmt::Display for CounterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CounterKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_serde_matches_wire_names() {
        for kind in CounterKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
            let back: CounterKind = serde_json::from_str(&json).unwrap();
            assert_eq!(back, kind);
        }
    }

    #[test]
    fn test_from_str_roundtrip() {
        for kind in CounterKind::ALL {
            assert_eq!(kind.as_str().parse::<CounterKind>().unwrap(), kind);
        }
        assert!("member-count".parse::<CounterKind>().is_err());
    }

    #[test]
    fn test_labels_are_unique() {
        let labels: HashSet<_> = CounterKind::ALL.iter().map(|k| k.label()).collect();
        assert_eq!(labels.len(), CounterKind::ALL.len());
    }

    #[test]
    fn test_unknown_wire_string_fails_deserialization() {
        assert!(serde_json::from_str::<CounterKind>("\"admins\"").is_err());
    }
}
