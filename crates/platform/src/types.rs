//! Identifier newtypes and membership records shared across headcount crates.

use serde::{Deserialize, Serialize};

/// Identifier of one chat-platform community (server/guild).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommunityId(pub String);

/// Identifier of one channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub String);

/// Identifier of one category container.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub String);

macro_rules! impl_id {
    ($name:ident) => {
        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

impl_id!(CommunityId);
impl_id!(ChannelId);
impl_id!(CategoryId);

/// Presence state the platform reports for one member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PresenceStatus {
    Online,
    Idle,
    DoNotDisturb,
    Offline,
}

impl PresenceStatus {
    /// Whether this status counts as "online" for counter purposes.
    /// Idle and do-not-disturb members are connected, so they count.
    #[must_use]
    pub fn is_online(self) -> bool {
        !matches!(self, Self::Offline)
    }
}

/// Point-in-time view of one community member.
///
/// A missing presence record (`presence: None`) means the platform sent no
/// presence data for this member; readers treat it as offline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRecord {
    #[serde(default)]
    pub bot: bool,
    /// Number of roles assigned to the member, including the implicit
    /// general-access role every member holds.
    #[serde(default)]
    pub role_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence: Option<PresenceStatus>,
}

impl MemberRecord {
    /// A human member with only the implicit base role and no presence data.
    #[must_use]
    pub fn human() -> Self {
        Self {
            bot: false,
            role_count: 1,
            presence: None,
        }
    }

    /// An automated account with only the implicit base role.
    #[must_use]
    pub fn bot() -> Self {
        Self {
            bot: true,
            role_count: 1,
            presence: None,
        }
    }

    #[must_use]
    pub fn with_presence(mut self, presence: PresenceStatus) -> Self {
        self.presence = Some(presence);
        self
    }

    #[must_use]
    pub fn with_roles(mut self, role_count: u32) -> Self {
        self.role_count = role_count;
        self
    }
}

/// Handle to a live channel, carrying the display name last seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRef {
    pub id: ChannelId,
    pub community: CommunityId,
    pub name: String,
}

/// Handle to a live category container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRef {
    pub id: CategoryId,
    pub community: CommunityId,
    pub name: String,
}

/// Connect permission applied to categories and channels the bot creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionPolicy {
    /// Anyone may connect.
    Open,
    /// Deny connect for the general-access role. Counter channels are
    /// display-only, so this is the default.
    #[default]
    DenyConnect,
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presence_serde_kebab_case() {
        let json = serde_json::to_string(&PresenceStatus::DoNotDisturb).unwrap();
        assert_eq!(json, "\"do-not-disturb\"");
        let back: PresenceStatus = serde_json::from_str("\"idle\"").unwrap();
        assert_eq!(back, PresenceStatus::Idle);
    }

    #[test]
    fn test_presence_is_online() {
        assert!(PresenceStatus::Online.is_online());
        assert!(PresenceStatus::Idle.is_online());
        assert!(PresenceStatus::DoNotDisturb.is_online());
        assert!(!PresenceStatus::Offline.is_online());
    }

    #[test]
    fn test_member_record_defaults() {
        let member: MemberRecord = serde_json::from_str("{}").unwrap();
        assert!(!member.bot);
        assert_eq!(member.role_count, 0);
        assert!(member.presence.is_none());
    }

    #[test]
    fn test_member_record_skips_absent_presence() {
        let json = serde_json::to_value(MemberRecord::human()).unwrap();
        assert!(json.get("presence").is_none());
    }

    #[test]
    fn test_id_display() {
        let id = CommunityId::new("123");
        assert_eq!(id.to_string(), "123");
        assert_eq!(id.as_str(), "123");
    }
}
