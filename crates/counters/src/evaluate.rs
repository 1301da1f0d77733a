//! Statistic evaluation over a membership snapshot.

use headcount_platform::MemberRecord;

use crate::kind::CounterKind;

/// Whether a member counts as online: any live presence except offline.
/// A missing presence record means offline.
fn online(member: &MemberRecord) -> bool {
    member.presence.is_some_and(|p| p.is_online())
}

/// Count the members a kind selects. Pure; the snapshot is whatever the
/// caller fetched.
#[must_use]
pub fn evaluate(kind: CounterKind, members: &[MemberRecord]) -> usize {
    let selected: fn(&MemberRecord) -> bool = match kind {
        CounterKind::Members => |m| !m.bot,
        CounterKind::Bots => |m| m.bot,
        // More than the implicit base role every member holds.
        CounterKind::Roles => |m| !m.bot && m.role_count > 1,
        CounterKind::OnlineMembers => |m| !m.bot && online(m),
        CounterKind::OnlineBots => |m| m.bot && online(m),
        CounterKind::OfflineMembers => |m| !m.bot && !online(m),
        CounterKind::OfflineBots => |m| m.bot && !online(m),
    };
    members.iter().filter(|m| selected(m)).count()
}

/// Display name a counter channel should carry for a count.
#[must_use]
pub fn target_name(kind: CounterKind, count: usize) -> String {
    format!("{}: {}", kind.label(), count)
}
