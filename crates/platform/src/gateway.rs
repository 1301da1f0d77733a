//! The collaborator contract consumed by the provisioning and
//! reconciliation services.

use {
    async_trait::async_trait,
    tokio::sync::{mpsc, oneshot},
};

use crate::{
    command::{CommandInvocation, CommandSpec},
    error::Result,
    types::{
        CategoryId, CategoryRef, ChannelId, ChannelRef, CommunityId, MemberRecord,
        PermissionPolicy,
    },
};

/// Events pushed by a gateway session.
///
/// Membership and presence events only name the community; the services
/// fetch a fresh membership snapshot when they reconcile, so events carry
/// no member payload.
#[derive(Debug)]
pub enum GatewayEvent {
    MemberAdded {
        community: CommunityId,
    },
    MemberRemoved {
        community: CommunityId,
    },
    PresenceUpdated {
        community: CommunityId,
    },
    /// A registered command was invoked. The reply channel must receive
    /// exactly one final response text.
    Command {
        invocation: CommandInvocation,
        reply: oneshot::Sender<String>,
    },
}

/// Receiver end of a gateway event stream.
pub type EventReceiver = mpsc::Receiver<GatewayEvent>;

/// Sender end of a gateway event stream.
pub type EventSender = mpsc::Sender<GatewayEvent>;

/// Operations the core needs from the chat platform. One session is
/// acquired at startup and shared process-wide.
#[async_trait]
pub trait CommunityGateway: Send + Sync {
    /// Fetch a point-in-time membership snapshot. Called fresh on every
    /// reconcile; implementations must not serve stale core-visible caches.
    async fn fetch_membership(&self, community: &CommunityId) -> Result<Vec<MemberRecord>>;

    /// Find a category by exact, case-sensitive name.
    async fn find_category(
        &self,
        community: &CommunityId,
        name: &str,
    ) -> Result<Option<CategoryRef>>;

    async fn create_category(
        &self,
        community: &CommunityId,
        name: &str,
        policy: &PermissionPolicy,
    ) -> Result<CategoryRef>;

    async fn create_voice_channel(
        &self,
        community: &CommunityId,
        name: &str,
        parent: &CategoryId,
        policy: &PermissionPolicy,
    ) -> Result<ChannelRef>;

    /// Look up a channel; `None` when it no longer exists.
    async fn get_channel(
        &self,
        community: &CommunityId,
        channel: &ChannelId,
    ) -> Result<Option<ChannelRef>>;

    /// Look up a category; `None` when it no longer exists.
    async fn get_category(
        &self,
        community: &CommunityId,
        category: &CategoryId,
    ) -> Result<Option<CategoryRef>>;

    async fn rename_channel(&self, channel: &ChannelRef, new_name: &str) -> Result<()>;

    async fn delete_channel(&self, channel: &ChannelRef) -> Result<()>;

    async fn delete_category(&self, category: &CategoryRef) -> Result<()>;

    /// Number of channels currently parented under a category.
    async fn child_count(&self, category: &CategoryRef) -> Result<usize>;

    /// Best-effort display name for a community. Diagnostics only; `None`
    /// when the community is no longer resolvable.
    async fn community_label(&self, community: &CommunityId) -> Option<String>;

    /// Register the static command schema with the platform.
    async fn register_commands(&self, specs: &[CommandSpec]) -> Result<()>;
}
