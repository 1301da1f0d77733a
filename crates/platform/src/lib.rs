//! Chat-platform gateway contract.
//!
//! The rest of the workspace talks to the chat platform exclusively through
//! the [`CommunityGateway`] trait and the [`GatewayEvent`] stream defined
//! here. A real platform session implements the trait; [`sim::SimGateway`]
//! provides an in-process backend for tests and local development.

pub mod command;
pub mod error;
pub mod gateway;
pub mod sim;
pub mod types;

pub use {
    command::{Capability, CommandInvocation, CommandOption, CommandSpec},
    error::{Error, Result},
    gateway::{CommunityGateway, EventReceiver, EventSender, GatewayEvent},
    types::{
        CategoryId, CategoryRef, ChannelId, ChannelRef, CommunityId, MemberRecord,
        PermissionPolicy, PresenceStatus,
    },
};
