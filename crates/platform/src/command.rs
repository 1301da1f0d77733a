//! Static command schema and invocation types.
//!
//! The command surface is fixed: the binary builds the schema once at
//! startup and registers it through the gateway. Invocations come back over
//! the gateway event stream with the caller's capabilities attached, so the
//! dispatcher can gate commands without another platform round trip.

use std::collections::HashMap;

use serde::Serialize;

use crate::types::CommunityId;

/// Capability a caller must hold for a gated command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Capability {
    /// May create, rename, and delete channels.
    ManageChannels,
    /// Full administrative control over the community.
    Administrator,
}

impl Capability {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::ManageChannels => "Manage Channels",
            Self::Administrator => "Administrator",
        }
    }
}

/// One option in a command schema.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandOption {
    pub name: &'static str,
    pub description: &'static str,
    pub required: bool,
    /// Fixed choice values; empty for free-form string options.
    #[serde(skip_serializing_if = "no_choices")]
    pub choices: &'static [&'static str],
}

fn no_choices(choices: &&[&str]) -> bool {
    choices.is_empty()
}

/// A command registered with the platform at startup.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub options: Vec<CommandOption>,
    /// Capability the platform should require before offering the command.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_capability: Option<Capability>,
}

/// A command invocation received from the gateway.
#[derive(Debug, Clone)]
pub struct CommandInvocation {
    pub community: CommunityId,
    pub command: String,
    pub args: HashMap<String, String>,
    /// Capabilities the platform resolved for the caller. The dispatcher
    /// re-checks these even when the platform already gated the command.
    pub caller_capabilities: Vec<Capability>,
}

impl CommandInvocation {
    #[must_use]
    pub fn has_capability(&self, capability: Capability) -> bool {
        self.caller_capabilities.contains(&capability)
    }

    #[must_use]
    pub fn arg(&self, name: &str) -> Option<&str> {
        self.args.get(name).map(String::as_str)
    }
}
