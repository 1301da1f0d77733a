//! Command schema and dispatch.
//!
//! The schema is static: three commands, registered once at startup.
//! Every invocation gets exactly one final reply, either a confirmation
//! summary or an explanation with a remediation hint.

use std::sync::Arc;

use {
    headcount_counters::CounterKind,
    headcount_engine::{Error, ProvisionService, Result},
    headcount_platform::{Capability, CommandInvocation, CommandOption, CommandSpec},
    tracing::info,
};

pub const SETUP: &str = "counter-setup";
pub const TYPES: &str = "counter-types";
pub const RESET: &str = "counter-reset";

/// Wire names offered as the `kind` choice. Kept in lockstep with
/// [`CounterKind::ALL`]; a test asserts the two match.
const KIND_CHOICES: &[&str] = &[
    "members",
    "bots",
    "roles",
    "online-members",
    "online-bots",
    "offline-members",
    "offline-bots",
];

/// The fixed command schema registered with the platform at startup.
pub fn command_specs() -> Vec<CommandSpec> {
    vec![
        CommandSpec {
            name: SETUP,
            description: "Set up a live counter channel",
            options: vec![
                CommandOption {
                    name: "kind",
                    description: "Statistic the counter displays",
                    required: true,
                    choices: KIND_CHOICES,
                },
                CommandOption {
                    name: "category",
                    description: "Category to place the counter under",
                    required: true,
                    choices: &[],
                },
            ],
            required_capability: Some(Capability::ManageChannels),
        },
        CommandSpec {
            name: TYPES,
            description: "List available counter types",
            options: Vec::new(),
            required_capability: None,
        },
        CommandSpec {
            name: RESET,
            description: "Remove every counter in this community",
            options: Vec::new(),
            required_capability: Some(Capability::Administrator),
        },
    ]
}

/// Handle one invocation and produce the final reply text. Never leaves
/// the requester without a response.
pub async fn dispatch(provision: &Arc<ProvisionService>, invocation: CommandInvocation) -> String {
    info!(
        community = %invocation.community,
        command = %invocation.command,
        "command invoked"
    );

    let result = match invocation.command.as_str() {
        SETUP => handle_setup(provision, &invocation).await,
        TYPES => Ok(list_types()),
        RESET => handle_reset(provision, &invocation).await,
        other => Ok(format!("Unknown command: {other}.")),
    };

    match result {
        Ok(reply) => reply,
        Err(Error::PermissionDenied { capability }) => format!(
            "You need the {} capability to run this command. Ask a community \
             administrator to grant it or to run the command for you.",
            capability.label()
        ),
        Err(e) => format!(
            "Something went wrong: {e}. Check that the bot can manage channels \
             and that its role sits above the channels it manages."
        ),
    }
}

fn gate(invocation: &CommandInvocation, capability: Capability) -> Result<()> {
    if invocation.has_capability(capability) {
        Ok(())
    } else {
        Err(Error::permission_denied(capability))
    }
}

async fn handle_setup(
    provision: &Arc<ProvisionService>,
    invocation: &CommandInvocation,
) -> Result<String> {
    gate(invocation, Capability::ManageChannels)?;

    let Some(kind_arg) = invocation.arg("kind") else {
        return Ok("The kind option is required. See /counter-types for the available kinds.".into());
    };
    let kind = match kind_arg.parse::<CounterKind>() {
        Ok(kind) => kind,
        Err(e) => {
            return Ok(format!("{e}. See /counter-types for the available kinds."));
        },
    };
    let Some(category) = invocation.arg("category") else {
        return Ok("The category option is required.".into());
    };

    let config = provision
        .set_up(&invocation.community, kind, category)
        .await?;
    Ok(format!(
        "Created a \"{}\" counter under \"{category}\". It updates \
         automatically as the community changes. (channel {})",
        kind.label(),
        config.channel_id
    ))
}

async fn handle_reset(
    provision: &Arc<ProvisionService>,
    invocation: &CommandInvocation,
) -> Result<String> {
    gate(invocation, Capability::Administrator)?;

    let report = provision.tear_down(&invocation.community).await?;
    if report.deleted == 0 && report.failed == 0 {
        return Ok("Nothing to reset: no counters are set up in this community.".into());
    }

    let mut reply = format!("Removed {} counter channel(s).", report.deleted);
    if report.failed > 0 {
        reply.push_str(&format!(
            " {} could not be deleted and may need manual cleanup.",
            report.failed
        ));
    }
    reply.push_str(" All counter configuration was cleared.");
    Ok(reply)
}

fn list_types() -> String {
    let mut reply = String::from("Available counter types:\n");
    for kind in CounterKind::ALL {
        reply.push_str(&format!("• `{}` — {}\n", kind, kind.label()));
    }
    reply
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use {
        headcount_platform::{
            CommunityGateway, CommunityId, MemberRecord, sim::SimGateway,
        },
        headcount_store::{ConfigStore, MemorySnapshot, SnapshotStore},
    };

    use super::*;

    fn invocation(
        command: &str,
        args: &[(&str, &str)],
        caps: &[Capability],
    ) -> CommandInvocation {
        CommandInvocation {
            community: CommunityId::new("c1"),
            command: command.to_string(),
            args: args
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
            caller_capabilities: caps.to_vec(),
        }
    }

    async fn services() -> (Arc<SimGateway>, Arc<ConfigStore>, Arc<ProvisionService>) {
        let gateway = Arc::new(SimGateway::new());
        gateway.add_community("c1", "Test").await;
        gateway
            .set_members("c1", vec![MemberRecord::human(), MemberRecord::bot()])
            .await;
        let store = Arc::new(ConfigStore::new());
        let provision = Arc::new(ProvisionService::new(
            Arc::clone(&gateway) as Arc<dyn CommunityGateway>,
            Arc::clone(&store),
            Arc::new(MemorySnapshot::new()) as Arc<dyn SnapshotStore>,
        ));
        (gateway, store, provision)
    }

    #[test]
    fn test_kind_choices_match_counter_kinds() {
        let wire: Vec<_> = CounterKind::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(KIND_CHOICES, wire.as_slice());
    }

    #[test]
    fn test_schema_has_three_commands_with_gates() {
        let specs = command_specs();
        assert_eq!(specs.len(), 3);
        let setup = specs.iter().find(|s| s.name == SETUP).unwrap();
        assert_eq!(setup.required_capability, Some(Capability::ManageChannels));
        assert!(setup.options.iter().any(|o| o.name == "kind" && o.required));
        let reset = specs.iter().find(|s| s.name == RESET).unwrap();
        assert_eq!(reset.required_capability, Some(Capability::Administrator));
        assert!(specs.iter().any(|s| s.name == TYPES));
    }

    #[tokio::test]
    async fn test_setup_requires_manage_channels() {
        let (_gateway, store, provision) = services().await;
        let reply = dispatch(
            &provision,
            invocation(SETUP, &[("kind", "members"), ("category", "Stats")], &[]),
        )
        .await;
        assert!(reply.contains("Manage Channels"));
        assert!(store.get(&CommunityId::new("c1")).await.is_none());
    }

    #[tokio::test]
    async fn test_setup_creates_counter() {
        let (_gateway, store, provision) = services().await;
        let reply = dispatch(
            &provision,
            invocation(
                SETUP,
                &[("kind", "members"), ("category", "Stats")],
                &[Capability::ManageChannels],
            ),
        )
        .await;
        assert!(reply.contains("Total Members"));
        assert_eq!(store.get(&CommunityId::new("c1")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_setup_rejects_unknown_kind() {
        let (_gateway, _store, provision) = services().await;
        let reply = dispatch(
            &provision,
            invocation(
                SETUP,
                &[("kind", "admins"), ("category", "Stats")],
                &[Capability::ManageChannels],
            ),
        )
        .await;
        assert!(reply.contains("unknown counter kind"));
    }

    #[tokio::test]
    async fn test_setup_failure_reports_with_hint() {
        let (_gateway, _store, provision) = services().await;
        let mut inv = invocation(
            SETUP,
            &[("kind", "members"), ("category", "Stats")],
            &[Capability::ManageChannels],
        );
        inv.community = CommunityId::new("unknown");
        let reply = dispatch(&provision, inv).await;
        assert!(reply.contains("Something went wrong"));
    }

    #[tokio::test]
    async fn test_reset_requires_administrator() {
        let (_gateway, _store, provision) = services().await;
        let reply = dispatch(
            &provision,
            invocation(RESET, &[], &[Capability::ManageChannels]),
        )
        .await;
        assert!(reply.contains("Administrator"));
    }

    #[tokio::test]
    async fn test_reset_with_nothing_configured() {
        let (_gateway, _store, provision) = services().await;
        let reply = dispatch(
            &provision,
            invocation(RESET, &[], &[Capability::Administrator]),
        )
        .await;
        assert!(reply.contains("Nothing to reset"));
    }

    #[tokio::test]
    async fn test_reset_reports_counts() {
        let (_gateway, _store, provision) = services().await;
        dispatch(
            &provision,
            invocation(
                SETUP,
                &[("kind", "members"), ("category", "Stats")],
                &[Capability::ManageChannels],
            ),
        )
        .await;
        let reply = dispatch(
            &provision,
            invocation(RESET, &[], &[Capability::Administrator]),
        )
        .await;
        assert!(reply.contains("Removed 1 counter channel(s)"));
    }

    #[tokio::test]
    async fn test_types_lists_every_kind() {
        let (_gateway, _store, provision) = services().await;
        let reply = dispatch(&provision, invocation(TYPES, &[], &[])).await;
        for kind in CounterKind::ALL {
            assert!(reply.contains(kind.as_str()));
            assert!(reply.contains(kind.label()));
        }
    }

    #[tokio::test]
    async fn test_unknown_command_still_replies() {
        let (_gateway, _store, provision) = services().await;
        let reply = dispatch(&provision, invocation("counter-bogus", &[], &[])).await;
        assert!(reply.contains("Unknown command"));
    }
}
