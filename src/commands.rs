use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::future::join_all;
use serenity::builder::{CreateCommand, CreateCommandOption};
use serenity::http::Http;
use serenity::model::application::CommandOptionType;
use serenity::model::id::{CommandId, GuildId};
use tracing::{info, warn};

/// Static description of a slash command with a single string option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub option: OptionDefinition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub required: bool,
}

pub const SEARCH_GIF: CommandDefinition = CommandDefinition {
    name: "searchgif",
    description: "Search Tenor for a GIF",
    option: OptionDefinition {
        name: "keyword",
        description: "Keyword to search a GIF for",
        required: true,
    },
};

impl CommandDefinition {
    pub fn to_builder(&self) -> CreateCommand {
        CreateCommand::new(self.name)
            .description(self.description)
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::String,
                    self.option.name,
                    self.option.description,
                )
                .required(self.option.required),
            )
    }
}

/// A command as the platform currently knows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredCommand {
    pub id: u64,
    pub name: String,
}

/// Command storage scoped to a single guild.
#[async_trait]
pub trait CommandRegistry: Send + Sync {
    async fn list(&self) -> Result<Vec<RegisteredCommand>>;
    async fn delete(&self, command: &RegisteredCommand) -> Result<()>;
    async fn create(&self, definition: &CommandDefinition) -> Result<RegisteredCommand>;
}

/// Guild commands through the Discord REST API.
pub struct GuildRegistry {
    http: Arc<Http>,
    guild_id: GuildId,
}

impl GuildRegistry {
    pub fn new(http: Arc<Http>, guild_id: GuildId) -> Self {
        Self { http, guild_id }
    }
}

#[async_trait]
impl CommandRegistry for GuildRegistry {
    async fn list(&self) -> Result<Vec<RegisteredCommand>> {
        let commands = self
            .guild_id
            .get_commands(&self.http)
            .await
            .with_context(|| format!("Failed to list commands for guild {}", self.guild_id))?;

        Ok(commands
            .into_iter()
            .map(|c| RegisteredCommand {
                id: c.id.get(),
                name: c.name,
            })
            .collect())
    }

    async fn delete(&self, command: &RegisteredCommand) -> Result<()> {
        self.guild_id
            .delete_command(&self.http, CommandId::new(command.id))
            .await
            .with_context(|| format!("Failed to delete command '{}'", command.name))
    }

    async fn create(&self, definition: &CommandDefinition) -> Result<RegisteredCommand> {
        let command = self
            .guild_id
            .create_command(&self.http, definition.to_builder())
            .await
            .with_context(|| format!("Failed to create command '{}'", definition.name))?;

        Ok(RegisteredCommand {
            id: command.id.get(),
            name: command.name,
        })
    }
}

#[derive(Debug)]
pub enum CleanupFailure {
    List(anyhow::Error),
    Delete { name: String, error: anyhow::Error },
}

/// Per-command outcome of clearing out old registrations.
#[derive(Debug, Default)]
pub struct CleanupReport {
    pub removed: Vec<String>,
    pub failures: Vec<CleanupFailure>,
}

impl CleanupReport {
    fn log(&self) {
        info!("Removed {} previously registered command(s)", self.removed.len());
        for failure in &self.failures {
            match failure {
                CleanupFailure::List(e) => warn!("Could not list commands: {:#}", e),
                CleanupFailure::Delete { name, error } => {
                    warn!("Could not delete command '{}': {:#}", name, error)
                }
            }
        }
    }
}

/// Delete every command registered in the guild. Failures are collected and
/// logged, never returned.
pub async fn remove_all_commands(registry: &dyn CommandRegistry) -> CleanupReport {
    let mut report = CleanupReport::default();

    let commands = match registry.list().await {
        Ok(commands) => commands,
        Err(e) => {
            report.failures.push(CleanupFailure::List(e));
            report.log();
            return report;
        }
    };

    let outcomes = join_all(
        commands
            .iter()
            .map(|command| async move { (command, registry.delete(command).await) }),
    )
    .await;

    for (command, outcome) in outcomes {
        match outcome {
            Ok(()) => report.removed.push(command.name.clone()),
            Err(error) => report.failures.push(CleanupFailure::Delete {
                name: command.name.clone(),
                error,
            }),
        }
    }

    report.log();
    report
}

pub async fn register_command(
    registry: &dyn CommandRegistry,
    definition: &CommandDefinition,
) -> Result<RegisteredCommand> {
    let command = registry
        .create(definition)
        .await
        .with_context(|| format!("Failed to register /{}", definition.name))?;

    info!("Registered /{} (id {})", command.name, command.id);
    Ok(command)
}

/// Clear stale commands, then register `definition`. Only the registration
/// can fail.
pub async fn sync_commands(
    registry: &dyn CommandRegistry,
    definition: &CommandDefinition,
) -> Result<RegisteredCommand> {
    remove_all_commands(registry).await;
    register_command(registry, definition).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeRegistry {
        commands: Mutex<Vec<RegisteredCommand>>,
        fail_list: bool,
        fail_delete: Vec<&'static str>,
        fail_create: bool,
    }

    impl FakeRegistry {
        fn with(names: &[&str]) -> Self {
            let commands = names
                .iter()
                .enumerate()
                .map(|(i, name)| RegisteredCommand {
                    id: i as u64 + 1,
                    name: name.to_string(),
                })
                .collect();
            Self {
                commands: Mutex::new(commands),
                ..Default::default()
            }
        }

        fn names(&self) -> Vec<String> {
            self.commands
                .lock()
                .unwrap()
                .iter()
                .map(|c| c.name.clone())
                .collect()
        }
    }

    #[async_trait]
    impl CommandRegistry for FakeRegistry {
        async fn list(&self) -> Result<Vec<RegisteredCommand>> {
            if self.fail_list {
                anyhow::bail!("401 Unauthorized");
            }
            Ok(self.commands.lock().unwrap().clone())
        }

        async fn delete(&self, command: &RegisteredCommand) -> Result<()> {
            if self.fail_delete.iter().any(|name| *name == command.name) {
                anyhow::bail!("404 Unknown application command");
            }
            self.commands.lock().unwrap().retain(|c| c.id != command.id);
            Ok(())
        }

        async fn create(&self, definition: &CommandDefinition) -> Result<RegisteredCommand> {
            if self.fail_create {
                anyhow::bail!("400 Invalid Form Body");
            }
            let command = RegisteredCommand {
                id: 100,
                name: definition.name.to_string(),
            };
            self.commands.lock().unwrap().push(command.clone());
            Ok(command)
        }
    }

    #[test]
    fn test_search_gif_builder_payload() {
        let payload = serde_json::to_value(SEARCH_GIF.to_builder()).unwrap();
        assert_eq!(payload["name"], "searchgif");
        assert_eq!(payload["options"].as_array().unwrap().len(), 1);

        let option = &payload["options"][0];
        assert_eq!(option["name"], "keyword");
        assert_eq!(option["type"], 3);
        assert_eq!(option["required"], true);
    }

    #[tokio::test]
    async fn test_remove_all_commands() {
        let registry = FakeRegistry::with(&["searchgif", "givemeagif"]);

        let report = remove_all_commands(&registry).await;

        assert_eq!(report.removed, vec!["searchgif", "givemeagif"]);
        assert!(report.failures.is_empty());
        assert!(registry.names().is_empty());
    }

    #[tokio::test]
    async fn test_delete_failure_does_not_stop_cleanup() {
        let registry = FakeRegistry {
            fail_delete: vec!["old"],
            ..FakeRegistry::with(&["old", "older", "oldest"])
        };

        let report = remove_all_commands(&registry).await;

        assert_eq!(report.removed, vec!["older", "oldest"]);
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(
            &report.failures[0],
            CleanupFailure::Delete { name, .. } if name == "old"
        ));
        assert_eq!(registry.names(), vec!["old"]);
    }

    #[tokio::test]
    async fn test_list_failure_is_reported() {
        let registry = FakeRegistry {
            fail_list: true,
            ..FakeRegistry::with(&["old"])
        };

        let report = remove_all_commands(&registry).await;

        assert!(report.removed.is_empty());
        assert!(matches!(
            report.failures.as_slice(),
            [CleanupFailure::List(_)]
        ));
    }

    #[tokio::test]
    async fn test_sync_leaves_exactly_one_command() {
        let registry = FakeRegistry::with(&["givemeagif"]);

        let command = sync_commands(&registry, &SEARCH_GIF).await.unwrap();

        assert_eq!(command.name, "searchgif");
        assert_eq!(registry.names(), vec!["searchgif"]);
    }

    #[tokio::test]
    async fn test_sync_registers_even_when_cleanup_fails() {
        let registry = FakeRegistry {
            fail_list: true,
            ..Default::default()
        };

        sync_commands(&registry, &SEARCH_GIF).await.unwrap();
        assert_eq!(registry.names(), vec!["searchgif"]);
    }

    #[tokio::test]
    async fn test_create_failure_is_fatal() {
        let registry = FakeRegistry {
            fail_create: true,
            ..Default::default()
        };

        let err = sync_commands(&registry, &SEARCH_GIF).await.unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to register /searchgif"));
    }
}
