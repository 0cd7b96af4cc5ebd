use std::sync::Arc;

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use serenity::builder::{CreateInteractionResponse, CreateInteractionResponseMessage};
use serenity::model::application::{CommandInteraction, Interaction};
use serenity::model::gateway::Ready;
use serenity::model::id::GuildId;
use serenity::prelude::{Client, Context, EventHandler, GatewayIntents};
use tracing::{error, info};

use crate::bot::AppState;
use crate::commands::{self, GuildRegistry, SEARCH_GIF};
use crate::platform::{CommandArgument, IncomingCommand};

struct Handler {
    state: Arc<AppState>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("Connected to Discord as {}", ready.user.name);
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Interaction::Command(command) = interaction else {
            return;
        };

        let incoming = to_incoming(&command);
        let Some(reply) = self.state.handle_command(&incoming).await else {
            return;
        };

        let response = CreateInteractionResponse::Message(
            CreateInteractionResponseMessage::new().content(reply),
        );
        if let Err(e) = command.create_response(&ctx.http, response).await {
            error!("Failed to reply to /{}: {}", incoming.command_name, e);
        }
    }
}

fn to_incoming(command: &CommandInteraction) -> IncomingCommand {
    IncomingCommand {
        command_name: command.data.name.clone(),
        arguments: command
            .data
            .options
            .iter()
            .map(|option| CommandArgument {
                name: option.name.clone(),
                value: option.value.as_str().map(str::to_string),
            })
            .collect(),
        user_name: command.user.name.clone(),
    }
}

/// Register the slash command, then serve interactions until the gateway
/// connection ends.
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let guild_id = GuildId::new(state.config.guild_id()?);

    info!("Starting Discord platform...");

    let mut client = Client::builder(&state.config.discord.bot_token, GatewayIntents::GUILDS)
        .event_handler(Handler {
            state: state.clone(),
        })
        .await
        .context("Failed to create Discord client")?;

    let application = client
        .http
        .get_current_application_info()
        .await
        .context("Failed to open Discord session")?;
    client.http.set_application_id(application.id);

    let registry = GuildRegistry::new(client.http.clone(), guild_id);
    commands::sync_commands(&registry, &SEARCH_GIF).await?;

    info!("Giffie is running. Press Ctrl+C to stop.");
    client
        .start()
        .await
        .context("Discord gateway connection failed")?;

    Ok(())
}
