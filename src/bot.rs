use anyhow::Result;
use tracing::{debug, info, warn};

use crate::commands::SEARCH_GIF;
use crate::config::Config;
use crate::platform::IncomingCommand;
use crate::tenor::{GifSearch, TenorClient};

/// Reply sent whenever the search yields no usable GIF.
pub const FALLBACK_REPLY: &str = "Couldn't find a GIF. 😢";

/// Shared application state
pub struct AppState {
    pub config: Config,
    search: Box<dyn GifSearch>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let search = TenorClient::new(&config.tenor)?;
        Ok(Self::with_search(config, Box::new(search)))
    }

    pub fn with_search(config: Config, search: Box<dyn GifSearch>) -> Self {
        Self { config, search }
    }

    pub async fn handle_command(&self, incoming: &IncomingCommand) -> Option<String> {
        handle_command(incoming, self.search.as_ref()).await
    }
}

/// Reply text for one interaction, or `None` when the command is not ours.
pub async fn handle_command(incoming: &IncomingCommand, search: &dyn GifSearch) -> Option<String> {
    if incoming.command_name != SEARCH_GIF.name {
        debug!("Ignoring unknown command /{}", incoming.command_name);
        return None;
    }

    let keyword = incoming.first_string_argument();
    info!("{} is searching for a GIF: {}", incoming.user_name, keyword);

    let reply = match search.fetch_gif(keyword).await {
        Ok(url) => url,
        Err(e) => {
            warn!("GIF search for {:?} failed: {}", keyword, e);
            FALLBACK_REPLY.to_string()
        }
    };

    Some(reply)
}
