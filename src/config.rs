use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_TENOR_BASE_URL: &str = "https://tenor.googleapis.com/v2/search";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub discord: DiscordConfig,
    #[serde(default)]
    pub tenor: TenorConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DiscordConfig {
    #[serde(default)]
    pub bot_token: String,
    /// Guild the slash command is registered in.
    #[serde(default)]
    pub guild_id: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TenorConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_tenor_base_url")]
    pub base_url: String,
}

impl Default for TenorConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_tenor_base_url(),
        }
    }
}

fn default_tenor_base_url() -> String {
    DEFAULT_TENOR_BASE_URL.to_string()
}

impl Config {
    /// Read, override from the environment and validate. Every failure here
    /// is fatal for the process.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config = Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid TOML")
    }

    /// Replace file values with `BOT_TOKEN`, `TENOR_API_KEY` and
    /// `DISCORD_GUILD_ID` when those are set to something non-empty.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = get("BOT_TOKEN") {
            self.discord.bot_token = token;
        }
        if let Some(key) = get("TENOR_API_KEY") {
            self.tenor.api_key = key;
        }
        if let Some(guild) = get("DISCORD_GUILD_ID") {
            self.discord.guild_id = guild;
        }
    }

    pub fn validate(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("discord.bot_token", &self.discord.bot_token),
            ("tenor.api_key", &self.tenor.api_key),
            ("discord.guild_id", &self.discord.guild_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if !missing.is_empty() {
            anyhow::bail!("Missing required config values: {}", missing.join(", "));
        }

        self.guild_id()?;

        reqwest::Url::parse(&self.tenor.base_url)
            .with_context(|| format!("Invalid tenor.base_url: {}", self.tenor.base_url))?;

        Ok(())
    }

    /// The target guild as a numeric snowflake.
    pub fn guild_id(&self) -> Result<u64> {
        let raw = self.discord.guild_id.trim();
        let id: u64 = raw
            .parse()
            .with_context(|| format!("discord.guild_id is not a numeric id: {:?}", raw))?;
        if id == 0 {
            anyhow::bail!("discord.guild_id must not be 0");
        }
        Ok(id)
    }
}
