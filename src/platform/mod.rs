pub mod discord;

/// A slash-command invocation received from any platform
#[derive(Debug, Clone, Default)]
pub struct IncomingCommand {
    /// Name of the invoked command, without the leading slash
    pub command_name: String,
    /// Options in the order the platform delivered them
    pub arguments: Vec<CommandArgument>,
    /// Display name of the invoking user
    pub user_name: String,
}

#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct CommandArgument {
    pub name: String,
    /// `None` for options that are not strings
    pub value: Option<String>,
}

impl IncomingCommand {
    /// String value of the first option, empty when there is none.
    pub fn first_string_argument(&self) -> &str {
        self.arguments
            .first()
            .and_then(|arg| arg.value.as_deref())
            .unwrap_or_default()
    }
}
