//! Host-tunable settings. Everything here has a default matching the stock message set, so most
//! hosts only construct [`Settings::default()`].

/// Message templates sent to invokers by the dispatcher and the invocation context.
///
/// Templates are written with the color marker (see [`Settings::color_marker`]) and are
/// translated on delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Messages {
    /// Sent when a players-only command is run from a non-interactive invoker.
    pub players_only: String,
    /// Sent when the invoker lacks the command's permission.
    pub no_permission: String,
    /// Sent when the invoker lacks a subcommand's permission.
    pub no_subcommand_permission: String,
    /// Sent when nothing matched and the command has no root handler.
    pub invalid_command: String,
    /// Prepended to the usage string by [`InvocationContext::send_usage`](crate::InvocationContext::send_usage).
    pub usage_prefix: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            players_only: "&cThis command can only be used by players.".to_owned(),
            no_permission: "&cYou don't have permission to use this command.".to_owned(),
            no_subcommand_permission: "&cYou don't have permission to use this subcommand."
                .to_owned(),
            invalid_command: "&cInvalid command.".to_owned(),
            usage_prefix: "&cUsage: ".to_owned(),
        }
    }
}

/// Settings shared by every command bound through one registrar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// The character authors write color codes with.
    pub color_marker: char,
    /// The host's native color-escape character every marker is rewritten to.
    pub color_escape: char,
    /// Fixed message templates.
    pub messages: Messages,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color_marker: '&',
            color_escape: '\u{00A7}',
            messages: Messages::default(),
        }
    }
}

impl Settings {
    /// Rewrites every color marker in `message` to the host's escape character.
    pub fn translate_colors(&self, message: &str) -> String {
        message
            .chars()
            .map(|ch| if ch == self.color_marker { self.color_escape } else { ch })
            .collect()
    }
}
