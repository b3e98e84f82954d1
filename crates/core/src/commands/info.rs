//! Command information types

use super::context::ActionContext;

/// Result of command execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[repr(u8)]
pub enum CommandResult {
    /// Not a command for us, let the line through
    #[default]
    Continue = 0,
    /// Command was handled, swallow the chat line
    Handled = 1,
}

/// A chat line split into an action name and its arguments
#[derive(Debug, Clone)]
pub struct CommandInfo {
    /// Tokenized arguments (index 0 is the command name, without prefix)
    args: Vec<String>,
}

impl CommandInfo {
    /// Parse a chat line, returning `None` unless it starts with `prefix`
    /// followed by a command name.
    pub fn from_chat(line: &str, prefix: &str) -> Option<Self> {
        let body = line.trim_start().strip_prefix(prefix)?;
        let args = tokenize(body);
        if args.is_empty() || body.starts_with(char::is_whitespace) {
            return None;
        }
        Some(Self { args })
    }

    /// Get the number of arguments (including command name at index 0)
    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    /// Get argument by index (0 = command name)
    ///
    /// Returns empty string if index is out of bounds.
    pub fn arg(&self, index: usize) -> &str {
        self.args.get(index).map(|s| s.as_str()).unwrap_or("")
    }

    /// Get all arguments after command name as a single string
    pub fn arg_string(&self) -> String {
        self.args_from(1)
    }

    /// Arguments from `index` on, joined by single spaces
    pub fn args_from(&self, index: usize) -> String {
        self.args.get(index..).map(|rest| rest.join(" ")).unwrap_or_default()
    }
}

/// Split a command line on whitespace, keeping `"quoted words"` together
pub fn tokenize(line: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;

    for c in line.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    args.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }
    if has_token {
        args.push(current);
    }

    args
}

/// Type alias for action callbacks
pub type ActionCallback =
    Box<dyn Fn(&mut ActionContext<'_>, &CommandInfo) -> CommandResult + Send + Sync>;
