use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaCommand {
    Quit,
    Help,
    Collections,
    Indexes { collection: String },
}

impl fmt::Display for MetaCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaCommand::Quit => write!(f, "quit"),
            MetaCommand::Help => write!(f, "help"),
            MetaCommand::Collections => write!(f, "collections"),
            MetaCommand::Indexes { collection } => write!(f, "indexes {}", collection),
        }
    }
}

pub fn parse_meta_command(input: &str) -> Option<MetaCommand> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    let normalized = trimmed.trim_end_matches(';').trim();
    let lower = normalized.to_lowercase();

    match lower.as_str() {
        "\\q" | "\\quit" | ".quit" | ".exit" | "quit" | "exit" => {
            return Some(MetaCommand::Quit);
        }
        "\\help" | ".help" | "help" => return Some(MetaCommand::Help),
        "\\collections" | ".collections" => return Some(MetaCommand::Collections),
        _ => {}
    }

    // Collection names are case-sensitive, so only the command word is folded.
    let (command, rest) = normalized.split_once(char::is_whitespace)?;
    match command.to_lowercase().as_str() {
        "\\indexes" | ".indexes" => Some(MetaCommand::Indexes {
            collection: rest.trim().to_string(),
        }),
        _ => None,
    }
}
