//! Chat command vocabulary and the text-to-command parser.

const COMMAND_PREFIX: char = '/';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Start,
    NewEmployee,
    TimeIn,
    TimeOut,
    Report,
}

impl Command {
    pub fn from_token(token: &str) -> Option<Self> {
        let normalized = normalize_token(token);
        match normalized.as_str() {
            "/start" => Some(Self::Start),
            "/new" => Some(Self::NewEmployee),
            "/timein" => Some(Self::TimeIn),
            "/timeout" => Some(Self::TimeOut),
            "/report" => Some(Self::Report),
            _ => None,
        }
    }

    pub fn as_label(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::NewEmployee => "new",
            Self::TimeIn => "timein",
            Self::TimeOut => "timeout",
            Self::Report => "report",
        }
    }

    pub fn takes_parameter(self) -> bool {
        !matches!(self, Self::Start)
    }
}

/// A message read in the idle state, split into command and parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedInput {
    pub command: Command,
    /// `None` for a bare command token, `Some` (possibly empty) otherwise.
    pub parameter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnrecognizedCommand(pub String);

pub fn parse_input(raw: &str) -> Result<ParsedInput, UnrecognizedCommand> {
    let text = raw.trim_start();
    let (token, parameter) = match text.find(char::is_whitespace) {
        Some(split_at) => {
            let (token, rest) = text.split_at(split_at);
            (token, Some(rest.trim().to_owned()))
        }
        None => (text, None),
    };

    let command =
        Command::from_token(token).ok_or_else(|| UnrecognizedCommand(token.to_owned()))?;

    Ok(ParsedInput { command, parameter })
}

/// Lowercases, adds the `/` prefix when missing and drops a `@botname` suffix.
fn normalize_token(token: &str) -> String {
    let lowered = token.to_lowercase();
    let without_mention = match lowered.split_once('@') {
        Some((command, _bot)) => command.to_owned(),
        None => lowered,
    };

    if without_mention.starts_with(COMMAND_PREFIX) {
        without_mention
    } else {
        format!("{COMMAND_PREFIX}{without_mention}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_commands_with_and_without_prefix() {
        assert_eq!(Command::from_token("new"), Some(Command::NewEmployee));
        assert_eq!(Command::from_token("/new"), Some(Command::NewEmployee));
        assert_eq!(Command::from_token("TimeIn"), Some(Command::TimeIn));
        assert_eq!(Command::from_token("/REPORT"), Some(Command::Report));
    }

    #[test]
    fn ignores_bot_mention_suffix() {
        assert_eq!(
            Command::from_token("/timeout@shiftlog_bot"),
            Some(Command::TimeOut)
        );
    }

    #[test]
    fn rejects_unknown_tokens() {
        assert_eq!(Command::from_token("hello"), None);
        assert_eq!(Command::from_token("/"), None);
        assert_eq!(Command::from_token(""), None);
    }

    #[test]
    fn bare_command_has_no_parameter() {
        let parsed = parse_input("timein").expect("command should parse");

        assert_eq!(parsed.command, Command::TimeIn);
        assert_eq!(parsed.parameter, None);
    }

    #[test]
    fn inline_parameter_is_trimmed_and_keeps_inner_spaces() {
        let parsed = parse_input("/new   Alice  Smith ").expect("command should parse");

        assert_eq!(parsed.command, Command::NewEmployee);
        assert_eq!(parsed.parameter.as_deref(), Some("Alice  Smith"));
    }

    #[test]
    fn trailing_whitespace_yields_empty_parameter() {
        let parsed = parse_input("new ").expect("command should parse");

        assert_eq!(parsed.parameter.as_deref(), Some(""));
    }

    #[test]
    fn unknown_command_reports_the_token() {
        let error = parse_input("dance now").expect_err("unknown command must fail");

        assert_eq!(error, UnrecognizedCommand("dance".to_owned()));
    }

    #[test]
    fn start_is_the_only_command_without_parameter() {
        assert!(!Command::Start.takes_parameter());
        assert!(Command::NewEmployee.takes_parameter());
        assert!(Command::Report.takes_parameter());
    }
}
