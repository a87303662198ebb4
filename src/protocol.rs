// Message types between the stdin reader, the app loop, and the printer.

use thiserror::Error;

use crate::draft::position::Position;
use crate::valuation::recommend::RecommendationsWeights;

// ---------------------------------------------------------------------------
// User commands
// ---------------------------------------------------------------------------

/// A command typed at the prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    /// Draft a player onto the user's team.
    Mine(String),
    /// Mark a player as taken by another team.
    Gone(String),
    Undo,
    /// Show the top of the ranking; `None` uses the configured default.
    Top(Option<usize>),
    /// Restrict the view to one position; `None` shows all.
    FilterPosition(Option<Position>),
    /// Filter the view by player/team substring; `None` clears the search.
    Find(Option<String>),
    Roster,
    Scarcity,
    /// Replace the scoring weights; `None` prints the current ones.
    Weights(Option<RecommendationsWeights>),
    Save(String),
    Load(String),
    Reset,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("unknown command '{0}' (type 'help' for a list)")]
    UnknownCommand(String),

    #[error("'{command}' needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("unknown position '{0}' (use QB, RB, WR, TE, DST, K or ALL)")]
    UnknownPosition(String),

    #[error("weights takes exactly four numbers: <delta> <vor> <scarcity> <bench_boost>")]
    WeightCount,
}

/// Parse one input line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<UserCommand>, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };
    let arg = (!rest.is_empty()).then(|| rest.to_string());

    let cmd = match verb.to_lowercase().as_str() {
        "mine" | "m" => UserCommand::Mine(arg.ok_or(ParseError::MissingArgument {
            command: "mine",
            argument: "a player name",
        })?),
        "gone" | "g" => UserCommand::Gone(arg.ok_or(ParseError::MissingArgument {
            command: "gone",
            argument: "a player name",
        })?),
        "undo" | "u" => UserCommand::Undo,
        "top" | "t" => UserCommand::Top(arg.map(|n| parse_count(&n)).transpose()?),
        "pos" | "p" => {
            let Some(arg) = arg else {
                return Err(ParseError::MissingArgument {
                    command: "pos",
                    argument: "a position or ALL",
                });
            };
            if arg.eq_ignore_ascii_case("all") {
                UserCommand::FilterPosition(None)
            } else {
                let pos =
                    Position::from_str_pos(&arg).ok_or(ParseError::UnknownPosition(arg))?;
                UserCommand::FilterPosition(Some(pos))
            }
        }
        "find" | "f" => UserCommand::Find(arg),
        "roster" | "r" => UserCommand::Roster,
        "scarcity" | "s" => UserCommand::Scarcity,
        "weights" | "w" => UserCommand::Weights(arg.map(|a| parse_weights(&a)).transpose()?),
        "save" => UserCommand::Save(arg.ok_or(ParseError::MissingArgument {
            command: "save",
            argument: "a file path",
        })?),
        "load" => UserCommand::Load(arg.ok_or(ParseError::MissingArgument {
            command: "load",
            argument: "a file path",
        })?),
        "reset" => UserCommand::Reset,
        "help" | "h" | "?" => UserCommand::Help,
        "quit" | "q" | "exit" => UserCommand::Quit,
        other => return Err(ParseError::UnknownCommand(other.to_string())),
    };
    Ok(Some(cmd))
}

fn parse_count(s: &str) -> Result<usize, ParseError> {
    s.parse::<usize>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| ParseError::InvalidNumber(s.to_string()))
}

fn parse_weight(s: &str) -> Result<f64, ParseError> {
    s.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .ok_or_else(|| ParseError::InvalidNumber(s.to_string()))
}

fn parse_weights(s: &str) -> Result<RecommendationsWeights, ParseError> {
    let parts: Vec<&str> = s.split_whitespace().collect();
    let [d, v, sc, b] = parts.as_slice() else {
        return Err(ParseError::WeightCount);
    };
    Ok(RecommendationsWeights {
        w_delta: parse_weight(d)?,
        w_vor: parse_weight(v)?,
        w_scarcity: parse_weight(sc)?,
        bench_depth_boost: parse_weight(b)?,
    })
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Updates pushed from the app loop to the printer.
#[derive(Debug, Clone, PartialEq)]
pub enum UiUpdate {
    /// Rendered text to print.
    Output(String),
    /// A command failed; printed on stderr.
    Error(String),
    /// The app loop has stopped.
    Shutdown,
}
