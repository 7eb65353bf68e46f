// Line-oriented console front end.
//
// Reads one command per line from an async reader and writes responses to an
// async writer, so the binary runs it on stdin/stdout and tests drive it from
// in-memory buffers. Parsing is separate from execution and has no I/O.

use std::fmt;

use anyhow::Context;
use pairpick_core::{CandidateSource, ComparisonSession, Direction, PollKey, Slot, Uid};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

pub const HELP: &str = "\
commands:
  next a|b          show the next item in a slot (history, else a suggestion)
  prev a|b          show the previous item in a slot (history, else a suggestion)
  pick a|b <uid>    show a specific item in a slot
  auto              fill every empty slot with a suggestion
  compare           record the displayed pair as compared
  show              print the displayed pair
  poll <name>       switch the active poll
  logout            forget everything from this session
  help              print this list
  quit              leave";

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Step(Slot, Direction),
    Pick(Slot, Uid),
    Auto,
    Compare,
    Show,
    Poll(PollKey),
    Logout,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty command")]
    Empty,

    #[error("unknown command `{0}` (try `help`)")]
    UnknownCommand(String),

    #[error("`{command}` needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("`{0}` is not a slot, expected `a` or `b`")]
    InvalidSlot(String),

    #[error("`{command}` does not take `{extra}`")]
    UnexpectedArgument { command: &'static str, extra: String },
}

/// Parse one console line. Keywords and slot names are case-insensitive;
/// identifiers and poll names are taken verbatim.
pub fn parse_command(line: &str) -> Result<Command, ParseError> {
    let mut words = line.split_whitespace();
    let Some(keyword) = words.next() else {
        return Err(ParseError::Empty);
    };

    let command = match keyword.to_ascii_lowercase().as_str() {
        "next" => Command::Step(slot_arg("next", words.next())?, Direction::Right),
        "prev" => Command::Step(slot_arg("prev", words.next())?, Direction::Left),
        "pick" => {
            let slot = slot_arg("pick", words.next())?;
            let uid = words.next().ok_or(ParseError::MissingArgument {
                command: "pick",
                argument: "an identifier",
            })?;
            Command::Pick(slot, Uid::from(uid))
        }
        "poll" => {
            let name = words.next().ok_or(ParseError::MissingArgument {
                command: "poll",
                argument: "a poll name",
            })?;
            Command::Poll(PollKey::from(name))
        }
        "auto" => Command::Auto,
        "compare" => Command::Compare,
        "show" => Command::Show,
        "logout" => Command::Logout,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(ParseError::UnknownCommand(other.to_string())),
    };

    if let Some(extra) = words.next() {
        return Err(ParseError::UnexpectedArgument {
            command: command.keyword(),
            extra: extra.to_string(),
        });
    }
    Ok(command)
}

fn slot_arg(command: &'static str, word: Option<&str>) -> Result<Slot, ParseError> {
    match word.map(str::to_ascii_lowercase).as_deref() {
        Some("a") => Ok(Slot::A),
        Some("b") => Ok(Slot::B),
        Some(_) => Err(ParseError::InvalidSlot(word.unwrap_or_default().to_string())),
        None => Err(ParseError::MissingArgument {
            command,
            argument: "a slot (`a` or `b`)",
        }),
    }
}

impl Command {
    fn keyword(&self) -> &'static str {
        match self {
            Command::Step(_, Direction::Right) => "next",
            Command::Step(_, Direction::Left) => "prev",
            Command::Pick(..) => "pick",
            Command::Auto => "auto",
            Command::Compare => "compare",
            Command::Show => "show",
            Command::Poll(_) => "poll",
            Command::Logout => "logout",
            Command::Help => "help",
            Command::Quit => "quit",
        }
    }
}

// ---------------------------------------------------------------------------
// Loop
// ---------------------------------------------------------------------------

enum Flow {
    Continue,
    Quit,
}

struct Shown<'a>(Option<&'a Uid>);

impl fmt::Display for Shown<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(uid) => write!(f, "{uid}"),
            None => f.write_str("-"),
        }
    }
}

/// Run the console until `quit` or end of input. Returns the poll that was
/// active when the loop ended.
///
/// Source failures are reported on `writer` and the loop keeps going; only
/// I/O failures on the reader or writer end it early.
pub async fn run<S, R, W>(
    session: &mut ComparisonSession<S>,
    poll: PollKey,
    reader: R,
    mut writer: W,
) -> anyhow::Result<PollKey>
where
    S: CandidateSource,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut poll = poll;
    let mut lines = reader.lines();
    info!("Console started on poll {}", poll);
    say(&mut writer, &format!("poll {poll}; type `help` for commands")).await?;

    while let Some(line) = lines.next_line().await.context("failed to read command")? {
        if line.trim().is_empty() {
            continue;
        }

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(e) => {
                say(&mut writer, &format!("error: {e}")).await?;
                continue;
            }
        };
        debug!("Console command: {:?}", command);

        if let Flow::Quit = execute(session, &mut poll, command, &mut writer).await? {
            break;
        }
    }

    writer.flush().await.context("failed to flush console output")?;
    info!("Console stopped");
    Ok(poll)
}

async fn execute<S, W>(
    session: &mut ComparisonSession<S>,
    poll: &mut PollKey,
    command: Command,
    writer: &mut W,
) -> anyhow::Result<Flow>
where
    S: CandidateSource,
    W: AsyncWrite + Unpin,
{
    match command {
        Command::Step(slot, direction) => match session.step(poll, slot, direction).await {
            Ok(Some(uid)) => say(writer, &format!("{slot}: {uid}")).await?,
            Ok(None) => say(writer, &format!("{slot}: nothing more to show")).await?,
            Err(e) => report_fetch_error(writer, poll, &e).await?,
        },
        Command::Pick(slot, uid) => {
            say(writer, &format!("{slot}: {uid}")).await?;
            session.pick(poll, slot, uid);
        }
        Command::Auto => match session.autofill(poll).await {
            Ok(_) => show(session, poll, writer).await?,
            Err(e) => report_fetch_error(writer, poll, &e).await?,
        },
        Command::Compare => {
            if session.record_comparison(poll) {
                say(writer, "comparison recorded").await?;
            } else {
                say(writer, "nothing recorded (need two different items, not yet compared)")
                    .await?;
            }
        }
        Command::Show => show(session, poll, writer).await?,
        Command::Poll(next) => {
            info!("Switching poll {} -> {}", poll, next);
            *poll = next;
            say(writer, &format!("poll {poll}")).await?;
        }
        Command::Logout => {
            session.logout();
            say(writer, "session cleared").await?;
        }
        Command::Help => say(writer, HELP).await?,
        Command::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

async fn show<S, W>(session: &ComparisonSession<S>, poll: &PollKey, writer: &mut W) -> anyhow::Result<()>
where
    S: CandidateSource,
    W: AsyncWrite + Unpin,
{
    let a = Shown(session.current(poll, Slot::A));
    let b = Shown(session.current(poll, Slot::B));
    say(writer, &format!("A: {a}  B: {b}")).await
}

async fn report_fetch_error<W, E>(writer: &mut W, poll: &PollKey, error: &E) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
    E: std::error::Error,
{
    warn!("Fetching candidates for poll {} failed: {}", poll, error);
    say(writer, &format!("error: could not fetch candidates: {error}")).await
}

async fn say<W: AsyncWrite + Unpin>(writer: &mut W, text: &str) -> anyhow::Result<()> {
    writer
        .write_all(format!("{text}\n").as_bytes())
        .await
        .context("failed to write console output")
}
