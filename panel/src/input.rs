//! Line-oriented input.

use crate::terminal::TerminalUi;
use panelsync_sync::InputEvent;
use panelsync_types::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// One parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum InputCommand {
    Set { key: String, value: Value },
    Toggle { key: String },
}

impl InputCommand {
    pub fn key(&self) -> &str {
        match self {
            Self::Set { key, .. } | Self::Toggle { key } => key,
        }
    }
}

/// Parses `key=value` or a bare `key`. Blank lines and `#` comments yield
/// `None`.
pub fn parse_line(line: &str) -> panelsync_types::Result<Option<InputCommand>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    match line.split_once('=') {
        Some((key, value)) => {
            let key = key.trim();
            if key.is_empty() {
                return Err(panelsync_types::Error::InvalidValue(line.to_string()));
            }
            Ok(Some(InputCommand::Set {
                key: key.to_string(),
                value: value.parse()?,
            }))
        }
        None => Ok(Some(InputCommand::Toggle {
            key: line.to_string(),
        })),
    }
}

/// Turns a command into the event the controller expects, or `None` when
/// the widget refuses it.
fn to_event(command: InputCommand, ui: &TerminalUi) -> Option<InputEvent> {
    if !ui.is_enabled(command.key()) {
        warn!("{} is locked awaiting confirmation", command.key());
        return None;
    }
    match command {
        InputCommand::Set { key, value } => Some(InputEvent::Changed { key, value }),
        InputCommand::Toggle { key } => match ui.toggle(&key) {
            Some(_) => Some(InputEvent::Activated { key }),
            None => {
                warn!("{} is not a toggle", key);
                None
            }
        },
    }
}

/// Reads commands until EOF or until the controller goes away.
pub async fn read_inputs<R>(
    reader: R,
    ui: TerminalUi,
    inputs: mpsc::Sender<InputEvent>,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                warn!("Ignoring {:?}: {}", line, e);
                continue;
            }
        };
        let Some(event) = to_event(command, &ui) else {
            continue;
        };
        if inputs.send(event).await.is_err() {
            debug!("Controller stopped, closing input");
            break;
        }
    }
    Ok(())
}
