// Line-oriented driver for a correction session.
//
// Reads one command per line and prints the session's view after each one.
// Alerts go to stderr as `alert: <column>: <message>`.

use std::io::{self, BufRead, Write};

use colcheck_core::{CellEdit, FlaggedCell};
use colcheck_verify::{Action, CorrectionSession, SessionState, View};

use crate::CliError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Act(Action),
    /// `set <row> <value>`: stage a correction for a listed row (1-based).
    Set { row: usize, value: String },
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };
    let command = match word.to_ascii_lowercase().as_str() {
        "undo" => Command::Act(Action::Undo),
        "inspect" | "see" => Command::Act(Action::Inspect),
        "accept" | "carry-on" => Command::Act(Action::Accept),
        "retry" => Command::Act(Action::Retry),
        "fix" => Command::Act(Action::Fix),
        "done" => Command::Act(Action::Done),
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        "set" => {
            let (row, value) = match rest.split_once(char::is_whitespace) {
                Some((r, v)) => (r, v.trim()),
                None => (rest, ""),
            };
            let row: usize = row
                .parse()
                .map_err(|_| format!("'{}' is not a row number", row))?;
            if row == 0 {
                return Err("rows are numbered from 1".to_string());
            }
            Command::Set { row, value: unquote(value).to_string() }
        }
        other => return Err(format!("unknown command '{}'", other)),
    };
    if rest.is_empty() || matches!(command, Command::Set { .. }) {
        Ok(command)
    } else {
        Err(format!("'{}' takes no arguments", word))
    }
}

/// `""` stages an empty value.
fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Run the session until it finishes or input ends. Returns whether it
/// reached `Done` or `Reverted`.
pub fn drive<R: BufRead, W: Write>(
    session: &mut CorrectionSession<'_>,
    input: R,
    out: &mut W,
) -> Result<bool, CliError> {
    let mut staged: Vec<CellEdit> = Vec::new();
    let mut lines = input.lines();

    show(session, &staged, out)?;
    while !session.is_finished() {
        write!(out, "> ").map_err(io_err)?;
        out.flush().map_err(io_err)?;

        let line = match lines.next() {
            Some(line) => line.map_err(|e| CliError::io(format!("stdin: {}", e)))?,
            None => {
                writeln!(out).map_err(io_err)?;
                return Ok(false);
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(msg) => {
                writeln!(out, "{} (type 'help' for commands)", msg).map_err(io_err)?;
                continue;
            }
        };

        let before = session.state();
        let result = match command {
            Command::Quit => return Ok(false),
            Command::Help => {
                help(session, out)?;
                continue;
            }
            Command::Set { row, value } => {
                stage(session, &mut staged, row, value, out)?;
                continue;
            }
            Command::Act(Action::Undo) => session.undo(),
            Command::Act(Action::Inspect) => session.inspect(),
            Command::Act(Action::Accept) => session.accept(),
            Command::Act(Action::Retry) => session.retry(),
            Command::Act(Action::Fix) => session.fix(std::mem::take(&mut staged)),
            Command::Act(Action::Done) => session.done(),
        };
        if let Err(e) = result {
            writeln!(out, "{}", e).map_err(io_err)?;
            continue;
        }
        if session.state() != before {
            staged.clear();
        }
        show(session, &staged, out)?;
    }

    Ok(true)
}

fn stage<W: Write>(
    session: &CorrectionSession<'_>,
    staged: &mut Vec<CellEdit>,
    row: usize,
    value: String,
    out: &mut W,
) -> Result<(), CliError> {
    let column = match session.view() {
        View::Inspecting { column, .. } => column,
        _ => {
            writeln!(out, "'set' is only available while inspecting values").map_err(io_err)?;
            return Ok(());
        }
    };
    if !session.flagged().iter().any(|cell| cell.row + 1 == row) {
        writeln!(out, "row {} is not listed", row).map_err(io_err)?;
        return Ok(());
    }

    staged.retain(|edit| edit.row + 1 != row);
    writeln!(out, "row {}: {:?} staged", row, value).map_err(io_err)?;
    staged.push(CellEdit { row: row - 1, column, value });
    Ok(())
}

fn show<W: Write>(session: &mut CorrectionSession<'_>, staged: &[CellEdit], out: &mut W) -> Result<(), CliError> {
    for alert in session.take_alerts() {
        eprintln!("alert: {}: {}", alert.column, alert.message);
    }
    let position = session.state().index().map(|i| (i + 1, session.queue().len()));
    render(&session.view(), position, staged, out)
}

fn render<W: Write>(
    view: &View,
    position: Option<(usize, usize)>,
    staged: &[CellEdit],
    out: &mut W,
) -> Result<(), CliError> {
    let counter = position.map(|(n, of)| format!("[{}/{}] ", n, of)).unwrap_or_default();
    match view {
        View::Presenting { verdict, prompt, actions, .. } => {
            writeln!(out, "{}{}", counter, prompt.title).map_err(io_err)?;
            writeln!(out, "{}", prompt.message).map_err(io_err)?;
            writeln!(out, "{}", prompt.details).map_err(io_err)?;
            if let Some(v) = verdict {
                writeln!(out, "{}", v.message).map_err(io_err)?;
            }
            writeln!(out, "{}", prompt.example_line()).map_err(io_err)?;
            writeln!(out, "Actions: {}", action_list(actions)).map_err(io_err)?;
        }
        View::Inspecting { column, example_value, cells, note, tip, actions, .. } => {
            writeln!(out, "{}Values to correct in {} (example: {})", counter, column, example_value)
                .map_err(io_err)?;
            if cells.is_empty() {
                writeln!(out, "  no flagged rows left").map_err(io_err)?;
            }
            for cell in cells {
                writeln!(out, "  {}", cell_line(cell, staged)).map_err(io_err)?;
            }
            writeln!(out, "{}", note).map_err(io_err)?;
            if let Some(tip) = tip {
                writeln!(out, "{}", tip).map_err(io_err)?;
            }
            writeln!(out, "Actions: set <row> <value>, {}", action_list(actions)).map_err(io_err)?;
        }
        View::Editing { .. } => {}
        View::Done => writeln!(out, "All columns verified.").map_err(io_err)?,
        View::Reverted => writeln!(out, "Changes undone.").map_err(io_err)?,
    }
    Ok(())
}

fn cell_line(cell: &FlaggedCell, staged: &[CellEdit]) -> String {
    match staged.iter().find(|edit| edit.row == cell.row) {
        Some(edit) => format!("row {}: {:?} -> {:?}", cell.row + 1, cell.value, edit.value),
        None => format!("row {}: {:?}", cell.row + 1, cell.value),
    }
}

fn action_list(actions: &[Action]) -> String {
    actions
        .iter()
        .map(|a| format!("{} ({})", a, a.label()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn help<W: Write>(session: &CorrectionSession<'_>, out: &mut W) -> Result<(), CliError> {
    writeln!(out, "Commands available now:").map_err(io_err)?;
    if matches!(session.state(), SessionState::Inspecting(_)) {
        writeln!(out, "  set <row> <value>  stage a correction (\"\" for empty)").map_err(io_err)?;
    }
    for action in session.available_actions() {
        let what = match action {
            Action::Undo => "revert everything back to before the wizard ran",
            Action::Inspect => "list the unexpected values",
            Action::Accept => "keep the column as it is and move on",
            Action::Retry => "run the verification query again",
            Action::Fix => "apply staged corrections and verify again",
            Action::Done => "stop correcting this column and move on",
        };
        writeln!(out, "  {:<17}  {}", action.to_string(), what).map_err(io_err)?;
    }
    writeln!(out, "  quit               leave without finishing").map_err(io_err)?;
    Ok(())
}

fn io_err(e: io::Error) -> CliError {
    CliError::io(format!("stdout: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_actions_case_insensitively() {
        assert_eq!(parse_command("Accept"), Ok(Command::Act(Action::Accept)));
        assert_eq!(parse_command("  inspect "), Ok(Command::Act(Action::Inspect)));
        assert_eq!(parse_command("?"), Ok(Command::Help));
        assert!(parse_command("accept now").is_err());
        assert!(parse_command("rollback").is_err());
    }

    #[test]
    fn parses_set_with_spaces_in_value() {
        assert_eq!(
            parse_command("set 4 EC1A 1BB"),
            Ok(Command::Set { row: 4, value: "EC1A 1BB".into() })
        );
        assert_eq!(parse_command("set 2 \"\""), Ok(Command::Set { row: 2, value: String::new() }));
        assert!(parse_command("set x 1").is_err());
        assert!(parse_command("set 0 1").is_err());
    }

    #[test]
    fn staged_value_is_shown_next_to_cell() {
        let cell = FlaggedCell { row: 3, value: "n/a".into() };
        let staged = vec![CellEdit { row: 3, column: "Postcode".into(), value: "E1 6AN".into() }];
        assert_eq!(cell_line(&cell, &staged), "row 4: \"n/a\" -> \"E1 6AN\"");
        assert_eq!(cell_line(&cell, &[]), "row 4: \"n/a\"");
    }
}
