//! Plain-text view and stdin confirmation for the `tasks` subcommands.

use std::io::{self, BufRead, Write};

use super::controller::{Confirm, TaskView, UiState};
use super::view::EMPTY_LIST_MESSAGE;
use crate::types::Task;

/// Writes one line per task to `out`, errors to `err`.
pub struct TerminalView<W: Write, E: Write> {
    out: W,
    err: E,
    failed: bool,
}

impl TerminalView<io::Stdout, io::Stderr> {
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }
}

impl<W: Write, E: Write> TerminalView<W, E> {
    pub fn new(out: W, err: E) -> Self {
        Self {
            out,
            err,
            failed: false,
        }
    }

    /// Whether any error was reported.
    pub fn failed(&self) -> bool {
        self.failed
    }

    pub fn into_parts(self) -> (W, E) {
        (self.out, self.err)
    }
}

impl<W: Write, E: Write> TaskView for TerminalView<W, E> {
    fn render_tasks(&mut self, state: &UiState, tasks: &[Task]) {
        let _ = writeln!(self.out, "{} tasks of {}:", state.filter, state.user);
        if tasks.is_empty() {
            let _ = writeln!(self.out, "  {}", EMPTY_LIST_MESSAGE);
            return;
        }
        for task in tasks {
            let mark = if task.status.is_completed() { 'x' } else { ' ' };
            let _ = writeln!(
                self.out,
                "  [{}] #{:<4} {}  ({})",
                mark,
                task.id,
                task.title,
                task.created_at.format("%Y-%m-%d %H:%M")
            );
        }
    }

    fn show_error(&mut self, context: &str, message: &str) {
        self.failed = true;
        let _ = writeln!(self.err, "{}: {}", context, message);
    }
}

/// Asks on stdin; anything but `y`/`yes` declines.
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        print!("{} [y/N] ", prompt);
        let _ = io::stdout().flush();

        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        parse_answer(&answer)
    }
}

fn parse_answer(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
