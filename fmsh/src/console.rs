//! Presentation layer
//!
//! The dispatch loop and handlers only ever write through [`Console`]. The
//! one value flowing back is the answer to a confirmation question.

use colored::Colorize;
use std::collections::VecDeque;
use std::io::{BufRead, Write};
use std::sync::Mutex;

pub trait Console: Send + Sync {
    /// Plain output line.
    fn print(&self, text: &str);

    fn success(&self, text: &str);

    /// Informational notice (cancellations, hints).
    fn notice(&self, text: &str);

    fn error(&self, text: &str);

    fn clear(&self);

    /// Ask a yes/no question; `true` means proceed.
    fn confirm(&self, question: &str) -> bool;

    fn table(&self, headers: &[&str], rows: &[Vec<String>]) {
        self.print(&format_table(headers, rows));
    }
}

/// Render rows under headers with padded columns and a separator line.
pub fn format_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            let len = cell.chars().count();
            match widths.get_mut(i) {
                Some(w) => *w = (*w).max(len),
                None => widths.push(len),
            }
        }
    }

    let render = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .enumerate()
            .map(|(i, cell)| format!("{:<width$}", cell, width = widths[i]))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&render(headers.to_vec()));
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    for row in rows {
        out.push('\n');
        out.push_str(&render(row.iter().map(String::as_str).collect()));
    }
    out
}

/// Styled console on the real terminal.
#[derive(Debug, Default)]
pub struct TerminalConsole;

impl TerminalConsole {
    pub fn new() -> Self {
        Self
    }
}

impl Console for TerminalConsole {
    fn print(&self, text: &str) {
        println!("{text}");
    }

    fn success(&self, text: &str) {
        println!("{}", text.green());
    }

    fn notice(&self, text: &str) {
        println!("{}", text.yellow());
    }

    fn error(&self, text: &str) {
        eprintln!("{}", text.red());
    }

    fn clear(&self) {
        print!("\x1b[2J\x1b[1;1H");
        let _ = std::io::stdout().flush();
    }

    fn confirm(&self, question: &str) -> bool {
        print!("{} {} ", question.yellow(), "(y/n):".bold());
        let _ = std::io::stdout().flush();

        let mut answer = String::new();
        match std::io::stdin().lock().read_line(&mut answer) {
            Ok(_) => is_yes(&answer),
            Err(_) => false,
        }
    }
}

pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Output,
    Success,
    Notice,
    Error,
    Question,
}

/// In-memory console that records every line and answers confirmations
/// from a queue. Used to embed the shell and in tests.
#[derive(Debug, Default)]
pub struct CapturedConsole {
    lines: Mutex<Vec<(LineKind, String)>>,
    answers: Mutex<VecDeque<bool>>,
    clears: Mutex<usize>,
}

impl CapturedConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an answer for the next confirmation question.
    pub fn answer(&self, yes: bool) {
        self.answers.lock().unwrap_or_else(|e| e.into_inner()).push_back(yes);
    }

    pub fn lines(&self) -> Vec<(LineKind, String)> {
        self.lines.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn lines_of(&self, kind: LineKind) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, text)| text)
            .collect()
    }

    /// Plain output joined with newlines.
    pub fn output(&self) -> String {
        self.lines_of(LineKind::Output).join("\n")
    }

    pub fn errors(&self) -> Vec<String> {
        self.lines_of(LineKind::Error)
    }

    pub fn notices(&self) -> Vec<String> {
        self.lines_of(LineKind::Notice)
    }

    pub fn questions(&self) -> Vec<String> {
        self.lines_of(LineKind::Question)
    }

    pub fn clear_count(&self) -> usize {
        *self.clears.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Forget everything recorded so far; queued answers are kept.
    pub fn reset(&self) {
        self.lines.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    fn push(&self, kind: LineKind, text: &str) {
        self.lines
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((kind, text.to_string()));
    }
}

impl Console for CapturedConsole {
    fn print(&self, text: &str) {
        self.push(LineKind::Output, text);
    }

    fn success(&self, text: &str) {
        self.push(LineKind::Success, text);
    }

    fn notice(&self, text: &str) {
        self.push(LineKind::Notice, text);
    }

    fn error(&self, text: &str) {
        self.push(LineKind::Error, text);
    }

    fn clear(&self) {
        *self.clears.lock().unwrap_or_else(|e| e.into_inner()) += 1;
    }

    fn confirm(&self, question: &str) -> bool {
        self.push(LineKind::Question, question);
        self.answers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or(false)
    }
}
