//! Command-line parser for fmsh
//!
//! Splits one input line into a command name and its arguments. There is no
//! shell grammar here: no pipes, redirections or variables. Quotes group
//! words, backslashes escape quotes and backslashes, and the parser never
//! fails.

use std::collections::HashMap;

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedCommand {
    pub command: String,
    pub args: Vec<String>,
}

impl ParsedCommand {
    pub fn is_empty(&self) -> bool {
        self.command.is_empty()
    }
}

/// Value of a parsed flag: either a bare switch or an attached value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagValue {
    Bool(bool),
    Value(String),
}

impl FlagValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FlagValue::Value(v) => Some(v),
            FlagValue::Bool(_) => None,
        }
    }

    pub fn is_set(&self) -> bool {
        !matches!(self, FlagValue::Bool(false))
    }
}

/// Result of [`parse_flags`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedFlags {
    /// Flag name (without leading dashes) to value
    pub flags: HashMap<String, FlagValue>,
    /// Non-flag tokens in their original order
    pub remaining: Vec<String>,
}

impl ParsedFlags {
    pub fn get(&self, name: &str) -> Option<&FlagValue> {
        self.flags.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.flags.get(name).is_some_and(FlagValue::is_set)
    }

    /// First value found under any of `names`, e.g. `["algorithm", "a"]`.
    pub fn value_of(&self, names: &[&str]) -> Option<&str> {
        names
            .iter()
            .find_map(|name| self.flags.get(*name).and_then(FlagValue::as_str))
    }
}

/// Parse a line into command and arguments, honoring `"` and `'` quoting.
///
/// A quote of the other kind inside a quoted run is literal. `\"`, `\'` and
/// `\\` produce the escaped character. An unterminated quote swallows the
/// rest of the line into one token. Empty tokens (such as `""`) are dropped.
pub fn parse_command_with_quotes(input: &str) -> ParsedCommand {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut quote_char = '"';
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let prev = if i > 0 { Some(chars[i - 1]) } else { None };

        if (c == '"' || c == '\'') && prev != Some('\\') {
            if !in_quotes {
                in_quotes = true;
                quote_char = c;
            } else if c == quote_char {
                in_quotes = false;
            } else {
                current.push(c);
            }
            i += 1;
            continue;
        }

        if c == ' ' && !in_quotes {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            i += 1;
            continue;
        }

        if c == '\\' {
            if let Some(&next) = chars.get(i + 1) {
                if next == '"' || next == '\'' || next == '\\' {
                    current.push(next);
                    i += 2;
                    continue;
                }
            }
        }

        current.push(c);
        i += 1;
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    let mut tokens = tokens.into_iter();
    ParsedCommand {
        command: tokens.next().unwrap_or_default(),
        args: tokens.collect(),
    }
}

/// The same parse as [`parse_command_with_quotes`], flattened.
pub fn tokenize(input: &str) -> Vec<String> {
    let parsed = parse_command_with_quotes(input);
    if parsed.command.is_empty() {
        return Vec::new();
    }
    let mut tokens = Vec::with_capacity(parsed.args.len() + 1);
    tokens.push(parsed.command);
    tokens.extend(parsed.args);
    tokens
}

/// Purely syntactic: `-x`, `--long` and `-123` are flags, `-` is not.
pub fn is_flag(s: &str) -> bool {
    s.starts_with('-') && s.chars().count() > 1
}

/// Split tokens into flags and remaining arguments.
///
/// `--key=value` splits on the first `=`, `--key` is a switch, and `-k`
/// takes the next token as its value unless that token looks like a flag.
pub fn parse_flags(args: &[String]) -> ParsedFlags {
    let mut parsed = ParsedFlags::default();
    let mut i = 0;

    while i < args.len() {
        let arg = &args[i];

        if let Some(long) = arg.strip_prefix("--") {
            match long.split_once('=') {
                Some((key, value)) => {
                    parsed
                        .flags
                        .insert(key.to_string(), FlagValue::Value(value.to_string()));
                }
                None => {
                    parsed.flags.insert(long.to_string(), FlagValue::Bool(true));
                }
            }
        } else if arg.starts_with('-') && arg.chars().count() == 2 {
            let key = arg[1..].to_string();
            match args.get(i + 1) {
                Some(next) if !is_flag(next) => {
                    parsed.flags.insert(key, FlagValue::Value(next.clone()));
                    i += 1;
                }
                _ => {
                    parsed.flags.insert(key, FlagValue::Bool(true));
                }
            }
        } else {
            parsed.remaining.push(arg.clone());
        }

        i += 1;
    }

    parsed
}

/// Escape backslashes, quotes and control whitespace for display.
pub fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}

/// Collapse runs of whitespace to a single space and trim both ends.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
