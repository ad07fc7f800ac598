use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Tab completion for command names (first word) and local paths.
pub struct FmshHelper {
    commands: Vec<String>,
    cwd: Arc<RwLock<PathBuf>>,
    home: PathBuf,
}

impl FmshHelper {
    /// `commands` should contain every command name and alias.
    pub fn new(mut commands: Vec<String>, cwd: Arc<RwLock<PathBuf>>, home: PathBuf) -> Self {
        commands.sort();
        commands.dedup();
        Self { commands, cwd, home }
    }

    fn current_dir(&self) -> PathBuf {
        self.cwd.read().map(|cwd| cwd.clone()).unwrap_or_default()
    }

    fn complete_command(&self, word: &str) -> Vec<Pair> {
        self.commands
            .iter()
            .filter(|name| name.starts_with(word))
            .map(|name| Pair {
                display: name.clone(),
                replacement: name.clone(),
            })
            .collect()
    }

    fn complete_path(&self, word: &str) -> Vec<Pair> {
        let (dir_part, partial) = match word.rfind('/') {
            Some(i) => (&word[..=i], &word[i + 1..]),
            None => ("", word),
        };
        let dir = resolve_dir(&self.current_dir(), &self.home, dir_part);

        let Ok(entries) = std::fs::read_dir(&dir) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .flatten()
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                if !name.starts_with(partial) || (partial.is_empty() && name.starts_with('.')) {
                    return None;
                }
                let is_dir = entry.file_type().is_ok_and(|ft| ft.is_dir());
                Some(if is_dir { format!("{name}/") } else { name })
            })
            .collect();
        names.sort();

        names
            .into_iter()
            .map(|name| Pair {
                replacement: format!("{dir_part}{name}"),
                display: name,
            })
            .collect()
    }
}

impl Completer for FmshHelper {
    type Candidate = Pair;

    fn complete(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line_to_cursor = &line[..pos];
        let (start, word) = find_word_start(line_to_cursor);
        let is_first_word = line_to_cursor[..start].trim().is_empty();

        if is_first_word {
            if word.is_empty() {
                return Ok((pos, Vec::new()));
            }
            let mut completions = self.complete_command(word);
            if completions.is_empty() && (word.contains('/') || word.starts_with('.')) {
                completions = self.complete_path(word);
            }
            return Ok((start, completions));
        }

        Ok((start, self.complete_path(word)))
    }
}

fn find_word_start(line: &str) -> (usize, &str) {
    let mut start = line.len();
    for (i, c) in line.char_indices().rev() {
        if c.is_whitespace() || c == '"' || c == '\'' {
            break;
        }
        start = i;
    }
    (start, &line[start..])
}

/// Directory to list for the typed prefix `dir_part` (which ends in `/` or is empty).
fn resolve_dir(cwd: &Path, home: &Path, dir_part: &str) -> PathBuf {
    if dir_part.is_empty() {
        return cwd.to_path_buf();
    }
    if let Some(rest) = dir_part.strip_prefix("~/") {
        return home.join(rest);
    }
    let path = Path::new(dir_part);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

impl Hinter for FmshHelper {
    type Hint = String;

    fn hint(&self, _line: &str, _pos: usize, _ctx: &Context<'_>) -> Option<String> {
        None
    }
}

impl Highlighter for FmshHelper {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Borrowed(hint)
    }
}

impl Validator for FmshHelper {}

impl Helper for FmshHelper {}
