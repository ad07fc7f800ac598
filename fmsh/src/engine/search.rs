//! Recursive search: file names by glob, exact names, and file contents

use super::walk::Walker;
use super::EntryKind;
use crate::cancel::{self, CancellationToken};
use crate::error::FmshResult;
use regex::Regex;
use std::path::{Path, PathBuf};

pub(crate) fn contains_glob_chars(s: &str) -> bool {
    s.chars().any(|c| c == '*' || c == '?' || c == '[')
}

/// Shell-style glob match on a single name: `*`, `?` and `[...]` classes
/// (with `!`/`^` negation and `a-z` ranges).
///
/// Runs in O(pattern * name): on a mismatch only the most recent `*` is
/// retried, one name character further along.
pub fn match_glob_pattern(pattern: &str, name: &str) -> bool {
    let tokens = compile_glob(pattern);
    let name: Vec<char> = name.chars().collect();

    let (mut p, mut n) = (0, 0);
    // Token index after the last `*`, and the name index it is retried from.
    let mut backtrack: Option<(usize, usize)> = None;
    while n < name.len() {
        match tokens.get(p) {
            Some(GlobToken::Star) => {
                p += 1;
                backtrack = Some((p, n));
                continue;
            }
            Some(token) if token.matches(name[n]) => {
                p += 1;
                n += 1;
                continue;
            }
            _ => {}
        }
        match backtrack {
            Some((star_p, star_n)) => {
                p = star_p;
                n = star_n + 1;
                backtrack = Some((star_p, n));
            }
            None => return false,
        }
    }
    tokens[p..].iter().all(|t| matches!(t, GlobToken::Star))
}

enum GlobToken {
    Star,
    AnyChar,
    Class(CharClass),
    Literal(char),
}

impl GlobToken {
    fn matches(&self, c: char) -> bool {
        match self {
            Self::Star | Self::AnyChar => true,
            Self::Class(class) => class.matches(c),
            Self::Literal(l) => *l == c,
        }
    }
}

fn compile_glob(pattern: &str) -> Vec<GlobToken> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut rest = chars.as_slice();
    let mut tokens = Vec::new();
    while let Some((&c, after)) = rest.split_first() {
        rest = after;
        let token = match c {
            '*' => {
                // Runs of stars behave like one.
                if matches!(tokens.last(), Some(GlobToken::Star)) {
                    continue;
                }
                GlobToken::Star
            }
            '?' => GlobToken::AnyChar,
            '[' => match parse_class(after) {
                Some((class, remaining)) => {
                    rest = remaining;
                    GlobToken::Class(class)
                }
                // An unclosed class is a literal '['
                None => GlobToken::Literal('['),
            },
            c => GlobToken::Literal(c),
        };
        tokens.push(token);
    }
    tokens
}

struct CharClass {
    negated: bool,
    ranges: Vec<(char, char)>,
}

impl CharClass {
    fn matches(&self, c: char) -> bool {
        let hit = self.ranges.iter().any(|(lo, hi)| *lo <= c && c <= *hi);
        hit != self.negated
    }
}

/// Parse the body of a `[...]` class; returns the class and the pattern after `]`.
fn parse_class(pattern: &[char]) -> Option<(CharClass, &[char])> {
    let mut i = 0;
    let mut negated = false;
    if matches!(pattern.first(), Some('!' | '^')) {
        negated = true;
        i += 1;
    }

    let mut ranges = Vec::new();
    let mut first = true;
    while i < pattern.len() {
        let c = pattern[i];
        if c == ']' && !first {
            return Some((CharClass { negated, ranges }, &pattern[i + 1..]));
        }
        first = false;
        if pattern.get(i + 1) == Some(&'-') && pattern.get(i + 2).is_some_and(|end| *end != ']') {
            ranges.push((c, pattern[i + 2]));
            i += 3;
        } else {
            ranges.push((c, c));
            i += 1;
        }
    }
    None
}

/// Every path below `root` whose name matches `pattern`.
///
/// A pattern without glob characters matches names containing it.
pub async fn find<F>(root: &Path, pattern: &str, token: &CancellationToken, mut on_match: F) -> FmshResult<usize>
where
    F: FnMut(&Path) + Send,
{
    let glob = contains_glob_chars(pattern);
    let mut walker = Walker::new(root, token).await?;
    let mut count = 0;
    while let Some(entry) = walker.next().await? {
        let name = entry.file_name();
        let hit = if glob {
            match_glob_pattern(pattern, &name)
        } else {
            name.contains(pattern)
        };
        if hit {
            count += 1;
            on_match(&entry.path);
        }
    }
    Ok(count)
}

/// Every path below `root` whose name equals `name`, ignoring case.
pub async fn where_is<F>(root: &Path, name: &str, token: &CancellationToken, mut on_match: F) -> FmshResult<usize>
where
    F: FnMut(&Path) + Send,
{
    let wanted = name.to_lowercase();
    let mut walker = Walker::new(root, token).await?;
    let mut count = 0;
    while let Some(entry) = walker.next().await? {
        if entry.file_name().to_lowercase() == wanted {
            count += 1;
            on_match(&entry.path);
        }
    }
    Ok(count)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrepMatch {
    pub path: PathBuf,
    pub line_number: usize,
    pub line: String,
}

/// Search file contents line by line. `target` may be a file or a directory
/// tree; files that are not valid UTF-8 are skipped.
pub async fn grep<F>(target: &Path, regex: &Regex, token: &CancellationToken, mut on_match: F) -> FmshResult<usize>
where
    F: FnMut(&GrepMatch) + Send,
{
    let meta = super::stat(target, token).await?;
    let mut count = 0;

    if !meta.is_dir() {
        return grep_file(target, regex, token, &mut on_match).await;
    }

    let mut walker = Walker::new(target, token).await?;
    while let Some(entry) = walker.next().await? {
        if entry.kind != EntryKind::File {
            continue;
        }
        match grep_file(&entry.path, regex, token, &mut on_match).await {
            Ok(n) => count += n,
            Err(e) if e.is_aborted() => return Err(e),
            Err(e) => {
                tracing::debug!(path = %entry.path.display(), error = %e, "Skipping unreadable file");
            }
        }
    }
    Ok(count)
}

async fn grep_file<F>(path: &Path, regex: &Regex, token: &CancellationToken, on_match: &mut F) -> FmshResult<usize>
where
    F: FnMut(&GrepMatch) + Send,
{
    let data = cancel::guard_path(token, path, tokio::fs::read(path)).await?;
    let Ok(text) = String::from_utf8(data) else {
        return Ok(0);
    };

    let mut count = 0;
    for (i, line) in text.lines().enumerate() {
        if regex.is_match(line) {
            count += 1;
            on_match(&GrepMatch {
                path: path.to_path_buf(),
                line_number: i + 1,
                line: line.to_string(),
            });
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::RegexBuilder;
    use std::fs;

    #[test]
    fn test_glob_basics() {
        assert!(match_glob_pattern("*.txt", "notes.txt"));
        assert!(!match_glob_pattern("*.txt", "notes.md"));
        assert!(match_glob_pattern("file?.rs", "file1.rs"));
        assert!(!match_glob_pattern("file?.rs", "file10.rs"));
        assert!(match_glob_pattern("*", ""));
        assert!(match_glob_pattern("a*b*c", "aXXbYc"));
    }

    #[test]
    fn test_glob_classes() {
        assert!(match_glob_pattern("[abc].txt", "b.txt"));
        assert!(!match_glob_pattern("[abc].txt", "d.txt"));
        assert!(match_glob_pattern("[a-c]1", "c1"));
        assert!(match_glob_pattern("[!a-c]1", "x1"));
        assert!(!match_glob_pattern("[^a-c]1", "a1"));
        assert!(match_glob_pattern("[]]", "]"));
        assert!(match_glob_pattern("[a", "[a"));
    }

    #[test]
    fn test_glob_many_stars_is_fast() {
        let name = "a".repeat(40);
        let started = std::time::Instant::now();
        assert!(!match_glob_pattern("*a*a*a*a*a*a*a*b", &name));
        assert!(match_glob_pattern("*a*a*a*a*a*a*a*", &name));
        assert!(started.elapsed() < std::time::Duration::from_millis(100));
    }

    #[test]
    fn test_glob_backtracks_past_partial_match() {
        assert!(match_glob_pattern("*ab", "aab"));
        assert!(match_glob_pattern("*.tar.gz", "x.tar.tar.gz"));
        assert!(!match_glob_pattern("a*", "ba"));
        assert!(match_glob_pattern("**x", "x"));
    }

    #[test]
    fn test_glob_unicode() {
        assert!(match_glob_pattern("gr*e", "grüße"));
        assert!(match_glob_pattern("?ber", "über"));
    }

    fn tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src/nested")).unwrap();
        fs::write(root.join("README.md"), "hello\nworld\n").unwrap();
        fs::write(root.join("src/main.rs"), "fn main() {\n    println!(\"Hello\");\n}\n").unwrap();
        fs::write(root.join("src/nested/readme.md"), "nested readme\n").unwrap();
        fs::write(root.join("src/blob.bin"), [0xff_u8, 0xfe, 0x00, 0x68]).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_find_by_glob() {
        let dir = tree();
        let token = CancellationToken::new();
        let mut found = Vec::new();
        let count = find(dir.path(), "*.md", &token, |p| found.push(p.to_path_buf()))
            .await
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(found[0], dir.path().join("README.md"));
        assert_eq!(found[1], dir.path().join("src/nested/readme.md"));
    }

    #[tokio::test]
    async fn test_find_by_substring() {
        let dir = tree();
        let token = CancellationToken::new();
        let mut found = Vec::new();
        find(dir.path(), "main", &token, |p| found.push(p.to_path_buf()))
            .await
            .unwrap();
        assert_eq!(found, vec![dir.path().join("src/main.rs")]);
    }

    #[tokio::test]
    async fn test_where_is_ignores_case() {
        let dir = tree();
        let token = CancellationToken::new();
        let mut found = Vec::new();
        let count = where_is(dir.path(), "readme.md", &token, |p| found.push(p.to_path_buf()))
            .await
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_grep_tree_skips_binary() {
        let dir = tree();
        let token = CancellationToken::new();
        let regex = RegexBuilder::new("hello").case_insensitive(true).build().unwrap();
        let mut matches = Vec::new();
        let count = grep(dir.path(), &regex, &token, |m| matches.push(m.clone()))
            .await
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(matches[0].path, dir.path().join("README.md"));
        assert_eq!(matches[0].line_number, 1);
        assert_eq!(matches[1].path, dir.path().join("src/main.rs"));
        assert_eq!(matches[1].line_number, 2);
    }

    #[tokio::test]
    async fn test_grep_single_file() {
        let dir = tree();
        let token = CancellationToken::new();
        let regex = Regex::new("^w").unwrap();
        let mut lines = Vec::new();
        grep(&dir.path().join("README.md"), &regex, &token, |m| lines.push(m.line.clone()))
            .await
            .unwrap();
        assert_eq!(lines, vec!["world".to_string()]);
    }

    #[tokio::test]
    async fn test_search_with_aborted_token() {
        let dir = tree();
        let token = CancellationToken::new();
        token.cancel();
        let err = find(dir.path(), "*", &token, |_| {}).await.unwrap_err();
        assert!(err.is_aborted());
    }
}
