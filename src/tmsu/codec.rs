//! Parsing tmsu output and escaping tag arguments.
//!
//! tmsu prints a tag containing a space as `foo\ bar`. Tags are unescaped for
//! display and re-escaped before they go back on a command line.

use std::path::PathBuf;

const ROOT_PATH_PREFIX: &str = "Root path: ";

/// `foo\ bar` -> `foo bar`
pub fn unescape_tag(raw: &str) -> String {
    raw.replace("\\ ", " ")
}

/// `foo bar` -> `foo\ bar`
pub fn escape_tag(tag: &str) -> String {
    tag.replace(' ', "\\ ")
}

/// Escape each tag and join them into one space separated argument
pub fn join_tags<S: AsRef<str>>(tags: &[S]) -> String {
    tags.iter()
        .map(|t| escape_tag(t.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse the output of `tmsu tags -1 <path>`.
///
/// The first line echoes the path and is discarded; each following line is
/// one tag.
pub fn parse_tag_list(output: &str) -> Vec<String> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .skip(1)
        .map(unescape_tag)
        .collect()
}

/// Parse the output of `tmsu tags -1` run without a path: every line is a tag
pub fn parse_tag_names(output: &str) -> Vec<String> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(unescape_tag)
        .collect()
}

/// Split a space separated list of tags as typed by the user. `\ ` keeps a
/// space inside a tag.
pub fn split_tags(input: &str) -> Vec<String> {
    let mut tags = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&' ') => {
                current.push(' ');
                chars.next();
            }
            c if c.is_whitespace() => {
                if !current.is_empty() {
                    tags.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tags.push(current);
    }
    tags
}

/// Extract the database root from `tmsu info` output
pub fn parse_root_path(output: &str) -> Option<PathBuf> {
    output
        .lines()
        .find_map(|line| line.trim_start().strip_prefix(ROOT_PATH_PREFIX))
        .map(str::trim)
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
}
