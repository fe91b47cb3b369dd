use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HunkLine {
    Context(String),
    Add(String),
    Delete(String),
    NoNewline,
}

#[derive(Debug, Clone)]
pub struct Hunk {
    pub header: String,
    pub old_start: usize,
    pub old_len: usize,
    pub new_start: usize,
    pub new_len: usize,
    pub lines: Vec<HunkLine>,
}

#[derive(Debug, Clone)]
pub struct FilePatch {
    pub old_path: String,
    pub new_path: String,
    pub hunks: Vec<Hunk>,
}

/// Strips the `a/`/`b/` prefix git-style diffs use, falling back to the raw
/// path when no such prefix is present.
fn strip_prefix(path: &str) -> &str {
    path.strip_prefix("a/")
        .or_else(|| path.strip_prefix("b/"))
        .unwrap_or(path)
}

pub fn parse_patch(patch_text: &str) -> Result<Vec<FilePatch>> {
    let lines: Vec<&str> = patch_text.lines().collect();
    let mut file_patches = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if !lines[i].starts_with("--- ") {
            i += 1;
            continue;
        }
        let old_header = lines[i];
        i += 1;
        if i >= lines.len() || !lines[i].starts_with("+++ ") {
            return Err(Error::Parse(format!(
                "expected '+++ ' header after '{old_header}'"
            )));
        }
        let new_header = lines[i];
        i += 1;

        let old_path = strip_prefix(old_header[4..].trim()).to_string();
        let new_path = strip_prefix(new_header[4..].trim()).to_string();

        let mut hunks = Vec::new();
        while i < lines.len() && lines[i].starts_with("@@ ") {
            let header = lines[i].to_string();
            let (old_start, old_len, new_start, new_len) = parse_hunk_header(&header)?;
            i += 1;

            let mut hunk_lines = Vec::new();
            while i < lines.len() {
                let line = lines[i];
                if line.starts_with("@@ ") || line.starts_with("--- ") {
                    break;
                }
                if let Some(rest) = line.strip_prefix(' ') {
                    hunk_lines.push(HunkLine::Context(rest.to_string()));
                } else if let Some(rest) = line.strip_prefix('+') {
                    hunk_lines.push(HunkLine::Add(rest.to_string()));
                } else if let Some(rest) = line.strip_prefix('-') {
                    hunk_lines.push(HunkLine::Delete(rest.to_string()));
                } else if line.starts_with('\\') {
                    hunk_lines.push(HunkLine::NoNewline);
                } else if line.is_empty() {
                    hunk_lines.push(HunkLine::Context(String::new()));
                } else {
                    break;
                }
                i += 1;
            }

            hunks.push(Hunk {
                header,
                old_start,
                old_len,
                new_start,
                new_len,
                lines: hunk_lines,
            });
        }

        file_patches.push(FilePatch {
            old_path,
            new_path,
            hunks,
        });
    }

    Ok(file_patches)
}

fn parse_hunk_header(header: &str) -> Result<(usize, usize, usize, usize)> {
    let body = header
        .strip_prefix("@@ ")
        .and_then(|s| s.strip_suffix(" @@").or_else(|| s.split(" @@").next()))
        .ok_or_else(|| Error::Parse(format!("malformed hunk header: {header}")))?;

    let mut parts = body.split_whitespace();
    let old = parts
        .next()
        .and_then(|s| s.strip_prefix('-'))
        .ok_or_else(|| Error::Parse(format!("malformed hunk header: {header}")))?;
    let new = parts
        .next()
        .and_then(|s| s.strip_prefix('+'))
        .ok_or_else(|| Error::Parse(format!("malformed hunk header: {header}")))?;

    let (old_start, old_len) = parse_range(old)?;
    let (new_start, new_len) = parse_range(new)?;
    Ok((old_start, old_len, new_start, new_len))
}

fn parse_range(range: &str) -> Result<(usize, usize)> {
    let mut it = range.splitn(2, ',');
    let start = it
        .next()
        .ok_or_else(|| Error::Parse(format!("malformed range: {range}")))?
        .parse::<usize>()
        .map_err(|e| Error::Parse(format!("bad range start '{range}': {e}")))?;
    let len = match it.next() {
        Some(s) => s
            .parse::<usize>()
            .map_err(|e| Error::Parse(format!("bad range length '{range}': {e}")))?,
        None => 1,
    };
    Ok((start, len))
}
