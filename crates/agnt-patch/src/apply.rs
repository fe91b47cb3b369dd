use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::parse::{parse_patch, FilePatch, Hunk, HunkLine};
use crate::reject::{truncate60, Reject};

const FUZZ_WINDOW: usize = 20;

#[derive(Debug)]
pub struct ApplyReport {
    pub all_ok: bool,
    pub rejects: Vec<Reject>,
}

/// Applies every file-patch in `patch_text` against files under `root_dir`.
/// Each file-patch either fully applies or is rejected and leaves the file
/// untouched — there is no partial application within one file.
pub fn apply(patch_text: &str, root_dir: &Path) -> Result<ApplyReport> {
    let file_patches = match parse_patch(patch_text) {
        Ok(patches) => patches,
        Err(e) => {
            return Ok(ApplyReport {
                all_ok: false,
                rejects: vec![Reject {
                    file: "<patch>".to_string(),
                    hunk_header: String::new(),
                    line: 0,
                    expected: "well-formed unified diff".to_string(),
                    actual: e.to_string(),
                }],
            });
        }
    };

    let mut rejects = Vec::new();
    for file_patch in &file_patches {
        if let Err(reject) = apply_file_patch(file_patch, root_dir) {
            rejects.push(reject);
        }
    }

    Ok(ApplyReport {
        all_ok: rejects.is_empty(),
        rejects,
    })
}

fn apply_file_patch(file_patch: &FilePatch, root_dir: &Path) -> std::result::Result<(), Reject> {
    let path = resolve_path(root_dir, &file_patch.new_path);
    let original = std::fs::read_to_string(&path).map_err(|e| Reject {
        file: file_patch.new_path.clone(),
        hunk_header: String::new(),
        line: 0,
        expected: "readable file".to_string(),
        actual: format!("failed to read file: {e}"),
    })?;

    let eol = detect_eol(&original);
    let had_trailing_newline = original.ends_with('\n') || original.ends_with("\r\n");
    let file_lines = split_lines(&original);

    let mut result_lines: Vec<String> = Vec::new();
    let mut cursor = 0usize;

    for hunk in &file_patch.hunks {
        let position = locate_hunk(&file_lines, hunk).map_err(|reject| Reject {
            file: file_patch.new_path.clone(),
            ..reject
        })?;

        if position < cursor {
            return Err(Reject {
                file: file_patch.new_path.clone(),
                hunk_header: hunk.header.clone(),
                line: position + 1,
                expected: format!("position at or after line {}", cursor + 1),
                actual: format!("accepted position {}", position + 1),
            });
        }

        result_lines.extend_from_slice(&file_lines[cursor..position]);

        let mut file_cursor = position;
        for hunk_line in &hunk.lines {
            match hunk_line {
                HunkLine::Context(_) => {
                    result_lines.push(file_lines[file_cursor].clone());
                    file_cursor += 1;
                }
                HunkLine::Delete(_) => {
                    file_cursor += 1;
                }
                HunkLine::Add(text) => {
                    result_lines.push(text.clone());
                }
                HunkLine::NoNewline => {}
            }
        }
        cursor = file_cursor;
    }

    result_lines.extend_from_slice(&file_lines[cursor..]);

    let mut joined = result_lines.join(&eol);
    if had_trailing_newline {
        joined.push_str(&eol);
    }

    std::fs::write(&path, joined).map_err(|e| Reject {
        file: file_patch.new_path.clone(),
        hunk_header: String::new(),
        line: 0,
        expected: "writable file".to_string(),
        actual: format!("failed to write file: {e}"),
    })
}

/// Finds where a hunk's context+delete lines actually live in the file.
/// Tries the position the hunk header claims first, then fuzzes outward up
/// to 20 lines in both directions, accepting only a position where every
/// context and delete line matches exactly.
fn locate_hunk(file_lines: &[String], hunk: &Hunk) -> std::result::Result<usize, Reject> {
    let expected_start = hunk.old_start.saturating_sub(1);
    let needle: Vec<&str> = hunk
        .lines
        .iter()
        .filter_map(|l| match l {
            HunkLine::Context(t) | HunkLine::Delete(t) => Some(t.as_str()),
            _ => None,
        })
        .collect();

    for offset in 0..=FUZZ_WINDOW {
        if expected_start >= offset {
            let pos = expected_start - offset;
            if matches_at(file_lines, &needle, pos) {
                return Ok(pos);
            }
        }
        if offset > 0 && matches_at(file_lines, &needle, expected_start + offset) {
            return Ok(expected_start + offset);
        }
    }

    let (actual_line, actual_text) = file_lines
        .get(expected_start)
        .map(|l| (expected_start + 1, l.as_str()))
        .unwrap_or((expected_start + 1, ""));

    Err(Reject {
        file: String::new(),
        hunk_header: hunk.header.clone(),
        line: actual_line,
        expected: truncate60(needle.first().copied().unwrap_or("")),
        actual: truncate60(actual_text),
    })
}

fn matches_at(file_lines: &[String], needle: &[&str], pos: usize) -> bool {
    if needle.is_empty() || pos + needle.len() > file_lines.len() {
        return needle.is_empty();
    }
    needle
        .iter()
        .enumerate()
        .all(|(i, line)| file_lines[pos + i] == *line)
}

fn resolve_path(root_dir: &Path, path: &str) -> PathBuf {
    let candidate = Path::new(path);
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        root_dir.join(candidate)
    }
}

fn detect_eol(text: &str) -> String {
    if text.contains("\r\n") {
        "\r\n".to_string()
    } else {
        "\n".to_string()
    }
}

fn split_lines(text: &str) -> Vec<String> {
    let normalized = text.replace("\r\n", "\n");
    let mut lines: Vec<String> = normalized.split('\n').map(str::to_string).collect();
    if lines.last().map(String::is_empty).unwrap_or(false) {
        lines.pop();
    }
    lines
}
