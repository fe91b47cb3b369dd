//! Inline tool-call recovery: scans assistant content for `tool_name {...}`
//! occurrences when the model didn't use structured tool calls.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineCall {
    pub name: String,
    pub arguments: String,
    span: (usize, usize),
}

/// Scans left to right for a word-boundary occurrence of a known tool name
/// immediately (optionally with whitespace) followed by `{`, extracts the
/// brace-balanced JSON object, and strips the recovered spans from the
/// returned content.
pub fn recover_inline_calls(content: &str, known_tool_names: &[String]) -> (String, Vec<InlineCall>) {
    let mut calls = Vec::new();
    let char_indices: Vec<usize> = content.char_indices().map(|(i, _)| i).collect();

    let mut cursor = 0usize;
    for &i in &char_indices {
        if i < cursor {
            continue;
        }
        let Some((name, json_start)) = match_tool_name_at(content, i, known_tool_names) else {
            continue;
        };
        let Some(json_end) = find_balanced_json_end(content, json_start) else {
            continue;
        };
        let json_str = &content[json_start..=json_end];
        if serde_json::from_str::<serde_json::Value>(json_str).is_err() {
            continue;
        }
        calls.push(InlineCall {
            name: name.to_string(),
            arguments: json_str.to_string(),
            span: (i, json_end + 1),
        });
        cursor = json_end + 1;
    }

    let mut cleaned = content.to_string();
    for call in calls.iter().rev() {
        cleaned.replace_range(call.span.0..call.span.1, "");
    }

    (cleaned, calls)
}

fn match_tool_name_at<'a>(
    content: &str,
    pos: usize,
    known_tool_names: &'a [String],
) -> Option<(&'a str, usize)> {
    let preceding_is_word_char = content[..pos]
        .chars()
        .next_back()
        .map(|c| c.is_alphanumeric() || c == '_')
        .unwrap_or(false);
    if preceding_is_word_char {
        return None;
    }

    for name in known_tool_names {
        if !content[pos..].starts_with(name.as_str()) {
            continue;
        }
        let after_name = pos + name.len();
        let following_is_word_char = content[after_name..]
            .chars()
            .next()
            .map(|c| c.is_alphanumeric() || c == '_')
            .unwrap_or(false);
        if following_is_word_char {
            continue;
        }
        let mut j = after_name;
        while content[j..].starts_with(|c: char| c.is_whitespace()) {
            j += content[j..].chars().next().unwrap().len_utf8();
        }
        if content[j..].starts_with('{') {
            return Some((name.as_str(), j));
        }
    }
    None
}

/// Byte-wise brace balancing respecting string literals and escapes.
/// Reading byte-by-byte is safe here: multi-byte UTF-8 continuation bytes
/// never collide with the ASCII structural bytes this loop inspects.
fn find_balanced_json_end(content: &str, start: usize) -> Option<usize> {
    let bytes = content.as_bytes();
    if bytes.get(start) != Some(&b'{') {
        return None;
    }
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;
    let mut idx = start;
    while idx < bytes.len() {
        let b = bytes[idx];
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
        } else {
            match b {
                b'"' => in_string = true,
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(idx);
                    }
                }
                _ => {}
            }
        }
        idx += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tools() -> Vec<String> {
        vec!["read_file".to_string(), "bash".to_string()]
    }

    #[test]
    fn recovers_single_inline_call() {
        let content = r#"I'll read it. read_file {"path": "src/lib.rs"} and then explain."#;
        let (cleaned, calls) = recover_inline_calls(content, &tools());
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "read_file");
        let parsed: serde_json::Value = serde_json::from_str(&calls[0].arguments).unwrap();
        assert_eq!(parsed["path"], "src/lib.rs");
        assert!(!cleaned.contains("read_file"));
        assert!(cleaned.contains("I'll read it."));
        assert!(cleaned.contains("and then explain."));
    }

    #[test]
    fn handles_nested_braces_and_escaped_quotes() {
        let content = r#"bash {"command": "echo \"{nested}\"", "opts": {"timeout": 5}}"#;
        let (_, calls) = recover_inline_calls(content, &tools());
        assert_eq!(calls.len(), 1);
        let parsed: serde_json::Value = serde_json::from_str(&calls[0].arguments).unwrap();
        assert_eq!(parsed["opts"]["timeout"], 5);
    }

    #[test]
    fn word_boundary_prevents_partial_name_match() {
        let content = r#"not_read_file {"path": "x"} should not match"#;
        let (_, calls) = recover_inline_calls(content, &tools());
        assert!(calls.is_empty());
    }

    #[test]
    fn multiple_calls_recovered_in_order() {
        let content = r#"read_file {"path": "a"} then bash {"command": "ls"}"#;
        let (cleaned, calls) = recover_inline_calls(content, &tools());
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].name, "read_file");
        assert_eq!(calls[1].name, "bash");
        assert_eq!(cleaned.trim(), "then");
    }

    #[test]
    fn invalid_json_is_not_recovered() {
        let content = r#"bash {not valid json} trailing"#;
        let (cleaned, calls) = recover_inline_calls(content, &tools());
        assert!(calls.is_empty());
        assert_eq!(cleaned, content);
    }
}
