//! Tool-result compression, applied to every tool result
//! before it enters the message list. `compress_tool_result` is idempotent:
//! re-compressing an already-compressed result is a no-op.

const CEILING: usize = 8_000;

const PROCESS_KEYWORDS: &[&str] = &[
    "error", "warning", "fail", "pass", "succeed", "Error:", "FAIL:", "PASS:",
];

pub fn compress_tool_result(tool_name: &str, raw: &str) -> String {
    if raw.len() <= CEILING {
        return raw.to_string();
    }

    let compressed = match tool_name {
        "search_files" => compress_search_files(raw),
        "read_file" => compress_read_file(raw),
        _ if looks_like_process_result(raw) => compress_process_result(raw),
        _ => generic_truncate(raw),
    };

    if compressed.len() > CEILING {
        generic_truncate(&compressed)
    } else {
        compressed
    }
}

fn looks_like_process_result(raw: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(raw)
        .ok()
        .map(|v| v.get("stdout").is_some() && v.get("stderr").is_some())
        .unwrap_or(false)
}

fn compress_search_files(raw: &str) -> String {
    let Ok(mut value) = serde_json::from_str::<serde_json::Value>(raw) else {
        return generic_truncate(raw);
    };
    let Some(matches) = value.get("matches").and_then(|v| v.as_array()).cloned() else {
        return generic_truncate(raw);
    };

    let total = matches.len();
    let kept: Vec<_> = matches.into_iter().take(50).collect();
    let showing = kept.len();

    if let Some(obj) = value.as_object_mut() {
        obj.insert("matches".to_string(), serde_json::Value::Array(kept));
        obj.insert("truncated".to_string(), serde_json::Value::Bool(true));
        obj.insert("total_matches".to_string(), serde_json::json!(total));
        obj.insert("showing".to_string(), serde_json::json!(showing));
    }
    value.to_string()
}

fn compress_read_file(raw: &str) -> String {
    let Ok(mut value) = serde_json::from_str::<serde_json::Value>(raw) else {
        return generic_truncate(raw);
    };
    let Some(content) = value.get("content").and_then(|v| v.as_str()).map(str::to_string) else {
        return generic_truncate(raw);
    };

    let overhead = raw.len().saturating_sub(content.len());
    let budget = CEILING.saturating_sub(overhead).max(200);
    let truncated = truncate_at_newline(&content, budget);

    if let Some(obj) = value.as_object_mut() {
        obj.insert("content".to_string(), serde_json::Value::String(truncated));
        obj.insert("truncated".to_string(), serde_json::Value::Bool(true));
    }
    value.to_string()
}

/// Cuts `content` to `budget` bytes, preferring to land on the last newline
/// within the cut if doing so keeps more than half the budget intact.
fn truncate_at_newline(content: &str, budget: usize) -> String {
    if content.len() <= budget {
        return content.to_string();
    }
    let mut cut = budget.min(content.len());
    while cut > 0 && !content.is_char_boundary(cut) {
        cut -= 1;
    }
    let candidate = &content[..cut];
    if let Some(last_nl) = candidate.rfind('\n') {
        if last_nl > budget / 2 {
            return content[..last_nl].to_string();
        }
    }
    candidate.to_string()
}

fn compress_process_result(raw: &str) -> String {
    let Ok(mut value) = serde_json::from_str::<serde_json::Value>(raw) else {
        return generic_truncate(raw);
    };
    let stdout = value.get("stdout").and_then(|v| v.as_str()).unwrap_or("").to_string();
    let stderr = value.get("stderr").and_then(|v| v.as_str()).unwrap_or("").to_string();
    let combined = format!("{stdout}\n{stderr}");

    let matched: Vec<&str> = combined
        .lines()
        .filter(|line| PROCESS_KEYWORDS.iter().any(|k| line.contains(k)))
        .take(100)
        .collect();

    let Some(obj) = value.as_object_mut() else {
        return generic_truncate(raw);
    };

    if matched.is_empty() {
        let half = CEILING / 2;
        obj.insert(
            "stdout".to_string(),
            serde_json::Value::String(simple_truncate(&stdout, half)),
        );
        obj.insert(
            "stderr".to_string(),
            serde_json::Value::String(simple_truncate(&stderr, half)),
        );
    } else {
        obj.remove("stdout");
        obj.remove("stderr");
        obj.insert(
            "filtered_lines".to_string(),
            serde_json::Value::String(matched.join("\n")),
        );
    }
    obj.insert("truncated".to_string(), serde_json::Value::Bool(true));
    value.to_string()
}

fn simple_truncate(text: &str, budget: usize) -> String {
    let mut cut = budget.min(text.len());
    while cut > 0 && !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text[..cut].to_string()
}

fn generic_truncate(raw: &str) -> String {
    let trailer = format!("\n[... truncated, original {} chars]", raw.len());
    let budget = CEILING.saturating_sub(trailer.len());
    let mut cut = budget.min(raw.len());
    while cut > 0 && !raw.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}{trailer}", &raw[..cut])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn under_ceiling_passes_through_unchanged() {
        let raw = r#"{"content":"short"}"#;
        assert_eq!(compress_tool_result("read_file", raw), raw);
    }

    #[test]
    fn search_files_keeps_first_fifty_matches() {
        let matches: Vec<_> = (0..200).map(|i| serde_json::json!({"line": i, "text": "x".repeat(100)})).collect();
        let raw = serde_json::json!({"matches": matches}).to_string();
        let result = compress_tool_result("search_files", &raw);
        let value: serde_json::Value = serde_json::from_str(&result).unwrap();
        assert_eq!(value["showing"], 50);
        assert_eq!(value["total_matches"], 200);
        assert_eq!(value["matches"].as_array().unwrap().len(), 50);
    }

    #[test]
    fn read_file_truncates_content_and_keeps_other_fields() {
        let content = (0..2000).map(|i| format!("line {i}\n")).collect::<String>();
        let raw = serde_json::json!({"content": content, "sha256": "abc123"}).to_string();
        let result = compress_tool_result("read_file", &raw);
        let value: serde_json::Value = serde_json::from_str(&result).unwrap();
        assert_eq!(value["sha256"], "abc123");
        assert_eq!(value["truncated"], true);
        assert!(value["content"].as_str().unwrap().len() < content.len());
    }

    #[test]
    fn process_result_extracts_keyword_lines() {
        let stdout = (0..500)
            .map(|i| if i % 50 == 0 { format!("line {i} error\n") } else { format!("line {i}\n") })
            .collect::<String>();
        let raw = serde_json::json!({"stdout": stdout, "stderr": "", "success": false}).to_string();
        let result = compress_tool_result("run_build", &raw);
        let value: serde_json::Value = serde_json::from_str(&result).unwrap();
        assert!(value.get("stdout").is_none());
        assert!(value["filtered_lines"].as_str().unwrap().contains("error"));
    }

    #[test]
    fn generic_truncate_adds_trailer_with_original_length() {
        let raw = "x".repeat(20_000);
        let result = compress_tool_result("unknown_tool", &raw);
        assert!(result.contains("original 20000 chars"));
        assert!(result.len() <= CEILING);
    }

    #[test]
    fn compression_is_idempotent() {
        let raw = "x".repeat(20_000);
        let once = compress_tool_result("unknown_tool", &raw);
        let twice = compress_tool_result("unknown_tool", &once);
        assert_eq!(once, twice);

        let matches: Vec<_> = (0..500).map(|i| serde_json::json!({"line": i})).collect();
        let search_raw = serde_json::json!({"matches": matches}).to_string();
        let once = compress_tool_result("search_files", &search_raw);
        let twice = compress_tool_result("search_files", &once);
        assert_eq!(once, twice);
    }
}
