use agnt_llm::Message;

pub const DEFAULT_KEEP: usize = 4;

/// Keeps the system message plus the most recent `keep` non-system
/// messages, with an explanatory note/acknowledgement pair inserted
/// between them. Never modifies message contents — only drops messages.
pub fn truncate_messages(messages: Vec<Message>, keep: usize) -> Vec<Message> {
    let system = messages.iter().find(|m| m.is_system()).cloned();
    let rest: Vec<Message> = messages.into_iter().filter(|m| !m.is_system()).collect();

    if rest.len() <= keep {
        let mut result = Vec::new();
        if let Some(system) = system {
            result.push(system);
        }
        result.extend(rest);
        return result;
    }

    let dropped = rest.len() - keep;
    let tail = rest[rest.len() - keep..].to_vec();

    let mut result = Vec::with_capacity(keep + 3);
    if let Some(system) = system {
        result.push(system);
    }
    result.push(Message::user(format!(
        "[{dropped} earlier messages were truncated to stay within the context window]"
    )));
    result.push(Message::assistant(
        "Understood — continuing with the remaining context.",
    ));
    result.extend(tail);
    result
}
