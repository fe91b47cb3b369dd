//! Response classification: completion signals and action-phrase detection.

const COMPLETION_PHRASES: &[&str] = &[
    "thuvu finished",
    "finished tasks",
    "task complete",
    "successfully created",
    "i have successfully",
];

pub fn has_completion_signal(content: &str) -> bool {
    let lower = content.to_lowercase();
    COMPLETION_PHRASES.iter().any(|phrase| lower.contains(phrase))
}

const ACTION_LEAD_INS: &[&str] = &[
    "let me",
    "i will",
    "i'll",
    "now i",
    "next, i",
    "let's",
    "i need to",
    "i should",
    "i'm going to",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionSignal {
    None,
    Strong,
    Weak,
}

fn starts_with_lead_in(trimmed_lower: &str) -> bool {
    ACTION_LEAD_INS.iter().any(|lead_in| trimmed_lower.starts_with(lead_in))
}

/// A STRONG signal is a lead-in followed by words ending in `:`. A WEAK
/// signal is the same lead-ins on a short (<500 char) message that doesn't
/// end in sentence-final punctuation.
pub fn detect_action_signal(content: &str) -> ActionSignal {
    let trimmed = content.trim();
    let lower = trimmed.to_lowercase();
    if !starts_with_lead_in(&lower) {
        return ActionSignal::None;
    }
    if trimmed.ends_with(':') {
        return ActionSignal::Strong;
    }
    let short_enough = trimmed.chars().count() < 500;
    let ends_with_terminator = matches!(trimmed.chars().last(), Some('.') | Some('!') | Some('?'));
    if short_enough && !ends_with_terminator {
        return ActionSignal::Weak;
    }
    ActionSignal::None
}
