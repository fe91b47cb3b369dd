//! Stall detection: iteration caps, per-tool failure streaks, and
//! no-progress repetition detection.

use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StallOutcome {
    Continue,
    Warn,
    Stop,
}

#[derive(Debug, Clone, Copy)]
pub struct StallConfig {
    pub max_iterations: u32,
    pub max_consecutive_failures: u32,
    pub no_progress_warn_at: u32,
    pub no_progress_hard_at: u32,
}

impl Default for StallConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            max_consecutive_failures: 10,
            no_progress_warn_at: 3,
            no_progress_hard_at: 5,
        }
    }
}

impl StallConfig {
    /// The stricter cap used by callers that opt into the older strict mode.
    pub fn strict() -> Self {
        Self {
            max_consecutive_failures: 3,
            ..Self::default()
        }
    }
}

#[derive(Debug, Default)]
pub struct StallDetector {
    config_max_iterations: u32,
    config_max_consecutive_failures: u32,
    config_no_progress_warn_at: u32,
    config_no_progress_hard_at: u32,
    iterations: u32,
    consecutive_failures: HashMap<String, u32>,
    seen_signatures: HashSet<String>,
    no_progress_streak: u32,
}

impl StallDetector {
    pub fn new(config: StallConfig) -> Self {
        Self {
            config_max_iterations: config.max_iterations,
            config_max_consecutive_failures: config.max_consecutive_failures,
            config_no_progress_warn_at: config.no_progress_warn_at,
            config_no_progress_hard_at: config.no_progress_hard_at,
            iterations: 0,
            consecutive_failures: HashMap::new(),
            seen_signatures: HashSet::new(),
            no_progress_streak: 0,
        }
    }

    pub fn record_iteration(&mut self) -> StallOutcome {
        self.iterations += 1;
        if self.iterations >= self.config_max_iterations {
            StallOutcome::Stop
        } else {
            StallOutcome::Continue
        }
    }

    pub fn record_tool_result(&mut self, tool_name: &str, failed: bool) -> StallOutcome {
        let streak = self.consecutive_failures.entry(tool_name.to_string()).or_insert(0);
        if failed {
            *streak += 1;
        } else {
            *streak = 0;
        }
        if *streak >= self.config_max_consecutive_failures {
            StallOutcome::Stop
        } else {
            StallOutcome::Continue
        }
    }

    /// `signatures` are `"name:arguments"` strings for every tool call issued
    /// this turn. The streak only advances when every signature this turn
    /// was already seen in a prior turn; any new signature resets it.
    pub fn record_turn_signatures(&mut self, signatures: &[String]) -> StallOutcome {
        if signatures.is_empty() {
            return StallOutcome::Continue;
        }
        let all_repeats = signatures.iter().all(|sig| self.seen_signatures.contains(sig));
        for sig in signatures {
            self.seen_signatures.insert(sig.clone());
        }
        if all_repeats {
            self.no_progress_streak += 1;
        } else {
            self.no_progress_streak = 0;
        }

        if self.no_progress_streak >= self.config_no_progress_hard_at {
            StallOutcome::Stop
        } else if self.no_progress_streak >= self.config_no_progress_warn_at {
            StallOutcome::Warn
        } else {
            StallOutcome::Continue
        }
    }
}

/// A tool result is a failure if it reports `"success":false`,
/// `"timed_out":true`, a `"stderr":"timeout"` field, or a non-null `"error"`
/// field.
pub fn is_failure_result(json: &str) -> bool {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(json) else {
        return false;
    };
    if value.get("success") == Some(&serde_json::Value::Bool(false)) {
        return true;
    }
    if value.get("timed_out") == Some(&serde_json::Value::Bool(true)) {
        return true;
    }
    if value.get("stderr").and_then(|v| v.as_str()) == Some("timeout") {
        return true;
    }
    if let Some(error) = value.get("error") {
        if !error.is_null() {
            return true;
        }
    }
    false
}
