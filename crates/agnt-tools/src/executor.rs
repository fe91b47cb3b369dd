use std::time::Duration;

use tokio::time::interval;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::registry::ToolRegistry;
use crate::status::ToolStatus;

pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(60 * 60);
const PROGRESS_TICK: Duration = Duration::from_millis(500);

/// Runs one tool call under two chained cancellations (the outer agent
/// cancel and this call's own timeout) plus a progress ticker that fires
/// every 500ms independent of both, so progress always stops cleanly even
/// when the tool is killed.
///
/// The JSON result string covers success, tool-internal failure, and
/// timeout alike — only an outer cancellation is surfaced as `Err`, since
/// callers need to distinguish "the conversation was cancelled" from "the
/// tool produced an error".
pub async fn execute(
    registry: &ToolRegistry,
    name: &str,
    arguments: &str,
    outer_cancel: &CancellationToken,
    timeout: Duration,
    mut on_progress: impl FnMut(ToolStatus),
) -> Result<String> {
    let tool = registry
        .get(name)
        .ok_or_else(|| Error::UnknownTool(name.to_string()))?;

    on_progress(ToolStatus::Pending);

    let progress_cancel = CancellationToken::new();
    let ticker_guard = progress_cancel.clone();
    let ticker = tokio::spawn(async move {
        let mut ticks = interval(PROGRESS_TICK);
        ticks.tick().await; // first tick fires immediately
        loop {
            tokio::select! {
                _ = ticker_guard.cancelled() => break,
                _ = ticks.tick() => {}
            }
        }
    });

    on_progress(ToolStatus::Running);

    let call = tool.call_erased(arguments);

    let outcome = tokio::select! {
        biased;
        _ = outer_cancel.cancelled() => {
            progress_cancel.cancel();
            let _ = ticker.await;
            on_progress(ToolStatus::Cancelled);
            return Err(Error::Cancelled);
        }
        result = tokio::time::timeout(timeout, call) => result,
    };

    progress_cancel.cancel();
    let _ = ticker.await;

    match outcome {
        Ok(json) => {
            on_progress(if result_is_error(&json) {
                ToolStatus::Failed
            } else {
                ToolStatus::Completed
            });
            Ok(json)
        }
        Err(_elapsed) => {
            on_progress(ToolStatus::TimedOut);
            Ok(serde_json::json!({
                "error": "timeout",
                "timed_out": true,
                "elapsed_ms": timeout.as_millis() as u64,
            })
            .to_string())
        }
    }
}

fn result_is_error(json: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(json)
        .ok()
        .and_then(|v| v.get("error").is_some().then_some(()))
        .is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::{RiskClass, ToolCategory};
    use crate::tool::Tool;

    #[derive(Clone)]
    struct Slow;

    #[derive(serde::Deserialize)]
    struct NoInput {}

    impl agnt_llm::Describe for NoInput {
        fn describe() -> agnt_llm::Schema {
            agnt_llm::Schema::Object {
                description: None,
                properties: vec![],
                required: vec![],
            }
        }
    }

    impl Tool for Slow {
        type Input = NoInput;
        fn name(&self) -> &str {
            "slow"
        }
        fn description(&self) -> &str {
            "sleeps forever"
        }
        fn risk_class(&self) -> RiskClass {
            RiskClass::ReadOnly
        }
        fn category(&self) -> ToolCategory {
            ToolCategory::Ordinary
        }
        async fn call(&self, _input: NoInput) -> String {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            "unreachable".to_string()
        }
    }

    #[derive(Clone)]
    struct Instant;

    impl Tool for Instant {
        type Input = NoInput;
        fn name(&self) -> &str {
            "instant"
        }
        fn description(&self) -> &str {
            "returns immediately"
        }
        fn risk_class(&self) -> RiskClass {
            RiskClass::ReadOnly
        }
        fn category(&self) -> ToolCategory {
            ToolCategory::Ordinary
        }
        async fn call(&self, _input: NoInput) -> String {
            serde_json::json!({"content": "done"}).to_string()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_produces_timed_out_json() {
        let mut registry = ToolRegistry::new();
        registry.register(Slow);
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(async move {
            execute(&registry, "slow", "{}", &cancel, Duration::from_millis(10), |_| {})
                .await
        });
        tokio::time::advance(Duration::from_millis(20)).await;
        let result = handle.await.unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&result).unwrap();
        assert_eq!(value["timed_out"], true);
    }

    #[tokio::test]
    async fn successful_call_reports_completed() {
        let mut registry = ToolRegistry::new();
        registry.register(Instant);
        let cancel = CancellationToken::new();
        let mut statuses = Vec::new();
        let result = execute(
            &registry,
            "instant",
            "{}",
            &cancel,
            Duration::from_secs(5),
            |s| statuses.push(s),
        )
        .await
        .unwrap();
        assert!(result.contains("done"));
        assert_eq!(
            statuses,
            vec![ToolStatus::Pending, ToolStatus::Running, ToolStatus::Completed]
        );
    }

    #[tokio::test]
    async fn unknown_tool_is_an_error() {
        let registry = ToolRegistry::new();
        let cancel = CancellationToken::new();
        let err = execute(&registry, "missing", "{}", &cancel, Duration::from_secs(1), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnknownTool(_)));
    }

    #[tokio::test]
    async fn outer_cancellation_is_surfaced() {
        let mut registry = ToolRegistry::new();
        registry.register(Slow);
        let cancel = CancellationToken::new();
        let cancel_for_task = cancel.clone();
        let handle = tokio::spawn(async move {
            execute(
                &registry,
                "slow",
                "{}",
                &cancel_for_task,
                Duration::from_secs(3600),
                |_| {},
            )
            .await
        });
        tokio::task::yield_now().await;
        cancel.cancel();
        let result = handle.await.unwrap();
        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
