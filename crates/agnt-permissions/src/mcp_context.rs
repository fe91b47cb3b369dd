use std::future::Future;

tokio::task_local! {
    static IN_MCP_CONTEXT: bool;
}

/// Runs `f` with the async-local `in_mcp_context` flag set to `value`. A
/// tool-batching framework that already acquired outer permission scopes
/// its dispatched calls with `value = true` so the gate auto-grants them.
pub async fn with_mcp_context<F: Future>(value: bool, f: F) -> F::Output {
    IN_MCP_CONTEXT.scope(value, f).await
}

pub fn in_mcp_context() -> bool {
    IN_MCP_CONTEXT.try_with(|v| *v).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn defaults_to_false_outside_scope() {
        assert!(!in_mcp_context());
    }

    #[tokio::test]
    async fn scope_sets_the_flag_for_its_duration() {
        let seen = with_mcp_context(true, async { in_mcp_context() }).await;
        assert!(seen);
        assert!(!in_mcp_context());
    }
}
