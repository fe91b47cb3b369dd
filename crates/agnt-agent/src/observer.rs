//! Loop observer callbacks, used to surface streaming tokens, tool progress,
//! and iteration boundaries to a caller without threading a struct of
//! closures through the control loop.

use agnt_tools::ToolStatus;

pub trait LoopObserver: Send {
    fn on_token(&mut self, _delta: &str) {}
    fn on_reasoning(&mut self, _delta: &str) {}
    fn on_tool_progress(&mut self, _call_id: &str, _tool_name: &str, _status: ToolStatus) {}
    fn on_tool_result(&mut self, _call_id: &str, _tool_name: &str, _result: &str) {}
    fn on_content_replace(&mut self, _content: &str) {}
    fn on_iteration(&mut self, _iteration: u32) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl LoopObserver for NullObserver {}
