//! Realtime voice tool bridge.
//!
//! [`bridge::RealtimeBridge`] holds one websocket session with the voice API,
//! advertises the [`catalog`] tools, and answers every extracted tool call
//! with exactly one `tool.result` event carrying the same call id.

pub mod bridge;
pub mod catalog;
pub mod events;
pub mod executor;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_support;

pub use bridge::{BridgeError, BridgeSettings, BridgeState, RealtimeBridge, SessionReport};
pub use catalog::{session_update, tool_catalog, ToolName, ToolSchema};
pub use events::{extract_tool_call, tool_result_event, ToolArguments, ToolCall};
pub use executor::ToolExecutor;
pub use transport::{RealtimeTransport, TransportError, WebSocketTransport};
