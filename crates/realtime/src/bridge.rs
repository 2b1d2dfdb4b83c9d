use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use deskvoice_core::config::{ConfigError, RealtimeConfig};
use deskvoice_core::ServiceDesk;

use crate::catalog::session_update;
use crate::events::{extract_tool_call, tool_result_event};
use crate::executor::ToolExecutor;
use crate::transport::{RealtimeTransport, TransportError, WebSocketTransport};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BridgeState {
    Connecting,
    SessionConfigured,
    Listening,
    Dispatching,
    Closed,
}

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[derive(Clone, Debug)]
pub struct BridgeSettings {
    pub model: String,
    pub instructions: String,
    pub tool_timeout: Duration,
}

impl From<&RealtimeConfig> for BridgeSettings {
    fn from(config: &RealtimeConfig) -> Self {
        Self {
            model: config.model.clone(),
            instructions: config.instructions.clone(),
            tool_timeout: Duration::from_secs(config.tool_timeout_secs),
        }
    }
}

/// Counters for one connection, returned when the peer closes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionReport {
    pub frames_received: usize,
    pub frames_discarded: usize,
    pub tool_calls: usize,
}

/// Owns one connection to the voice API and relays tool calls to the
/// service desk, one frame at a time.
pub struct RealtimeBridge {
    transport: Arc<dyn RealtimeTransport>,
    executor: ToolExecutor,
    settings: BridgeSettings,
    session_id: Uuid,
    state: BridgeState,
}

impl RealtimeBridge {
    pub fn new(
        transport: Arc<dyn RealtimeTransport>,
        desk: Arc<dyn ServiceDesk>,
        settings: BridgeSettings,
    ) -> Self {
        Self {
            executor: ToolExecutor::new(desk, settings.tool_timeout),
            transport,
            settings,
            session_id: Uuid::new_v4(),
            state: BridgeState::Connecting,
        }
    }

    /// Builds a websocket bridge; fails before any network activity when the
    /// credential is missing.
    pub fn from_config(
        config: &RealtimeConfig,
        desk: Arc<dyn ServiceDesk>,
    ) -> Result<Self, BridgeError> {
        let api_key = config.credential()?.clone();
        let transport = WebSocketTransport::new(&config.url, api_key, config.max_frame_bytes);
        Ok(Self::new(Arc::new(transport), desk, BridgeSettings::from(config)))
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    /// Runs until the peer closes the stream or the transport fails.
    pub async fn run(&mut self) -> Result<SessionReport, BridgeError> {
        let outcome = self.pump().await;
        self.state = BridgeState::Closed;

        if let Err(error) = self.transport.disconnect().await {
            warn!(
                event_name = "realtime.bridge.disconnect_failed",
                correlation_id = %self.session_id,
                error = %error,
                "failed to close realtime transport"
            );
        }

        match &outcome {
            Ok(report) => info!(
                event_name = "realtime.bridge.closed",
                correlation_id = %self.session_id,
                frames_received = report.frames_received,
                frames_discarded = report.frames_discarded,
                tool_calls = report.tool_calls,
                "realtime session closed"
            ),
            Err(error) => warn!(
                event_name = "realtime.bridge.failed",
                correlation_id = %self.session_id,
                error = %error,
                "realtime session ended with an error"
            ),
        }
        outcome
    }

    async fn pump(&mut self) -> Result<SessionReport, BridgeError> {
        self.state = BridgeState::Connecting;
        info!(
            event_name = "realtime.bridge.connecting",
            correlation_id = %self.session_id,
            model = %self.settings.model,
            "opening realtime connection"
        );
        self.transport.connect().await?;

        let update = session_update(&self.settings.model, &self.settings.instructions);
        self.transport.send(update.to_string()).await?;
        self.state = BridgeState::SessionConfigured;
        info!(
            event_name = "realtime.bridge.session_configured",
            correlation_id = %self.session_id,
            "session update sent"
        );

        let mut report = SessionReport::default();
        self.state = BridgeState::Listening;

        while let Some(frame) = self.transport.next_frame().await? {
            report.frames_received += 1;
            match self.handle_frame(&frame).await {
                Some(result) => {
                    report.tool_calls += 1;
                    self.transport.send(result.to_string()).await?;
                }
                None => report.frames_discarded += 1,
            }
            self.state = BridgeState::Listening;
        }

        Ok(report)
    }

    /// The correlated result event for a tool-call frame; `None` for frames
    /// that are not JSON or carry no tool call.
    pub async fn handle_frame(&mut self, raw: &str) -> Option<Value> {
        let frame = match serde_json::from_str::<Value>(raw) {
            Ok(frame) => frame,
            Err(error) => {
                warn!(
                    event_name = "realtime.frame.discarded",
                    correlation_id = %self.session_id,
                    frame_bytes = raw.len(),
                    error = %error,
                    "skipping non-JSON frame"
                );
                return None;
            }
        };

        let Some(call) = extract_tool_call(&frame) else {
            debug!(
                event_name = "realtime.frame.ignored",
                correlation_id = %self.session_id,
                frame_type = frame.get("type").and_then(serde_json::Value::as_str).unwrap_or("unknown"),
                "frame carries no tool call"
            );
            return None;
        };

        self.state = BridgeState::Dispatching;
        let call_id = call.call_id.clone();
        info!(
            event_name = "realtime.tool.received",
            correlation_id = %self.session_id,
            call_id = %call_id,
            tool = %call.name,
            "tool call received"
        );

        let output = self.executor.execute(call).await;
        self.state = BridgeState::Listening;
        Some(tool_result_event(&call_id, output))
    }
}
