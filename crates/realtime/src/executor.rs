use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::warn;

use deskvoice_core::args::{
    decode_args, CreateTicketArgs, SearchKnowledgeArgs, TicketLookupArgs, UpdateTicketArgs,
};
use deskvoice_core::{OperationError, ServiceDesk};

use crate::catalog::ToolName;
use crate::events::ToolCall;

/// Runs one tool call against the service desk and always yields an output
/// object: the operation's fields, or a single `error` field.
#[derive(Clone)]
pub struct ToolExecutor {
    desk: Arc<dyn ServiceDesk>,
    timeout: Duration,
}

impl ToolExecutor {
    pub fn new(desk: Arc<dyn ServiceDesk>, timeout: Duration) -> Self {
        Self { desk, timeout }
    }

    pub async fn execute(&self, call: ToolCall) -> Value {
        let arguments = match call.arguments.resolve() {
            Ok(arguments) => arguments,
            Err(error) => {
                warn!(
                    event_name = "realtime.tool.arguments_rejected",
                    call_id = %call.call_id,
                    tool = %call.name,
                    error = %error,
                    "tool arguments could not be decoded"
                );
                return json!({ "error": format!("invalid tool arguments: {error}") });
            }
        };

        let Some(tool) = ToolName::from_name(&call.name) else {
            warn!(
                event_name = "realtime.tool.unknown",
                call_id = %call.call_id,
                tool = %call.name,
                "unknown tool requested"
            );
            return json!({ "error": format!("Unknown tool {}", call.name) });
        };

        let guarded = AssertUnwindSafe(self.invoke(tool, arguments)).catch_unwind();
        let outcome = match tokio::time::timeout(self.timeout, guarded).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_panic)) => {
                Err(OperationError::Execution(format!("{tool} failed unexpectedly")))
            }
            Err(_elapsed) => Err(OperationError::Timeout {
                operation: tool.to_string(),
                timeout_secs: self.timeout.as_secs(),
            }),
        };

        match outcome {
            Ok(output) => output,
            Err(error) => {
                warn!(
                    event_name = "realtime.tool.failed",
                    call_id = %call.call_id,
                    tool = %tool,
                    error_class = error.error_class(),
                    error = %error,
                    "tool call failed"
                );
                error.to_output()
            }
        }
    }

    async fn invoke(
        &self,
        tool: ToolName,
        arguments: Map<String, Value>,
    ) -> Result<Value, OperationError> {
        let name = tool.as_str();
        match tool {
            ToolName::SearchKnowledge => {
                let query = decode_args::<SearchKnowledgeArgs>(name, arguments)?.validate()?;
                encode(self.desk.search_knowledge(&query).await?)
            }
            ToolName::CreateTicket => {
                let ticket = decode_args::<CreateTicketArgs>(name, arguments)?.validate()?;
                encode(self.desk.create_ticket(ticket).await?)
            }
            ToolName::GetTicketStatus => {
                let reference = decode_args::<TicketLookupArgs>(name, arguments)?.validate()?;
                encode(self.desk.get_ticket_status(&reference).await?)
            }
            ToolName::UpdateTicket => {
                let update = decode_args::<UpdateTicketArgs>(name, arguments)?.validate()?;
                encode(self.desk.update_ticket(update).await?)
            }
        }
    }
}

fn encode<T: Serialize>(value: T) -> Result<Value, OperationError> {
    serde_json::to_value(value)
        .map_err(|error| OperationError::Execution(format!("could not encode result: {error}")))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::{json, Map};

    use super::ToolExecutor;
    use crate::events::{ToolArguments, ToolCall};
    use crate::test_support::{CountingDesk, DeskBehavior};

    fn call(name: &str, arguments: ToolArguments) -> ToolCall {
        ToolCall { call_id: "call-1".to_string(), name: name.to_string(), arguments }
    }

    fn object(value: serde_json::Value) -> Map<String, serde_json::Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    fn executor(desk: Arc<CountingDesk>) -> ToolExecutor {
        ToolExecutor::new(desk, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn unknown_tool_never_reaches_the_backend() {
        let desk = Arc::new(CountingDesk::default());
        let output = executor(desk.clone())
            .execute(call("reboot_server", ToolArguments::Decoded(Map::new())))
            .await;

        assert_eq!(output, json!({ "error": "Unknown tool reboot_server" }));
        assert_eq!(desk.calls(), 0);
    }

    #[tokio::test]
    async fn status_lookup_accepts_integer_ticket_id() {
        let desk = Arc::new(CountingDesk::default());
        let output = executor(desk.clone())
            .execute(call(
                "get_ticket_status",
                ToolArguments::Encoded("{\"ticket_id\": 5}".to_string()),
            ))
            .await;

        assert_eq!(output["formatted_number"], "ITSD-20240101-0005");
        assert_eq!(desk.calls(), 1);
    }

    #[tokio::test]
    async fn validation_failures_skip_the_backend() {
        let desk = Arc::new(CountingDesk::default());
        let output = executor(desk.clone())
            .execute(call(
                "update_ticket",
                ToolArguments::Decoded(object(json!({
                    "ticket_ref": "5",
                    "comment": "done",
                    "status": "finished"
                }))),
            ))
            .await;

        let message = output["error"].as_str().unwrap_or_default();
        assert!(message.starts_with("invalid arguments for update_ticket"), "{message}");
        assert_eq!(desk.calls(), 0);
    }

    #[tokio::test]
    async fn malformed_encoded_arguments_are_reported() {
        let desk = Arc::new(CountingDesk::default());
        let output = executor(desk.clone())
            .execute(call("search_knowledge", ToolArguments::Encoded("{oops".to_string())))
            .await;

        let message = output["error"].as_str().unwrap_or_default();
        assert!(message.starts_with("invalid tool arguments"), "{message}");
        assert_eq!(desk.calls(), 0);
    }

    #[tokio::test]
    async fn backend_failure_becomes_error_output() {
        let desk = Arc::new(CountingDesk::with_behavior(DeskBehavior::FailStorage));
        let output = executor(desk.clone())
            .execute(call(
                "search_knowledge",
                ToolArguments::Decoded(object(json!({ "query": "vpn" }))),
            ))
            .await;

        assert_eq!(output, json!({ "error": "storage failure: database is locked" }));
        assert_eq!(desk.calls(), 1);
    }

    #[tokio::test]
    async fn backend_panic_is_contained() {
        let desk = Arc::new(CountingDesk::with_behavior(DeskBehavior::Panic));
        let output = executor(desk)
            .execute(call(
                "search_knowledge",
                ToolArguments::Decoded(object(json!({ "query": "vpn" }))),
            ))
            .await;

        assert_eq!(output, json!({ "error": "search_knowledge failed unexpectedly" }));
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_backend_times_out() {
        let desk = Arc::new(CountingDesk::with_behavior(DeskBehavior::Stall));
        let output = ToolExecutor::new(desk, Duration::from_secs(2))
            .execute(call(
                "create_ticket",
                ToolArguments::Decoded(object(json!({
                    "requester_name": "Ana",
                    "requester_email": "ana@example.com",
                    "title": "Laptop",
                    "description": "Will not boot"
                }))),
            ))
            .await;

        assert_eq!(output, json!({ "error": "create_ticket timed out after 2s" }));
    }
}
