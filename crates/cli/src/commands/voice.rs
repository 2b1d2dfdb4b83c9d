use std::sync::Arc;

use deskvoice_core::ServiceDesk;
use deskvoice_db::{seed_knowledge, SqlServiceDesk};
use deskvoice_realtime::{BridgeError, RealtimeBridge};

use crate::commands::{open_database, prepare, CommandResult, StepError};

/// Holds one realtime session open until the peer closes it.
pub fn run() -> CommandResult {
    let (config, runtime) = match prepare("voice") {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    if let Err(error) = config.realtime_credential() {
        return CommandResult::failure("voice", "config_validation", error.to_string(), 2);
    }

    let result = runtime.block_on(async {
        let pool = open_database(&config).await?;
        seed_knowledge(&pool).await.map_err(|error| ("seed_execution", error.to_string(), 6u8))?;

        let desk: Arc<dyn ServiceDesk> = Arc::new(SqlServiceDesk::new(pool.clone()));
        let outcome = match RealtimeBridge::from_config(&config.realtime, desk) {
            Ok(mut bridge) => bridge.run().await.map_err(bridge_failure),
            Err(error) => Err(bridge_failure(error)),
        };
        pool.close().await;
        outcome
    });

    match result {
        Ok(report) => CommandResult::success_with_data(
            "voice",
            format!(
                "realtime session closed after {} frames and {} tool calls",
                report.frames_received, report.tool_calls
            ),
            Some(serde_json::json!({
                "frames_received": report.frames_received,
                "frames_discarded": report.frames_discarded,
                "tool_calls": report.tool_calls,
            })),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("voice", error_class, message, exit_code)
        }
    }
}

fn bridge_failure(error: BridgeError) -> StepError {
    match error {
        BridgeError::Config(error) => ("config_validation", error.to_string(), 2),
        BridgeError::Transport(error) => ("realtime_transport", error.to_string(), 7),
    }
}
