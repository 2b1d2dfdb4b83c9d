use std::sync::Arc;

use deskvoice_agent::AssistantRuntime;
use deskvoice_core::args::MIN_QUERY_CHARS;
use deskvoice_db::{seed_knowledge, SqlServiceDesk};

use crate::commands::{open_database, prepare, CommandResult};

/// Runs one utterance through the text path and prints the envelope.
pub fn run(utterance: &str) -> CommandResult {
    if utterance.trim().chars().count() < MIN_QUERY_CHARS {
        return CommandResult::failure(
            "ask",
            "validation",
            format!("utterance must be at least {MIN_QUERY_CHARS} characters"),
            2,
        );
    }

    let (config, runtime) = match prepare("ask") {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = open_database(&config).await?;
        seed_knowledge(&pool).await.map_err(|error| ("seed_execution", error.to_string(), 6u8))?;

        let assistant = AssistantRuntime::new(Arc::new(SqlServiceDesk::new(pool.clone())));
        let envelope = assistant.handle_assistant_utterance(utterance).await;
        pool.close().await;
        Ok::<_, crate::commands::StepError>(envelope)
    });

    match result {
        Ok(envelope) => CommandResult::success_with_data(
            "ask",
            envelope.response.clone(),
            serde_json::to_value(&envelope).ok(),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("ask", error_class, message, exit_code)
        }
    }
}
