use deskvoice_db::{seed_dummy_data, SeedSummary};

use crate::commands::{open_database, prepare, CommandResult};

pub fn run() -> CommandResult {
    let (config, runtime) = match prepare("seed") {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = open_database(&config).await?;
        let summary = seed_dummy_data(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 6u8));
        pool.close().await;
        summary
    });

    match result {
        Ok(summary) => CommandResult::success_with_data(
            "seed",
            seed_message(&summary),
            serde_json::to_value(&summary).ok(),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn seed_message(summary: &SeedSummary) -> String {
    if summary.knowledge_created == 0 && summary.tickets_created == 0 {
        return "dummy data already present; nothing inserted".to_string();
    }
    format!(
        "inserted {} knowledge articles and {} tickets",
        summary.knowledge_created, summary.tickets_created
    )
}
