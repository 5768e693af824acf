use tenderflow_db::migrations;

use crate::commands::{with_database, CommandResult};

pub fn run() -> CommandResult {
    let result = with_database("migrate", |pool| async move {
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;
        migrations::applied_count(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))
    });

    match result {
        Ok(applied) => {
            let available = migrations::available_count();
            CommandResult::success(
                "migrate",
                format!("schema up to date: {applied} of {available} migrations applied"),
            )
        }
        Err(failure) => failure,
    }
}
