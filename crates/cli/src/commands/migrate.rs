use crate::commands::{prepare, CommandResult, EXIT_DB_CONNECT, EXIT_DB_WRITE};
use giftmatch_core::config::LoadOptions;
use giftmatch_db::{connect_from_config, migrations};

pub fn run(options: LoadOptions) -> CommandResult {
    let (config, runtime) = match prepare("migrate", options) {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = connect_from_config(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), EXIT_DB_CONNECT))?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), EXIT_DB_WRITE))?;
        let applied = migrations::applied_versions(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), EXIT_DB_WRITE))?;
        pool.close().await;
        Ok::<usize, (&'static str, String, u8)>(applied.len())
    });

    match result {
        Ok(applied) => CommandResult::success(
            "migrate",
            format!("applied pending migrations ({applied} total applied)"),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("migrate", error_class, message, exit_code)
        }
    }
}
