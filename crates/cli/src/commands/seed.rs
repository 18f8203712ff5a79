use crate::commands::{prepare, CommandResult, EXIT_DB_CONNECT, EXIT_DB_WRITE, EXIT_VERIFICATION};
use giftmatch_core::config::LoadOptions;
use giftmatch_db::{connect_from_config, migrations, CatalogSeedDataset, SeedResult};

pub fn run(options: LoadOptions) -> CommandResult {
    let (config, runtime) = match prepare("seed", options) {
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

        let seed_result = CatalogSeedDataset::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), EXIT_DB_WRITE))?;

        let verification = CatalogSeedDataset::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), EXIT_VERIFICATION))?;

        let run_result: Result<SeedResult, (&'static str, String, u8)> =
            if verification.all_present {
                Ok(seed_result)
            } else {
                let failed_checks = verification
                    .checks
                    .iter()
                    .filter_map(|(check, passed)| (!passed).then_some(*check))
                    .collect::<Vec<_>>();
                Err(("seed_verification", verification_message(&failed_checks), EXIT_VERIFICATION))
            };

        pool.close().await;
        run_result
    });

    match result {
        Ok(seeded) => CommandResult::success(
            "seed",
            format!(
                "demo catalog loaded: {} products ({} active)",
                seeded.products_seeded, seeded.active_products
            ),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn verification_message(failed_checks: &[&str]) -> String {
    if failed_checks.is_empty() {
        "some seed products failed to load".to_string()
    } else {
        format!("seed verification failed for checks: {}", failed_checks.join(", "))
    }
}
