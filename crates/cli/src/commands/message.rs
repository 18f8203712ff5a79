use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use giftmatch_core::config::LoadOptions;
use giftmatch_core::{MessageRequest, ProductId, SuggestionService};
use giftmatch_db::{connect_from_config, SqlCatalogStore};
use serde::Serialize;

use crate::commands::{prepare, read_profile, rng_for, CommandResult, EXIT_DB_CONNECT};

#[derive(Debug, Clone, Args)]
pub struct MessageArgs {
    /// JSON file describing the recipient
    #[arg(long)]
    pub profile: PathBuf,
    /// Product to write the message for
    #[arg(long, value_name = "PRODUCT_ID")]
    pub product: String,
    #[arg(long, help = "Seed for reproducible template choice")]
    pub seed: Option<u64>,
}

#[derive(Debug, Serialize)]
struct MessageOutput {
    product_id: ProductId,
    message: String,
}

pub fn run(options: LoadOptions, args: &MessageArgs) -> CommandResult {
    let profile = match read_profile("message", &args.profile) {
        Ok(profile) => profile,
        Err(failure) => return failure,
    };
    let (config, runtime) = match prepare("message", options) {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    let request = MessageRequest { profile, product_id: ProductId::from(args.product.as_str()) };

    runtime.block_on(async {
        let pool = match connect_from_config(&config.database).await {
            Ok(pool) => pool,
            Err(error) => {
                return CommandResult::failure(
                    "message",
                    "db_connectivity",
                    error.to_string(),
                    EXIT_DB_CONNECT,
                )
            }
        };

        let store = SqlCatalogStore::new(pool.clone());
        let outcome = match SuggestionService::new(Arc::new(store), &config.matching) {
            Ok(service) => service.message(&request, &mut rng_for(args.seed)).await,
            Err(error) => Err(error),
        };
        pool.close().await;

        match outcome {
            Ok(message) => CommandResult::success_with(
                "message",
                MessageOutput { product_id: request.product_id.clone(), message },
            ),
            Err(error) => CommandResult::from_application("message", error),
        }
    })
}
