use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use giftmatch_core::config::LoadOptions;
use giftmatch_core::{ProductId, SuggestionRequest, SuggestionService};
use giftmatch_db::{connect_from_config, SqlCatalogStore};

use crate::commands::{prepare, read_profile, rng_for, CommandResult, EXIT_DB_CONNECT};

#[derive(Debug, Clone, Args)]
pub struct SuggestArgs {
    /// JSON file describing the recipient
    #[arg(long)]
    pub profile: PathBuf,
    /// Product id to leave out; repeatable
    #[arg(long = "exclude", value_name = "PRODUCT_ID")]
    pub exclude: Vec<String>,
    #[arg(long, help = "Number of suggestions (defaults to matching.browse_limit)")]
    pub top_n: Option<usize>,
    #[arg(long, help = "Seed for reproducible fallback and message choice")]
    pub seed: Option<u64>,
}

pub fn run(options: LoadOptions, args: &SuggestArgs) -> CommandResult {
    let profile = match read_profile("suggest", &args.profile) {
        Ok(profile) => profile,
        Err(failure) => return failure,
    };
    let (config, runtime) = match prepare("suggest", options) {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    let request = SuggestionRequest {
        profile,
        exclude_ids: args.exclude.iter().map(|id| ProductId::from(id.as_str())).collect(),
        top_n: args.top_n,
    };

    runtime.block_on(async {
        let pool = match connect_from_config(&config.database).await {
            Ok(pool) => pool,
            Err(error) => {
                return CommandResult::failure(
                    "suggest",
                    "db_connectivity",
                    error.to_string(),
                    EXIT_DB_CONNECT,
                )
            }
        };

        let store = SqlCatalogStore::new(pool.clone());
        let outcome = match SuggestionService::new(Arc::new(store), &config.matching) {
            Ok(service) => service.suggest(&request, &mut rng_for(args.seed)).await,
            Err(error) => Err(error),
        };
        pool.close().await;

        match outcome {
            Ok(result) => CommandResult::success_with("suggest", result),
            Err(error) => CommandResult::from_application("suggest", error),
        }
    })
}
