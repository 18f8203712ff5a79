pub mod config;
pub mod doctor;
pub mod message;
pub mod migrate;
pub mod seed;
pub mod suggest;

use std::fs;
use std::path::Path;

use giftmatch_core::config::{AppConfig, LoadOptions};
use giftmatch_core::{ApplicationError, InterfaceError, RawRecipientInput};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tokio::runtime::Runtime;

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_RUNTIME: u8 = 3;
pub const EXIT_DB_CONNECT: u8 = 4;
pub const EXIT_DB_WRITE: u8 = 5;
pub const EXIT_VERIFICATION: u8 = 6;
pub const EXIT_INPUT: u8 = 7;
pub const EXIT_NO_RESULT: u8 = 8;
pub const EXIT_UNAVAILABLE: u8 = 9;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

#[derive(Debug, Serialize)]
struct DataOutcome<T: Serialize> {
    command: String,
    status: String,
    data: T,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    /// Success carrying a structured payload under `data`.
    pub fn success_with<T: Serialize>(command: &str, data: T) -> Self {
        let payload =
            DataOutcome { command: command.to_string(), status: "ok".to_string(), data };
        match serde_json::to_string(&payload) {
            Ok(output) => Self { exit_code: 0, output },
            Err(error) => Self::failure(command, "serialization", error.to_string(), 1),
        }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Maps a service error onto the same classes the HTTP API reports.
    pub fn from_application(command: &str, error: ApplicationError) -> Self {
        let interface = error.into_interface(command);
        let exit_code = match interface {
            InterfaceError::BadRequest { .. } => EXIT_INPUT,
            InterfaceError::NotFound { .. } | InterfaceError::LimitReached { .. } => EXIT_NO_RESULT,
            InterfaceError::ServiceUnavailable { .. } => EXIT_UNAVAILABLE,
            InterfaceError::Internal { .. } => EXIT_CONFIG,
        };
        Self::failure(command, interface.code(), interface.message(), exit_code)
    }
}

/// Loads config and a current-thread runtime, or the failure to report.
pub(crate) fn prepare(
    command: &str,
    options: LoadOptions,
) -> Result<(AppConfig, Runtime), CommandResult> {
    let config = AppConfig::load(options).map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            EXIT_CONFIG,
        )
    })?;

    let runtime =
        tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
            CommandResult::failure(
                command,
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                EXIT_RUNTIME,
            )
        })?;

    Ok((config, runtime))
}

/// Reads a recipient profile from a JSON file.
pub(crate) fn read_profile(command: &str, path: &Path) -> Result<RawRecipientInput, CommandResult> {
    let raw = fs::read_to_string(path).map_err(|error| {
        CommandResult::failure(
            command,
            "profile_read",
            format!("failed to read profile `{}`: {error}", path.display()),
            EXIT_INPUT,
        )
    })?;

    serde_json::from_str(&raw).map_err(|error| {
        CommandResult::failure(
            command,
            "profile_parse",
            format!("profile `{}` is not valid JSON: {error}", path.display()),
            EXIT_INPUT,
        )
    })
}

/// Seeded when the operator asks for reproducible output.
pub(crate) fn rng_for(seed: Option<u64>) -> StdRng {
    seed.map(StdRng::seed_from_u64).unwrap_or_else(StdRng::from_entropy)
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}
