use giftmatch_core::config::{AppConfig, LoadOptions};
use giftmatch_core::MatchingEngine;
use giftmatch_db::{connect_from_config, migrations};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

impl DoctorReport {
    fn passed(&self) -> bool {
        self.overall_status == CheckStatus::Pass
    }
}

/// Returns the rendered report and whether every check passed.
pub fn run(options: LoadOptions, json_output: bool) -> (String, bool) {
    let report = build_report(options);
    let passed = report.passed();

    if json_output {
        let output = serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
        return (output, passed);
    }

    (render_human(&report), passed)
}

fn build_report(options: LoadOptions) -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(options) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_message_templates(&config));
            checks.push(check_catalog(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["message_templates", "catalog_readiness"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_message_templates(config: &AppConfig) -> DoctorCheck {
    match MatchingEngine::new(config.matching.weights, config.matching.max_per_category) {
        Ok(_) => DoctorCheck {
            name: "message_templates",
            status: CheckStatus::Pass,
            details: "message templates compiled for every tone".to_string(),
        },
        Err(error) => DoctorCheck {
            name: "message_templates",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

/// Connects, confirms migrations ran and counts active products.
fn check_catalog(config: &AppConfig) -> DoctorCheck {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name: "catalog_readiness",
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            };
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_from_config(&config.database)
            .await
            .map_err(|error| format!("failed to connect to database: {error}"))?;

        let outcome = async {
            let applied = migrations::applied_versions(&pool)
                .await
                .map_err(|error| format!("migrations have not been applied: {error}"))?;
            let active: i64 =
                sqlx::query_scalar("SELECT COUNT(1) FROM product WHERE is_active = 1")
                    .fetch_one(&pool)
                    .await
                    .map_err(|error| format!("catalog query failed: {error}"))?;
            Ok::<(usize, i64), String>((applied.len(), active))
        }
        .await;

        pool.close().await;
        outcome
    });

    match result {
        Ok((_, 0)) => DoctorCheck {
            name: "catalog_readiness",
            status: CheckStatus::Fail,
            details: "catalog has no active products; run `giftmatch seed`".to_string(),
        },
        Ok((applied, active)) => DoctorCheck {
            name: "catalog_readiness",
            status: CheckStatus::Pass,
            details: format!(
                "connected using `{}`: {applied} migrations, {active} active products",
                config.database.url
            ),
        },
        Err(error) => DoctorCheck { name: "catalog_readiness", status: CheckStatus::Fail, details: error },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
