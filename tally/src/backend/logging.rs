use anyhow::Result;
use tracing_subscriber::filter::EnvFilter;

static CRATE_TARGET: &str = "kinshu_tally";

/// Install a stdout subscriber. `RUST_LOG` wins over `level` when set.
///
/// The services log through the `log` facade; the subscriber picks those
/// records up as well.
pub fn init(level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_directives(level))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {}", e))
}

fn default_directives(level: &str) -> String {
    format!("warn,{}={}", CRATE_TARGET, max_level(level))
}

fn max_level(level: &str) -> &'static str {
    match level.trim().to_ascii_lowercase().as_str() {
        "error" => "error",
        "warn" | "warning" => "warn",
        "debug" => "debug",
        "trace" => "trace",
        _ => "info",
    }
}
