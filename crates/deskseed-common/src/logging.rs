//! ---
//! seed_section: "01-core-data-model"
//! seed_subsection: "module"
//! seed_type: "source"
//! seed_scope: "code"
//! seed_description: "Tracing subscriber initialisation."
//! seed_version: "v0.0.0-prealpha"
//! seed_owner: "tbd"
//! ---
use tracing_subscriber::{fmt as subscriber_fmt, prelude::*, EnvFilter, Registry};

const LOG_ENV: &str = "DESKSEED_LOG";

/// Initialize the tracing subscriber for the CLI and tests.
///
/// `DESKSEED_LOG` overrides the filter when set; otherwise the
/// standard `RUST_LOG` variable is honoured, finally defaulting to
/// `info` so every create/delete is visible on the console.
pub fn init() {
    let filter = match std::env::var(LOG_ENV) {
        Ok(directive) => EnvFilter::try_new(directive).unwrap_or_else(|err| {
            eprintln!("invalid {LOG_ENV} directive ({err}); defaulting to info");
            EnvFilter::new("info")
        }),
        Err(_) => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let _ = Registry::default()
        .with(filter)
        .with(subscriber_fmt::layer())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init();
        init();
    }
}
