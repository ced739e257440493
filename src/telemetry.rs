use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

/// Initialize structured JSON logging on stderr.
///
/// `RUST_LOG` directives take precedence over the configured level.
pub fn init_telemetry(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_level))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .try_init()?;

    tracing::debug!("cherry-bot telemetry initialized with structured logging");
    Ok(())
}

/// Generate a correlation ID for linking everything one delivery does
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span wrapping the handling of a single webhook delivery
pub fn create_delivery_span(
    event: &str,
    repository: &str,
    number: u64,
    correlation_id: &str,
) -> tracing::Span {
    tracing::info_span!(
        "webhook_delivery",
        event = event,
        repository = repository,
        pr.number = number,
        correlation.id = correlation_id,
    )
}

/// The one place handler failures are reported.
///
/// Failures are terminal for the branch of work that produced them only;
/// the error chain is flattened into a single log field.
pub fn report(err: &anyhow::Error) {
    tracing::error!(error = %format!("{err:#}"), "webhook handling failed");
}
