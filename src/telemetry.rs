use tracing::subscriber::SetGlobalDefaultError;
use tracing::Subscriber;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

/// JSON subscriber filtered by `RUST_LOG`, falling back to `default_filter`.
pub fn get_subscriber(default_filter: &str) -> impl Subscriber + Send + Sync {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let formatting_layer = fmt::layer()
        .json()
        .with_current_span(false)
        .with_target(true);

    Registry::default().with(env_filter).with(formatting_layer)
}

/// Install `subscriber` for the whole process. Fails if one is already set.
pub fn init_subscriber(
    subscriber: impl Subscriber + Send + Sync,
) -> Result<(), SetGlobalDefaultError> {
    tracing::subscriber::set_global_default(subscriber)
}
