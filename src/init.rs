use crate::level::Severity;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Configuration of the global `tracing` subscriber used by
/// [`TracingSink`](crate::tracing_sink::TracingSink).
///
/// **Fields**
/// - `max_level`: most verbose severity printed; `Critical` and `Error`
///   both map to `ERROR`.
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt::Layer` is
///   installed and events are printed to the console.
/// - `with_target`: print the event target (`log_facade` for records).
#[derive(Clone, Debug)]
pub struct SubscriberConfig {
    pub max_level: Severity,
    pub enable_stdout: bool,
    pub with_target: bool,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            max_level: Severity::Information,
            enable_stdout: true,
            with_target: false,
        }
    }
}

/// Initialize the global `tracing` subscriber with the provided
/// [`SubscriberConfig`].
///
/// **Effects**
///
/// Installs a [`Registry`] with a level filter and, when enabled, a `fmt`
/// layer as the global default subscriber. Panics if a global subscriber
/// is already set.
pub fn init_tracing_with_config(config: SubscriberConfig) {
    if !try_init_tracing_with_config(config) {
        panic!("set global subscriber: a global default is already installed");
    }
}

/// Initialize tracing with sensible defaults.
///
/// Equivalent to calling [`init_tracing_with_config`] with
/// [`SubscriberConfig::default`].
pub fn init_tracing() {
    init_tracing_with_config(SubscriberConfig::default());
}

/// Like [`init_tracing_with_config`] but returns `false` instead of
/// panicking when a global subscriber is already installed.
pub fn try_init_tracing_with_config(config: SubscriberConfig) -> bool {
    let filter = LevelFilter::from_level(config.max_level.as_tracing_level());

    // Two subscriber shapes, one per stdout setting, so the types line up.
    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer().with_target(config.with_target);
        let subscriber = Registry::default().with(filter).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber).is_ok()
    } else {
        let subscriber = Registry::default().with(filter);
        tracing::subscriber::set_global_default(subscriber).is_ok()
    }
}
