//! # Telemetry
//!
//! Global tracing setup plus the task-local trace context that ties one
//! webhook delivery to every log line and error response it produces.

use std::any::type_name_of_val;
use std::sync::atomic::{AtomicBool, Ordering};

use log::LevelFilter;
use thiserror::Error;
use tokio::task_local;
use tracing_log::LogTracer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::config::AppConfig;

/// Identifies one webhook delivery across log lines and error bodies.
#[derive(Debug, Clone)]
pub struct TraceContext {
    pub trace_id: String,
}

task_local! {
    static CURRENT_DELIVERY: TraceContext;
}

/// Failures while installing the global subscriber
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("could not install the log bridge: {0}")]
    LogBridge(#[from] log::SetLoggerError),
    #[error("could not install the tracing subscriber: {0}")]
    Subscriber(#[from] TryInitError),
}

static INIT_DONE: AtomicBool = AtomicBool::new(false);

/// Install the global subscriber once; later calls are no-ops.
///
/// The filter comes from `RUST_LOG` when set, else from the configured log
/// level. Output is JSON unless the config asks for the pretty format.
pub fn init_tracing(config: &AppConfig) -> Result<(), TelemetryError> {
    if INIT_DONE.swap(true, Ordering::SeqCst) {
        return Ok(());
    }

    // Route log-crate records (sqlx, sea-orm internals) through tracing.
    if let Err(error) = LogTracer::builder()
        .with_max_level(LevelFilter::Trace)
        .init()
    {
        // An already-installed bridge is fine; anything else means
        // log-crate records are lost, so say so on stderr.
        if !type_name_of_val(log::logger()).contains("LogTracer") {
            eprintln!("warning: log bridge not installed: {error}");
        }
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let format_layer = match config.log_format.as_str() {
        "pretty" => fmt::layer().pretty().boxed(),
        _ => fmt::layer().json().boxed(),
    };

    if let Err(error) = tracing_subscriber::registry()
        .with(filter)
        .with(format_layer)
        .try_init()
    {
        INIT_DONE.store(false, Ordering::SeqCst);
        eprintln!("warning: tracing subscriber not installed: {error}");
    }
    Ok(())
}

/// Run `future` with `context` as the active delivery's trace context.
pub async fn with_trace_context<F, T>(context: TraceContext, future: F) -> T
where
    F: Future<Output = T>,
{
    CURRENT_DELIVERY.scope(context, future).await
}

/// Trace id of the delivery the current task is handling, if any.
pub fn current_trace_id() -> Option<String> {
    CURRENT_DELIVERY
        .try_with(|context| context.trace_id.clone())
        .ok()
}
