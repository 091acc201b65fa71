use std::env;
use tracing::{info, Subscriber};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Pretty, colored console output on stdout. Progress spinners draw on stderr.
fn console_layer<S>() -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(std::io::stdout)
        .pretty()
        .with_file(false)
        .without_time()
        .with_ansi(true)
}

pub fn init_logger() -> impl Drop {
    let filter = env::var("TRACING_LEVEL").unwrap_or_else(|_| "info".to_string());
    let filter_layer = EnvFilter::new(filter);

    let log_file_path =
        env::var("LOG_FILE_PATH").unwrap_or_else(|_| "./logs/asset-duper.log".to_string());

    let file_appender = tracing_appender::rolling::never("./", &log_file_path);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(console_layer())
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
        .with(filter_layer)
        .init();

    info!("Tracing is configured for stdout and {}", log_file_path);

    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_layer_accepts_events() {
        let subscriber = tracing_subscriber::registry().with(console_layer());
        tracing::subscriber::with_default(subscriber, || {
            info!(records = 3, "console layer smoke event");
        });
    }
}
