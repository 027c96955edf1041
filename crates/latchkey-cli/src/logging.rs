//! Logging initialization
//!
//! Logs go to a caller-supplied sink (stderr for the binary) so the wrapped
//! command keeps stdout to itself.

use anyhow::Context;
use tracing::{Subscriber, subscriber::set_global_default};
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_subscriber::{EnvFilter, Registry, fmt, fmt::MakeWriter, layer::SubscriberExt};

use crate::settings::LogFormat;

/// Creates a tracing subscriber writing to `sink` in the given format.
///
/// # Arguments
/// * `name` - The application name for log entries
/// * `env_filter` - Default log level filter, used when `RUST_LOG` is unset
/// * `format` - Bunyan JSON or pretty single-line output
/// * `sink` - The output sink for log entries
pub fn get_subscriber<Sink>(
    name: &str,
    env_filter: &str,
    format: LogFormat,
    sink: Sink,
) -> Box<dyn Subscriber + Send + Sync>
where
    Sink: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(env_filter));

    match format {
        LogFormat::Json => Box::new(
            Registry::default()
                .with(env_filter)
                .with(JsonStorageLayer)
                .with(BunyanFormattingLayer::new(name.into(), sink)),
        ),
        LogFormat::Pretty => Box::new(
            Registry::default()
                .with(env_filter)
                .with(fmt::layer().with_writer(sink).with_ansi(false)),
        ),
    }
}

/// Installs the global subscriber and bridges `log` records into it.
///
/// This should only be called once during startup.
pub fn init_subscriber(subscriber: impl Subscriber + Send + Sync + 'static) -> anyhow::Result<()> {
    LogTracer::init().context("Failed to set logger")?;
    set_global_default(subscriber).context("Failed to set subscriber")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Buffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn test_json_subscriber_writes_bunyan_records() {
        let buffer = Buffer::default();
        let sink = buffer.clone();
        let subscriber = get_subscriber("latchkey-test", "info", LogFormat::Json, move || {
            sink.clone()
        });

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(lock = "lock:jobs", "Lock acquired");
        });

        let output = buffer.contents();
        assert!(output.contains("\"name\":\"latchkey-test\""), "{output}");
        assert!(output.contains("\"msg\":\"Lock acquired\""), "{output}");
        assert!(output.contains("\"lock\":\"lock:jobs\""), "{output}");
    }

    #[test]
    fn test_pretty_subscriber_writes_plain_lines() {
        let buffer = Buffer::default();
        let sink = buffer.clone();
        let subscriber = get_subscriber("latchkey-test", "info", LogFormat::Pretty, move || {
            sink.clone()
        });

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!("Lock wait timed out");
        });

        let output = buffer.contents();
        assert!(output.contains("WARN"), "{output}");
        assert!(output.contains("Lock wait timed out"), "{output}");
        assert!(!output.trim_start().starts_with('{'), "{output}");
    }
}
