//! Log output.
//!
//! Every module logs through `tracing`; this installs the global
//! subscriber. Natively events go to stderr and honour `RUST_LOG`. With the
//! `wasm` feature they go to the browser console, without timestamps since
//! the system clock is unavailable there.

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Filter used when nothing else is configured
pub const DEFAULT_FILTER: &str = "liquid_fx=info";

/// Output format of log lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable single lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

fn filter(default_filter: &str) -> EnvFilter {
    if cfg!(feature = "wasm") {
        return EnvFilter::new(default_filter);
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}

/// Install the global subscriber
///
/// Returns `false` if a subscriber was already installed, in which case
/// nothing changes.
pub fn init_logging(default_filter: &str, format: LogFormat) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter(default_filter))
        .with_target(true)
        .with_ansi(false);

    #[cfg(feature = "wasm")]
    let builder = builder.without_time().with_writer(console::ConsoleMakeWriter);
    #[cfg(not(feature = "wasm"))]
    let builder = builder.with_writer(std::io::stderr);

    let installed = match format {
        LogFormat::Text => builder.try_init().is_ok(),
        LogFormat::Json => builder.json().try_init().is_ok(),
    };
    if installed {
        tracing::debug!(filter = default_filter, ?format, "logging initialized");
    }
    installed
}

#[cfg(feature = "wasm")]
mod console {
    use std::io;
    use tracing_subscriber::fmt::MakeWriter;
    use wasm_bindgen::JsValue;

    /// Hands out one [`ConsoleWriter`] per event
    #[derive(Debug, Clone, Copy)]
    pub struct ConsoleMakeWriter;

    /// Buffers one formatted event and logs it on drop
    #[derive(Debug, Default)]
    pub struct ConsoleWriter {
        buffer: Vec<u8>,
    }

    impl io::Write for ConsoleWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.buffer.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Drop for ConsoleWriter {
        fn drop(&mut self) {
            let line = String::from_utf8_lossy(&self.buffer);
            let line = line.trim_end();
            if !line.is_empty() {
                web_sys::console::log_1(&JsValue::from_str(line));
            }
        }
    }

    impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
        type Writer = ConsoleWriter;

        fn make_writer(&'a self) -> Self::Writer {
            ConsoleWriter::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_rejected() {
        let _ = init_logging(DEFAULT_FILTER, LogFormat::Text);
        assert!(!init_logging("debug", LogFormat::Json));
    }

    #[test]
    fn test_log_format_serde() {
        assert_eq!(serde_json::to_string(&LogFormat::Json).unwrap(), "\"json\"");
        let parsed: LogFormat = serde_json::from_str("\"text\"").unwrap();
        assert_eq!(parsed, LogFormat::Text);
    }
}
