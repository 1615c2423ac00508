// Logging - stderr subscriber with symbol-prefixed events

use std::fmt::{self, Write as _};

use colored::*;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::{self, Writer};
use tracing_subscriber::fmt::{FmtContext, FormatEvent};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

fn level_symbol(level: Level) -> ColoredString {
    match level {
        Level::TRACE => "[ ]".dimmed(),
        Level::DEBUG => "[?]".blue(),
        Level::INFO => "[+]".green().bold(),
        Level::WARN => "[*]".yellow().bold(),
        Level::ERROR => "[-]".red().bold(),
    }
}

/// Module path below the crate root, e.g. `probe::ping`
fn short_target(target: &str) -> &str {
    target
        .strip_prefix(concat!(env!("CARGO_PKG_NAME"), "::"))
        .unwrap_or(target)
}

/// Message first, then any structured fields as `key=value`
#[derive(Default)]
struct EventText {
    message: String,
    fields: String,
}

impl Visit for EventText {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}

/// Warnings and errors are user-facing and print bare. Debug and trace
/// lines name the module they came from.
pub struct NetcheckFormatter;

impl<S, N> FormatEvent<S, N> for NetcheckFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> format::FormatFields<'a> + 'static,
{
    fn format_event(&self, _ctx: &FmtContext<'_, S, N>, mut writer: Writer<'_>, event: &Event<'_>) -> fmt::Result {
        let metadata = event.metadata();
        let mut text = EventText::default();
        event.record(&mut text);

        write!(writer, "{} ", level_symbol(*metadata.level()))?;
        if *metadata.level() >= Level::DEBUG {
            write!(writer, "{}: ", short_target(metadata.target()).dimmed())?;
        }
        writeln!(writer, "{}{}", text.message, text.fields.as_str().dimmed())
    }
}

/// Install the global subscriber. Output never touches stdout, so tables
/// and JSON stay clean.
pub fn init(level: Level) {
    let filter = EnvFilter::new(level.as_str().to_lowercase());

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .event_format(NetcheckFormatter)
        .try_init();

    if installed.is_err() {
        tracing::debug!("Subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use tracing_subscriber::fmt::MakeWriter;

    use super::*;
    use crate::render::tests::strip_ansi;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn capture(emit: impl FnOnce()) -> String {
        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::TRACE)
            .with_writer(captured.clone())
            .event_format(NetcheckFormatter)
            .finish();
        tracing::subscriber::with_default(subscriber, emit);

        let bytes = captured.0.lock().unwrap().clone();
        strip_ansi(&String::from_utf8(bytes).unwrap())
    }

    #[test]
    fn test_short_target() {
        assert_eq!(short_target("netcheck::probe::ping"), "probe::ping");
        assert_eq!(short_target("other_crate::module"), "other_crate::module");
    }

    #[test]
    fn test_warning_prints_bare_message() {
        let text = capture(|| tracing::warn!("Dependency 'ping' is missing or failing."));
        assert_eq!(text, "[*] Dependency 'ping' is missing or failing.\n");
    }

    #[test]
    fn test_debug_names_module_and_fields() {
        let text = capture(|| tracing::debug!(program = "ip", args = "-json link", "Running command"));
        assert_eq!(text, "[?] logging::tests: Running command program=ip args=-json link\n");
    }
}
