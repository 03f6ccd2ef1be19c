//! Log line formatting.
//!
//! Events emitted by hardware components carry a `component` and an `id`
//! field, and are rendered as `[<component> id:<id> - <timestamp>]: <message>`.
//! Other events use their level in place of the component.

use std::fmt::{self, Write as _};
use std::time::{SystemTime, UNIX_EPOCH};

use anstyle::{AnsiColor, Style};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

#[derive(Debug, Default)]
struct HardwareFields {
    component: Option<String>,
    id: Option<u64>,
    message: String,
    extra: String,
}

impl Visit for HardwareFields {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "component" {
            self.component = Some(value.to_owned());
        } else {
            self.record_debug(field, &value);
        }
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        if field.name() == "id" {
            self.id = Some(value);
        } else {
            self.record_debug(field, &value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            let _ = write!(self.extra, " {}={value:?}", field.name());
        }
    }
}

fn millis_since_epoch() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis())
}

fn level_style(level: Level) -> Style {
    let color = match level {
        Level::ERROR => AnsiColor::Red,
        Level::WARN => AnsiColor::Yellow,
        Level::INFO => AnsiColor::Green,
        Level::DEBUG => AnsiColor::Blue,
        _ => AnsiColor::Magenta,
    };
    Style::new().fg_color(Some(anstyle::Color::Ansi(color)))
}

/// Formatter for the hardware trace lines
#[derive(Debug, Default, Clone, Copy)]
pub struct HardwareFormat;

impl<S, N> FormatEvent<S, N> for HardwareFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut fields = HardwareFields::default();
        event.record(&mut fields);

        let level = *event.metadata().level();
        let prefix = match (&fields.component, fields.id) {
            (Some(component), Some(id)) => format!("{component} id:{id}"),
            (Some(component), None) => component.clone(),
            (None, _) => level.to_string(),
        };

        let style = if writer.has_ansi_escapes() {
            level_style(level).bold()
        } else {
            Style::new()
        };

        write!(
            writer,
            "{}[{prefix} - {}]:{} {}{}",
            style.render(),
            millis_since_epoch(),
            style.render_reset(),
            fields.message,
            fields.extra,
        )?;

        // The keyboard puts the terminal in raw mode, where a line feed does
        // not bring the cursor back to the first column
        if crossterm::terminal::is_raw_mode_enabled().unwrap_or(false) {
            writer.write_str("\r\n")
        } else {
            writer.write_char('\n')
        }
    }
}
