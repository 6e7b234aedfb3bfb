//! Tracing layer that forwards warnings and errors to the log panel.

use std::fmt::{self, Write as _};

use tokio::sync::mpsc;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

pub struct UiLogLayer {
    tx: mpsc::UnboundedSender<String>,
}

impl UiLogLayer {
    pub fn new(tx: mpsc::UnboundedSender<String>) -> Self {
        Self { tx }
    }
}

#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl Visit for LineVisitor {
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

/// `HH:MM:SS LEVEL message key=value…`
pub fn format_line(time: &str, level: &Level, message: &str, fields: &str) -> String {
    format!("{} {} {}{}", time, level, message, fields)
}

impl<S: Subscriber> Layer<S> for UiLogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let level = event.metadata().level();
        // More verbose levels compare greater.
        if *level > Level::WARN {
            return;
        }
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);
        let time = chrono::Local::now().format("%H:%M:%S").to_string();
        let _ = self
            .tx
            .send(format_line(&time, level, &visitor.message, &visitor.fields));
    }
}
