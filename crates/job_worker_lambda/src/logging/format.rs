use std::fmt;

use chrono::Local;
use job_worker_core::contract::PROCESS_REQUEST_ID;
use job_worker_core::log_record::{LogRecord, Severity};
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id};
use tracing::{Event, Level, Metadata, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// Target carrying `critical` events, which `tracing` has no level for.
pub const CRITICAL_TARGET: &str = "job_worker::critical";
pub const REQUEST_ID_FIELD: &str = "request_id";

const MESSAGE_FIELD: &str = "message";

pub fn severity_of(metadata: &Metadata<'_>) -> Severity {
    let level = *metadata.level();
    if level == Level::ERROR {
        if metadata.target() == CRITICAL_TARGET {
            Severity::Critical
        } else {
            Severity::Error
        }
    } else if level == Level::WARN {
        Severity::Warning
    } else if level == Level::INFO {
        Severity::Info
    } else {
        Severity::Debug
    }
}

/// Renders every event as [`LogRecord`] lines.
///
/// A multi-line message becomes one record per line, each with the same
/// timestamp, severity and correlation id.
///
/// The correlation id comes from the event's `request_id` field, then from the
/// closest enclosing span that declared one, then falls back to
/// [`PROCESS_REQUEST_ID`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestLineFormat;

impl<S, N> FormatEvent<S, N> for RequestLineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);

        let correlation_id = visitor
            .request_id
            .take()
            .or_else(|| span_request_id(ctx))
            .unwrap_or_else(|| PROCESS_REQUEST_ID.to_string());

        let mut record = LogRecord {
            timestamp: Local::now().naive_local(),
            severity: severity_of(event.metadata()),
            correlation_id,
            message: String::new(),
        };
        let message = visitor.rendered_message();
        if message.is_empty() {
            return writeln!(writer, "{record}");
        }
        for segment in message.lines() {
            segment.clone_into(&mut record.message);
            writeln!(writer, "{record}")?;
        }
        Ok(())
    }
}

fn span_request_id<S, N>(ctx: &FmtContext<'_, S, N>) -> Option<String>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    ctx.event_scope()?.find_map(|span| {
        let extensions = span.extensions();
        extensions
            .get::<SpanRequestId>()
            .map(|request_id| request_id.0.clone())
    })
}

#[derive(Debug, Clone)]
struct SpanRequestId(String);

/// Remembers the `request_id` a span was opened with so events logged inside
/// it inherit the id.
#[derive(Debug, Clone, Copy, Default)]
pub struct CorrelationLayer;

impl<S> Layer<S> for CorrelationLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut visitor = LineVisitor::default();
        attrs.record(&mut visitor);

        if let (Some(request_id), Some(span)) = (visitor.request_id, ctx.span(id)) {
            span.extensions_mut().insert(SpanRequestId(request_id));
        }
    }
}

#[derive(Debug, Default)]
struct LineVisitor {
    message: String,
    request_id: Option<String>,
    fields: Vec<(&'static str, String)>,
}

impl LineVisitor {
    fn record_value(&mut self, field: &Field, value: String) {
        match field.name() {
            MESSAGE_FIELD => self.message = value,
            REQUEST_ID_FIELD => self.request_id = Some(value),
            name => self.fields.push((name, value)),
        }
    }

    fn rendered_message(&self) -> String {
        let mut message = self.message.clone();
        for (name, value) in &self.fields {
            if !message.is_empty() {
                message.push(' ');
            }
            message.push_str(name);
            message.push('=');
            message.push_str(value);
        }
        message
    }
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_value(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record_value(field, format!("{value:?}"));
    }
}
