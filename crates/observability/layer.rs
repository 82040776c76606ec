use std::collections::BTreeMap;

use chrono::Utc;
use tracing::{
    Event, Subscriber,
    field::{Field, Visit},
    span::{Attributes, Id, Record},
};
use tracing_subscriber::{Layer, layer::Context, registry::LookupSpan};

use super::{
    alert_queue::{AlertEvent, AlertQueue, SpanSummary},
    config::ServiceContext,
};

/// Events emitted by the alert pipeline itself are never forwarded.
const OWN_TARGET: &str = "crates::observability";

const SENSITIVE_MARKERS: [&str; 7] = [
    "secret",
    "token",
    "signature",
    "password",
    "authorization",
    "private_key",
    "webhook_url",
];

pub(crate) struct AlertLayer {
    queue: AlertQueue,
    service_context: ServiceContext,
}

impl AlertLayer {
    pub(crate) fn new(queue: AlertQueue, service_context: ServiceContext) -> Self {
        Self {
            queue,
            service_context,
        }
    }
}

#[derive(Default)]
struct RedactingVisitor {
    values: BTreeMap<String, String>,
}

impl RedactingVisitor {
    fn insert(&mut self, field: &Field, value: String) {
        let name = field.name();
        let value = if is_sensitive(name) {
            "[REDACTED]".to_string()
        } else {
            value
        };
        self.values.insert(name.to_string(), value);
    }
}

impl Visit for RedactingVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.insert(field, format!("{value:?}"));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, value.to_string());
    }
}

struct SpanFields(BTreeMap<String, String>);

impl<S> Layer<S> for AlertLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut visitor = RedactingVisitor::default();
        attrs.record(&mut visitor);
        if visitor.values.is_empty() {
            return;
        }
        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(SpanFields(visitor.values));
        }
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };

        let mut visitor = RedactingVisitor::default();
        values.record(&mut visitor);
        if visitor.values.is_empty() {
            return;
        }

        let mut extensions = span.extensions_mut();
        match extensions.get_mut::<SpanFields>() {
            Some(existing) => existing.0.extend(visitor.values),
            None => extensions.insert(SpanFields(visitor.values)),
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if metadata.target().starts_with(OWN_TARGET) {
            return;
        }

        let mut visitor = RedactingVisitor::default();
        event.record(&mut visitor);
        let message = visitor
            .values
            .remove("message")
            .map(|raw| unquote(&raw).to_string());

        let spans = ctx
            .event_span(event)
            .map(|span| {
                span.scope()
                    .from_root()
                    .map(|s| SpanSummary {
                        name: s.metadata().name().to_string(),
                        fields: s
                            .extensions()
                            .get::<SpanFields>()
                            .map(|fields| fields.0.clone())
                            .unwrap_or_default(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let location = match (metadata.file(), metadata.line()) {
            (Some(file), Some(line)) => Some(format!("{file}:{line}")),
            _ => None,
        };

        self.queue.push(AlertEvent {
            level: *metadata.level(),
            timestamp: Utc::now(),
            service_name: self.service_context.service_name.clone(),
            environment: self.service_context.environment.clone(),
            component: self.service_context.component.clone(),
            target: metadata.target().to_string(),
            location,
            message,
            fields: visitor.values,
            spans,
        });
    }
}

fn unquote(input: &str) -> &str {
    let trimmed = input.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(trimmed)
}

fn is_sensitive(field_name: &str) -> bool {
    let field = field_name.to_ascii_lowercase();
    SENSITIVE_MARKERS.iter().any(|marker| field.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_credentials_and_signatures() {
        assert!(is_sensitive("stripe_signature"));
        assert!(is_sensitive("purchase_token"));
        assert!(is_sensitive("Authorization"));
        assert!(is_sensitive("google_private_key"));
        assert!(!is_sensitive("payment_intent_id"));
        assert!(!is_sensitive("user_id"));
    }

    #[test]
    fn unquotes_debug_strings() {
        assert_eq!(unquote("\"order settled\""), "order settled");
        assert_eq!(unquote(" plain "), "plain");
        assert_eq!(unquote("\""), "\"");
    }
}
