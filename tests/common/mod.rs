//! Shared harness: an in-memory exporter behind the global tracer
//! provider. Tests are serialized so each one reads only its own spans.

#![allow(dead_code)]

use std::sync::{Mutex, MutexGuard, OnceLock};

use opentelemetry::global;
use opentelemetry::Value;
use opentelemetry_sdk::export::trace::SpanData;
use opentelemetry_sdk::testing::trace::InMemorySpanExporter;
use opentelemetry_sdk::trace::TracerProvider;

static EXPORTER: OnceLock<InMemorySpanExporter> = OnceLock::new();
static PROVIDER: OnceLock<TracerProvider> = OnceLock::new();
static SERIAL: Mutex<()> = Mutex::new(());

/// Installs the shared provider on first use, resets the exporter and
/// hands back the serialization guard. Hold the guard for the whole test.
pub fn setup() -> (MutexGuard<'static, ()>, InMemorySpanExporter) {
    let guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let exporter = EXPORTER
        .get_or_init(|| {
            let exporter = InMemorySpanExporter::default();
            let provider = TracerProvider::builder()
                .with_simple_exporter(exporter.clone())
                .build();
            global::set_tracer_provider(provider.clone());
            PROVIDER.set(provider).unwrap();
            exporter
        })
        .clone();
    // The simple processor exports on a background thread; drain any
    // spans still in flight from the previous test before resetting.
    flush();
    exporter.reset();
    (guard, exporter)
}

pub fn finished(exporter: &InMemorySpanExporter) -> Vec<SpanData> {
    flush();
    exporter.get_finished_spans().unwrap()
}

fn flush() {
    if let Some(provider) = PROVIDER.get() {
        for result in provider.force_flush() {
            result.unwrap();
        }
    }
}

pub fn attr(span: &SpanData, key: &str) -> Option<Value> {
    span.attributes
        .iter()
        .find(|kv| kv.key.as_str() == key)
        .map(|kv| kv.value.clone())
}
