use prometheus::{register_counter, register_counter_vec, Counter, CounterVec};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use lazy_static::lazy_static;

lazy_static! {
    pub static ref QUIZ_QUESTION_CNTR: CounterVec = register_counter_vec!(
        "quiz_questions_served_total",
        "Number of questions handed out by the quiz endpoint",
        &["category"]
    )
    .unwrap();
    pub static ref QUESTION_CREATED_CNTR: Counter = register_counter!(
        "questions_created_total",
        "Number of questions created through the api"
    )
    .unwrap();
}

const DEFAULT_LOG_FILTER: &str = "info";

fn span_events_enabled() -> bool {
    std::env::var("INCLUDE_SPAN_EVENTS").is_ok_and(|value| value.eq_ignore_ascii_case("true"))
}

/// Installs the global subscriber; `LOG_LEVEL` takes `EnvFilter` directives
/// and falls back to `info` when unset or unparsable.
pub fn init_tracing() {
    let span_events = if span_events_enabled() {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };
    let fmt_layer = fmt::layer().with_target(true).with_span_events(span_events);
    let filter_layer = EnvFilter::try_from_env("LOG_LEVEL")
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
