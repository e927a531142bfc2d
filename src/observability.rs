use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("thinkchat.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("thinkchat.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("thinkchat.client.request_duration_seconds");

pub(crate) static STREAM_EVENTS: Counter = Counter::new("thinkchat.stream.events");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("thinkchat.stream.errors");
pub(crate) static STREAM_BYTES: Counter = Counter::new("thinkchat.stream.bytes");

pub(crate) static TURNS: Counter = Counter::new("thinkchat.session.turns");
pub(crate) static TURN_FAILURES: Counter = Counter::new("thinkchat.session.turn_failures");
pub(crate) static TURN_DURATION: Moments = Moments::new("thinkchat.session.turn_duration_seconds");
pub(crate) static TOKEN_COUNT_FAILURES: Counter =
    Counter::new("thinkchat.session.token_count_failures");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&STREAM_EVENTS);
    collector.register_counter(&STREAM_ERRORS);
    collector.register_counter(&STREAM_BYTES);

    collector.register_counter(&TURNS);
    collector.register_counter(&TURN_FAILURES);
    collector.register_moments(&TURN_DURATION);
    collector.register_counter(&TOKEN_COUNT_FAILURES);
}
