use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("ogstartup.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("ogstartup.client.request_errors");
pub(crate) static CLIENT_REQUEST_RETRIES: Counter = Counter::new("ogstartup.client.retries");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("ogstartup.client.request_duration_seconds");
pub(crate) static CLIENT_RETRY_BACKOFF: Moments =
    Moments::new("ogstartup.client.retry_backoff_seconds");

pub(crate) static SESSION_TURNS: Counter = Counter::new("ogstartup.session.turns");
pub(crate) static SESSION_ROLLBACKS: Counter = Counter::new("ogstartup.session.rollbacks");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_counter(&CLIENT_REQUEST_RETRIES);
    collector.register_moments(&CLIENT_REQUEST_DURATION);
    collector.register_moments(&CLIENT_RETRY_BACKOFF);

    collector.register_counter(&SESSION_TURNS);
    collector.register_counter(&SESSION_ROLLBACKS);
}
