use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, Histogram, register_counter, register_gauge, register_histogram};


lazy_static! {
    pub static ref ANALYZE_REQUESTS: Counter =
        register_counter!("analyzer_requests_total", "Total number of analyze requests").unwrap();
    pub static ref RATE_LIMITED: Counter =
        register_counter!("analyzer_rate_limited_total", "Requests rejected by the rate limiter").unwrap();
    pub static ref TRUNCATED_DOCUMENTS: Counter =
        register_counter!("analyzer_truncated_documents_total", "Documents cut to the character budget").unwrap();
    pub static ref REPAIRED_REPLIES: Counter =
        register_counter!("analyzer_repaired_replies_total", "Model replies recovered by the repair pass").unwrap();
    pub static ref PARSE_FAILURES: Counter =
        register_counter!("analyzer_parse_failures_total", "Model replies that could not be parsed").unwrap();
    pub static ref UPSTREAM_FAILURES: Counter =
        register_counter!("analyzer_upstream_failures_total", "Failed calls to the model provider").unwrap();
    pub static ref UPSTREAM_LATENCY: Histogram = register_histogram!(
        "analyzer_upstream_latency_seconds",
        "Model call latency in seconds",
        vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0]
    )
    .unwrap();
    pub static ref TRACKED_IDENTITIES: Gauge =
        register_gauge!("analyzer_rate_limit_identities", "Client identities held by the rate limiter").unwrap();
}
