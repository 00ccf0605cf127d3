mod analyze;
mod diagnostics;
mod email;
mod extract;
mod health;
mod metrics;

pub use analyze::analyze_handler;
pub use diagnostics::{status_handler, version_handler};
pub use email::email_draft_handler;
pub use extract::extract_handler;
pub use health::health_handler;
pub use metrics::metrics_handler;
