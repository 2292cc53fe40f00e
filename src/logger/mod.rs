//! Process-wide tracing subscriber. Starts with a bootstrap filter so
//! settings parsing is logged, then switches to the configured one.

mod logger;
pub use logger::*;

pub use tracing::{debug, error, info, trace, warn};
