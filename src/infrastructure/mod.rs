pub mod logging;

pub use logging::{default_filter, default_logs_dir, init_logging};
