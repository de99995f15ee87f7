// File: spinbot-common/src/traits/mod.rs
pub mod record_traits;
pub mod repository_traits;

pub use record_traits::{parse_flag, LogField, LogRecord, SpinFlagged};
pub use repository_traits::{EventLogRepository, FlagUpdate, SpinFlagRepository, ThresholdStore};
