pub mod stats;
pub mod threshold_service;
pub mod donation_service;
pub mod spin_resolver;
pub mod command_service;
pub mod event_handler;

pub use command_service::{CommandOutcome, CommandService};
pub use donation_service::{DonationService, TrackerSnapshot, RECENT_LIMIT};
pub use event_handler::ChatEventHandler;
pub use spin_resolver::SpinResolver;
pub use threshold_service::ThresholdService;
