pub mod guard;
pub mod history;
pub mod shared;

pub use guard::{EntryGuard, GuardStatus, LAST_CLOSED_BAR};
pub use history::{RejectionLog, SignalHistory};
pub use shared::SharedEntryGuard;
