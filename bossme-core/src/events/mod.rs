//! Update events and the bounded queue polling clients read from

mod clock;
mod queue;
mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use queue::{DEFAULT_QUEUE_CAPACITY, UpdateQueue};
pub use types::{EventKind, Timestamp, UpdateEvent};
