//! Event notification: per-manager buses and the application-wide sync bus.

mod bus;
mod sync;

pub use bus::{EventBus, Subscription};
pub use sync::{SyncBus, SyncEvent, WeakSyncBus};
