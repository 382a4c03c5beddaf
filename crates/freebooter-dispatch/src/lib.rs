//! Cross-thread plumbing for Freebooter.
//!
//! Two small building blocks that every other layer leans on:
//!
//! - [`CallbackQueue`] is the one synchronization boundary between the
//!   network thread and the simulation loop. Work is pushed from anywhere
//!   and executed on the main thread when the queue is drained.
//! - [`EventBus`] carries typed events (logins, logouts, object
//!   lifecycle) from the code that produces them to the code that owns the
//!   affected state.

mod bus;
mod queue;

pub use bus::{Event, EventBus, Subscription};
pub use queue::{Callback, CallbackQueue};
