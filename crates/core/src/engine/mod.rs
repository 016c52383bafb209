//! Queue engine: ticket lifecycle and FIFO ordering per department.

mod queue;
mod types;

pub use queue::QueueEngine;
pub use types::{AdvanceOutcome, JoinOutcome, JoinRequest, QueueError, QueueStatus};
