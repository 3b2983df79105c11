//! Scheduler layer for the bot
//!
//! This layer drives the poll cycle: it asks the status source for
//! changes, renders verdicts, hands them to the notifier and decides
//! when the watermark may advance.

pub mod poller;

pub use poller::{CycleOutcome, StatusPoller};
