//! Pending Queue Module
//!
//! This module holds items that were submitted but not yet dispatched.
//! The coordinator drains it whenever a flush trigger fires.

mod pending;

pub use pending::PendingQueue;
