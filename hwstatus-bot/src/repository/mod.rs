//! Repository layer
//!
//! Repositories are stateless HTTP clients for the two external
//! collaborators of the bot: the review API that reports status changes
//! and the messenger that delivers them. They translate every transport
//! outcome into a typed [`hwstatus_core::Error`] and hold no business logic.
//!
//! All repositories are trait-based to enable testing and mocking.

mod notifier;
mod status_source;

// Re-export traits
pub use notifier::Notifier;
pub use status_source::StatusSource;

// Re-export implementations
pub use notifier::TelegramNotifier;
pub use status_source::HttpStatusSource;
