//! Inbound message intake — classification, dedup, extraction, processing.

pub mod classify;
pub mod dedup;
pub mod extract;
pub mod processor;
pub mod types;

pub use classify::classify;
pub use dedup::SeenMessages;
pub use processor::IntakeProcessor;
pub use types::{InboundMessage, IntakeOutcome, MessageKind};
