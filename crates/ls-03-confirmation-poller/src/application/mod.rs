//! # Application Layer

pub mod poller;
pub mod top_up;

pub use poller::ConfirmationPoller;
pub use top_up::TopUpConfirmation;
