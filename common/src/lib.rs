pub mod payment;
pub mod relay_api;
pub mod secret;
pub mod session;
pub mod token;

pub use secret::Secret;
