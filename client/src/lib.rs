//! Client-side orchestration for Xpaio.
//!
//! Drives wallet sign-in, payments and token issuance against an injected
//! [`sdk::WalletSdk`] and the relay service. Rendering is left to the host;
//! everything here is plain state plus async flows.

pub mod app;
pub mod auth;
pub mod chat;
pub mod config;
pub mod error;
pub mod payment;
pub mod relay_client;
pub mod sdk;
pub mod token_form;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use app::App;
pub use config::{ClientConfig, SandboxMode};
pub use error::ClientError;
