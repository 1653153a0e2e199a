#![forbid(unsafe_code)]

//! Built-in overlay payload families.
//!
//! Each family is a configuration/info pair: the configuration describes the
//! overlay a producer wants shown, the info describes what the user did with
//! it. They are ordinary [`Payload`] types; nothing here is special-cased by
//! the core, and downstream crates define their own families the same way.
//!
//! [`Payload`]: crate::user_data::Payload

pub mod confirmation;
pub mod http_auth;

pub use confirmation::{ConfirmationAction, ConfirmationConfig, ConfirmationResponse};
pub use http_auth::{HttpAuthConfig, HttpAuthResponse};
