#![forbid(unsafe_code)]

//! Scrim overlay coordination core.
//!
//! This crate provides the model-layer plumbing for presenting overlay UI
//! (dialogs, infobars, auth prompts) decoupled from the objects that request
//! it. Producers describe *what* to show as an [`OverlayRequest`] carrying a
//! typed configuration; the presentation layer answers with zero or more
//! dispatched [`OverlayResponse`]s while the overlay is visible and exactly
//! one optional completion response when it concludes.
//!
//! # Key Components
//!
//! - [`UserData`] - Heterogeneous one-payload-per-type container
//! - [`OverlayRequest`] / [`OverlayResponse`] - Immutable typed value objects
//! - [`RequestSupport`] - Composable predicates over request configuration types
//! - [`CallbackManager`] - Multicast dispatch + one-shot completion callbacks
//! - [`RequestQueue`] - Per-surface FIFO pairing each request with its callbacks
//! - [`overlays`] - Built-in payload families (HTTP auth, confirmation alerts)
//!
//! # How it fits in the system
//!
//! This crate is model-layer only: it never renders anything. A presentation
//! layer owns a [`RequestQueue`] per surface, consults a [`RequestSupport`]
//! predicate to decide whether the front request is one it can show, wires
//! user interaction into the request's [`CallbackManager`], and concludes the
//! overlay through the queue.

pub mod callback_manager;
pub mod overlays;
pub mod queue;
pub mod request;
pub mod response;
pub mod support;
pub mod user_data;

pub use callback_manager::CallbackManager;
pub use queue::RequestQueue;
pub use request::OverlayRequest;
pub use response::OverlayResponse;
pub use support::{
    AggregateSupport, ConfigSupport, DisabledSupport, RequestSupport, UniversalSupport,
};
pub use user_data::{Payload, UserData};
