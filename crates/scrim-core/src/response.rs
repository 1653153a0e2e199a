#![forbid(unsafe_code)]

//! Overlay responses.
//!
//! An [`OverlayResponse`] describes *what the user or overlay produced*: a
//! single typed info payload attached at creation time. Responses flow back
//! through a request's [`CallbackManager`], either as interim dispatches
//! while the overlay is visible or as the final completion response.
//!
//! [`CallbackManager`]: crate::callback_manager::CallbackManager

use std::any::TypeId;
use std::fmt;

use crate::user_data::{Payload, UserData};

/// An immutable value object carrying the outcome of overlay interaction.
///
/// Created through [`OverlayResponse::with_info`]. A response is owned by the
/// [`CallbackManager`] it is handed to, until dispatched or consumed.
///
/// [`CallbackManager`]: crate::callback_manager::CallbackManager
pub struct OverlayResponse {
    data: UserData,
}

impl OverlayResponse {
    /// Create a response carrying `info`.
    #[must_use]
    pub fn with_info<I: Payload>(info: I) -> Self {
        let mut data = UserData::new();
        data.insert(info);
        Self { data }
    }

    /// The info the response was created with, or `None` if it was created
    /// with a different info type.
    #[must_use]
    pub fn info<I: Payload>(&self) -> Option<&I> {
        self.data.get::<I>()
    }

    /// Whether the response carries info of type `I`.
    #[must_use]
    pub fn carries<I: Payload>(&self) -> bool {
        self.data.contains::<I>()
    }

    pub(crate) fn carries_id(&self, type_id: TypeId) -> bool {
        self.data.contains_id(type_id)
    }
}

impl fmt::Debug for OverlayResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlayResponse").field("info", &self.data).finish()
    }
}
