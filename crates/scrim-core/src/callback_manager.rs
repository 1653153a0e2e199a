#![forbid(unsafe_code)]

//! Per-request callback dispatch.
//!
//! A [`CallbackManager`] pairs 1:1 with an [`OverlayRequest`] and carries the
//! two kinds of listeners interested in that overlay's outcome:
//!
//! - *Dispatch callbacks* are multicast observers bound to a response info
//!   type. Every dispatched response fires every matching callback, in
//!   registration order, any number of times over the overlay's lifetime.
//! - *Completion callbacks* fire exactly once each, when the overlay's
//!   overall interaction concludes, all receiving the same final response
//!   (which may be absent).
//!
//! # State machine
//!
//! `Idle → HasPendingCompletion → Completed` (terminal). Dispatch callbacks
//! are independent of this chain and stay usable for the whole lifetime.
//! Once completed, [`execute_completion_callbacks`] is a no-op and the
//! pending response can no longer change.
//!
//! Dropping a manager fires nothing: conclusions are always explicit.
//!
//! [`OverlayRequest`]: crate::request::OverlayRequest
//! [`execute_completion_callbacks`]: CallbackManager::execute_completion_callbacks

use std::any::{TypeId, type_name};
use std::fmt;

use crate::response::OverlayResponse;
use crate::user_data::Payload;

type ErasedDispatch = Box<dyn FnMut(&OverlayResponse)>;
type CompletionCallback = Box<dyn FnOnce(Option<&OverlayResponse>)>;

struct DispatchEntry {
    info_type: TypeId,
    info_type_name: &'static str,
    callback: ErasedDispatch,
}

/// Dispatch and completion callback registry for a single overlay request.
///
/// Not internally synchronized: confine each instance to one logical owner
/// context, typically the UI control-flow thread.
#[derive(Default)]
pub struct CallbackManager {
    dispatch_callbacks: Vec<DispatchEntry>,
    completion_callbacks: Vec<CompletionCallback>,
    completion_response: Option<OverlayResponse>,
    completed: bool,
}

impl CallbackManager {
    /// Create a manager with no listeners and no pending response.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for responses carrying info type `I`.
    ///
    /// Callbacks are multicast: every registered callback whose type matches
    /// a dispatched response fires, in registration order. Registering the
    /// same callback (or type) twice means both registrations fire.
    pub fn add_dispatch_callback<I: Payload>(&mut self, mut callback: impl FnMut(&I) + 'static) {
        let erased: ErasedDispatch = Box::new(move |response| {
            if let Some(info) = response.info::<I>() {
                callback(info);
            }
        });
        self.dispatch_callbacks.push(DispatchEntry {
            info_type: TypeId::of::<I>(),
            info_type_name: type_name::<I>(),
            callback: erased,
        });
    }

    /// Fan `response` out to every dispatch callback bound to its info type.
    ///
    /// Responses whose info type has no registered listener are silently
    /// dropped; overlays nobody is listening for are legitimate. May be
    /// called any number of times, including after completion.
    pub fn dispatch_response(&mut self, response: OverlayResponse) {
        let mut fired = 0usize;
        for entry in &mut self.dispatch_callbacks {
            if response.carries_id(entry.info_type) {
                (entry.callback)(&response);
                fired += 1;
            }
        }
        if fired == 0 {
            tracing::debug!(response = ?response, "dispatched response had no listeners");
        } else {
            tracing::trace!(response = ?response, fired, "dispatched response");
        }
    }

    /// Register `callback` to run when the overlay interaction concludes.
    ///
    /// Completion callbacks fire in registration order, each exactly once.
    /// If the manager has already completed, `callback` is invoked
    /// immediately with the final response rather than being silently lost.
    pub fn add_completion_callback(
        &mut self,
        callback: impl FnOnce(Option<&OverlayResponse>) + 'static,
    ) {
        if self.completed {
            tracing::debug!("completion callback added after completion; invoking immediately");
            callback(self.completion_response.as_ref());
            return;
        }
        self.completion_callbacks.push(Box::new(callback));
    }

    /// Store `response` as the pending completion result.
    ///
    /// Later calls overwrite earlier ones; only the most recent value is
    /// handed to completion callbacks. Ignored once completed.
    pub fn set_completion_response(&mut self, response: OverlayResponse) {
        if self.completed {
            tracing::warn!(response = ?response, "completion response set after completion; ignored");
            return;
        }
        if let Some(previous) = &self.completion_response {
            tracing::trace!(previous = ?previous, "overwriting pending completion response");
        }
        self.completion_response = Some(response);
    }

    /// The currently stored completion response, without consuming it.
    #[must_use]
    pub fn completion_response(&self) -> Option<&OverlayResponse> {
        self.completion_response.as_ref()
    }

    /// Conclude the overlay: run every completion callback, in registration
    /// order, passing the stored completion response (possibly absent).
    ///
    /// Transitions the manager to its terminal completed state; subsequent
    /// calls are no-ops.
    pub fn execute_completion_callbacks(&mut self) {
        if self.completed {
            return;
        }
        self.completed = true;
        let callbacks = std::mem::take(&mut self.completion_callbacks);
        tracing::debug!(
            count = callbacks.len(),
            response = ?self.completion_response,
            "executing completion callbacks"
        );
        for callback in callbacks {
            callback(self.completion_response.as_ref());
        }
    }

    /// Whether [`execute_completion_callbacks`] has already run.
    ///
    /// [`execute_completion_callbacks`]: CallbackManager::execute_completion_callbacks
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed
    }
}

impl fmt::Debug for CallbackManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackManager")
            .field(
                "dispatch_types",
                &self
                    .dispatch_callbacks
                    .iter()
                    .map(|entry| entry.info_type_name)
                    .collect::<Vec<_>>(),
            )
            .field("completion_callbacks", &self.completion_callbacks.len())
            .field("completion_response", &self.completion_response)
            .field("completed", &self.completed)
            .finish()
    }
}
