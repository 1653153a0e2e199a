#![forbid(unsafe_code)]

//! Per-surface request queues.
//!
//! A [`RequestQueue`] owns the overlay requests enqueued against one
//! presentation surface, in FIFO order, pairing each request with its
//! [`CallbackManager`] for the request's whole lifetime. The presentation
//! layer works the front of the queue: inspect it, wire interaction callbacks
//! into it, and conclude it with [`pop_front`] (or conclude everything with
//! [`cancel_all`] when the surface goes away).
//!
//! Dropping a queue fires no callbacks; conclusions are explicit.
//!
//! [`pop_front`]: RequestQueue::pop_front
//! [`cancel_all`]: RequestQueue::cancel_all

use std::collections::VecDeque;
use std::fmt;

use crate::callback_manager::CallbackManager;
use crate::request::OverlayRequest;
use crate::response::OverlayResponse;
use crate::support::RequestSupport;

struct EnqueuedOverlay {
    request: OverlayRequest,
    callbacks: CallbackManager,
}

/// FIFO of overlay requests for a single presentation surface.
///
/// Single-owner, not internally synchronized; confine each queue to the
/// surface's control-flow thread.
#[derive(Default)]
pub struct RequestQueue {
    entries: VecDeque<EnqueuedOverlay>,
}

impl RequestQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue `request` behind any requests already waiting.
    ///
    /// The queue creates the request's [`CallbackManager`] and keeps the two
    /// paired until the request is concluded. The manager is returned so the
    /// producer can register its callbacks while the request waits its turn.
    pub fn push_back(&mut self, request: OverlayRequest) -> &mut CallbackManager {
        tracing::debug!(request = ?request, waiting = self.entries.len(), "enqueueing overlay request");
        self.entries.push_back(EnqueuedOverlay {
            request,
            callbacks: CallbackManager::new(),
        });
        &mut self
            .entries
            .back_mut()
            .expect("entry was just pushed")
            .callbacks
    }

    /// The request currently at the front, if any.
    #[must_use]
    pub fn front(&self) -> Option<&OverlayRequest> {
        self.entries.front().map(|entry| &entry.request)
    }

    /// The front request, but only when `support` accepts it.
    ///
    /// This is the question a presentation surface asks before showing
    /// anything: "is the next overlay one of mine?"
    #[must_use]
    pub fn front_supported(&self, support: &dyn RequestSupport) -> Option<&OverlayRequest> {
        self.front().filter(|request| support.is_supported(request))
    }

    /// The callback manager paired with the front request, if any.
    pub fn front_callbacks(&mut self) -> Option<&mut CallbackManager> {
        self.entries.front_mut().map(|entry| &mut entry.callbacks)
    }

    /// Conclude the front overlay and remove it from the queue.
    ///
    /// When `response` is given it becomes the completion response (last
    /// write wins over anything set earlier through [`front_callbacks`]);
    /// either way the request's completion callbacks run before the entry is
    /// dropped. Returns the concluded request, or `None` on an empty queue.
    ///
    /// [`front_callbacks`]: RequestQueue::front_callbacks
    pub fn pop_front(&mut self, response: Option<OverlayResponse>) -> Option<OverlayRequest> {
        let mut entry = self.entries.pop_front()?;
        tracing::debug!(request = ?entry.request, "concluding front overlay");
        if let Some(response) = response {
            entry.callbacks.set_completion_response(response);
        }
        entry.callbacks.execute_completion_callbacks();
        Some(entry.request)
    }

    /// Conclude every enqueued overlay with no completion response.
    ///
    /// Used when the owning surface disappears: each request's completion
    /// callbacks observe an absent response, front to back.
    pub fn cancel_all(&mut self) {
        tracing::debug!(cancelled = self.entries.len(), "cancelling all enqueued overlays");
        for mut entry in self.entries.drain(..) {
            entry.callbacks.execute_completion_callbacks();
        }
    }

    /// Number of enqueued requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no request is enqueued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The enqueued requests, front to back.
    pub fn requests(&self) -> impl Iterator<Item = &OverlayRequest> {
        self.entries.iter().map(|entry| &entry.request)
    }
}

impl fmt::Debug for RequestQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestQueue").field("len", &self.entries.len()).finish()
    }
}
