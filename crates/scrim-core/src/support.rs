#![forbid(unsafe_code)]

//! Support predicates over overlay requests.
//!
//! A [`RequestSupport`] decides whether a request is one a given consumer
//! (usually a presentation surface) knows how to handle. The decision is made
//! on the request's configuration type, so implementers typically keep one
//! monomorphic [`ConfigSupport`] per payload type and combine several under
//! an [`AggregateSupport`] to accept a family of configurations.
//!
//! The trivial predicates are process-wide singletons: [`all()`] accepts
//! everything, [`none()`] accepts nothing.

use std::marker::PhantomData;

use crate::request::OverlayRequest;
use crate::user_data::Payload;

/// Predicate over a request's attached configuration type.
///
/// Predicates are typically process-wide singletons handed around as
/// `&'static dyn RequestSupport`; see [`all()`], [`none()`], and
/// [`ConfigSupport::shared`].
pub trait RequestSupport: Send + Sync {
    /// Whether `request` is one this predicate's owner can handle.
    fn is_supported(&self, request: &OverlayRequest) -> bool;
}

/// Supports every request.
#[derive(Clone, Copy, Debug, Default)]
pub struct UniversalSupport;

impl RequestSupport for UniversalSupport {
    fn is_supported(&self, _request: &OverlayRequest) -> bool {
        true
    }
}

/// Supports no request.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledSupport;

impl RequestSupport for DisabledSupport {
    fn is_supported(&self, _request: &OverlayRequest) -> bool {
        false
    }
}

/// Process-wide predicate that supports every request.
#[must_use]
pub fn all() -> &'static dyn RequestSupport {
    static SUPPORT: UniversalSupport = UniversalSupport;
    &SUPPORT
}

/// Process-wide predicate that supports no request.
#[must_use]
pub fn none() -> &'static dyn RequestSupport {
    static SUPPORT: DisabledSupport = DisabledSupport;
    &SUPPORT
}

/// Supports exactly the requests configured with payload type `C`.
///
/// Zero-sized; [`ConfigSupport::shared`] returns the per-type singleton the
/// way consumers usually want it.
pub struct ConfigSupport<C: Payload> {
    _config: PhantomData<fn() -> C>,
}

impl<C: Payload> ConfigSupport<C> {
    const SHARED: Self = Self { _config: PhantomData };

    /// Create a predicate for configuration type `C`.
    #[must_use]
    pub const fn new() -> Self {
        Self { _config: PhantomData }
    }

    /// The process-wide predicate instance for configuration type `C`.
    #[must_use]
    pub fn shared() -> &'static Self {
        &Self::SHARED
    }
}

impl<C: Payload> Default for ConfigSupport<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Payload> RequestSupport for ConfigSupport<C> {
    fn is_supported(&self, request: &OverlayRequest) -> bool {
        request.is_configured_with::<C>()
    }
}

/// Union of child predicates: supported iff *any* child is.
///
/// Children are evaluated in the order given, short-circuiting on the first
/// match. The aggregate holds references to its children rather than copies;
/// the `'static` bound reflects that children are expected to be the
/// process-wide singletons above.
pub struct AggregateSupport {
    children: Vec<&'static dyn RequestSupport>,
}

impl AggregateSupport {
    /// Combine `children` into a union predicate.
    ///
    /// # Panics
    ///
    /// Panics if `children` is empty. An aggregate with nothing to delegate
    /// to is a construction bug, not a legitimate "supports nothing" value;
    /// use [`none()`] for that.
    #[must_use]
    pub fn new(children: Vec<&'static dyn RequestSupport>) -> Self {
        assert!(!children.is_empty(), "AggregateSupport requires at least one child predicate");
        Self { children }
    }
}

impl RequestSupport for AggregateSupport {
    fn is_supported(&self, request: &OverlayRequest) -> bool {
        self.children.iter().any(|child| child.is_supported(request))
    }
}
