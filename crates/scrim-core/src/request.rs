#![forbid(unsafe_code)]

//! Overlay requests.
//!
//! An [`OverlayRequest`] describes *what overlay to show and why*: it wraps
//! exactly one typed configuration payload constructed at creation time and
//! immutable afterwards. The configuration type doubles as the request's
//! identity for dispatch decisions: support predicates match on it (see
//! [`crate::support`]).

use std::fmt;

use crate::user_data::{Payload, UserData};

/// An immutable value object requesting that an overlay be shown.
///
/// Created through [`OverlayRequest::with_config`], which attaches the typed
/// configuration describing the overlay. Whatever subsystem enqueued the
/// request owns it, typically a per-surface [`RequestQueue`].
///
/// [`RequestQueue`]: crate::queue::RequestQueue
pub struct OverlayRequest {
    data: UserData,
}

impl OverlayRequest {
    /// Create a request configured with `config`.
    #[must_use]
    pub fn with_config<C: Payload>(config: C) -> Self {
        let mut data = UserData::new();
        data.insert(config);
        Self { data }
    }

    /// The configuration the request was created with, or `None` if it was
    /// created with a different configuration type.
    #[must_use]
    pub fn config<C: Payload>(&self) -> Option<&C> {
        self.data.get::<C>()
    }

    /// Whether the request was created with configuration type `C`.
    #[must_use]
    pub fn is_configured_with<C: Payload>(&self) -> bool {
        self.data.contains::<C>()
    }
}

impl fmt::Debug for OverlayRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlayRequest").field("config", &self.data).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct DialogConfig {
        message: &'static str,
    }

    #[derive(Debug, PartialEq)]
    struct BannerConfig;

    #[test]
    fn config_roundtrips_through_request() {
        let request = OverlayRequest::with_config(DialogConfig { message: "hello" });
        assert_eq!(request.config::<DialogConfig>(), Some(&DialogConfig { message: "hello" }));
    }

    #[test]
    fn config_of_other_type_is_absent() {
        let request = OverlayRequest::with_config(DialogConfig { message: "hello" });
        assert_eq!(request.config::<BannerConfig>(), None);
        assert!(!request.is_configured_with::<BannerConfig>());
        assert!(request.is_configured_with::<DialogConfig>());
    }

    #[test]
    fn debug_names_the_config_type() {
        let request = OverlayRequest::with_config(BannerConfig);
        let rendered = format!("{request:?}");
        assert!(rendered.contains("BannerConfig"), "unexpected debug output: {rendered}");
    }
}
