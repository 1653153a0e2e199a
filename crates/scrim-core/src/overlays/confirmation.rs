#![forbid(unsafe_code)]

//! Confirmation alert overlays.
//!
//! A two-button alert: the user either confirms the described action or
//! dismisses it.

use crate::support::ConfigSupport;

/// Configuration for a confirmation alert.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfirmationConfig {
    title: String,
    message: String,
}

impl ConfirmationConfig {
    /// Describe a confirmation alert with the given title and body message.
    #[must_use]
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }

    /// The alert title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The alert body message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The predicate supporting exactly confirmation-configured requests.
    #[must_use]
    pub fn request_support() -> &'static ConfigSupport<Self> {
        ConfigSupport::shared()
    }
}

/// How the user resolved a confirmation alert.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfirmationAction {
    /// The user accepted the described action.
    Confirmed,
    /// The user dismissed the alert without accepting.
    Dismissed,
}

/// Outcome info for a confirmation alert.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConfirmationResponse {
    action: ConfirmationAction,
}

impl ConfirmationResponse {
    /// Record the user's resolution.
    #[must_use]
    pub fn new(action: ConfirmationAction) -> Self {
        Self { action }
    }

    /// The action the user took.
    #[must_use]
    pub fn action(&self) -> ConfirmationAction {
        self.action
    }

    /// Whether the user confirmed.
    #[must_use]
    pub fn confirmed(&self) -> bool {
        self.action == ConfirmationAction::Confirmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback_manager::CallbackManager;
    use crate::request::OverlayRequest;
    use crate::response::OverlayResponse;
    use crate::support::RequestSupport;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn config_accessors_reflect_construction() {
        let config = ConfirmationConfig::new("Clear history?", "This cannot be undone.");
        assert_eq!(config.title(), "Clear history?");
        assert_eq!(config.message(), "This cannot be undone.");
    }

    #[test]
    fn request_support_matches_only_confirmation_requests() {
        let support = ConfirmationConfig::request_support();
        let request = OverlayRequest::with_config(ConfirmationConfig::new("t", "m"));
        assert!(support.is_supported(&request));
        assert!(!support.is_supported(&OverlayRequest::with_config(0u8)));
    }

    #[test]
    fn outcome_flows_through_a_callback_manager() {
        let mut manager = CallbackManager::new();
        let confirmed = Rc::new(Cell::new(false));

        let flag = Rc::clone(&confirmed);
        manager.add_completion_callback(move |response| {
            let action = response
                .and_then(|r| r.info::<ConfirmationResponse>())
                .map(|info| info.confirmed())
                .unwrap_or(false);
            flag.set(action);
        });

        manager.set_completion_response(OverlayResponse::with_info(ConfirmationResponse::new(
            ConfirmationAction::Confirmed,
        )));
        manager.execute_completion_callbacks();

        assert!(confirmed.get());
    }
}
