#![forbid(unsafe_code)]

//! HTTP authentication challenge overlays.

use url::Url;

use crate::support::ConfigSupport;

/// Configuration for an HTTP authentication dialog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpAuthConfig {
    url: Url,
    message: String,
    default_username: String,
}

impl HttpAuthConfig {
    /// Describe an auth challenge from `url`, with the dialog `message` and
    /// the text to prefill in the username field.
    #[must_use]
    pub fn new(url: Url, message: impl Into<String>, default_username: impl Into<String>) -> Self {
        Self {
            url,
            message: message.into(),
            default_username: default_username.into(),
        }
    }

    /// The URL of the page requesting authentication.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The message to display in the auth dialog.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The default text for the username field.
    #[must_use]
    pub fn default_username(&self) -> &str {
        &self.default_username
    }

    /// The predicate supporting exactly HTTP-auth-configured requests.
    #[must_use]
    pub fn request_support() -> &'static ConfigSupport<Self> {
        ConfigSupport::shared()
    }
}

/// What the user entered into an HTTP authentication dialog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpAuthResponse {
    username: String,
    password: String,
}

impl HttpAuthResponse {
    /// Record the submitted credentials.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// The username entered into the dialog.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The password entered into the dialog.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}
