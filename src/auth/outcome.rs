// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Validation outcomes.
//!
//! Every failure path of the gate is recovered into a [`Denial`]; nothing
//! escapes to the host application as an error. A denial always carries a
//! non-empty message and a documentation link derived from its kind.

/// Base URL of the Typeauth error documentation.
pub const DOCS_BASE_URL: &str = "https://docs.typeauth.com";

pub const MISSING_TOKEN_MESSAGE: &str = "Missing token";
pub const AUTHENTICATION_FAILED_MESSAGE: &str = "Typeauth authentication failed";
pub const RETRIES_EXHAUSTED_MESSAGE: &str = "API request failed after multiple retries";
pub const MALFORMED_RESPONSE_MESSAGE: &str = "Failed to parse authentication response";
pub const UNEXPECTED_MESSAGE: &str = "Unexpected error occurred";
pub const CANCELLED_MESSAGE: &str = "Authentication request was cancelled";

/// Why a request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialKind {
    /// No token could be extracted; no remote call was made
    MissingCredential,
    /// The service answered that the token is not valid
    AuthenticationDenied,
    /// The service answered with a non-2xx status or an unreadable body
    RemoteApiError,
    /// Every attempt failed at the transport layer
    TransportFailure,
    /// The retry loop finished without an answer
    UnexpectedState,
}

impl DenialKind {
    /// Documentation page for this kind of denial.
    pub fn docs_url(&self) -> String {
        let page = match self {
            DenialKind::MissingCredential | DenialKind::AuthenticationDenied => "authentication",
            DenialKind::RemoteApiError | DenialKind::TransportFailure => "api-request",
            DenialKind::UnexpectedState => "unexpected",
        };
        format!("{DOCS_BASE_URL}/errors/{page}")
    }

    fn default_message(&self) -> &'static str {
        match self {
            DenialKind::MissingCredential => MISSING_TOKEN_MESSAGE,
            DenialKind::AuthenticationDenied => AUTHENTICATION_FAILED_MESSAGE,
            DenialKind::RemoteApiError => MALFORMED_RESPONSE_MESSAGE,
            DenialKind::TransportFailure => RETRIES_EXHAUSTED_MESSAGE,
            DenialKind::UnexpectedState => UNEXPECTED_MESSAGE,
        }
    }
}

/// A rejected validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    kind: DenialKind,
    message: String,
    docs_url: String,
}

impl Denial {
    /// Create a denial; a blank message is replaced by the kind's default.
    pub fn new(kind: DenialKind, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            kind.default_message().to_string()
        } else {
            message
        };
        Self {
            kind,
            message,
            docs_url: kind.docs_url(),
        }
    }

    pub fn missing_credential() -> Self {
        Self::new(DenialKind::MissingCredential, MISSING_TOKEN_MESSAGE)
    }

    pub fn authentication_failed() -> Self {
        Self::new(DenialKind::AuthenticationDenied, AUTHENTICATION_FAILED_MESSAGE)
    }

    pub fn status(status: u16) -> Self {
        Self::new(
            DenialKind::RemoteApiError,
            format!("API request failed with status: {status}"),
        )
    }

    pub fn malformed_response() -> Self {
        Self::new(DenialKind::RemoteApiError, MALFORMED_RESPONSE_MESSAGE)
    }

    pub fn retries_exhausted() -> Self {
        Self::new(DenialKind::TransportFailure, RETRIES_EXHAUSTED_MESSAGE)
    }

    pub fn unexpected() -> Self {
        Self::new(DenialKind::UnexpectedState, UNEXPECTED_MESSAGE)
    }

    pub fn cancelled() -> Self {
        Self::new(DenialKind::UnexpectedState, CANCELLED_MESSAGE)
    }

    pub fn kind(&self) -> DenialKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn docs_url(&self) -> &str {
        &self.docs_url
    }
}

impl std::fmt::Display for Denial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (see {})", self.message, self.docs_url)
    }
}

/// Result of validating one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Authenticated,
    Denied(Denial),
}

impl ValidationOutcome {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, ValidationOutcome::Authenticated)
    }

    /// The denial, if any.
    pub fn denial(&self) -> Option<&Denial> {
        match self {
            ValidationOutcome::Authenticated => None,
            ValidationOutcome::Denied(denial) => Some(denial),
        }
    }

    /// Converts the outcome into the boolean exposed to downstream handlers.
    pub fn into_result(self) -> Result<bool, Denial> {
        match self {
            ValidationOutcome::Authenticated => Ok(true),
            ValidationOutcome::Denied(denial) => Err(denial),
        }
    }
}

impl From<Denial> for ValidationOutcome {
    fn from(denial: Denial) -> Self {
        ValidationOutcome::Denied(denial)
    }
}
