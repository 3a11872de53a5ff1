//! The identity a request is evaluated for.

use clouddrive_core::types::id::UserId;
use serde::{Deserialize, Serialize};

/// Credentials for a public link presented alongside a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkCredentials {
    /// The link token.
    pub token: String,
    /// Password, when the link is protected.
    pub password: Option<String>,
}

/// An authenticated user, an anonymous link holder, or both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// The user, when signed in.
    pub user_id: Option<UserId>,
    /// Link credentials, when presented.
    pub link: Option<LinkCredentials>,
}

impl Principal {
    /// A signed-in user without link credentials.
    pub fn user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            link: None,
        }
    }

    /// An anonymous caller holding a link.
    pub fn anonymous_link(token: impl Into<String>, password: Option<String>) -> Self {
        Self {
            user_id: None,
            link: Some(LinkCredentials {
                token: token.into(),
                password,
            }),
        }
    }

    /// Attach link credentials.
    pub fn with_link(mut self, token: impl Into<String>, password: Option<String>) -> Self {
        self.link = Some(LinkCredentials {
            token: token.into(),
            password,
        });
        self
    }

    /// Check if nothing identifies the caller.
    pub fn is_anonymous(&self) -> bool {
        self.user_id.is_none() && self.link.is_none()
    }
}
