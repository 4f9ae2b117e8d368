use serde::{Deserialize, Serialize};

use crate::Secret;

/// Identity returned by the wallet SDK after a successful sign-in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletUser {
    #[serde(alias = "uid")]
    pub id: String,
    #[serde(alias = "username")]
    pub display_name: String,
}

/// Client-side authentication state.
///
/// Created on app load and held by the top-level controller. Never persisted:
/// a reload starts from [`Session::new`] again.
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub is_authenticated: bool,
    pub access_token: Option<Secret>,
    pub user: Option<WalletUser>,
    pub status_message: String,
    pub error_message: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            is_authenticated: false,
            access_token: None,
            user: None,
            status_message: "Initializing wallet...".to_string(),
            error_message: None,
        }
    }

    /// The access token, if the session can be used for payment or token
    /// actions. An authenticated session with a blank token does not count.
    pub fn usable_token(&self) -> Option<&Secret> {
        if !self.is_authenticated {
            return None;
        }
        self.access_token.as_ref().filter(|t| !t.is_blank())
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
    }

    /// Record a successful sign-in.
    pub fn sign_in(&mut self, access_token: Secret, user: WalletUser) {
        self.access_token = Some(access_token);
        self.user = Some(user);
        self.is_authenticated = true;
        self.error_message = None;
        self.status_message = "Signed in".to_string();
    }

    /// Record a failed sign-in. The message doubles as the status line.
    pub fn fail(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.is_authenticated = false;
        self.access_token = None;
        self.status_message = message.clone();
        self.error_message = Some(message);
    }

    /// Keep the app usable without a wallet. The session stays
    /// unauthenticated, so payment and token actions remain refused.
    pub fn continue_as_guest(&mut self, reason: &str) {
        self.is_authenticated = false;
        self.access_token = None;
        self.user = Some(WalletUser {
            id: "guest".to_string(),
            display_name: "Guest".to_string(),
        });
        self.error_message = None;
        self.status_message = format!("{reason}; continuing without wallet sign-in");
    }

    pub fn is_guest(&self) -> bool {
        !self.is_authenticated && self.user.as_ref().is_some_and(|u| u.id == "guest")
    }

    /// Clear error and credentials before another sign-in attempt.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
