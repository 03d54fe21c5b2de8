//! OAuth token types.

use serde::{Deserialize, Serialize};

/// Token endpoint response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Token {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub token_type: Option<String>,
    /// Access token lifetime in seconds.
    pub expires_in: Option<u64>,
    pub refresh_token_expires_in: Option<u64>,
    pub scope: Option<String>,
    pub id_token: Option<String>,
}

/// Which code is being exchanged at the token endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grant {
    /// First exchange: the code returned to the redirect URI.
    AuthorizationCode,
    /// Renewal with a previously issued refresh token.
    RefreshToken,
}

impl Grant {
    pub const fn grant_type(self) -> &'static str {
        match self {
            Self::AuthorizationCode => "authorization_code",
            Self::RefreshToken => "refresh_token",
        }
    }
}
