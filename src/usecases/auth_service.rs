//! Auth Service - OAuth Token Exchange
//!
//! Exchanges an authorization code or a refresh token for a new access
//! token. The form body and app authentication follow the profile's
//! [`TokenAuth`]: Basic `appKey:appSecret` header, or `client_id` in the
//! body. A successful exchange installs the new access token for every
//! later request.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::adapters::codec;
use crate::adapters::http::RequestFactory;
use crate::config::TokenAuth;
use crate::domain::{Grant, Token};
use crate::error::ApiError;
use crate::ports::transport::AUTHORIZATION;
use crate::usecases::dispatch::Dispatcher;

/// OAuth operations.
#[derive(Debug, Clone)]
pub struct AuthService {
  dispatcher: Dispatcher,
  requests: Arc<RequestFactory>,
  /// Redirect URI registered with the app.
  redirect_uri: String,
}

impl AuthService {
  pub fn new(dispatcher: Dispatcher, requests: Arc<RequestFactory>, redirect_uri: impl Into<String>) -> Self {
    Self {
      dispatcher,
      requests,
      redirect_uri: redirect_uri.into(),
    }
  }

  /// Exchange `code` at the token endpoint.
  ///
  /// `code` is passed decoded; the form body encodes it.
  ///
  /// # Errors
  /// `Status` on a non-2xx response, plus transport, timeout, decode and
  /// credential failures.
  #[instrument(skip(self, code), fields(grant = grant.grant_type()))]
  pub async fn access_token(&self, code: &str, grant: Grant) -> Result<Token, ApiError> {
    let token_auth = self.requests.profile().token_auth;
    let pairs = self.token_form(token_auth, code, grant);

    let mut request = self.requests.post_form(self.requests.token_url()?, &pairs);
    if token_auth == TokenAuth::Basic {
      request = request.with_header(AUTHORIZATION, self.requests.basic_auth());
    }

    let response = self.dispatcher.send_expecting_success(request).await?;
    let token: Token = codec::decode(&response.body)?;

    if let Some(access_token) = &token.access_token {
      self.requests.set_access_token(access_token.as_str()).await;
    }
    info!(
      expires_in = ?token.expires_in,
      refreshed = token.refresh_token.is_some(),
      "Access token issued"
    );
    Ok(token)
  }

  /// Browser URL that starts the authorization-code flow.
  ///
  /// # Errors
  /// `InvalidUrl` if the profile's authorize URL does not parse.
  pub fn authorization_url(&self) -> Result<String, ApiError> {
    Ok(self.requests.authorize_url(&self.redirect_uri)?.into())
  }

  fn token_form<'a>(&'a self, token_auth: TokenAuth, code: &'a str, grant: Grant) -> Vec<(&'a str, &'a str)> {
    let grant_type = grant.grant_type();
    let redirect_uri = self.redirect_uri.as_str();

    match (token_auth, grant) {
      (TokenAuth::Basic, Grant::RefreshToken) => {
        vec![("grant_type", grant_type), ("refresh_token", code)]
      }
      (TokenAuth::Basic, Grant::AuthorizationCode) => vec![
        ("grant_type", grant_type),
        ("code", code),
        ("redirect_uri", redirect_uri),
      ],
      (TokenAuth::ClientId, Grant::RefreshToken) => vec![
        ("client_id", self.requests.credentials().app_key.as_str()),
        ("redirect_uri", redirect_uri),
        ("grant_type", grant_type),
        ("refresh_token", code),
      ],
      (TokenAuth::ClientId, Grant::AuthorizationCode) => vec![
        ("client_id", self.requests.credentials().app_key.as_str()),
        ("redirect_uri", redirect_uri),
        ("access_type", "offline"),
        ("grant_type", grant_type),
        ("code", code),
      ],
    }
  }
}
