//! Request Factory - Endpoint URLs and Auth Headers
//!
//! Every descriptor a service sends is built here, so the API profile is
//! the only place that knows paths, query conventions and auth style.
//! Query strings go through `Url`'s form encoder: commas in symbol lists
//! come out as `%2C`, matching the upstream wire format.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::Url;
use tokio::sync::RwLock;

use crate::config::{ApiProfile, AuthScheme, Credentials};
use crate::error::ApiError;
use crate::ports::transport::{CONTENT_TYPE, HttpRequest, URL_ENCODED};

/// Builds request descriptors for one API profile and credential set.
#[derive(Debug)]
pub struct RequestFactory {
  profile: ApiProfile,
  base: Url,
  credentials: Credentials,
  /// Current OAuth access token, replaced on refresh.
  access_token: Arc<RwLock<Option<String>>>,
}

impl RequestFactory {
  /// Create a factory for `profile`.
  ///
  /// # Errors
  /// Returns `InvalidUrl` if the profile's base URL does not parse.
  pub fn new(profile: ApiProfile, credentials: Credentials) -> Result<Self, ApiError> {
    let base = Url::parse(&profile.base_url).map_err(|e| invalid_url(&profile.base_url, &e))?;
    Ok(Self {
      profile,
      base,
      credentials,
      access_token: Arc::new(RwLock::new(None)),
    })
  }

  pub const fn profile(&self) -> &ApiProfile {
    &self.profile
  }

  pub const fn credentials(&self) -> &Credentials {
    &self.credentials
  }

  /// Replace the held access token.
  pub async fn set_access_token(&self, token: impl Into<String>) {
    let mut guard = self.access_token.write().await;
    *guard = Some(token.into());
  }

  pub async fn access_token(&self) -> Option<String> {
    self.access_token.read().await.clone()
  }

  /// Market-data endpoint: `<base><market_data_path><segments>?<query>`.
  pub fn market_data(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url, ApiError> {
    self.endpoint(self.profile.market_data_path, segments, query)
  }

  /// Trader endpoint: `<base><trader_path><segments>?<query>`.
  pub fn trader(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url, ApiError> {
    self.endpoint(self.profile.trader_path, segments, query)
  }

  /// OAuth token endpoint.
  pub fn token_url(&self) -> Result<Url, ApiError> {
    self
      .base
      .join(self.profile.token_path)
      .map_err(|e| invalid_url(self.profile.token_path, &e))
  }

  /// Browser URL that starts the authorization-code flow.
  ///
  /// Built from the profile's absolute authorize URL, not from the base URL.
  pub fn authorize_url(&self, redirect_uri: &str) -> Result<Url, ApiError> {
    let mut url = Url::parse(self.profile.authorize_url)
      .map_err(|e| invalid_url(self.profile.authorize_url, &e))?;
    url
      .query_pairs_mut()
      .append_pair("response_type", "code")
      .append_pair("client_id", &self.credentials.app_key)
      .append_pair("redirect_uri", redirect_uri);
    Ok(url)
  }

  fn endpoint(&self, prefix: &str, segments: &[&str], query: &[(&str, &str)]) -> Result<Url, ApiError> {
    let mut url = self.base.join(prefix).map_err(|e| invalid_url(prefix, &e))?;
    url
      .path_segments_mut()
      .map_err(|()| ApiError::InvalidUrl(format!("{} cannot carry a path", self.base)))?
      .pop_if_empty()
      .extend(segments);

    let api_key = self.profile.auth_scheme == AuthScheme::ApiKeyQuery;
    if !query.is_empty() || api_key {
      let mut pairs = url.query_pairs_mut();
      if api_key {
        pairs.append_pair("apikey", &self.credentials.app_key);
      }
      pairs.extend_pairs(query);
    }
    Ok(url)
  }

  /// GET descriptor with the auth the profile requires.
  pub async fn get(&self, url: Url) -> HttpRequest {
    self.authorize(HttpRequest::get(url)).await
  }

  /// DELETE descriptor with auth.
  pub async fn delete(&self, url: Url) -> HttpRequest {
    self.authorize(HttpRequest::delete(url)).await
  }

  /// POST descriptor with a JSON body and auth.
  pub async fn post_json(&self, url: Url, body: String) -> HttpRequest {
    self.authorize(HttpRequest::post(url, body).json()).await
  }

  /// PUT descriptor with a JSON body and auth.
  pub async fn put_json(&self, url: Url, body: String) -> HttpRequest {
    self.authorize(HttpRequest::put(url, body).json()).await
  }

  /// POST descriptor with a form-urlencoded body and no bearer token.
  pub fn post_form(&self, url: Url, pairs: &[(&str, &str)]) -> HttpRequest {
    HttpRequest::post(url, self.form_body(pairs)).with_header(CONTENT_TYPE, URL_ENCODED)
  }

  /// Form-urlencode `pairs` in order.
  pub fn form_body(&self, pairs: &[(&str, &str)]) -> String {
    // Borrow Url's form serializer; the scratch URL is never sent.
    let mut scratch = self.base.clone();
    scratch.query_pairs_mut().clear().extend_pairs(pairs);
    scratch.query().unwrap_or_default().to_string()
  }

  /// `Basic base64(appKey:appSecret)` for the token endpoint.
  pub fn basic_auth(&self) -> String {
    let raw = format!("{}:{}", self.credentials.app_key, self.credentials.app_secret);
    format!("Basic {}", BASE64.encode(raw))
  }

  async fn authorize(&self, request: HttpRequest) -> HttpRequest {
    match self.access_token().await {
      Some(token) => request.bearer(&token),
      None => request,
    }
  }
}

fn invalid_url(input: &str, error: &impl std::fmt::Display) -> ApiError {
  ApiError::InvalidUrl(format!("{input}: {error}"))
}
