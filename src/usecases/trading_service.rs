//! Trading Service - Accounts, Orders, Saved Orders
//!
//! Request templating over the trader endpoints. Every call carries the
//! bearer token; any non-2xx status is an error. Order bodies are logged
//! before submission.

use std::sync::Arc;

use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, instrument};

use crate::adapters::codec;
use crate::adapters::http::RequestFactory;
use crate::domain::{AccountNumber, Order, OrderQuery, UserPrincipals};
use crate::error::ApiError;
use crate::usecases::dispatch::Dispatcher;

const ACCOUNTS: &str = "accounts";
const ORDERS: &str = "orders";
const SAVED_ORDERS: &str = "savedorders";

/// Account and order operations.
#[derive(Debug, Clone)]
pub struct TradingService {
  dispatcher: Dispatcher,
  requests: Arc<RequestFactory>,
}

impl TradingService {
  pub const fn new(dispatcher: Dispatcher, requests: Arc<RequestFactory>) -> Self {
    Self {
      dispatcher,
      requests,
    }
  }

  /// Balances and account metadata.
  #[instrument(skip(self))]
  pub async fn account(&self, account: &str) -> Result<Value, ApiError> {
    self.get_json(self.requests.trader(&[ACCOUNTS, account], &[])?).await
  }

  /// Account with its positions and orders.
  #[instrument(skip(self))]
  pub async fn account_with_positions(&self, account: &str) -> Result<Value, ApiError> {
    let url = self
      .requests
      .trader(&[ACCOUNTS, account], &[("fields", "positions,orders")])?;
    self.get_json(url).await
  }

  /// Account numbers and the hashes used in trader paths.
  #[instrument(skip(self))]
  pub async fn account_numbers(&self) -> Result<Vec<AccountNumber>, ApiError> {
    self
      .get_json(self.requests.trader(&[ACCOUNTS, "accountNumbers"], &[])?)
      .await
  }

  /// User principals with streamer connection info and subscription keys.
  #[instrument(skip(self))]
  pub async fn user_principals(&self) -> Result<UserPrincipals, ApiError> {
    let url = self.requests.trader(
      &["userprincipals"],
      &[("fields", "streamerSubscriptionKeys,streamerConnectionInfo")],
    )?;
    self.get_json(url).await
  }

  /// Submit a new order.
  #[instrument(skip(self, order))]
  pub async fn place_order(&self, account: &str, order: &Order) -> Result<(), ApiError> {
    let url = self.requests.trader(&[ACCOUNTS, account, ORDERS], &[])?;
    self.submit(url, order, false).await
  }

  /// Replace an open order.
  #[instrument(skip(self, order))]
  pub async fn replace_order(&self, account: &str, order_id: &str, order: &Order) -> Result<(), ApiError> {
    let url = self.requests.trader(&[ACCOUNTS, account, ORDERS, order_id], &[])?;
    self.submit(url, order, true).await
  }

  /// Cancel an open order.
  #[instrument(skip(self))]
  pub async fn cancel_order(&self, account: &str, order_id: &str) -> Result<(), ApiError> {
    let url = self.requests.trader(&[ACCOUNTS, account, ORDERS, order_id], &[])?;
    self.delete(url).await
  }

  #[instrument(skip(self))]
  pub async fn order(&self, account: &str, order_id: &str) -> Result<Value, ApiError> {
    let url = self.requests.trader(&[ACCOUNTS, account, ORDERS, order_id], &[])?;
    self.get_json(url).await
  }

  /// Orders for an account, filtered by entry time and status.
  #[instrument(skip(self, query))]
  pub async fn orders(&self, account: &str, query: &OrderQuery) -> Result<Vec<Value>, ApiError> {
    let status = query.status.map(|s| s.to_string());
    let max_results = query.max_results.map(|n| n.to_string());

    let mut pairs: Vec<(&str, &str)> = Vec::new();
    if let Some(from) = &query.from_entered_time {
      pairs.push(("fromEnteredTime", from.as_str()));
    }
    if let Some(to) = &query.to_entered_time {
      pairs.push(("toEnteredTime", to.as_str()));
    }
    if let Some(status) = &status {
      pairs.push(("status", status.as_str()));
    }
    if let Some(max_results) = &max_results {
      pairs.push(("maxResults", max_results.as_str()));
    }

    let url = self.requests.trader(&[ACCOUNTS, account, ORDERS], &pairs)?;
    self.get_json(url).await
  }

  /// Store an order for later submission.
  #[instrument(skip(self, order))]
  pub async fn create_saved_order(&self, account: &str, order: &Order) -> Result<(), ApiError> {
    let url = self.requests.trader(&[ACCOUNTS, account, SAVED_ORDERS], &[])?;
    self.submit(url, order, false).await
  }

  #[instrument(skip(self))]
  pub async fn saved_orders(&self, account: &str) -> Result<Vec<Value>, ApiError> {
    let url = self.requests.trader(&[ACCOUNTS, account, SAVED_ORDERS], &[])?;
    self.get_json(url).await
  }

  #[instrument(skip(self))]
  pub async fn delete_saved_order(&self, account: &str, saved_order_id: &str) -> Result<(), ApiError> {
    let url = self
      .requests
      .trader(&[ACCOUNTS, account, SAVED_ORDERS, saved_order_id], &[])?;
    self.delete(url).await
  }

  async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
    let request = self.requests.get(url).await;
    let response = self.dispatcher.send_expecting_success(request).await?;
    Ok(codec::decode(&response.body)?)
  }

  async fn submit(&self, url: Url, order: &Order, replace: bool) -> Result<(), ApiError> {
    let body = codec::encode(order)?;
    info!(order = %body, replace, "Submitting order");

    let request = if replace {
      self.requests.put_json(url, body).await
    } else {
      self.requests.post_json(url, body).await
    };
    let response = self.dispatcher.send_expecting_success(request).await?;
    info!(status = response.status, "Order accepted");
    Ok(())
  }

  async fn delete(&self, url: Url) -> Result<(), ApiError> {
    let request = self.requests.delete(url).await;
    self.dispatcher.send_expecting_success(request).await?;
    Ok(())
  }
}
