//! Quote Service - Quotes, Option Chains, Price History, Movers
//!
//! Builds market-data requests for the active API profile. Two-sided
//! chain queries go through the [`ChainFetcher`] with one request tagged
//! per contract side; everything else is a single dispatch-decode-return.
//!
//! Tickers are normalized (`$SPX.X` -> `SPX`) before quote and price
//! history URLs are built. Chain and movers symbols are sent as given.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, instrument, warn};

use crate::adapters::codec;
use crate::adapters::http::RequestFactory;
use crate::domain::{
  Candles, ContractSide, Equity, OptionChain, PriceHistoryQuery, Screener, normalize_ticker,
};
use crate::error::ApiError;
use crate::usecases::chain_fetcher::{ChainFetcher, ChainRequest};
use crate::usecases::dispatch::Dispatcher;
use crate::usecases::handle::{ChainHandle, TaskHandle};

/// Owned query parameters, borrowed as pairs when the URL is built.
type Params = Vec<(&'static str, String)>;

fn as_pairs(params: &Params) -> Vec<(&str, &str)> {
  params.iter().map(|(name, value)| (*name, value.as_str())).collect()
}

fn format_date(date: NaiveDate) -> String {
  date.format("%Y-%m-%d").to_string()
}

/// Market data operations.
#[derive(Debug, Clone)]
pub struct QuoteService {
  dispatcher: Dispatcher,
  chains: ChainFetcher,
  requests: Arc<RequestFactory>,
  /// Strikes per expiration when the caller gives none.
  default_strike_count: u32,
}

impl QuoteService {
  pub fn new(dispatcher: Dispatcher, requests: Arc<RequestFactory>, default_strike_count: u32) -> Self {
    let chains = dispatcher.chain_fetcher();
    Self {
      dispatcher,
      chains,
      requests,
      default_strike_count,
    }
  }

  /// The fetcher used for two-sided chains.
  pub const fn chain_fetcher(&self) -> &ChainFetcher {
    &self.chains
  }

  /// Current quote for one ticker.
  ///
  /// Returns `Ok(None)` when the upstream answers with a non-2xx status or
  /// has no entry for the ticker.
  ///
  /// # Errors
  /// Transport, timeout, decode and credential failures.
  #[instrument(skip(self))]
  pub async fn quote(&self, ticker: &str) -> Result<Option<Equity>, ApiError> {
    let symbol = normalize_ticker(ticker);
    let url = self.requests.market_data(&[symbol.as_str(), "quotes"], &[])?;
    let response = self.dispatcher.send(self.requests.get(url).await).await?;

    if !response.is_success() {
      warn!(status = response.status, "Quote unavailable");
      return Ok(None);
    }

    let entries = codec::decode_keyed(&response.body)?;
    let equity = match codec::entry(&entries, &symbol)? {
      Some(equity) => Some(equity),
      None => codec::entry(&entries, ticker)?,
    };
    Ok(equity)
  }

  /// Spawn [`quote`](Self::quote) and return its handle.
  pub fn quote_handle(&self, ticker: &str) -> TaskHandle<Option<Equity>, ApiError> {
    let service = self.clone();
    let ticker = ticker.to_string();
    TaskHandle::spawn(async move { service.quote(&ticker).await })
  }

  /// Quotes for several tickers in one request, in input order.
  /// Repeated tickers each get their own entry.
  ///
  /// # Errors
  /// `Status` on a non-2xx response, `MissingSymbol` when a ticker has no
  /// entry, plus transport, timeout, decode and credential failures.
  #[instrument(skip_all, fields(tickers = tickers.len()))]
  pub async fn quotes<S: AsRef<str>>(&self, tickers: &[S]) -> Result<Vec<Equity>, ApiError> {
    let symbols: Vec<String> = tickers.iter().map(|t| normalize_ticker(t.as_ref())).collect();
    let joined = symbols.join(",");
    let url = self.requests.market_data(&["quotes"], &[("symbol", &joined)])?;
    let response = self
      .dispatcher
      .send_expecting_success(self.requests.get(url).await)
      .await?;

    let entries = codec::decode_keyed(&response.body)?;
    let mut equities = Vec::with_capacity(symbols.len());
    for (ticker, symbol) in tickers.iter().map(|t| t.as_ref()).zip(&symbols) {
      let entry = match codec::entry::<Equity>(&entries, symbol)? {
        Some(equity) => Some(equity),
        None => codec::entry(&entries, ticker)?,
      };
      let mut equity = entry.ok_or_else(|| ApiError::MissingSymbol(ticker.to_string()))?;
      equity.symbol.get_or_insert_with(|| symbol.clone());
      equities.push(equity);
    }

    debug!(count = equities.len(), "Quotes decoded");
    Ok(equities)
  }

  /// Full two-sided chain for `ticker`.
  ///
  /// # Errors
  /// `InvalidUrl` for an unusable ticker, or the fetch's `ChainError`.
  #[instrument(skip(self))]
  pub async fn option_chain(&self, ticker: &str, strike_count: Option<u32>) -> Result<OptionChain, ApiError> {
    let requests = self.side_requests(&self.chain_params(ticker, strike_count)).await?;
    Ok(self.chains.fetch(requests).await?)
  }

  /// Spawn [`option_chain`](Self::option_chain) and return its handle.
  ///
  /// # Errors
  /// `InvalidUrl` when the requests cannot be built.
  pub async fn option_chain_handle(
    &self,
    ticker: &str,
    strike_count: Option<u32>,
  ) -> Result<ChainHandle, ApiError> {
    let requests = self.side_requests(&self.chain_params(ticker, strike_count)).await?;
    Ok(self.chains.spawn(requests))
  }

  /// Two-sided chain limited to expirations up to `to_date`.
  ///
  /// # Errors
  /// As [`option_chain`](Self::option_chain).
  #[instrument(skip(self))]
  pub async fn close_expiration_option_chain(
    &self,
    ticker: &str,
    to_date: NaiveDate,
    strike_count: Option<u32>,
    otm_only: bool,
  ) -> Result<OptionChain, ApiError> {
    let params = self.close_expiration_params(ticker, to_date, strike_count, otm_only);
    let requests = self.side_requests(&params).await?;
    Ok(self.chains.fetch(requests).await?)
  }

  /// Spawn [`close_expiration_option_chain`](Self::close_expiration_option_chain).
  ///
  /// # Errors
  /// `InvalidUrl` when the requests cannot be built.
  pub async fn close_expiration_option_chain_handle(
    &self,
    ticker: &str,
    to_date: NaiveDate,
    strike_count: Option<u32>,
    otm_only: bool,
  ) -> Result<ChainHandle, ApiError> {
    let params = self.close_expiration_params(ticker, to_date, strike_count, otm_only);
    let requests = self.side_requests(&params).await?;
    Ok(self.chains.spawn(requests))
  }

  /// Chain for a single expiration date, both sides in one request.
  ///
  /// # Errors
  /// As [`option_chain`](Self::option_chain).
  #[instrument(skip(self))]
  pub async fn option_chain_for_date(&self, ticker: &str, date: NaiveDate) -> Result<OptionChain, ApiError> {
    let date = format_date(date);
    let params: Params = vec![
      ("symbol", ticker.to_string()),
      ("strikeCount", self.default_strike_count.to_string()),
      ("toDate", date.clone()),
      ("fromDate", date),
    ];
    self.single_chain(&params).await
  }

  /// Chain for a single strike across expirations.
  ///
  /// # Errors
  /// As [`option_chain`](Self::option_chain).
  #[instrument(skip(self))]
  pub async fn option_chain_for_strike(&self, ticker: &str, strike: f64) -> Result<OptionChain, ApiError> {
    let params: Params = vec![("symbol", ticker.to_string()), ("strike", strike.to_string())];
    self.single_chain(&params).await
  }

  /// Chain for one strike on one expiration date.
  ///
  /// # Errors
  /// As [`option_chain`](Self::option_chain).
  #[instrument(skip(self))]
  pub async fn option_chain_for_strike_and_date(
    &self,
    ticker: &str,
    strike: f64,
    date: NaiveDate,
  ) -> Result<OptionChain, ApiError> {
    let date = format_date(date);
    let params: Params = vec![
      ("symbol", ticker.to_string()),
      ("toDate", date.clone()),
      ("fromDate", date),
      ("strike", strike.to_string()),
    ];
    self.single_chain(&params).await
  }

  /// Candles for `ticker` over the query's window.
  ///
  /// # Errors
  /// `Status` on a non-2xx response, plus transport, timeout, decode and
  /// credential failures.
  #[instrument(skip(self, query))]
  pub async fn price_history(&self, ticker: &str, query: &PriceHistoryQuery) -> Result<Candles, ApiError> {
    let mut params: Params = vec![
      ("symbol", normalize_ticker(ticker)),
      ("periodType", query.period_type.clone()),
      ("period", query.period.clone()),
      ("frequencyType", query.frequency_type.clone()),
      ("frequency", query.frequency.clone()),
    ];
    if let Some(start) = query.start_date {
      params.push(("startDate", start.to_string()));
    }
    if let Some(end) = query.end_date {
      params.push(("endDate", end.to_string()));
    }

    let url = self.requests.market_data(&["pricehistory"], &as_pairs(&params))?;
    let response = self
      .dispatcher
      .send_expecting_success(self.requests.get(url).await)
      .await?;
    Ok(codec::decode(&response.body)?)
  }

  /// Top movers for an index (`$SPX`, `$DJI`, ...).
  ///
  /// # Errors
  /// `Status` on a non-2xx response, plus transport, timeout, decode and
  /// credential failures.
  #[instrument(skip(self))]
  pub async fn movers(&self, index: &str, sort: &str, frequency: u32) -> Result<Screener, ApiError> {
    let frequency = frequency.to_string();
    let url = self
      .requests
      .market_data(&["movers", index], &[("sort", sort), ("frequency", &frequency)])?;
    let response = self
      .dispatcher
      .send_expecting_success(self.requests.get(url).await)
      .await?;
    Ok(codec::decode(&response.body)?)
  }

  fn chain_params(&self, ticker: &str, strike_count: Option<u32>) -> Params {
    vec![
      ("symbol", ticker.to_string()),
      (
        "strikeCount",
        strike_count.unwrap_or(self.default_strike_count).to_string(),
      ),
    ]
  }

  fn close_expiration_params(
    &self,
    ticker: &str,
    to_date: NaiveDate,
    strike_count: Option<u32>,
    otm_only: bool,
  ) -> Params {
    let mut params = self.chain_params(ticker, strike_count);
    params.push(("toDate", format_date(to_date)));
    if otm_only {
      params.push(("range", "OTM".to_string()));
    }
    params
  }

  /// One chain request per contract side, tagged with that side.
  async fn side_requests(&self, params: &Params) -> Result<Vec<ChainRequest>, ApiError> {
    let mut requests = Vec::with_capacity(ContractSide::ALL.len());
    for side in ContractSide::ALL {
      let mut pairs = as_pairs(params);
      pairs.push(("contractType", side.as_str()));
      let url = self.requests.market_data(&["chains"], &pairs)?;
      requests.push(ChainRequest::tagged(side, self.requests.get(url).await));
    }
    Ok(requests)
  }

  async fn single_chain(&self, params: &Params) -> Result<OptionChain, ApiError> {
    let url = self.requests.market_data(&["chains"], &as_pairs(params))?;
    let request = self.requests.get(url).await;
    Ok(self.chains.fetch_single(request).await?)
  }
}
