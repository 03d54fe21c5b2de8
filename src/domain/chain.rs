//! Option Chain — Calls and Puts by Expiration, then Strike
//!
//! The chain payload is keyed first by `"<yyyy-MM-dd>:<daysToExpiration>"`
//! and then by strike-price string (`"550.0"`), each value being the
//! contracts listed at that strike.
//!
//! A chain fetched as two filtered queries arrives as two partial chains,
//! one carrying calls and the other puts. The merge functions here combine
//! them into one complete chain where both side maps are present.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::contract::{ContractSide, OptionContract};
use super::lenient::f64_lenient;

/// Strike-price string -> contracts at that strike.
pub type StrikeMap = BTreeMap<String, Vec<OptionContract>>;

/// Expiration key -> strikes for that expiration.
pub type ExpirationMap = BTreeMap<String, StrikeMap>;

static EMPTY: ExpirationMap = BTreeMap::new();

/// An option chain for one underlying.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OptionChain {
    /// Underlying symbol.
    pub symbol: Option<String>,
    /// Upstream status string (`SUCCESS` / `FAILED`).
    pub status: Option<String>,
    #[serde(deserialize_with = "f64_lenient")]
    pub interest_rate: f64,
    #[serde(deserialize_with = "f64_lenient")]
    pub underlying_price: f64,
    #[serde(deserialize_with = "f64_lenient")]
    pub volatility: f64,
    /// Calls keyed by expiration, then strike.
    #[serde(rename = "callExpDateMap")]
    pub calls_by_expiration: Option<ExpirationMap>,
    /// Puts keyed by expiration, then strike.
    #[serde(rename = "putExpDateMap")]
    pub puts_by_expiration: Option<ExpirationMap>,
}

impl OptionChain {
    /// Combine two partial chains by inspecting which side `self` carries.
    ///
    /// `self` is the base and keeps its metadata. If its call map is empty
    /// (or absent) the call map of `other` is assigned; otherwise the put
    /// map of `other` is assigned. Assumes one partial holds calls only and
    /// the other puts only; when both hold data on the same side the result
    /// silently keeps the base side.
    #[must_use]
    pub fn merge_inferred(mut self, other: Self) -> Self {
        let base_has_calls = self
            .calls_by_expiration
            .as_ref()
            .is_some_and(|calls| !calls.is_empty());

        if base_has_calls {
            self.puts_by_expiration = other.puts_by_expiration;
        } else {
            self.calls_by_expiration = other.calls_by_expiration;
        }
        self.fill_missing_sides();
        self
    }

    /// Combine two partial chains whose sides are known up front.
    ///
    /// `self` was requested for `base_side`; the opposite side is taken from
    /// `other` regardless of what either payload contains.
    #[must_use]
    pub fn merge_tagged(mut self, base_side: ContractSide, other: Self) -> Self {
        match base_side {
            ContractSide::Call => self.puts_by_expiration = other.puts_by_expiration,
            ContractSide::Put => self.calls_by_expiration = other.calls_by_expiration,
        }
        self.fill_missing_sides();
        self
    }

    /// Replace absent side maps with empty ones.
    pub fn fill_missing_sides(&mut self) {
        self.calls_by_expiration.get_or_insert_with(BTreeMap::new);
        self.puts_by_expiration.get_or_insert_with(BTreeMap::new);
    }

    /// Whether both side maps are present.
    pub const fn is_complete(&self) -> bool {
        self.calls_by_expiration.is_some() && self.puts_by_expiration.is_some()
    }

    /// Call map, empty when absent.
    pub fn calls(&self) -> &ExpirationMap {
        self.calls_by_expiration.as_ref().unwrap_or(&EMPTY)
    }

    /// Put map, empty when absent.
    pub fn puts(&self) -> &ExpirationMap {
        self.puts_by_expiration.as_ref().unwrap_or(&EMPTY)
    }

    /// Side map for `side`.
    pub fn side(&self, side: ContractSide) -> &ExpirationMap {
        match side {
            ContractSide::Call => self.calls(),
            ContractSide::Put => self.puts(),
        }
    }

    /// All contracts of one side, expiration then strike order.
    pub fn contracts_for(&self, side: ContractSide) -> impl Iterator<Item = &OptionContract> {
        self.side(side)
            .values()
            .flat_map(|strikes| strikes.values())
            .flatten()
    }

    /// Every contract in the chain, calls first.
    pub fn collect_options(&self) -> Vec<&OptionContract> {
        ContractSide::ALL
            .into_iter()
            .flat_map(|side| self.contracts_for(side))
            .collect()
    }

    /// Symbol -> first contract listed at each strike, both sides.
    ///
    /// Contracts without a symbol are skipped.
    pub fn flatten(&self) -> HashMap<String, &OptionContract> {
        let mut flat = HashMap::new();
        for side in ContractSide::ALL {
            for strikes in self.side(side).values() {
                for contract in strikes.values().filter_map(|listed| listed.first()) {
                    if let Some(symbol) = &contract.symbol {
                        flat.insert(symbol.clone(), contract);
                    }
                }
            }
        }
        flat
    }

    /// Number of contracts across both sides.
    pub fn contract_count(&self) -> usize {
        ContractSide::ALL
            .into_iter()
            .map(|side| self.contracts_for(side).count())
            .sum()
    }
}

impl std::fmt::Display for OptionChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} : {}",
            self.symbol.as_deref().unwrap_or_default(),
            self.underlying_price
        )
    }
}

/// Split an expiration key (`"2024-09-20:3"`) into date string and days.
pub fn split_expiration_key(key: &str) -> Option<(&str, i64)> {
    let (date, days) = key.split_once(':')?;
    Some((date, days.trim().parse().ok()?))
}
