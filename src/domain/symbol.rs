//! Ticker and option-symbol handling.

use chrono::NaiveDate;
use thiserror::Error;

use super::contract::ContractSide;

/// Reasons an option symbol could not be decomposed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SymbolError {
    #[error("option symbol {0:?} has no underscore separator")]
    MissingSeparator(String),
    #[error("option symbol {0:?} has no C/P contract marker")]
    MissingContractMarker(String),
    #[error("option symbol {symbol:?} has an invalid expiration {date:?}")]
    InvalidExpiration { symbol: String, date: String },
    #[error("option symbol {0:?} has an invalid strike")]
    InvalidStrike(String),
    #[error("OSI symbol {0:?} must be 21 characters")]
    InvalidOsiLength(String),
}

/// Strip index decorations so a ticker can be used in a request path.
///
/// Index tickers are published as `$SPX.X`; they are requested as `SPX`.
/// Anything without both the leading `$` and the trailing `.X` is left
/// untouched.
pub fn normalize_ticker(ticker: &str) -> String {
    if ticker.starts_with('$') && ticker.ends_with(".X") {
        ticker[..ticker.len() - 1]
            .chars()
            .filter(|c| c.is_ascii_alphabetic() || *c == ' ')
            .collect()
    } else {
        ticker.to_string()
    }
}

/// Components of a listed option symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSymbol {
    pub ticker: String,
    /// Strike exactly as written in the symbol (`"335"`, `"552.5"`).
    pub strike: String,
    pub expiration: NaiveDate,
    pub contract: ContractSide,
}

/// Parse the underscore form `SPY_082120C335` (ticker, `MMDDYY`, side, strike).
pub fn parse_option_symbol(symbol: &str) -> Result<OptionSymbol, SymbolError> {
    let (ticker, rest) = symbol
        .split_once('_')
        .ok_or_else(|| SymbolError::MissingSeparator(symbol.to_string()))?;

    let (contract, marker) = if rest.contains('C') {
        (ContractSide::Call, 'C')
    } else if rest.contains('P') {
        (ContractSide::Put, 'P')
    } else {
        return Err(SymbolError::MissingContractMarker(symbol.to_string()));
    };

    let (date, strike) = rest
        .split_once(marker)
        .ok_or_else(|| SymbolError::MissingContractMarker(symbol.to_string()))?;

    if strike.is_empty() || strike.parse::<f64>().is_err() {
        return Err(SymbolError::InvalidStrike(symbol.to_string()));
    }

    let expiration = parse_mmddyy(date).ok_or_else(|| SymbolError::InvalidExpiration {
        symbol: symbol.to_string(),
        date: date.to_string(),
    })?;

    Ok(OptionSymbol {
        ticker: ticker.to_string(),
        strike: strike.to_string(),
        expiration,
        contract,
    })
}

/// Parse the padded OSI form `SPY   240920C00550000`.
///
/// Layout: 6-char root (space padded), `YYMMDD`, `C`/`P`, strike x 1000 in
/// 8 digits.
pub fn parse_osi_symbol(symbol: &str) -> Result<OptionSymbol, SymbolError> {
    if symbol.len() != 21 || !symbol.is_ascii() {
        return Err(SymbolError::InvalidOsiLength(symbol.to_string()));
    }
    let (root, rest) = symbol.split_at(6);
    let (date, rest) = rest.split_at(6);
    let (marker, strike) = rest.split_at(1);

    let contract = match marker {
        "C" => ContractSide::Call,
        "P" => ContractSide::Put,
        _ => return Err(SymbolError::MissingContractMarker(symbol.to_string())),
    };

    let expiration = parse_yymmdd(date).ok_or_else(|| SymbolError::InvalidExpiration {
        symbol: symbol.to_string(),
        date: date.to_string(),
    })?;

    let thousandths: u64 = strike
        .parse()
        .map_err(|_| SymbolError::InvalidStrike(symbol.to_string()))?;

    Ok(OptionSymbol {
        ticker: root.trim_end().to_string(),
        strike: format_thousandths(thousandths),
        expiration,
        contract,
    })
}

fn parse_mmddyy(date: &str) -> Option<NaiveDate> {
    if date.len() != 6 || !date.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let month = date[0..2].parse().ok()?;
    let day = date[2..4].parse().ok()?;
    let year: i32 = date[4..6].parse().ok()?;
    NaiveDate::from_ymd_opt(2000 + year, month, day)
}

fn parse_yymmdd(date: &str) -> Option<NaiveDate> {
    if date.len() != 6 || !date.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = date[0..2].parse().ok()?;
    let month = date[2..4].parse().ok()?;
    let day = date[4..6].parse().ok()?;
    NaiveDate::from_ymd_opt(2000 + year, month, day)
}

fn format_thousandths(value: u64) -> String {
    let whole = value / 1000;
    let frac = value % 1000;
    if frac == 0 {
        return whole.to_string();
    }
    let digits = format!("{frac:03}");
    format!("{whole}.{}", digits.trim_end_matches('0'))
}
