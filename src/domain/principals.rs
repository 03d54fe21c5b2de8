//! User principals and the streamer login request built from them.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrincipalsError {
    #[error("user principals carry no streamer info")]
    MissingStreamerInfo,
    #[error("user principals carry no accounts")]
    NoAccounts,
    #[error("unparseable streamer token timestamp {0:?}")]
    InvalidTimestamp(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPrincipals {
    pub user_id: Option<String>,
    pub user_cd_domain_id: Option<String>,
    pub primary_account_id: Option<String>,
    pub last_login_time: Option<String>,
    pub token_expiration_time: Option<String>,
    pub login_time: Option<String>,
    pub access_level: Option<String>,
    pub streamer_info: Option<StreamerInfo>,
    pub streamer_subscription_keys: Option<StreamerSubscriptionKeys>,
    pub accounts: Vec<Account>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StreamerInfo {
    pub streamer_binary_url: Option<String>,
    pub streamer_socket_url: Option<String>,
    pub token: Option<String>,
    pub token_timestamp: Option<String>,
    pub user_group: Option<String>,
    pub access_level: Option<String>,
    pub acl: Option<String>,
    pub app_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamerSubscriptionKeys {
    pub keys: Vec<SubscriptionKey>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscriptionKey {
    pub key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Account {
    pub account_id: Option<String>,
    pub display_name: Option<String>,
    pub account_cd_domain_id: Option<String>,
    pub company: Option<String>,
    pub segment: Option<String>,
    pub acl: Option<String>,
}

/// Plain account number and the hash the trader API expects in paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccountNumber {
    pub account_number: String,
    pub hash_value: String,
}

impl UserPrincipals {
    /// Build the ADMIN/LOGIN request sent first on a streamer socket.
    ///
    /// Uses the first listed account and the streamer token; the token
    /// timestamp is converted to epoch milliseconds.
    pub fn streaming_login_payload(&self) -> Result<serde_json::Value, PrincipalsError> {
        let info = self
            .streamer_info
            .as_ref()
            .ok_or(PrincipalsError::MissingStreamerInfo)?;
        let account = self.accounts.first().ok_or(PrincipalsError::NoAccounts)?;

        let timestamp = info.token_timestamp.as_deref().unwrap_or_default();
        let epoch_ms = parse_token_timestamp(timestamp)?;

        let field = |value: &Option<String>| value.clone().unwrap_or_default();
        let account_id = field(&account.account_id);
        let token = field(&info.token);
        let app_id = field(&info.app_id);

        let credential = format!(
            "userid={account_id}&token={token}&company={}&segment={}&cddomain={}&usergroup={}&accesslevel={}&authorized=Y&timestamp={epoch_ms}&appid={app_id}&acl={}",
            field(&account.company),
            field(&account.segment),
            field(&account.account_cd_domain_id),
            field(&info.user_group),
            field(&info.access_level),
            field(&info.acl),
        );

        Ok(json!({
            "requests": [{
                "service": "ADMIN",
                "requestid": "0",
                "command": "LOGIN",
                "account": account_id,
                "source": app_id,
                "parameters": {
                    "credential": credential,
                    "token": token,
                    "version": "1.0",
                },
            }]
        }))
    }
}

/// Accepts `2024-06-13T15:04:05+0000` or the bare `2024-06-13T15:04:05` (read as UTC).
fn parse_token_timestamp(timestamp: &str) -> Result<i64, PrincipalsError> {
    if let Ok(with_offset) = DateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%z") {
        return Ok(with_offset.timestamp_millis());
    }
    let bare = timestamp.get(..19).unwrap_or(timestamp);
    NaiveDateTime::parse_from_str(bare, "%Y-%m-%dT%H:%M:%S")
        .map(|naive| naive.and_utc().timestamp_millis())
        .map_err(|_| PrincipalsError::InvalidTimestamp(timestamp.to_string()))
}
