use serde::{Deserialize, Serialize};

/// V5 response envelope
#[derive(Debug, Deserialize)]
pub struct BybitApiResponse<T> {
    #[serde(rename = "retCode")]
    pub ret_code: i32,
    #[serde(rename = "retMsg")]
    pub ret_msg: String,
    pub result: T,
    #[serde(default)]
    pub time: Option<i64>,
}

/// `result` of every list-style endpoint
#[derive(Debug, Deserialize)]
pub struct BybitList<T> {
    #[serde(default)]
    pub category: Option<String>,
    pub list: Vec<T>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BybitTicker {
    pub symbol: String,
    pub last_price: String,
    /// Fractional change (0.0123 means +1.23%)
    pub price_24h_pcnt: String,
    pub high_price_24h: String,
    pub low_price_24h: String,
    pub volume_24h: String,
    #[serde(default)]
    pub turnover_24h: Option<String>,
    #[serde(default)]
    pub funding_rate: Option<String>,
    #[serde(default)]
    pub next_funding_time: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BybitFundingRate {
    pub symbol: String,
    pub funding_rate: String,
    pub funding_rate_timestamp: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BybitWallet {
    pub account_type: String,
    #[serde(default)]
    pub total_equity: String,
    #[serde(default)]
    pub total_wallet_balance: String,
    #[serde(default)]
    pub total_available_balance: String,
    #[serde(default)]
    pub coin: Vec<BybitCoinBalance>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BybitCoinBalance {
    pub coin: String,
    #[serde(default)]
    pub wallet_balance: String,
    #[serde(default)]
    pub equity: String,
    #[serde(default)]
    pub unrealised_pnl: String,
    #[serde(default)]
    pub usd_value: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BybitPosition {
    pub symbol: String,
    /// `Buy`, `Sell`, or empty for a flat slot
    #[serde(default)]
    pub side: String,
    pub size: String,
    #[serde(default)]
    pub avg_price: String,
    #[serde(default)]
    pub mark_price: String,
    #[serde(default)]
    pub leverage: String,
    #[serde(default)]
    pub unrealised_pnl: String,
    /// 0 in one-way mode, 1 (buy side) or 2 (sell side) in hedge mode
    #[serde(default)]
    pub position_idx: i32,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BybitOrderAck {
    pub order_id: String,
    #[serde(default)]
    pub order_link_id: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BybitOpenOrder {
    pub order_id: String,
    #[serde(default)]
    pub order_link_id: String,
    pub symbol: String,
    pub side: String,
    pub order_type: String,
    #[serde(default)]
    pub price: String,
    pub qty: String,
    pub order_status: String,
    #[serde(default)]
    pub created_time: String,
}
