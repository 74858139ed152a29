use serde::{Deserialize, Serialize};

/// `/api/v3/ticker/24hr` response for a single symbol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinanceTicker24h {
    pub symbol: String,
    #[serde(rename = "lastPrice")]
    pub last_price: String,
    /// Already expressed in percent
    #[serde(rename = "priceChangePercent")]
    pub price_change_percent: String,
    #[serde(rename = "highPrice")]
    pub high_price: String,
    #[serde(rename = "lowPrice")]
    pub low_price: String,
    pub volume: String,
    #[serde(rename = "quoteVolume", default)]
    pub quote_volume: Option<String>,
}

