use serde::{Deserialize, Serialize};

/// OKX API standard response wrapper
#[derive(Debug, Deserialize, Serialize)]
pub struct OkxResponse<T> {
    pub code: String,
    pub msg: String,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

/// OKX ticker data
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct OkxTicker {
    pub inst_type: String, // SPOT, SWAP, ...
    pub inst_id: String,   // e.g. BTC-USDT-SWAP
    pub last: String,      // Last traded price
    pub open_24h: String,  // 24h opening price
    pub high_24h: String,  // 24h highest price
    pub low_24h: String,   // 24h lowest price
    #[serde(default)]
    pub vol_ccy_24h: String, // 24h volume in base currency for SWAP
    pub vol_24h: String,   // 24h volume in contracts for SWAP
    pub ts: String,        // Timestamp
}
