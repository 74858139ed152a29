use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Typed errors for the types subsystem
#[derive(Error, Debug)]
pub enum TypesError {
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),
    #[error("Invalid price: {0}")]
    InvalidPrice(#[from] rust_decimal::Error),
}

/// Quote assets recognised when splitting a concatenated symbol, longest first
const QUOTE_ASSETS: [&str; 6] = ["FDUSD", "USDT", "USDC", "USD", "BTC", "ETH"];

/// Type-safe symbol representation with validation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol {
    pub base: String,
    pub quote: String,
}

impl Symbol {
    /// Create a new symbol with validation
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Result<Self, TypesError> {
        let base = base.into();
        let quote = quote.into();

        if base.is_empty() || quote.is_empty() {
            return Err(TypesError::InvalidSymbol(
                "Base and quote assets cannot be empty".to_string(),
            ));
        }

        Ok(Self { base, quote })
    }

    /// Create from a venue symbol like "BTCUSDT"
    pub fn from_string(symbol: &str) -> Result<Self, TypesError> {
        let upper = symbol.trim().to_uppercase();
        QUOTE_ASSETS
            .iter()
            .find_map(|quote| {
                upper
                    .strip_suffix(quote)
                    .filter(|base| !base.is_empty())
                    .map(|base| (base.to_string(), (*quote).to_string()))
            })
            .map_or_else(
                || Err(TypesError::InvalidSymbol(format!("Unable to parse symbol '{}'", symbol))),
                |(base, quote)| Self::new(base, quote),
            )
    }

    /// Concatenated venue form, e.g. "BTCUSDT"
    pub fn venue_symbol(&self) -> String {
        format!("{}{}", self.base, self.quote)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// Type-safe price representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(#[serde(with = "rust_decimal::serde::str")] pub Decimal);

impl Price {
    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    pub const fn value(&self) -> Decimal {
        self.0
    }
}

impl FromStr for Price {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Type-safe quantity representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(#[serde(with = "rust_decimal::serde::str")] pub Decimal);

impl Quantity {
    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    pub const fn value(&self) -> Decimal {
        self.0
    }
}

impl FromStr for Quantity {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Type-safe volume representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Volume(#[serde(with = "rust_decimal::serde::str")] pub Decimal);

impl Volume {
    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    pub const fn value(&self) -> Decimal {
        self.0
    }
}

impl FromStr for Volume {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Public market-data providers the aggregator can draw from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Bybit,
    Binance,
    Okx,
}

impl ProviderKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bybit => "bybit",
            Self::Binance => "binance",
            Self::Okx => "okx",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bybit" => Ok(Self::Bybit),
            "binance" => Ok(Self::Binance),
            "okx" => Ok(Self::Okx),
            other => Err(format!("unknown market data provider '{}'", other)),
        }
    }
}

/// Canonical ticker shape every provider payload is normalized into
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerSnapshot {
    pub symbol: String,
    pub last_price: Price,
    /// 24h change in percent (1.5 means +1.5%)
    pub change_percent_24h: Decimal,
    pub high_24h: Price,
    pub low_24h: Price,
    pub volume_24h: Volume,
    pub funding_rate: Option<Decimal>,
    pub fetched_at: DateTime<Utc>,
    pub source: ProviderKind,
}

/// How current a served ticker is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Freshness {
    /// Fetched from a provider during this call
    Live,
    /// Served from a cache entry still within its TTL
    Cached,
    /// Served from an expired cache entry because every provider failed
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketQuote {
    pub snapshot: TickerSnapshot,
    pub freshness: Freshness,
}

impl MarketQuote {
    pub fn is_stale(&self) -> bool {
        self.freshness == Freshness::Stale
    }
}

/// Funding rate entry from the venue's funding history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingRate {
    pub symbol: String,
    pub funding_rate: Decimal,
    pub funding_time: i64,
}

/// Product line of the venue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Spot,
    #[default]
    Linear,
    Inverse,
    Option,
}

impl Category {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Spot => "spot",
            Self::Linear => "linear",
            Self::Inverse => "inverse",
            Self::Option => "option",
        }
    }

    /// Only perpetual contracts settle funding
    pub const fn has_funding(self) -> bool {
        matches!(self, Self::Linear | Self::Inverse)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountType {
    #[default]
    Unified,
    Contract,
    Spot,
}

impl AccountType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unified => "UNIFIED",
            Self::Contract => "CONTRACT",
            Self::Spot => "SPOT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "Buy",
            Self::Sell => "Sell",
        }
    }

    pub const fn opposite(self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }
}

impl FromStr for OrderSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Buy" | "buy" | "BUY" => Ok(Self::Buy),
            "Sell" | "sell" | "SELL" => Ok(Self::Sell),
            other => Err(format!("unknown order side '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Limit,
}

impl OrderType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Market => "Market",
            Self::Limit => "Limit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub category: Category,
    pub symbol: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub quantity: Quantity,
    pub price: Option<Price>,
    pub reduce_only: bool,
    pub position_idx: Option<i32>,
}

impl OrderRequest {
    /// Market order in the default (linear) category
    pub fn market(symbol: impl Into<String>, side: OrderSide, quantity: Quantity) -> Self {
        Self {
            category: Category::default(),
            symbol: symbol.into(),
            side,
            order_type: OrderType::Market,
            quantity,
            price: None,
            reduce_only: false,
            position_idx: None,
        }
    }

    #[must_use]
    pub const fn category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    #[must_use]
    pub const fn limit(mut self, price: Price) -> Self {
        self.order_type = OrderType::Limit;
        self.price = Some(price);
        self
    }

    #[must_use]
    pub const fn reduce_only(mut self) -> Self {
        self.reduce_only = true;
        self
    }

    /// Target a hedge-mode slot
    #[must_use]
    pub const fn position_idx(mut self, idx: i32) -> Self {
        self.position_idx = Some(idx);
        self
    }
}

/// Per-coin balance inside a wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub coin: String,
    pub wallet_balance: Decimal,
    pub equity: Decimal,
    pub unrealised_pnl: Decimal,
    pub usd_value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletBalance {
    pub account_type: AccountType,
    pub total_equity: Decimal,
    pub total_wallet_balance: Decimal,
    pub total_available_balance: Decimal,
    pub coins: Vec<Balance>,
}

/// Open derivatives position. Flat entries are filtered out before this type
/// is built, so `side` is always set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub side: OrderSide,
    pub size: Quantity,
    pub entry_price: Price,
    pub mark_price: Price,
    pub leverage: Decimal,
    pub unrealised_pnl: Decimal,
    /// Venue slot index; non-zero only for hedge-mode positions
    pub position_idx: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenOrder {
    pub order_id: String,
    pub order_link_id: String,
    pub symbol: String,
    pub side: OrderSide,
    pub order_type: String,
    pub price: Price,
    pub quantity: Quantity,
    pub status: String,
    pub created_time: i64,
}

/// Venue acknowledgement for an accepted order or cancel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAck {
    pub order_id: String,
    pub order_link_id: String,
}

/// Conversion helpers for venue payloads, which carry numbers as strings
pub mod conversion {
    use super::*;
    use crate::core::errors::ExchangeError;

    /// Parse an optional numeric field; empty or malformed values become zero
    #[inline]
    pub fn string_to_decimal(s: &str) -> Decimal {
        s.trim().parse().unwrap_or(Decimal::ZERO)
    }

    /// Parse a field the snapshot cannot do without
    pub fn required_decimal(field: &str, s: &str) -> Result<Decimal, ExchangeError> {
        s.trim().parse().map_err(|e| {
            ExchangeError::protocol(None, format!("Invalid {} '{}': {}", field, s, e))
        })
    }

    #[inline]
    pub fn required_price(field: &str, s: &str) -> Result<Price, ExchangeError> {
        required_decimal(field, s).map(Price::new)
    }

    #[inline]
    pub fn required_volume(field: &str, s: &str) -> Result<Volume, ExchangeError> {
        required_decimal(field, s).map(Volume::new)
    }

    /// Parse an optional field, treating empty strings as absent
    pub fn optional_decimal(s: Option<&str>) -> Option<Decimal> {
        s.map(str::trim)
            .filter(|v| !v.is_empty())
            .and_then(|v| v.parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_from_string() {
        let btc = Symbol::from_string("BTCUSDT").unwrap();
        assert_eq!(btc.base, "BTC");
        assert_eq!(btc.quote, "USDT");
        assert_eq!(btc.venue_symbol(), "BTCUSDT");

        let eth = Symbol::from_string("ethbtc").unwrap();
        assert_eq!((eth.base.as_str(), eth.quote.as_str()), ("ETH", "BTC"));

        assert!(Symbol::from_string("USDT").is_err());
        assert!(Symbol::from_string("XYZ").is_err());
    }

    #[test]
    fn test_provider_kind_round_trips_through_str() {
        for kind in [ProviderKind::Bybit, ProviderKind::Binance, ProviderKind::Okx] {
            assert_eq!(kind.as_str().parse::<ProviderKind>(), Ok(kind));
        }
        assert_eq!("  OKX ".parse::<ProviderKind>(), Ok(ProviderKind::Okx));
    }

    #[test]
    fn test_category_funding_support() {
        assert!(Category::Linear.has_funding());
        assert!(Category::Inverse.has_funding());
        assert!(!Category::Spot.has_funding());
        assert!(!Category::Option.has_funding());
    }

    #[test]
    fn test_order_request_builders() {
        let qty: Quantity = "0.001".parse().unwrap();
        let order = OrderRequest::market("BTCUSDT", OrderSide::Buy, qty)
            .category(Category::Spot)
            .limit("30000".parse().unwrap());
        assert_eq!(order.order_type, OrderType::Limit);
        assert_eq!(order.category, Category::Spot);
        assert_eq!(order.price.unwrap().to_string(), "30000");
        assert!(!order.reduce_only);
    }
}
