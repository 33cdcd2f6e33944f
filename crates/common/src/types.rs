use serde::{Deserialize, Serialize};

/// Sort direction requested from `/activity`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityOrder {
    #[default]
    Asc,
    Desc,
}

impl ActivityOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
    Other,
}

impl Side {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("BUY") => Self::Buy,
            Some(s) if s.eq_ignore_ascii_case("SELL") => Self::Sell,
            _ => Self::Other,
        }
    }
}

/// Trade from Data API /trades.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiTrade {
    #[serde(rename = "proxyWallet")]
    pub proxy_wallet: Option<String>,
    #[serde(rename = "conditionId")]
    pub condition_id: Option<String>,
    pub title: Option<String>,
    pub outcome: Option<String>,
    #[serde(deserialize_with = "de_opt_f64_any", default)]
    pub price: Option<f64>,
    #[serde(deserialize_with = "de_opt_f64_any", default)]
    pub size: Option<f64>,
    pub side: Option<String>,
    pub timestamp: Option<i64>,
    #[serde(rename = "transactionHash")]
    pub transaction_hash: Option<String>,
}

/// A taker trade as the scanner sees it. Immutable once fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub timestamp: i64,
    pub wallet: String,
    pub market_title: String,
    pub outcome: String,
    pub price: f64,
    pub size: f64,
    pub side: Side,
}

impl Trade {
    /// Cash committed by the trade (USDC).
    pub fn spend(&self) -> f64 {
        self.price * self.size
    }

    /// Returns `None` for rows without a wallet; everything else is defaulted.
    pub fn from_api(t: ApiTrade) -> Option<Self> {
        let wallet = t.proxy_wallet.filter(|w| !w.trim().is_empty())?;
        Some(Self {
            timestamp: t.timestamp.unwrap_or(0),
            wallet,
            market_title: t.title.unwrap_or_default(),
            outcome: t.outcome.unwrap_or_default(),
            price: t.price.unwrap_or(0.0),
            size: t.size.unwrap_or(0.0),
            side: Side::parse(t.side.as_deref()),
        })
    }
}

/// One entry of a wallet's `/activity` history. Only the fields the
/// forensics need are kept; the rest of the payload is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ActivityRecord {
    pub timestamp: Option<i64>,
    #[serde(rename = "conditionId")]
    pub condition_id: Option<String>,
}

/// Position from Data API /positions.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiPosition {
    #[serde(rename = "proxyWallet")]
    pub proxy_wallet: Option<String>,
    #[serde(rename = "conditionId")]
    pub condition_id: Option<String>,
    pub title: Option<String>,
    pub outcome: Option<String>,
    #[serde(deserialize_with = "de_opt_f64_any", default)]
    pub size: Option<f64>,
    #[serde(rename = "avgPrice", deserialize_with = "de_opt_f64_any", default)]
    pub avg_price: Option<f64>,
    #[serde(rename = "currentValue", deserialize_with = "de_opt_f64_any", default)]
    pub current_value: Option<f64>,
    #[serde(rename = "cashPnl", deserialize_with = "de_opt_f64_any", default)]
    pub cash_pnl: Option<f64>,
}

/// The Data API sends numeric fields either as JSON numbers or as strings.
fn de_opt_f64_any<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de;

    struct F64OrString;

    impl<'de> de::Visitor<'de> for F64OrString {
        type Value = Option<f64>;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(f, "a number or a numeric string")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            let v = v.trim();
            if v.is_empty() {
                return Ok(None);
            }
            v.parse::<f64>().map(Some).map_err(E::custom)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v as f64))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(v as f64))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }
    }

    deserializer.deserialize_any(F64OrString)
}
