//! Live market mode
//!
//! Polls a 24h price change on a fixed cadence and thresholds it into
//! bull/bear/neutral. A failed poll keeps whatever mode was last known.

use serde::Deserialize;
use thiserror::Error;

/// Milliseconds between polls
pub const POLL_INTERVAL_MS: f64 = 60_000.0;
pub const BULL_THRESHOLD: f64 = 3.0;
pub const BEAR_THRESHOLD: f64 = -3.0;
pub const QUOTE_URL: &str =
    "https://api.coingecko.com/api/v3/simple/price?ids=solana&vs_currencies=usd&include_24hr_change=true";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarketMode {
    Bull,
    Bear,
    #[default]
    Neutral,
}

impl MarketMode {
    /// Scale applied to the base world speed
    pub fn speed_multiplier(self) -> f32 {
        match self {
            MarketMode::Bull => 0.88,
            MarketMode::Bear => 1.12,
            MarketMode::Neutral => 1.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MarketMode::Bull => "bull",
            MarketMode::Bear => "bear",
            MarketMode::Neutral => "neutral",
        }
    }

    /// 0xRRGGBB
    pub fn color(self) -> u32 {
        match self {
            MarketMode::Bull => 0x22C55E,
            MarketMode::Bear => 0xEF4444,
            MarketMode::Neutral => 0xAAAAAA,
        }
    }

    pub fn for_change(pct: f64) -> MarketMode {
        if pct >= BULL_THRESHOLD {
            MarketMode::Bull
        } else if pct <= BEAR_THRESHOLD {
            MarketMode::Bear
        } else {
            MarketMode::Neutral
        }
    }
}

/// Read-only view the engine consumes
pub trait Market {
    fn mode(&self) -> MarketMode;
}

impl Market for MarketMode {
    fn mode(&self) -> MarketMode {
        *self
    }
}

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("quote is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("quote has no {0} field")]
    MissingField(&'static str),
    #[error("network: {0}")]
    Network(String),
}

#[derive(Debug, Deserialize)]
struct Quote {
    solana: Option<SolQuote>,
}

#[derive(Debug, Deserialize)]
struct SolQuote {
    usd: Option<f64>,
    usd_24h_change: Option<f64>,
}

/// Latest price and 24h change
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    pub price: Option<f64>,
    pub change_24h: f64,
}

/// Parse a `{"solana":{"usd":..,"usd_24h_change":..}}` quote
pub fn parse_quote(json: &str) -> Result<Snapshot, QuoteError> {
    let quote: Quote = serde_json::from_str(json)?;
    let sol = quote.solana.ok_or(QuoteError::MissingField("solana"))?;
    let change_24h = sol
        .usd_24h_change
        .ok_or(QuoteError::MissingField("usd_24h_change"))?;
    Ok(Snapshot {
        price: sol.usd,
        change_24h,
    })
}

/// Mode state machine fed by poll results
#[derive(Debug, Clone, Default)]
pub struct MarketWatcher {
    mode: MarketMode,
    last: Option<Snapshot>,
    last_poll_ms: Option<f64>,
    /// Last poll failed
    pub error: bool,
}

impl MarketWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a poll result in. Errors keep the previous mode.
    pub fn apply(&mut self, result: Result<Snapshot, QuoteError>) {
        match result {
            Ok(snapshot) => {
                let mode = MarketMode::for_change(snapshot.change_24h);
                if mode != self.mode {
                    log::info!(
                        "Market mode {} -> {} ({:+.1}%)",
                        self.mode.label(),
                        mode.label(),
                        snapshot.change_24h
                    );
                }
                self.mode = mode;
                self.last = Some(snapshot);
                self.error = false;
            }
            Err(e) => {
                log::warn!("Market poll failed, keeping {}: {}", self.mode.label(), e);
                self.error = true;
            }
        }
    }

    /// True when a poll is due at `now_ms`; marks the poll as started
    pub fn begin_poll(&mut self, now_ms: f64) -> bool {
        let due = self
            .last_poll_ms
            .map(|last| now_ms - last >= POLL_INTERVAL_MS)
            .unwrap_or(true);
        if due {
            self.last_poll_ms = Some(now_ms);
        }
        due
    }

    pub fn snapshot(&self) -> Option<Snapshot> {
        self.last
    }

    /// e.g. "SOL $142.30 ▲4.2%"
    pub fn display_string(&self) -> String {
        let Some(Snapshot {
            price: Some(price),
            change_24h,
        }) = self.last
        else {
            return String::new();
        };
        let arrow = if change_24h > 0.0 {
            '▲'
        } else if change_24h < 0.0 {
            '▼'
        } else {
            '-'
        };
        format!("SOL ${:.2} {}{:.1}%", price, arrow, change_24h.abs())
    }
}

impl Market for MarketWatcher {
    fn mode(&self) -> MarketMode {
        self.mode
    }
}

/// Fetch one quote from the price feed
#[cfg(target_arch = "wasm32")]
pub async fn fetch_quote() -> Result<Snapshot, QuoteError> {
    use wasm_bindgen::JsCast;
    use wasm_bindgen_futures::JsFuture;

    let window = web_sys::window().ok_or_else(|| QuoteError::Network("no window".into()))?;
    let resp = JsFuture::from(window.fetch_with_str(QUOTE_URL))
        .await
        .map_err(|e| QuoteError::Network(format!("{:?}", e)))?;
    let resp: web_sys::Response = resp
        .dyn_into()
        .map_err(|_| QuoteError::Network("not a response".into()))?;
    if !resp.ok() {
        return Err(QuoteError::Network(format!("status {}", resp.status())));
    }
    let text = resp
        .text()
        .map_err(|e| QuoteError::Network(format!("{:?}", e)))?;
    let text = JsFuture::from(text)
        .await
        .map_err(|e| QuoteError::Network(format!("{:?}", e)))?;
    parse_quote(&text.as_string().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds() {
        assert_eq!(MarketMode::for_change(3.0), MarketMode::Bull);
        assert_eq!(MarketMode::for_change(2.99), MarketMode::Neutral);
        assert_eq!(MarketMode::for_change(-3.0), MarketMode::Bear);
        assert_eq!(MarketMode::for_change(0.0), MarketMode::Neutral);
    }

    #[test]
    fn test_parse_quote() {
        let snap = parse_quote(r#"{"solana":{"usd":142.3,"usd_24h_change":4.2}}"#);
        assert!(matches!(snap, Ok(Snapshot { change_24h, .. }) if change_24h == 4.2));
        assert!(matches!(
            parse_quote(r#"{"solana":{"usd":1.0}}"#),
            Err(QuoteError::MissingField("usd_24h_change"))
        ));
        assert!(matches!(parse_quote("nope"), Err(QuoteError::Parse(_))));
    }

    #[test]
    fn test_error_keeps_last_mode() {
        let mut w = MarketWatcher::new();
        w.apply(Ok(Snapshot {
            price: Some(100.0),
            change_24h: -5.0,
        }));
        assert_eq!(w.mode(), MarketMode::Bear);
        w.apply(Err(QuoteError::Network("timeout".into())));
        assert_eq!(w.mode(), MarketMode::Bear);
        assert!(w.error);
    }

    #[test]
    fn test_poll_cadence() {
        let mut w = MarketWatcher::new();
        assert!(w.begin_poll(0.0));
        assert!(!w.begin_poll(30_000.0));
        assert!(w.begin_poll(60_000.0));
    }

    #[test]
    fn test_display_string() {
        let mut w = MarketWatcher::new();
        assert_eq!(w.display_string(), "");
        w.apply(Ok(Snapshot {
            price: Some(142.3),
            change_24h: 4.2,
        }));
        assert_eq!(w.display_string(), "SOL $142.30 ▲4.2%");
    }
}
