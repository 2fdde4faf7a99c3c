//! Wallet connection and holder tiers
//!
//! The engine reads perks once at run start and never writes wallet state.
//! Without a wallet every method degrades to the empty tier.

/// Token holding bracket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tier {
    #[default]
    None,
    Degen,
    Holder,
    Whale,
}

/// Starting and ongoing perks granted by a tier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierPerks {
    pub shield_start: bool,
    pub bull_bonus_seconds: f32,
    pub combo_start: bool,
    pub magnet_radius_multiplier: f32,
    pub display_name: Option<&'static str>,
    /// 0xRRGGBB
    pub color: u32,
}

impl Default for TierPerks {
    fn default() -> Self {
        Tier::None.perks()
    }
}

impl Tier {
    /// Highest first, so the first match wins
    const THRESHOLDS: [(u64, Tier); 3] = [
        (1_000_000, Tier::Whale),
        (500_000, Tier::Holder),
        (100_000, Tier::Degen),
    ];

    pub fn for_balance(balance: u64) -> Tier {
        Self::THRESHOLDS
            .iter()
            .find(|(min, _)| balance >= *min)
            .map(|(_, tier)| *tier)
            .unwrap_or(Tier::None)
    }

    pub fn perks(self) -> TierPerks {
        match self {
            Tier::Whale => TierPerks {
                shield_start: true,
                bull_bonus_seconds: 5.0,
                combo_start: true,
                magnet_radius_multiplier: 2.0,
                display_name: Some("WHALE"),
                color: 0xF7931A,
            },
            Tier::Holder => TierPerks {
                shield_start: false,
                bull_bonus_seconds: 3.0,
                combo_start: false,
                magnet_radius_multiplier: 1.0,
                display_name: Some("HOLDER"),
                color: 0x9945FF,
            },
            Tier::Degen => TierPerks {
                shield_start: true,
                bull_bonus_seconds: 10.0,
                combo_start: false,
                magnet_radius_multiplier: 1.0,
                display_name: Some("DEGEN"),
                color: 0x22C55E,
            },
            Tier::None => TierPerks {
                shield_start: false,
                bull_bonus_seconds: 0.0,
                combo_start: false,
                magnet_radius_multiplier: 1.0,
                display_name: None,
                color: 0x888888,
            },
        }
    }
}

/// Read-only view the engine consumes
pub trait Wallet {
    fn is_connected(&self) -> bool;
    /// `first4...last4`, empty when disconnected
    fn short_address(&self) -> String;
    fn tier(&self) -> TierPerks;
}

/// No wallet extension present
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWallet;

impl Wallet for NoWallet {
    fn is_connected(&self) -> bool {
        false
    }

    fn short_address(&self) -> String {
        String::new()
    }

    fn tier(&self) -> TierPerks {
        TierPerks::default()
    }
}

/// Connected public key plus last known token balance
#[derive(Debug, Clone, Default)]
pub struct WalletState {
    pubkey: Option<String>,
    balance: u64,
    tier: Tier,
    /// Last connection error shown to the player
    pub error: Option<String>,
}

impl WalletState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&mut self, pubkey: impl Into<String>) {
        let pubkey = pubkey.into();
        log::info!("Wallet connected: {}", short_address(&pubkey));
        self.pubkey = Some(pubkey);
        self.error = None;
    }

    /// Record a failed connect without touching any existing connection
    pub fn connect_failed(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        log::warn!("Wallet connect failed: {}", reason);
        self.error = Some(reason);
    }

    pub fn set_balance(&mut self, balance: u64) {
        self.balance = balance;
        self.tier = Tier::for_balance(balance);
        log::info!("Wallet balance {} -> tier {:?}", balance, self.tier);
    }

    pub fn disconnect(&mut self) {
        *self = Self::default();
    }

    pub fn pubkey(&self) -> Option<&str> {
        self.pubkey.as_deref()
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    pub fn tier_kind(&self) -> Tier {
        self.tier
    }
}

impl Wallet for WalletState {
    fn is_connected(&self) -> bool {
        self.pubkey.is_some()
    }

    fn short_address(&self) -> String {
        self.pubkey.as_deref().map(short_address).unwrap_or_default()
    }

    fn tier(&self) -> TierPerks {
        if self.is_connected() {
            self.tier.perks()
        } else {
            TierPerks::default()
        }
    }
}

/// `first4...last4` of an address; short keys are returned whole
pub fn short_address(pubkey: &str) -> String {
    let chars: Vec<char> = pubkey.chars().collect();
    if chars.len() <= 8 {
        return pubkey.to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_thresholds() {
        assert_eq!(Tier::for_balance(0), Tier::None);
        assert_eq!(Tier::for_balance(99_999), Tier::None);
        assert_eq!(Tier::for_balance(100_000), Tier::Degen);
        assert_eq!(Tier::for_balance(500_000), Tier::Holder);
        assert_eq!(Tier::for_balance(2_000_000), Tier::Whale);
    }

    #[test]
    fn test_whale_perks() {
        let perks = Tier::Whale.perks();
        assert!(perks.shield_start && perks.combo_start);
        assert_eq!(perks.magnet_radius_multiplier, 2.0);
        assert_eq!(perks.bull_bonus_seconds, 5.0);
    }

    #[test]
    fn test_short_address() {
        assert_eq!(
            short_address("NV2RYH954cTJ3ckFUpvfqaQXU4ARqqDH3562nFSpump"),
            "NV2R...pump"
        );
        assert_eq!(short_address("abc"), "abc");
    }

    #[test]
    fn test_disconnected_has_no_perks() {
        let mut w = WalletState::new();
        w.set_balance(5_000_000);
        assert!(!w.is_connected());
        assert_eq!(w.tier(), TierPerks::default());
        assert_eq!(w.short_address(), "");

        w.connect("So11111111111111111111111111111111111111112");
        assert!(w.tier().shield_start);
        assert_eq!(w.short_address(), "So11...1112");

        w.disconnect();
        assert_eq!(w.tier_kind(), Tier::None);
    }

    #[test]
    fn test_failed_connect_keeps_state() {
        let mut w = WalletState::new();
        w.connect("abcdefghijkl");
        w.connect_failed("Connection rejected.");
        assert!(w.is_connected());
        assert_eq!(w.error.as_deref(), Some("Connection rejected."));
    }
}
