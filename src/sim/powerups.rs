//! Timed power-up effects
//!
//! Each effect is an independent active flag + countdown. Speed and score
//! multipliers are the product of whatever is active. Re-activating an effect
//! restarts its timer; durations never stack.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entities::{Coin, PowerUpKind};
use super::pool::EntityPool;
use crate::consts::*;

/// Active flag + remaining seconds
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EffectTimer {
    pub active: bool,
    pub remaining: f32,
    /// Duration the timer was last started with (for HUD bars)
    pub duration: f32,
}

impl EffectTimer {
    pub fn start(&mut self, duration: f32) {
        self.active = true;
        self.remaining = duration;
        self.duration = duration;
    }

    /// Count down; true exactly once, on the frame the effect runs out
    pub fn tick(&mut self, dt: f32) -> bool {
        if !self.active {
            return false;
        }
        self.remaining -= dt;
        if self.remaining <= 0.0 {
            self.active = false;
            self.remaining = 0.0;
            return true;
        }
        false
    }

    /// Remaining share of the duration, 0..=1
    pub fn fraction(&self) -> f32 {
        if self.duration <= 0.0 {
            0.0
        } else {
            (self.remaining / self.duration).clamp(0.0, 1.0)
        }
    }
}

/// One HUD row for an active effect
#[derive(Debug, Clone, PartialEq)]
pub struct HudItem {
    pub kind: PowerUpKind,
    pub label: String,
    /// Timer bar fill, `None` for untimed effects (shield)
    pub fraction: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerupManager {
    pub shield: bool,
    pub magnet: EffectTimer,
    pub slow: EffectTimer,
    /// Seconds left in the post-slow recovery ramp
    pub slow_return: f32,
    pub pump: EffectTimer,
    pub bull: EffectTimer,
    pub bear: EffectTimer,
    /// Tier perk: magnet radius scale, fixed for the run
    magnet_radius_mult: f32,
    /// Tier perk: seconds added to each bull market, fixed for the run
    bull_bonus: f32,
}

impl Default for PowerupManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PowerupManager {
    pub fn new() -> Self {
        Self {
            shield: false,
            magnet: EffectTimer::default(),
            slow: EffectTimer::default(),
            slow_return: 0.0,
            pump: EffectTimer::default(),
            bull: EffectTimer::default(),
            bear: EffectTimer::default(),
            magnet_radius_mult: 1.0,
            bull_bonus: 0.0,
        }
    }

    /// Clear every effect and tier bonus
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Snapshot tier bonuses for the run
    pub fn set_tier_bonuses(&mut self, magnet_radius_mult: f32, bull_bonus: f32) {
        self.magnet_radius_mult = magnet_radius_mult.max(0.0);
        self.bull_bonus = bull_bonus.max(0.0);
    }

    pub fn magnet_radius(&self) -> f32 {
        MAGNET_RADIUS * self.magnet_radius_mult
    }

    /// Start (or restart) a timed effect. Airdrop is instant and handled by
    /// the engine, so it is ignored here.
    pub fn activate(&mut self, kind: PowerUpKind) {
        match kind {
            PowerUpKind::Shield => self.shield = true,
            PowerUpKind::Magnet => self.magnet.start(MAGNET_DURATION),
            PowerUpKind::SlowTime => {
                self.slow.start(SLOW_DURATION);
                self.slow_return = 0.0;
            }
            PowerUpKind::Pump => self.pump.start(PUMP_DURATION),
            PowerUpKind::Bull => self.bull.start(BULL_DURATION + self.bull_bonus),
            PowerUpKind::Bear => self.bear.start(BEAR_DURATION),
            PowerUpKind::Airdrop => {}
        }
    }

    /// Consume the shield after it absorbed a hit
    pub fn break_shield(&mut self) {
        self.shield = false;
    }

    pub fn is_active(&self, kind: PowerUpKind) -> bool {
        match kind {
            PowerUpKind::Shield => self.shield,
            PowerUpKind::Magnet => self.magnet.active,
            PowerUpKind::SlowTime => self.slow.active,
            PowerUpKind::Pump => self.pump.active,
            PowerUpKind::Bull => self.bull.active,
            PowerUpKind::Bear => self.bear.active,
            PowerUpKind::Airdrop => false,
        }
    }

    /// Product of every active speed effect
    pub fn speed_multiplier(&self) -> f32 {
        let slow = if self.slow.active {
            SLOW_MULTIPLIER
        } else if self.slow_return > 0.0 {
            let t = 1.0 - self.slow_return / SLOW_RETURN;
            SLOW_MULTIPLIER + t * (1.0 - SLOW_MULTIPLIER)
        } else {
            1.0
        };
        let bear = if self.bear.active {
            BEAR_SPEED_MULTIPLIER
        } else {
            1.0
        };
        slow * bear
    }

    /// Product of every active score effect
    pub fn score_multiplier(&self) -> f64 {
        let pump = if self.pump.active { PUMP_MULTIPLIER } else { 1.0 };
        let bear = if self.bear.active {
            BEAR_SCORE_MULTIPLIER
        } else {
            1.0
        };
        pump * bear
    }

    /// Advance timers and apply the magnet pull toward `player_center`.
    /// Returns the effects that ran out this frame.
    pub fn update(
        &mut self,
        dt: f32,
        player_center: Vec2,
        coins: &mut EntityPool<Coin>,
    ) -> Vec<PowerUpKind> {
        let mut expired = Vec::new();

        if self.magnet.tick(dt) {
            expired.push(PowerUpKind::Magnet);
        } else if self.magnet.active {
            let radius = self.magnet_radius();
            for coin in coins.iter_mut() {
                let delta = player_center - coin.center();
                let dist = delta.length();
                if dist < radius && dist > 1.0 {
                    coin.pos += delta / dist * MAGNET_PULL * dt;
                }
            }
        }

        if self.slow.tick(dt) {
            self.slow_return = SLOW_RETURN;
            expired.push(PowerUpKind::SlowTime);
        } else if self.slow_return > 0.0 {
            self.slow_return = (self.slow_return - dt).max(0.0);
        }

        if self.pump.tick(dt) {
            expired.push(PowerUpKind::Pump);
        }
        if self.bull.tick(dt) {
            expired.push(PowerUpKind::Bull);
        }
        if self.bear.tick(dt) {
            expired.push(PowerUpKind::Bear);
        }

        expired
    }

    /// Rows for the effect HUD, in a stable order
    pub fn hud_items(&self) -> Vec<HudItem> {
        let mut items = Vec::new();
        if self.shield {
            items.push(HudItem {
                kind: PowerUpKind::Shield,
                label: "SHIELD".to_string(),
                fraction: None,
            });
        }
        let timed = [
            (PowerUpKind::Magnet, &self.magnet, ""),
            (PowerUpKind::SlowTime, &self.slow, ""),
            (PowerUpKind::Pump, &self.pump, "x3 "),
            (PowerUpKind::Bull, &self.bull, "BULL "),
            (PowerUpKind::Bear, &self.bear, "BEAR "),
        ];
        for (kind, timer, prefix) in timed {
            if timer.active {
                items.push(HudItem {
                    kind,
                    label: format!("{}{:.1}s", prefix, timer.remaining),
                    fraction: Some(timer.fraction()),
                });
            }
        }
        items
    }
}

/// Announcement shown when an effect starts
pub fn activation_message(kind: PowerUpKind) -> &'static str {
    match kind {
        PowerUpKind::Shield => "HELMETED UP!",
        PowerUpKind::Magnet => "MAGNET!",
        PowerUpKind::SlowTime => "SLOW TIME!",
        PowerUpKind::Pump => "LFG! x3 SCORE!",
        PowerUpKind::Bull => "BULL MARKET! COIN RAIN!",
        PowerUpKind::Bear => "BEAR MARKET! SLOW & LOW",
        PowerUpKind::Airdrop => "+500 AIRDROP!",
    }
}

/// Announcement shown when an effect runs out
pub fn expiry_message(kind: PowerUpKind) -> &'static str {
    match kind {
        PowerUpKind::Shield => "SHIELD BROKEN!",
        PowerUpKind::Magnet => "MAGNET OFF",
        PowerUpKind::SlowTime => "SPEED RETURNING",
        PowerUpKind::Pump => "PUMP ENDED",
        PowerUpKind::Bull => "BULL RUN OVER",
        PowerUpKind::Bear => "BEAR MARKET OVER",
        PowerUpKind::Airdrop => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entities::CoinTier;

    fn tick(m: &mut PowerupManager, seconds: f32) -> Vec<PowerUpKind> {
        let mut coins = EntityPool::default();
        let mut expired = Vec::new();
        let dt = 0.01;
        let steps = (seconds / dt).round() as usize;
        for _ in 0..steps {
            expired.extend(m.update(dt, Vec2::ZERO, &mut coins));
        }
        expired
    }

    #[test]
    fn test_multipliers_compose() {
        let mut m = PowerupManager::new();
        assert_eq!(m.speed_multiplier(), 1.0);
        assert_eq!(m.score_multiplier(), 1.0);

        m.activate(PowerUpKind::Pump);
        m.activate(PowerUpKind::Bear);
        assert_eq!(m.score_multiplier(), PUMP_MULTIPLIER * BEAR_SCORE_MULTIPLIER);

        m.activate(PowerUpKind::SlowTime);
        let expected = SLOW_MULTIPLIER * BEAR_SPEED_MULTIPLIER;
        assert!((m.speed_multiplier() - expected).abs() < 1e-6);
    }

    #[test]
    fn test_slow_time_recovery_ramp() {
        let mut m = PowerupManager::new();
        m.activate(PowerUpKind::SlowTime);
        let expired = tick(&mut m, SLOW_DURATION + 0.005);
        assert_eq!(expired, vec![PowerUpKind::SlowTime]);

        // Mid-ramp sits between slow and full speed
        tick(&mut m, SLOW_RETURN / 2.0);
        let mid = m.speed_multiplier();
        assert!(mid > SLOW_MULTIPLIER && mid < 1.0, "mid = {mid}");

        tick(&mut m, SLOW_RETURN);
        assert_eq!(m.speed_multiplier(), 1.0);
    }

    #[test]
    fn test_reactivation_resets_not_stacks() {
        let mut m = PowerupManager::new();
        m.activate(PowerUpKind::Pump);
        tick(&mut m, 4.0);
        m.activate(PowerUpKind::Pump);
        assert_eq!(m.pump.remaining, PUMP_DURATION);
    }

    #[test]
    fn test_bull_tier_bonus() {
        let mut m = PowerupManager::new();
        m.set_tier_bonuses(1.0, 5.0);
        m.activate(PowerUpKind::Bull);
        assert_eq!(m.bull.remaining, BULL_DURATION + 5.0);
    }

    #[test]
    fn test_each_expiry_fires_once() {
        let mut m = PowerupManager::new();
        m.activate(PowerUpKind::Magnet);
        m.activate(PowerUpKind::Pump);
        m.activate(PowerUpKind::Bear);
        let expired = tick(&mut m, 10.0);
        assert_eq!(expired.iter().filter(|k| **k == PowerUpKind::Magnet).count(), 1);
        assert_eq!(expired.iter().filter(|k| **k == PowerUpKind::Pump).count(), 1);
        assert_eq!(expired.iter().filter(|k| **k == PowerUpKind::Bear).count(), 1);
        assert!(m.hud_items().is_empty());
    }

    #[test]
    fn test_shield_persists_until_broken() {
        let mut m = PowerupManager::new();
        m.activate(PowerUpKind::Shield);
        assert!(tick(&mut m, 60.0).is_empty());
        assert!(m.shield);
        m.break_shield();
        assert!(!m.shield);
    }

    #[test]
    fn test_magnet_pulls_within_radius() {
        let mut m = PowerupManager::new();
        m.activate(PowerUpKind::Magnet);

        let mut coins: EntityPool<Coin> = EntityPool::default();
        coins.acquire().spawn(CoinTier::Btc, 200.0, 100.0, 0.0);
        coins.acquire().spawn(CoinTier::Btc, 900.0, 100.0, 0.0);
        let near_before = coins.active()[0].center();
        let far_before = coins.active()[1].center();

        let player = Vec2::new(100.0, 100.0);
        m.update(0.1, player, &mut coins);

        let near_after = coins.active()[0].center();
        assert!((near_after.x - (near_before.x - MAGNET_PULL * 0.1)).abs() < 0.01);
        assert_eq!(coins.active()[1].center(), far_before);
    }

    #[test]
    fn test_magnet_radius_tier() {
        let mut m = PowerupManager::new();
        m.set_tier_bonuses(2.0, 0.0);
        assert_eq!(m.magnet_radius(), MAGNET_RADIUS * 2.0);
        m.reset();
        assert_eq!(m.magnet_radius(), MAGNET_RADIUS);
    }

    #[test]
    fn test_hud_items() {
        let mut m = PowerupManager::new();
        m.activate(PowerUpKind::Shield);
        m.activate(PowerUpKind::Pump);
        let items = m.hud_items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].fraction, None);
        assert_eq!(items[1].label, "x3 6.0s");
        assert_eq!(items[1].fraction, Some(1.0));
    }
}
