//! World entities: obstacles, coins, power-up pickups, particles
//!
//! Each category is one struct with a `kind` enum so draw and collision code
//! can match exhaustively. All of them are pooled.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Rect;
use super::pool::Poolable;
use crate::consts::*;

/// How an obstacle sits in the world
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Placement {
    /// Standing on the ground line
    Ground,
    /// Floating with its bottom edge this far above the ground line
    Aerial { float_above: f32 },
}

/// Obstacle catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ObstacleKind {
    #[default]
    GreenCandle,
    RedCandle,
    TallCandle,
    /// Low bar: duck under it
    DuckBar,
    /// High bar: clears a standing runner, catches careless jumps
    FlyingBar,
    /// Short, wide ground hazard
    SpikeCluster,
    /// Wide low bar
    CrashBar,
}

impl ObstacleKind {
    pub const ALL: [ObstacleKind; 7] = [
        ObstacleKind::GreenCandle,
        ObstacleKind::RedCandle,
        ObstacleKind::TallCandle,
        ObstacleKind::DuckBar,
        ObstacleKind::FlyingBar,
        ObstacleKind::SpikeCluster,
        ObstacleKind::CrashBar,
    ];

    pub fn size(self) -> Vec2 {
        match self {
            ObstacleKind::GreenCandle => Vec2::new(18.0, 70.0),
            ObstacleKind::RedCandle => Vec2::new(18.0, 55.0),
            ObstacleKind::TallCandle => Vec2::new(18.0, 100.0),
            ObstacleKind::DuckBar => Vec2::new(75.0, 18.0),
            ObstacleKind::FlyingBar => Vec2::new(65.0, 18.0),
            ObstacleKind::SpikeCluster => Vec2::new(42.0, 26.0),
            ObstacleKind::CrashBar => Vec2::new(130.0, 22.0),
        }
    }

    pub fn placement(self) -> Placement {
        match self {
            ObstacleKind::DuckBar => Placement::Aerial { float_above: 28.0 },
            ObstacleKind::FlyingBar => Placement::Aerial { float_above: 80.0 },
            ObstacleKind::CrashBar => Placement::Aerial { float_above: 30.0 },
            _ => Placement::Ground,
        }
    }

    pub fn is_ground(self) -> bool {
        self.placement() == Placement::Ground
    }

    /// World speed required before this kind may appear
    pub fn min_speed(self) -> f32 {
        match self {
            ObstacleKind::DuckBar => 380.0,
            ObstacleKind::CrashBar => 520.0,
            _ => 0.0,
        }
    }

    /// Top edge y when spawned
    pub fn spawn_y(self) -> f32 {
        let h = self.size().y;
        match self.placement() {
            Placement::Ground => GROUND_Y - h,
            Placement::Aerial { float_above } => GROUND_Y - float_above - h,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Obstacle {
    pub kind: ObstacleKind,
    /// Top-left corner
    pub pos: Vec2,
    pub size: Vec2,
    pub active: bool,
}

impl Obstacle {
    /// Place a fresh obstacle of `kind` with its left edge at `x`
    pub fn spawn(&mut self, kind: ObstacleKind, x: f32) {
        self.kind = kind;
        self.size = kind.size();
        self.pos = Vec2::new(x, kind.spawn_y());
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.pos, self.size)
    }

    /// Forgiving collision box
    pub fn hitbox(&self) -> Rect {
        self.bounds().inset(OBSTACLE_HITBOX_INSET)
    }
}

impl Poolable for Obstacle {
    fn reset(&mut self) {
        *self = Self {
            active: self.active,
            ..Self::default()
        };
    }
    fn is_active(&self) -> bool {
        self.active
    }
    fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

/// Coin tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CoinTier {
    Btc,
    Eth,
    #[default]
    Sol,
}

impl CoinTier {
    pub const ALL: [CoinTier; 3] = [CoinTier::Btc, CoinTier::Eth, CoinTier::Sol];

    /// Base points before multipliers
    pub fn value(self) -> u32 {
        match self {
            CoinTier::Btc => 100,
            CoinTier::Eth => 50,
            CoinTier::Sol => 25,
        }
    }

    /// Relative draw weight (cheap coins are common)
    pub fn weight(self) -> f32 {
        match self {
            CoinTier::Btc => 20.0,
            CoinTier::Eth => 35.0,
            CoinTier::Sol => 45.0,
        }
    }

    /// Square side in pixels
    pub fn size(self) -> f32 {
        match self {
            CoinTier::Btc => 24.0,
            CoinTier::Eth => 22.0,
            CoinTier::Sol => 20.0,
        }
    }

    pub fn color(self) -> [f32; 4] {
        match self {
            CoinTier::Btc => [0.97, 0.58, 0.10, 1.0],
            CoinTier::Eth => [0.38, 0.49, 0.92, 1.0],
            CoinTier::Sol => [0.60, 0.27, 1.0, 1.0],
        }
    }

    /// 0xRRGGBB for text labels
    pub fn hex(self) -> u32 {
        match self {
            CoinTier::Btc => 0xF7931A,
            CoinTier::Eth => 0x627EEA,
            CoinTier::Sol => 0x9945FF,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            CoinTier::Btc => "BTC",
            CoinTier::Eth => "ETH",
            CoinTier::Sol => "SOL",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Coin {
    pub tier: CoinTier,
    /// Top-left corner used for collision (the bob is drawn, not simulated)
    pub pos: Vec2,
    pub size: Vec2,
    /// Bob phase in seconds
    pub phase: f32,
    pub active: bool,
}

impl Coin {
    /// Place a coin centered at (`x`, `center_y`)
    pub fn spawn(&mut self, tier: CoinTier, x: f32, center_y: f32, phase: f32) {
        let side = tier.size();
        self.tier = tier;
        self.size = Vec2::splat(side);
        self.pos = Vec2::new(x, center_y - side / 2.0);
        self.phase = phase;
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    /// Coins collide with their full box
    pub fn hitbox(&self) -> Rect {
        Rect::new(self.pos, self.size)
    }

    /// Vertical draw offset for the idle bob
    pub fn bob_offset(&self) -> f32 {
        (self.phase * COIN_BOB_RATE).sin() * COIN_BOB_AMPLITUDE
    }
}

impl Poolable for Coin {
    fn reset(&mut self) {
        *self = Self {
            active: self.active,
            ..Self::default()
        };
    }
    fn is_active(&self) -> bool {
        self.active
    }
    fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

/// Power-up catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PowerUpKind {
    #[default]
    Shield,
    Magnet,
    SlowTime,
    Pump,
    Bull,
    Bear,
    /// Instant bonus, not a timed effect
    Airdrop,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 7] = [
        PowerUpKind::Shield,
        PowerUpKind::Magnet,
        PowerUpKind::SlowTime,
        PowerUpKind::Pump,
        PowerUpKind::Bull,
        PowerUpKind::Bear,
        PowerUpKind::Airdrop,
    ];

    pub fn weight(self) -> f32 {
        match self {
            PowerUpKind::Shield => 30.0,
            PowerUpKind::Magnet => 25.0,
            PowerUpKind::SlowTime => 20.0,
            PowerUpKind::Bull => 15.0,
            PowerUpKind::Pump => 10.0,
            PowerUpKind::Bear => 8.0,
            PowerUpKind::Airdrop => 4.0,
        }
    }

    /// Rank for the run summary, lower is better
    pub fn priority(self) -> u8 {
        match self {
            PowerUpKind::Airdrop => 0,
            PowerUpKind::Bull => 1,
            PowerUpKind::Pump => 2,
            PowerUpKind::Bear => 3,
            PowerUpKind::Shield => 4,
            PowerUpKind::Magnet => 5,
            PowerUpKind::SlowTime => 6,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PowerUpKind::Shield => "SHIELD",
            PowerUpKind::Magnet => "MAGNET",
            PowerUpKind::SlowTime => "SLOW TIME",
            PowerUpKind::Pump => "PUMP",
            PowerUpKind::Bull => "BULL",
            PowerUpKind::Bear => "BEAR",
            PowerUpKind::Airdrop => "AIRDROP",
        }
    }

    pub fn color(self) -> [f32; 4] {
        match self {
            PowerUpKind::Shield => [0.55, 0.60, 0.45, 1.0],
            PowerUpKind::Magnet => [0.90, 0.25, 0.25, 1.0],
            PowerUpKind::SlowTime => [0.30, 0.70, 0.95, 1.0],
            PowerUpKind::Pump => [0.35, 0.90, 0.45, 1.0],
            PowerUpKind::Bull => [0.97, 0.58, 0.10, 1.0],
            PowerUpKind::Bear => [0.94, 0.27, 0.27, 1.0],
            PowerUpKind::Airdrop => [1.0, 0.84, 0.0, 1.0],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PowerUpPickup {
    pub kind: PowerUpKind,
    pub center: Vec2,
    pub radius: f32,
    pub active: bool,
}

impl PowerUpPickup {
    pub fn spawn(&mut self, kind: PowerUpKind, center: Vec2) {
        self.kind = kind;
        self.center = center;
        self.radius = POWERUP_RADIUS;
    }

    pub fn hitbox(&self) -> Rect {
        Rect::around_circle(self.center, self.radius)
    }
}

impl Poolable for PowerUpPickup {
    fn reset(&mut self) {
        *self = Self {
            active: self.active,
            ..Self::default()
        };
    }
    fn is_active(&self) -> bool {
        self.active
    }
    fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

/// Cosmetic particle, never collides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub life: f32,
    pub max_life: f32,
    pub size: f32,
    pub color: [f32; 4],
    pub active: bool,
}

/// Downward pull on particles (px/s²)
pub const PARTICLE_GRAVITY: f32 = 300.0;

impl Particle {
    /// Integrate one step; returns false once expired
    pub fn update(&mut self, dt: f32) -> bool {
        self.vel.y += PARTICLE_GRAVITY * dt;
        self.pos += self.vel * dt;
        self.life -= dt;
        self.life > 0.0
    }

    /// Fade factor (1 = fresh, 0 = expired)
    pub fn alpha(&self) -> f32 {
        if self.max_life <= 0.0 {
            0.0
        } else {
            (self.life / self.max_life).clamp(0.0, 1.0)
        }
    }
}

impl Poolable for Particle {
    fn reset(&mut self) {
        *self = Self {
            active: self.active,
            ..Self::default()
        };
    }
    fn is_active(&self) -> bool {
        self.active
    }
    fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_obstacle_placement() {
        let mut o = Obstacle::default();
        o.spawn(ObstacleKind::TallCandle, 500.0);
        assert_eq!(o.pos.y + o.size.y, GROUND_Y);

        o.spawn(ObstacleKind::DuckBar, 500.0);
        assert_eq!(o.pos.y + o.size.y, GROUND_Y - 28.0);
        assert!(!ObstacleKind::DuckBar.is_ground());
    }

    #[test]
    fn test_coin_tiers() {
        let total: f32 = CoinTier::ALL.iter().map(|t| t.weight()).sum();
        assert_eq!(total, 100.0);
        assert_eq!(CoinTier::Btc.value(), 100);
        assert_eq!(CoinTier::Eth.value(), 50);
    }

    #[test]
    fn test_coin_bob_does_not_move_hitbox() {
        let mut c = Coin::default();
        c.spawn(CoinTier::Btc, 100.0, 200.0, 0.0);
        let before = c.hitbox();
        c.phase = 0.65;
        assert!(c.bob_offset().abs() > 0.0);
        assert_eq!(c.hitbox(), before);
    }

    #[test]
    fn test_powerup_priority_order() {
        let mut kinds = PowerUpKind::ALL;
        kinds.sort_by_key(|k| k.priority());
        assert_eq!(kinds[0], PowerUpKind::Airdrop);
        assert_eq!(kinds[6], PowerUpKind::SlowTime);
    }

    #[test]
    fn test_particle_expires() {
        let mut p = Particle {
            life: 0.1,
            max_life: 0.1,
            ..Particle::default()
        };
        assert!(p.update(0.05));
        assert!((p.alpha() - 0.5).abs() < 1e-4);
        assert!(!p.update(0.06));
    }

    #[test]
    fn test_reset_keeps_pool_flag() {
        let mut o = Obstacle::default();
        o.active = true;
        o.spawn(ObstacleKind::CrashBar, 10.0);
        o.reset();
        assert!(o.active);
        assert_eq!(o.kind, ObstacleKind::GreenCandle);
    }
}
