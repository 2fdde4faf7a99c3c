//! Spawn director: procedural obstacles, coin patterns, power-ups, particles
//!
//! Pacing is driven by scrolled distance, not wall time. Three thresholds
//! (obstacle, coin, power-up) are compared against a distance accumulator;
//! crossing one spawns and rolls the next gap. Obstacle spacing is further
//! shaped by a wave phase that cycles on its own timer.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use std::f32::consts::{PI, TAU};

use super::entities::{Coin, CoinTier, Obstacle, ObstacleKind, Particle, PowerUpKind, PowerUpPickup};
use super::pool::EntityPool;
use crate::consts::*;

/// Obstacle spacing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WavePhase {
    Normal,
    /// Tight spacing
    Burst,
    /// Loose spacing
    Calm,
}

/// Coin offsets (dx, dy) relative to the spawn x and the ground line.
/// dy is the coin center.
const COIN_PATTERNS: &[&[(f32, f32)]] = &[
    // single low
    &[(0.0, -40.0)],
    // single high
    &[(0.0, -70.0)],
    // pair on the ground lane
    &[(0.0, -40.0), (38.0, -40.0)],
    // ground + float
    &[(0.0, -40.0), (30.0, -74.0)],
    // mid-air trail
    &[(0.0, -70.0), (34.0, -70.0), (68.0, -70.0), (102.0, -70.0)],
    // staircase up
    &[(0.0, -40.0), (30.0, -66.0), (60.0, -92.0)],
    // staircase down
    &[(0.0, -92.0), (30.0, -66.0), (60.0, -40.0)],
    // spaced pair
    &[(0.0, -60.0), (52.0, -60.0)],
];

/// Coins dropped by an airdrop, arcing ahead of the player
const AIRDROP_COINS: usize = 6;

/// Weighted draw. If float rounding leaves weight unspent the last item wins.
pub fn weighted_pick<T: Copy + Default>(
    rng: &mut impl Rng,
    items: &[T],
    weight: impl Fn(&T) -> f32,
) -> T {
    let roll: f32 = rng.random();
    pick_with_roll(items, weight, roll)
}

/// `roll` in [0, 1) scaled by the total weight
pub(crate) fn pick_with_roll<T: Copy + Default>(
    items: &[T],
    weight: impl Fn(&T) -> f32,
    roll: f32,
) -> T {
    let total: f32 = items.iter().map(&weight).sum();
    let mut r = roll * total;
    for item in items {
        r -= weight(item);
        if r <= 0.0 {
            return *item;
        }
    }
    items.last().copied().unwrap_or_default()
}

pub struct SpawnDirector {
    pub obstacles: EntityPool<Obstacle>,
    pub coins: EntityPool<Coin>,
    pub powerups: EntityPool<PowerUpPickup>,
    pub particles: EntityPool<Particle>,
    rng: Pcg32,
    /// Total scrolled distance this run
    distance: f32,
    next_obstacle: f32,
    next_coin: f32,
    next_powerup: f32,
    wave: WavePhase,
    wave_timer: f32,
    last_obstacle: Option<ObstacleKind>,
    bull_coin_cooldown: f32,
    max_particles: usize,
}

impl SpawnDirector {
    pub fn new(seed: u64, max_particles: usize) -> Self {
        let mut director = Self {
            obstacles: EntityPool::with_capacity(16),
            coins: EntityPool::with_capacity(32),
            powerups: EntityPool::with_capacity(4),
            particles: EntityPool::with_capacity(max_particles.min(256)),
            rng: Pcg32::seed_from_u64(seed),
            distance: 0.0,
            next_obstacle: 0.0,
            next_coin: 0.0,
            next_powerup: 0.0,
            wave: WavePhase::Normal,
            wave_timer: 0.0,
            last_obstacle: None,
            bull_coin_cooldown: 0.0,
            max_particles,
        };
        director.reset();
        director
    }

    /// Return every entity to its pool and rewind pacing
    pub fn reset(&mut self) {
        self.obstacles.release_all();
        self.coins.release_all();
        self.powerups.release_all();
        self.particles.release_all();
        self.distance = 0.0;
        self.next_obstacle = FIRST_OBSTACLE_DISTANCE;
        self.next_coin = FIRST_COIN_DISTANCE;
        self.next_powerup = self.powerup_delay();
        self.wave = WavePhase::Normal;
        self.wave_timer = 0.0;
        self.last_obstacle = None;
        self.bull_coin_cooldown = 0.0;
    }

    pub fn set_max_particles(&mut self, max: usize) {
        self.max_particles = max;
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Advance one frame at world `speed`. While `bull_active`, normal coin
    /// patterns are replaced by a dense single-coin stream.
    pub fn update(&mut self, dt: f32, speed: f32, bull_active: bool) {
        let dx = speed * dt;
        self.distance += dx;
        self.tick_wave(dt);

        for o in self.obstacles.iter_mut() {
            o.pos.x -= dx;
        }
        for c in self.coins.iter_mut() {
            c.pos.x -= dx;
            c.phase += dt;
        }
        for p in self.powerups.iter_mut() {
            p.center.x -= dx;
        }
        // Recycle only once the right edge has left the screen
        self.obstacles.release_where(|o| o.pos.x + o.size.x < 0.0);
        self.coins.release_where(|c| c.pos.x + c.size.x < 0.0);
        self.powerups.release_where(|p| p.center.x + p.radius < 0.0);

        if self.distance >= self.next_obstacle {
            self.spawn_obstacle(speed);
            self.next_obstacle = self.distance + self.obstacle_gap(speed);
        }

        if bull_active {
            self.bull_coin_cooldown -= dx;
            if self.bull_coin_cooldown <= 0.0 {
                self.spawn_bull_coin();
                self.bull_coin_cooldown = BULL_COIN_GAP;
            }
        } else if self.distance >= self.next_coin {
            self.spawn_coin_pattern();
            self.next_coin = self.distance + self.coin_gap(speed);
        }

        if self.distance >= self.next_powerup {
            self.spawn_powerup();
            self.next_powerup = self.powerup_delay();
        }

        self.update_particles(dt);
    }

    fn update_particles(&mut self, dt: f32) {
        for p in self.particles.iter_mut() {
            p.update(dt);
        }
        self.particles.release_where(|p| p.life <= 0.0);
    }

    fn tick_wave(&mut self, dt: f32) {
        self.wave_timer -= dt;
        if self.wave_timer > 0.0 {
            return;
        }
        let r: f32 = self.rng.random();
        let (phase, duration): (WavePhase, f32) = if r < 0.25 {
            (WavePhase::Burst, self.rng.random_range(3.0..6.0))
        } else if r < 0.45 {
            (WavePhase::Calm, self.rng.random_range(2.0..5.0))
        } else {
            (WavePhase::Normal, self.rng.random_range(4.0..10.0))
        };
        if phase != self.wave {
            log::debug!("Wave phase {:?} -> {:?} for {:.1}s", self.wave, phase, duration);
        }
        self.wave = phase;
        self.wave_timer = duration;
    }

    /// Gap to the next obstacle: shrinks with speed, stretched by the wave phase
    fn obstacle_gap(&mut self, speed: f32) -> f32 {
        let base = (2.5 - (speed - BASE_SPEED) / 500.0 * 1.3).max(1.0);
        let mult = match self.wave {
            WavePhase::Burst => self.rng.random_range(0.55..0.8),
            WavePhase::Calm => self.rng.random_range(2.0..4.0),
            WavePhase::Normal => self.rng.random_range(0.85..1.8),
        };
        speed * base * mult
    }

    fn coin_gap(&mut self, speed: f32) -> f32 {
        speed * self.rng.random_range(2.5..4.5)
    }

    fn powerup_delay(&mut self) -> f32 {
        self.distance + POWERUP_WARMUP_DISTANCE + self.rng.random_range(3000.0..6000.0)
    }

    /// Kinds allowed next, written into `buf`: speed-gated kinds stay out
    /// until the runner is fast enough, and the same bar never comes twice
    /// in a row. Ground kinds always pass, so the slice is never empty.
    fn obstacle_options<'a>(
        &self,
        speed: f32,
        buf: &'a mut [ObstacleKind; ObstacleKind::ALL.len()],
    ) -> &'a [ObstacleKind] {
        let mut n = 0;
        for kind in ObstacleKind::ALL {
            if speed >= kind.min_speed() && (kind.is_ground() || self.last_obstacle != Some(kind)) {
                buf[n] = kind;
                n += 1;
            }
        }
        &buf[..n]
    }

    fn spawn_obstacle(&mut self, speed: f32) {
        let mut buf = ObstacleKind::ALL;
        let options = self.obstacle_options(speed, &mut buf);
        let kind = options[self.rng.random_range(0..options.len())];
        self.last_obstacle = Some(kind);

        let width = kind.size().x;
        self.obstacles.acquire().spawn(kind, OBSTACLE_SPAWN_X);

        if !kind.is_ground() {
            return;
        }
        if speed > 420.0 && self.rng.random::<f32>() < 0.25 {
            let offset = width + self.rng.random_range(10.0..22.0f32).floor();
            self.obstacles.acquire().spawn(kind, OBSTACLE_SPAWN_X + offset);
        }
        if self.wave == WavePhase::Burst && speed > 550.0 && self.rng.random::<f32>() < 0.18 {
            let offset = width * 2.0 + self.rng.random_range(20.0..40.0f32).floor();
            self.obstacles.acquire().spawn(kind, OBSTACLE_SPAWN_X + offset);
        }
    }

    fn random_tier(&mut self) -> CoinTier {
        weighted_pick(&mut self.rng, &CoinTier::ALL, |t| t.weight())
    }

    fn spawn_coin_pattern(&mut self) {
        let pattern = COIN_PATTERNS[self.rng.random_range(0..COIN_PATTERNS.len())];
        for &(dx, dy) in pattern {
            let tier = self.random_tier();
            let phase = self.rng.random_range(0.0..TAU);
            self.coins
                .acquire()
                .spawn(tier, PICKUP_SPAWN_X + dx, GROUND_Y + dy, phase);
        }
    }

    fn spawn_bull_coin(&mut self) {
        let tier = self.random_tier();
        let lift = self.rng.random_range(36.0..105.0);
        let phase = self.rng.random_range(0.0..TAU);
        self.coins
            .acquire()
            .spawn(tier, PICKUP_SPAWN_X, GROUND_Y - lift, phase);
    }

    fn spawn_powerup(&mut self) {
        let kind = weighted_pick(&mut self.rng, &PowerUpKind::ALL, |k| k.weight());
        let lift = self.rng.random_range(80.0..110.0);
        self.powerups
            .acquire()
            .spawn(kind, Vec2::new(PICKUP_SPAWN_X, GROUND_Y - lift));
        log::debug!("Spawned power-up {:?}", kind);
    }

    /// Airdrop reward: an arc of coins just ahead of the player
    pub fn spawn_airdrop_burst(&mut self, player_x: f32) {
        for i in 0..AIRDROP_COINS {
            let t = i as f32 / (AIRDROP_COINS - 1) as f32;
            let x = player_x + 220.0 + i as f32 * 34.0;
            let y = GROUND_Y - 50.0 - (t * PI).sin() * 45.0;
            let tier = self.random_tier();
            let phase = self.rng.random_range(0.0..TAU);
            self.coins.acquire().spawn(tier, x, y, phase);
        }
    }

    /// Radial burst for a collected coin
    pub fn emit_coin_burst(&mut self, center: Vec2, color: [f32; 4]) {
        for i in 0..COIN_BURST_PARTICLES {
            if self.particles.len() >= self.max_particles {
                break;
            }
            let angle = i as f32 / COIN_BURST_PARTICLES as f32 * TAU
                + self.rng.random_range(-0.3..0.3);
            let speed = self.rng.random_range(60.0..160.0);
            let life = self.rng.random_range(0.4..0.7);
            let size = self.rng.random_range(2.0..4.0);
            let p = self.particles.acquire();
            p.pos = center;
            p.vel = Vec2::new(angle.cos(), angle.sin()) * speed - Vec2::new(0.0, 40.0);
            p.life = life;
            p.max_life = life;
            p.size = size;
            p.color = color;
        }
    }

    /// Return a collected coin to its pool
    pub fn remove_coin(&mut self, index: usize) {
        self.coins.release(index);
    }

    /// Return a collected power-up to its pool
    pub fn remove_powerup(&mut self, index: usize) {
        self.powerups.release(index);
    }

    /// Return an obstacle destroyed by the shield to its pool
    pub fn remove_obstacle(&mut self, index: usize) {
        self.obstacles.release(index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(director: &mut SpawnDirector, seconds: f32, speed: f32, bull: bool) {
        let dt = 1.0 / 60.0;
        let steps = (seconds / dt) as usize;
        for _ in 0..steps {
            director.update(dt, speed, bull);
        }
    }

    #[test]
    fn test_weighted_pick_fallback_to_last() {
        let items = [1u8, 2, 3];
        // A roll past the total exhausts the loop
        assert_eq!(pick_with_roll(&items, |_| 1.0, 1.5), 3);
        assert_eq!(pick_with_roll(&items, |_| 1.0, 0.0), 1);
        assert_eq!(pick_with_roll(&items, |_| 1.0, 0.5), 2);
    }

    #[test]
    fn test_weighted_pick_bias() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut counts = [0u32; 3];
        for _ in 0..10_000 {
            let tier = weighted_pick(&mut rng, &CoinTier::ALL, |t| t.weight());
            counts[CoinTier::ALL.iter().position(|t| *t == tier).unwrap_or(0)] += 1;
        }
        // sol (45) > eth (35) > btc (20)
        assert!(counts[2] > counts[1]);
        assert!(counts[1] > counts[0]);
    }

    #[test]
    fn test_first_spawns_by_distance() {
        let dt = 1.0 / 60.0;
        let mut d = SpawnDirector::new(1, 64);
        run(&mut d, 1.0, 310.0, false);
        assert!(d.distance() < FIRST_COIN_DISTANCE);
        assert!(d.obstacles.is_empty());
        assert!(d.coins.is_empty());

        // Coin threshold (500) comes before the obstacle threshold (550)
        while d.distance() < FIRST_COIN_DISTANCE {
            d.update(dt, 310.0, false);
        }
        assert!(!d.coins.is_empty());
        assert!(d.obstacles.is_empty());

        while d.distance() < FIRST_OBSTACLE_DISTANCE {
            d.update(dt, 310.0, false);
        }
        assert!(!d.obstacles.is_empty());
    }

    #[test]
    fn test_speed_gates_respected() {
        let mut d = SpawnDirector::new(7, 64);
        let mut buf = ObstacleKind::ALL;
        let slow = d.obstacle_options(310.0, &mut buf).to_vec();
        assert!(!slow.contains(&ObstacleKind::DuckBar));
        assert!(!slow.contains(&ObstacleKind::CrashBar));

        let mid = d.obstacle_options(400.0, &mut buf).to_vec();
        assert!(mid.contains(&ObstacleKind::DuckBar));
        assert!(!mid.contains(&ObstacleKind::CrashBar));

        d.last_obstacle = Some(ObstacleKind::CrashBar);
        let fast = d.obstacle_options(700.0, &mut buf).to_vec();
        assert!(!fast.contains(&ObstacleKind::CrashBar));
        assert!(fast.contains(&ObstacleKind::DuckBar));
    }

    #[test]
    fn test_no_aerial_repeat() {
        let mut d = SpawnDirector::new(11, 64);
        let mut last: Option<ObstacleKind> = None;
        for _ in 0..500 {
            d.spawn_obstacle(800.0);
            let kind = d.last_obstacle;
            if let (Some(prev), Some(cur)) = (last, kind) {
                if !cur.is_ground() {
                    assert_ne!(prev, cur);
                }
            }
            last = kind;
            d.obstacles.release_all();
        }
    }

    #[test]
    fn test_recycling_returns_to_pool() {
        let mut d = SpawnDirector::new(5, 64);
        run(&mut d, 20.0, 500.0, false);
        for o in d.obstacles.iter() {
            assert!(o.active);
            assert!(o.pos.x + o.size.x >= 0.0);
        }
        for c in d.coins.iter() {
            assert!(c.active);
            assert!(c.pos.x + c.size.x >= 0.0);
        }
        // Steady state reuses the pre-built pool instead of growing it
        assert_eq!(d.obstacles.len() + d.obstacles.free_len(), 16);
    }

    #[test]
    fn test_wide_obstacle_kept_until_fully_offscreen() {
        let mut d = SpawnDirector::new(5, 64);
        assert_eq!(ObstacleKind::CrashBar.size().x, 130.0);
        d.obstacles.acquire().spawn(ObstacleKind::CrashBar, -100.0);

        // Right edge still on screen at x = 29
        d.update(1.0 / 60.0, 60.0, false);
        assert_eq!(d.obstacles.len(), 1);

        // Right edge now at x = -11
        d.update(1.0, 40.0, false);
        assert!(d
            .obstacles
            .iter()
            .all(|o| o.kind != ObstacleKind::CrashBar));
    }

    #[test]
    fn test_burst_triple_cluster_offset() {
        let mut d = SpawnDirector::new(13, 64);
        let mut clusters = 0;
        for _ in 0..2000 {
            d.wave = WavePhase::Burst;
            d.last_obstacle = None;
            d.spawn_obstacle(600.0);
            let (kind, w) = {
                let lead = &d.obstacles.active()[0];
                (lead.kind, lead.size.x)
            };
            if kind.is_ground() {
                for o in d.obstacles.iter().skip(1) {
                    assert_eq!(o.kind, kind);
                    let offset = o.pos.x - OBSTACLE_SPAWN_X;
                    if offset >= w * 2.0 + 20.0 {
                        assert!(offset < w * 2.0 + 40.0);
                        clusters += 1;
                    } else {
                        // Pair follower
                        assert!(offset >= w + 10.0 && offset < w + 22.0);
                    }
                }
            } else {
                assert_eq!(d.obstacles.len(), 1);
            }
            d.obstacles.release_all();
        }
        assert!(clusters > 0);

        // Outside a burst the third obstacle never appears
        for _ in 0..2000 {
            d.wave = WavePhase::Normal;
            d.spawn_obstacle(600.0);
            assert!(d.obstacles.len() <= 2);
            d.obstacles.release_all();
        }
    }

    #[test]
    fn test_bull_rain_replaces_patterns() {
        let mut d = SpawnDirector::new(9, 64);
        run(&mut d, 2.0, 400.0, true);
        // 800 px scrolled at one coin per 85 px
        assert!(d.coins.len() >= 8, "got {}", d.coins.len());
        for c in d.coins.iter() {
            let center_y = c.center().y;
            assert!(center_y <= GROUND_Y - 36.0 && center_y >= GROUND_Y - 105.0);
        }
    }

    #[test]
    fn test_powerup_first_spawn_window() {
        let mut d = SpawnDirector::new(2, 64);
        assert!(d.next_powerup >= 8000.0 && d.next_powerup < 11000.0);
        run(&mut d, 30.0, 400.0, false);
        // 12000 px scrolled: the first pickup spawned and the next gap was rolled
        assert!(d.next_powerup > 11000.0);
    }

    #[test]
    fn test_coin_burst_respects_cap() {
        let mut d = SpawnDirector::new(4, 15);
        d.emit_coin_burst(Vec2::new(100.0, 100.0), [1.0; 4]);
        d.emit_coin_burst(Vec2::new(100.0, 100.0), [1.0; 4]);
        assert_eq!(d.particles.len(), 15);

        run(&mut d, 1.0, 300.0, false);
        assert!(d.particles.is_empty(), "particles expire");
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut d = SpawnDirector::new(6, 64);
        run(&mut d, 10.0, 500.0, false);
        d.spawn_airdrop_burst(PLAYER_X);
        d.reset();
        assert!(d.obstacles.is_empty());
        assert!(d.coins.is_empty());
        assert!(d.powerups.is_empty());
        assert_eq!(d.distance(), 0.0);
    }

    #[test]
    fn test_airdrop_burst_ahead_of_player() {
        let mut d = SpawnDirector::new(8, 64);
        d.spawn_airdrop_burst(PLAYER_X);
        assert_eq!(d.coins.len(), AIRDROP_COINS);
        assert!(d.coins.iter().all(|c| c.pos.x > PLAYER_X + PLAYER_W));
    }
}
