//! Run-scoped state and the game-over summary
//!
//! Everything here is reset by a restart. Nothing in this module talks to
//! collaborators; the engine copies values in and out.

use serde::{Deserialize, Serialize};

use super::entities::{CoinTier, PowerUpKind};
use crate::consts::*;
use crate::highscores::ScoreEntry;

/// Current phase of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title screen, waiting for start
    #[default]
    Menu,
    /// Active gameplay
    Running,
    /// Frozen mid-run
    Paused,
    /// Run ended, waiting for a name
    GameOver,
    /// Run saved, summary and leaderboard on screen
    Ranking,
}

/// Per-tier coin count and points earned
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CoinTally {
    counts: [u32; 3],
    values: [f64; 3],
}

impl CoinTally {
    fn slot(tier: CoinTier) -> usize {
        match tier {
            CoinTier::Btc => 0,
            CoinTier::Eth => 1,
            CoinTier::Sol => 2,
        }
    }

    pub fn add(&mut self, tier: CoinTier, points: f64) {
        let i = Self::slot(tier);
        self.counts[i] += 1;
        self.values[i] += points;
    }

    pub fn count(&self, tier: CoinTier) -> u32 {
        self.counts[Self::slot(tier)]
    }

    pub fn value(&self, tier: CoinTier) -> f64 {
        self.values[Self::slot(tier)]
    }
}

/// Score, streak and combo for the current run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Run {
    pub score: f64,
    pub survival_time: f32,
    pub coin_count: u32,
    pub streak: u32,
    pub best_streak: u32,
    pub combo_active: bool,
    pub combo_timer: f32,
    pub coins: CoinTally,
    pub best_powerup: Option<PowerUpKind>,
    /// Base world speed this frame, before power-up scaling
    pub speed: f32,
}

impl Run {
    pub fn new() -> Self {
        Self {
            speed: BASE_SPEED,
            ..Default::default()
        }
    }

    /// Count a collected coin worth `points`. Returns true when the streak
    /// hit a combo multiple and the boost was (re)started.
    pub fn record_coin(&mut self, tier: CoinTier, points: f64) -> bool {
        self.score += points;
        self.coin_count += 1;
        self.streak += 1;
        self.best_streak = self.best_streak.max(self.streak);
        self.coins.add(tier, points);

        if self.streak % COMBO_EVERY == 0 {
            self.start_combo(COMBO_DURATION);
            return true;
        }
        false
    }

    /// Keep the highest-priority power-up seen this run
    pub fn record_powerup(&mut self, kind: PowerUpKind) {
        let better = self
            .best_powerup
            .map(|best| kind.priority() < best.priority())
            .unwrap_or(true);
        if better {
            self.best_powerup = Some(kind);
        }
    }

    pub fn start_combo(&mut self, seconds: f32) {
        self.combo_active = true;
        self.combo_timer = seconds;
    }

    pub fn tick_combo(&mut self, dt: f32) {
        self.combo_timer = (self.combo_timer - dt).max(0.0);
        if self.combo_timer <= 0.0 {
            self.combo_active = false;
        }
    }

    pub fn combo_multiplier(&self) -> f64 {
        if self.combo_active {
            COMBO_MULTIPLIER
        } else {
            1.0
        }
    }

    /// Entry for the stores; the name is filled in at finalize
    pub fn to_entry(&self) -> ScoreEntry {
        ScoreEntry {
            name: String::new(),
            score: self.score.max(0.0).floor() as u64,
            time: self.survival_time.max(0.0).floor() as u32,
            coin_count: self.coin_count,
            streak: self.best_streak,
            date: String::new(),
        }
    }
}

/// Summary shown on the game-over and ranking screens
#[derive(Debug, Clone, PartialEq)]
pub struct GameOverData {
    pub score: f64,
    pub time: f32,
    pub coin_count: u32,
    pub best_streak: u32,
    pub best_score: u64,
    pub coins: CoinTally,
    pub best_powerup: Option<PowerUpKind>,
    pub biome: &'static str,
    pub player_name: Option<String>,
    pub leaderboard: Vec<ScoreEntry>,
}

impl GameOverData {
    pub fn from_run(run: &Run, best_score: u64, biome: &'static str) -> Self {
        Self {
            score: run.score,
            time: run.survival_time,
            coin_count: run.coin_count,
            best_streak: run.best_streak,
            best_score,
            coins: run.coins,
            best_powerup: run.best_powerup,
            biome,
            player_name: None,
            leaderboard: Vec::new(),
        }
    }

    /// Shareable one-paragraph summary
    pub fn share_text(&self, url: &str) -> String {
        let powerup = self
            .best_powerup
            .map(|k| format!("\nBest power-up: {}", k.label()))
            .unwrap_or_default();
        let coins: Vec<String> = CoinTier::ALL
            .iter()
            .map(|&tier| format!("{} x{}", tier.symbol(), self.coins.count(tier)))
            .collect();
        format!(
            "PUNCH RUN: ${} | {}s | streak x{}{}\n{}\n{}",
            self.score.floor() as u64,
            self.time.floor() as u32,
            self.best_streak,
            powerup,
            coins.join("  "),
            url
        )
    }
}

/// Text HUD values for the DOM overlay
#[derive(Debug, Clone, PartialEq)]
pub struct HudSnapshot {
    pub score: u64,
    pub best: u64,
    pub time: u32,
    pub streak: u32,
    pub combo: bool,
    pub weekend: bool,
    pub biome: &'static str,
    pub phase: GamePhase,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combo_every_fifth_coin() {
        let mut run = Run::new();
        for _ in 0..4 {
            assert!(!run.record_coin(CoinTier::Sol, 25.0));
        }
        assert!(run.record_coin(CoinTier::Sol, 25.0));
        assert!(run.combo_active);
        assert_eq!(run.combo_timer, COMBO_DURATION);
    }

    #[test]
    fn test_combo_refreshes_when_active() {
        let mut run = Run::new();
        run.start_combo(0.5);
        for _ in 0..5 {
            run.record_coin(CoinTier::Btc, 100.0);
        }
        assert_eq!(run.combo_timer, COMBO_DURATION);
    }

    #[test]
    fn test_combo_expires() {
        let mut run = Run::new();
        run.start_combo(1.0);
        run.tick_combo(0.6);
        assert!(run.combo_active);
        run.tick_combo(0.6);
        assert!(!run.combo_active);
        assert_eq!(run.combo_multiplier(), 1.0);
    }

    #[test]
    fn test_best_powerup_priority() {
        let mut run = Run::new();
        run.record_powerup(PowerUpKind::Magnet);
        run.record_powerup(PowerUpKind::Pump);
        run.record_powerup(PowerUpKind::Shield);
        assert_eq!(run.best_powerup, Some(PowerUpKind::Pump));
        run.record_powerup(PowerUpKind::Airdrop);
        assert_eq!(run.best_powerup, Some(PowerUpKind::Airdrop));
    }

    #[test]
    fn test_tally_and_entry() {
        let mut run = Run::new();
        run.record_coin(CoinTier::Btc, 100.0);
        run.record_coin(CoinTier::Eth, 50.0);
        run.survival_time = 12.7;
        assert_eq!(run.coins.count(CoinTier::Btc), 1);
        assert_eq!(run.coins.value(CoinTier::Eth), 50.0);
        let entry = run.to_entry();
        assert_eq!(entry.score, 150);
        assert_eq!(entry.time, 12);
        assert_eq!(entry.coin_count, 2);
        assert_eq!(entry.streak, 2);
    }

    #[test]
    fn test_share_text() {
        let mut run = Run::new();
        run.record_coin(CoinTier::Btc, 100.0);
        run.record_powerup(PowerUpKind::Bull);
        let data = GameOverData::from_run(&run, 100, "THE FIELDS");
        let text = data.share_text("https://example.test");
        assert!(text.contains("$100"));
        assert!(text.contains("BTC x1"));
        assert!(text.contains("BULL"));
    }
}
