//! Punch Run - a crypto-themed endless runner
//!
//! Core modules:
//! - `sim`: Gameplay simulation (player physics, spawning, power-ups, scoring)
//! - `renderer`: WebGPU rendering pipeline
//! - `highscores`: Local leaderboard and best score
//! - `leaderboard`: Remote leaderboard client cache and service logic
//! - `market`: Price-driven difficulty modifier
//! - `wallet`: Token-holding tiers and their run perks
//! - `settings`: Persisted user preferences

#[cfg(target_arch = "wasm32")]
pub mod audio;
pub mod highscores;
pub mod leaderboard;
pub mod market;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod wallet;

pub use highscores::{HighScores, ScoreStore};
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Logical world size (everything simulates in these pixels)
    pub const WORLD_W: f32 = 800.0;
    pub const WORLD_H: f32 = 300.0;
    /// Ground line: the y where the player's feet rest
    pub const GROUND_Y: f32 = WORLD_H - 50.0;
    /// Largest frame delta fed to the simulation (tab-switch stalls)
    pub const MAX_FRAME_DT: f32 = 0.05;

    /// Player geometry
    pub const PLAYER_X: f32 = 80.0;
    pub const PLAYER_W: f32 = 56.0;
    pub const PLAYER_H: f32 = 48.0;
    pub const PLAYER_DUCK_H: f32 = 36.0;
    pub const PLAYER_HITBOX_INSET: f32 = 8.0;

    /// Player physics (pixels, seconds)
    pub const GRAVITY: f32 = 1500.0;
    pub const JUMP_VELOCITY: f32 = -640.0;
    /// Double jump impulse relative to the ground jump
    pub const DOUBLE_JUMP_FACTOR: f32 = 0.82;
    /// Mid-air jumps allowed before landing
    pub const AIR_JUMPS: u8 = 1;
    pub const RUN_FRAME_TIME: f32 = 0.10;
    pub const RUN_FRAMES: u8 = 5;
    pub const DEATH_FLASH_TIME: f32 = 0.35;

    /// World speed curve (px/s)
    pub const BASE_SPEED: f32 = 310.0;
    pub const MAX_SPEED: f32 = 850.0;
    pub const EARLY_RAMP: f32 = 7.0;
    pub const LATE_RAMP: f32 = 4.5;
    pub const EARLY_RAMP_SECS: f32 = 10.0;

    /// Scoring
    pub const WEEKEND_MULTIPLIER: f64 = 2.0;
    pub const COMBO_MULTIPLIER: f64 = 2.0;
    pub const COMBO_EVERY: u32 = 5;
    pub const COMBO_DURATION: f32 = 3.0;
    /// Combo boost granted by a tier perk at run start
    pub const COMBO_START_DURATION: f32 = 5.0;
    pub const AIRDROP_BONUS: f64 = 500.0;
    /// Score span covered by one biome
    pub const BIOME_SCORE_SPAN: f64 = 1000.0;

    /// Spawning
    pub const OBSTACLE_SPAWN_X: f32 = WORLD_W + 60.0;
    pub const PICKUP_SPAWN_X: f32 = WORLD_W + 40.0;
    pub const OBSTACLE_HITBOX_INSET: f32 = 4.0;
    pub const FIRST_OBSTACLE_DISTANCE: f32 = 550.0;
    pub const FIRST_COIN_DISTANCE: f32 = 500.0;
    pub const POWERUP_WARMUP_DISTANCE: f32 = 5000.0;
    /// Distance between single coins during bull-market rain
    pub const BULL_COIN_GAP: f32 = 85.0;
    pub const POWERUP_RADIUS: f32 = 12.0;
    pub const COIN_BOB_AMPLITUDE: f32 = 5.0;
    pub const COIN_BOB_RATE: f32 = 2.4;
    pub const COIN_BURST_PARTICLES: usize = 10;

    /// Effect tuning
    pub const MAGNET_DURATION: f32 = 5.0;
    pub const MAGNET_RADIUS: f32 = 220.0;
    pub const MAGNET_PULL: f32 = 420.0;
    pub const SLOW_DURATION: f32 = 3.0;
    pub const SLOW_MULTIPLIER: f32 = 0.65;
    /// Ramp back to full speed once slow-time ends
    pub const SLOW_RETURN: f32 = 1.2;
    pub const PUMP_DURATION: f32 = 6.0;
    pub const PUMP_MULTIPLIER: f64 = 3.0;
    pub const BULL_DURATION: f32 = 5.0;
    pub const BEAR_DURATION: f32 = 5.0;
    pub const BEAR_SPEED_MULTIPLIER: f32 = 0.8;
    pub const BEAR_SCORE_MULTIPLIER: f64 = 0.5;

    /// Presentation timers
    pub const POPUP_TIME: f32 = 1.8;
    pub const FLOAT_TIME: f32 = 1.2;
    pub const FLOAT_DRIFT: f32 = 45.0;
    pub const MAX_FLOATS: usize = 3;
    pub const GAME_OVER_JINGLE_DELAY: f32 = 0.35;
}

/// Milliseconds since the Unix epoch
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    js_sys::Date::now()
}

/// Milliseconds since the Unix epoch
#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

/// Day of week (0 = Sunday) for a Unix timestamp, UTC
#[inline]
pub fn weekday(unix_ms: f64) -> u32 {
    let days = (unix_ms / 86_400_000.0).floor() as i64;
    // 1970-01-01 was a Thursday
    (days + 4).rem_euclid(7) as u32
}

/// Saturday or Sunday
#[inline]
pub fn is_weekend(unix_ms: f64) -> bool {
    matches!(weekday(unix_ms), 0 | 6)
}

/// Format a Unix timestamp as an ISO-8601 UTC string (millisecond precision)
pub fn iso_date(unix_ms: f64) -> String {
    let total_ms = unix_ms.max(0.0) as i64;
    let days = total_ms.div_euclid(86_400_000);
    let ms_of_day = total_ms.rem_euclid(86_400_000);

    // Civil-from-days (proleptic Gregorian)
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);

    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
        year,
        month,
        day,
        ms_of_day / 3_600_000,
        ms_of_day / 60_000 % 60,
        ms_of_day / 1000 % 60,
        ms_of_day % 1000
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weekday() {
        // 1970-01-01 Thursday
        assert_eq!(weekday(0.0), 4);
        // 2024-06-01 Saturday
        assert!(is_weekend(1_717_243_200_000.0));
        // 2024-06-03 Monday
        assert!(!is_weekend(1_717_416_000_000.0));
    }

    #[test]
    fn test_iso_date() {
        assert_eq!(iso_date(0.0), "1970-01-01T00:00:00.000Z");
        assert_eq!(iso_date(1_717_243_200_123.0), "2024-06-01T12:00:00.123Z");
        assert_eq!(iso_date(951_782_400_000.0), "2000-02-29T00:00:00.000Z");
    }
}
