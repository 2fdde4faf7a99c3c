//! Events emitted by the engine
//!
//! The engine owns no audio or DOM state. Each frame it hands back a list of
//! events and the shell turns them into sound, modals and logs.

use super::entities::PowerUpKind;
use super::state::GamePhase;

/// Named sound cues
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Jump,
    DoubleJump,
    Coin,
    /// Streak milestone reached
    Streak,
    Powerup,
    /// Airdrop pickup
    PowerupRare,
    ShieldBreak,
    Death,
    GameOver,
    MenuSelect,
}

/// Background music control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MusicCommand {
    Start,
    Stop,
    Pause,
    Resume,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Cue(Cue),
    Music(MusicCommand),
    PhaseChanged { from: GamePhase, to: GamePhase },
    BiomeChanged { index: usize, name: &'static str },
    EffectExpired(PowerUpKind),
    ShieldBroken,
    /// Run ended outside embed mode: ask the player for a name
    NamePrompt { score: u64 },
    /// Score saved locally and queued for the global board
    RunFinalized { name: String, score: u64 },
}
