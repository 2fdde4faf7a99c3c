//! Simulation module
//!
//! All gameplay logic lives here. Nothing in this module touches the DOM,
//! the GPU or the network:
//! - Variable timestep, clamped per frame
//! - Seeded RNG only (spawning)
//! - Collaborators borrowed per call, never stored
//! - Side effects reported as [`GameEvent`]s

pub mod biome;
pub mod collision;
pub mod engine;
pub mod entities;
pub mod event;
pub mod player;
pub mod pool;
pub mod popup;
pub mod powerups;
pub mod spawn;
pub mod state;
pub mod tick;

pub use biome::{BIOMES, Biome, BiomeFx, biome_for_score, biome_index};
pub use collision::Rect;
pub use engine::{ANONYMOUS, Collaborators, EngineConfig, GameEngine};
pub use entities::{Coin, CoinTier, Obstacle, ObstacleKind, Particle, PowerUpKind, PowerUpPickup};
pub use event::{Cue, GameEvent, MusicCommand};
pub use player::{JumpKind, Player};
pub use pool::{EntityPool, Poolable};
pub use popup::{FloatText, Popup, Popups};
pub use powerups::{HudItem, PowerupManager};
pub use spawn::{SpawnDirector, WavePhase};
pub use state::{CoinTally, GameOverData, GamePhase, HudSnapshot, Run};
pub use tick::{FrameInput, difficulty_speed};
