//! Game engine: owns every subsystem and drives the phase machine
//!
//! ```text
//! MENU --start--> RUNNING <--pause--> PAUSED
//!                    |
//!                 obstacle hit (no shield)
//!                    v
//!                GAME_OVER --name--> RANKING --start--> RUNNING
//! ```
//!
//! Collaborators (market, wallet, score store) are borrowed per call through
//! [`Collaborators`]; the engine never holds on to them.

use super::biome::{BIOMES, biome_for_score, biome_index};
use super::event::{Cue, GameEvent, MusicCommand};
use super::player::Player;
use super::popup::{Popups, colors};
use super::powerups::PowerupManager;
use super::spawn::SpawnDirector;
use super::state::{GameOverData, GamePhase, HudSnapshot, Run};
use crate::consts::*;
use crate::highscores::{ScoreEntry, ScoreStore};
use crate::market::{Market, MarketMode};
use crate::wallet::Wallet;

/// Name used when the player skips the prompt
pub const ANONYMOUS: &str = "Anonymous";

/// Fixed for the lifetime of an engine
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub seed: u64,
    /// Embedded in another page: no name prompt
    pub embed_mode: bool,
    /// Saturday or Sunday at startup; doubles coin value
    pub weekend: bool,
    pub max_particles: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            embed_mode: false,
            weekend: false,
            max_particles: 200,
        }
    }
}

/// Borrowed collaborators for one call
pub struct Collaborators<'a> {
    pub market: &'a dyn Market,
    pub wallet: &'a dyn Wallet,
    pub store: &'a mut dyn ScoreStore,
}

pub struct GameEngine {
    pub config: EngineConfig,
    pub phase: GamePhase,
    pub run: Run,
    pub player: Player,
    pub spawn: SpawnDirector,
    pub powerups: PowerupManager,
    pub popups: Popups,
    /// Seconds since the engine started, frozen while paused
    pub time: f64,
    /// Market mode sampled on the last running frame
    pub market_mode: MarketMode,
    /// Ground stripe scroll, 0..60
    pub ground_offset: f32,
    pub game_over: Option<GameOverData>,
    pub(crate) last_biome: usize,
    pub(crate) pending: Option<ScoreEntry>,
    pub(crate) jingle_timer: Option<f32>,
    pub(crate) events: Vec<GameEvent>,
}

impl GameEngine {
    pub fn new(config: EngineConfig) -> Self {
        log::info!(
            "Engine created (seed {}, weekend {}, embed {})",
            config.seed,
            config.weekend,
            config.embed_mode
        );
        Self {
            config,
            phase: GamePhase::Menu,
            run: Run::new(),
            player: Player::new(),
            spawn: SpawnDirector::new(config.seed, config.max_particles),
            powerups: PowerupManager::new(),
            popups: Popups::default(),
            time: 0.0,
            market_mode: MarketMode::Neutral,
            ground_offset: 0.0,
            game_over: None,
            last_biome: 0,
            pending: None,
            jingle_timer: None,
            events: Vec::new(),
        }
    }

    /// Events raised outside of [`GameEngine::frame`]
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn set_max_particles(&mut self, max: usize) {
        self.config.max_particles = max;
        self.spawn.set_max_particles(max);
    }

    pub(crate) fn set_phase(&mut self, to: GamePhase) {
        let from = self.phase;
        if from == to {
            return;
        }
        log::info!("Phase {:?} -> {:?}", from, to);
        self.phase = to;
        self.events.push(GameEvent::PhaseChanged { from, to });
    }

    /// Reinitialize the run and start playing. Wallet perks are read here
    /// and nowhere else.
    pub fn restart(&mut self, wallet: &dyn Wallet) {
        self.run = Run::new();
        self.player.reset();
        self.spawn.reset();
        self.powerups.reset();
        self.popups.clear();
        self.game_over = None;
        self.pending = None;
        self.jingle_timer = None;
        self.last_biome = 0;
        self.ground_offset = 0.0;

        let perks = wallet.tier();
        self.powerups
            .set_tier_bonuses(perks.magnet_radius_multiplier, perks.bull_bonus_seconds);
        if perks.shield_start {
            self.powerups.activate(super::entities::PowerUpKind::Shield);
        }
        if perks.combo_start {
            self.run.start_combo(COMBO_START_DURATION);
        }

        if let (true, Some(tier)) = (wallet.is_connected(), perks.display_name) {
            log::info!("Applying {} perks", tier);
            if perks.shield_start {
                self.popups
                    .show(format!("SHIELD BONUS - {tier} PERK"), perks.color);
            }
            if perks.combo_start {
                self.popups
                    .show(format!("COMBO START - {tier} PERK"), perks.color);
            }
            if perks.bull_bonus_seconds > 0.0 {
                self.popups.show(
                    format!("+{}s BULL BONUS", perks.bull_bonus_seconds),
                    colors::BULL,
                );
            }
        }

        self.set_phase(GamePhase::Running);
        self.events.push(GameEvent::Music(MusicCommand::Start));
        log::info!("Run started");
    }

    /// RUNNING <-> PAUSED; ignored in any other phase
    pub fn toggle_pause(&mut self) {
        match self.phase {
            GamePhase::Running => {
                self.set_phase(GamePhase::Paused);
                self.events.push(GameEvent::Music(MusicCommand::Pause));
            }
            GamePhase::Paused => {
                self.set_phase(GamePhase::Running);
                self.events.push(GameEvent::Music(MusicCommand::Resume));
            }
            _ => {}
        }
    }

    /// Enter PAUSED from RUNNING. Never resumes, so repeated calls are safe.
    pub fn pause(&mut self) {
        if self.phase == GamePhase::Running {
            self.toggle_pause();
        }
    }

    /// Fatal hit: freeze the run, build the summary and either prompt for a
    /// name or finalize straight away in embed mode
    pub(crate) fn trigger_game_over(&mut self, collab: &mut Collaborators<'_>) {
        self.player.trigger_death_flash();
        self.events.push(GameEvent::Cue(Cue::Death));
        self.events.push(GameEvent::Music(MusicCommand::Stop));
        self.set_phase(GamePhase::GameOver);

        let entry = self.run.to_entry();
        log::info!(
            "Game over: score {} in {}s, {} coins",
            entry.score,
            entry.time,
            entry.coin_count
        );
        self.game_over = Some(GameOverData::from_run(
            &self.run,
            collab.store.best_score(),
            self.biome().name,
        ));
        let score = entry.score;
        self.pending = Some(entry);

        if self.config.embed_mode {
            self.finalize_game_over(ANONYMOUS, collab);
        } else {
            self.events.push(GameEvent::NamePrompt { score });
        }
    }

    /// Save the pending run under a name and move to RANKING. A connected
    /// wallet's short address wins over the typed name. No-op outside
    /// GAME_OVER, so a late modal submit cannot save twice.
    pub fn finalize_game_over(&mut self, name: &str, collab: &mut Collaborators<'_>) {
        if self.phase != GamePhase::GameOver {
            return;
        }
        let Some(mut entry) = self.pending.take() else {
            return;
        };

        let name = if collab.wallet.is_connected() {
            collab.wallet.short_address()
        } else {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                ANONYMOUS.to_string()
            } else {
                trimmed.to_string()
            }
        };
        entry.name = name.clone();
        entry.date = crate::iso_date(crate::now_ms());

        collab.store.save_score(entry.clone());
        collab.store.submit_to_global(&entry);

        if let Some(data) = self.game_over.as_mut() {
            data.best_score = collab.store.best_score();
            data.player_name = Some(name.clone());
            data.leaderboard = collab.store.leaderboard();
        }

        self.set_phase(GamePhase::Ranking);
        self.jingle_timer = Some(GAME_OVER_JINGLE_DELAY);
        self.events.push(GameEvent::RunFinalized {
            name,
            score: entry.score,
        });
    }

    pub fn biome(&self) -> &'static super::biome::Biome {
        biome_for_score(self.run.score)
    }

    /// Announce a biome change once per crossing
    pub(crate) fn check_biome(&mut self) {
        let index = biome_index(self.run.score);
        if index != self.last_biome {
            self.last_biome = index;
            let name = BIOMES[index].name;
            log::info!("Entering biome {}", name);
            self.popups.show(name, colors::GOLD);
            self.events.push(GameEvent::BiomeChanged { index, name });
        }
    }

    pub fn hud(&self, best: u64) -> HudSnapshot {
        HudSnapshot {
            score: self.run.score.max(0.0).floor() as u64,
            best: best.max(self.run.score.max(0.0).floor() as u64),
            time: self.run.survival_time.floor() as u32,
            streak: self.run.streak,
            combo: self.run.combo_active,
            weekend: self.config.weekend,
            biome: self.biome().name,
            phase: self.phase,
        }
    }
}
