//! Per-frame simulation step
//!
//! Order within a running frame: speed, score, combo, player, spawner,
//! power-ups, popups, biome, then collisions. The magnet moves coins before
//! collisions test them, and the player is settled before anything is
//! tested against it.

use glam::Vec2;

use super::engine::{Collaborators, GameEngine};
use super::entities::PowerUpKind;
use super::event::{Cue, GameEvent};
use super::player::JumpKind;
use super::popup::{colors, streak_milestone};
use super::powerups::{activation_message, expiry_message};
use super::state::GamePhase;
use crate::consts::*;
use crate::market::MarketMode;

/// Input gathered by the shell since the last frame. Edge flags (`jump`,
/// `pause`, `start`) are cleared by the shell after each frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameInput {
    pub jump: bool,
    /// Level-triggered: duck while held
    pub duck_held: bool,
    pub pause: bool,
    pub start: bool,
}

/// Base world speed after `survival` seconds, market adjusted and capped.
/// Non-decreasing in `survival` for any fixed mode.
pub fn difficulty_speed(survival: f32, mode: MarketMode) -> f32 {
    let t = survival.max(0.0);
    let base = if t < EARLY_RAMP_SECS {
        BASE_SPEED + t * EARLY_RAMP
    } else {
        BASE_SPEED + EARLY_RAMP_SECS * EARLY_RAMP + (t - EARLY_RAMP_SECS) * LATE_RAMP
    };
    (base * mode.speed_multiplier()).min(MAX_SPEED)
}

impl GameEngine {
    /// Advance one frame. `dt` is clamped to `[0, MAX_FRAME_DT]`.
    pub fn frame(
        &mut self,
        dt: f32,
        input: &FrameInput,
        collab: &mut Collaborators<'_>,
    ) -> Vec<GameEvent> {
        let dt = if dt.is_finite() {
            dt.clamp(0.0, MAX_FRAME_DT)
        } else {
            0.0
        };

        self.handle_input(input, collab);

        if self.phase != GamePhase::Paused {
            self.time += dt as f64;
        }

        match self.phase {
            GamePhase::Running => self.update_running(dt, input, collab),
            GamePhase::Paused => {}
            GamePhase::Menu => self.popups.update(dt),
            GamePhase::GameOver | GamePhase::Ranking => {
                self.popups.update(dt);
                self.player.update_flash(dt);
                if let Some(timer) = self.jingle_timer.as_mut() {
                    *timer -= dt;
                    if *timer <= 0.0 {
                        self.jingle_timer = None;
                        self.events.push(GameEvent::Cue(Cue::GameOver));
                    }
                }
            }
        }

        std::mem::take(&mut self.events)
    }

    fn handle_input(&mut self, input: &FrameInput, collab: &mut Collaborators<'_>) {
        match self.phase {
            GamePhase::Menu | GamePhase::Ranking if input.start || input.jump => {
                self.events.push(GameEvent::Cue(Cue::MenuSelect));
                self.restart(collab.wallet);
            }
            GamePhase::Running | GamePhase::Paused if input.pause => self.toggle_pause(),
            GamePhase::Running if input.jump => match self.player.jump() {
                Some(JumpKind::Ground) => self.events.push(GameEvent::Cue(Cue::Jump)),
                Some(JumpKind::Air) => self.events.push(GameEvent::Cue(Cue::DoubleJump)),
                None => {}
            },
            _ => {}
        }
    }

    fn update_running(&mut self, dt: f32, input: &FrameInput, collab: &mut Collaborators<'_>) {
        self.market_mode = collab.market.mode();
        self.run.speed = difficulty_speed(self.run.survival_time, self.market_mode);
        let effective = self.run.speed * self.powerups.speed_multiplier();

        self.run.survival_time += dt;
        self.run.score += dt as f64 * self.powerups.score_multiplier();
        self.run.tick_combo(dt);

        self.player.update(dt, input.duck_held);
        self.spawn.update(dt, effective, self.powerups.bull.active);

        let expired = self
            .powerups
            .update(dt, self.player.center(), &mut self.spawn.coins);
        for kind in expired {
            self.popups.show(expiry_message(kind), colors::NEUTRAL);
            self.events.push(GameEvent::EffectExpired(kind));
        }

        self.popups.update(dt);
        self.check_biome();
        self.ground_offset = (self.ground_offset + effective * dt) % 60.0;

        self.resolve_collisions(collab);
    }

    fn resolve_collisions(&mut self, collab: &mut Collaborators<'_>) {
        let hitbox = self.player.hitbox();

        // Obstacles: the first overlap decides the frame
        if let Some(i) = self
            .spawn
            .obstacles
            .iter()
            .position(|o| o.hitbox().overlaps(&hitbox))
        {
            if self.powerups.shield {
                self.powerups.break_shield();
                self.spawn.remove_obstacle(i);
                self.run.streak = 0;
                self.popups
                    .show(expiry_message(PowerUpKind::Shield), colors::BEAR);
                self.events.push(GameEvent::Cue(Cue::ShieldBreak));
                self.events.push(GameEvent::ShieldBroken);
                log::info!("Shield absorbed a hit");
            } else {
                self.trigger_game_over(collab);
            }
            return;
        }

        // Coins, scored in list order so a combo started by one coin
        // boosts the next
        let hits: Vec<usize> = self
            .spawn
            .coins
            .iter()
            .enumerate()
            .filter(|(_, c)| c.hitbox().overlaps(&hitbox))
            .map(|(i, _)| i)
            .collect();
        for &i in &hits {
            let coin = &self.spawn.coins.active()[i];
            let (tier, center) = (coin.tier, coin.center());
            let weekend = if self.config.weekend {
                WEEKEND_MULTIPLIER
            } else {
                1.0
            };
            let points = tier.value() as f64
                * weekend
                * self.run.combo_multiplier()
                * self.powerups.score_multiplier();

            self.run.record_coin(tier, points);
            self.events.push(GameEvent::Cue(Cue::Coin));
            if let Some((text, color)) = streak_milestone(self.run.streak) {
                self.popups.show(text, color);
                self.events.push(GameEvent::Cue(Cue::Streak));
            }
            self.popups
                .float(format!("+{}", points.round() as i64), center, tier.hex());
            self.spawn.emit_coin_burst(center, tier.color());
        }
        for &i in hits.iter().rev() {
            self.spawn.remove_coin(i);
        }

        // Power-ups
        let hits: Vec<usize> = self
            .spawn
            .powerups
            .iter()
            .enumerate()
            .filter(|(_, p)| p.hitbox().overlaps(&hitbox))
            .map(|(i, _)| i)
            .collect();
        for &i in &hits {
            let kind = self.spawn.powerups.active()[i].kind;
            self.activate_powerup(kind);
        }
        for &i in hits.iter().rev() {
            self.spawn.remove_powerup(i);
        }
    }

    fn activate_powerup(&mut self, kind: PowerUpKind) {
        self.powerups.activate(kind);
        self.run.record_powerup(kind);
        log::info!("Power-up {:?}", kind);

        if kind == PowerUpKind::Airdrop {
            self.events.push(GameEvent::Cue(Cue::PowerupRare));
            self.run.score += AIRDROP_BONUS * self.powerups.score_multiplier();
            let above = self.player.center() - Vec2::new(0.0, self.player.size.y / 2.0 + 10.0);
            self.popups
                .float(activation_message(kind), above, colors::GOLD);
            self.spawn.spawn_airdrop_burst(self.player.pos.x);
        } else {
            self.events.push(GameEvent::Cue(Cue::Powerup));
            self.popups.show(activation_message(kind), kind_color(kind));
        }
    }
}

fn kind_color(kind: PowerUpKind) -> u32 {
    match kind {
        PowerUpKind::Bull => colors::BULL,
        PowerUpKind::Bear => colors::BEAR,
        PowerUpKind::Pump | PowerUpKind::Airdrop => colors::GOLD,
        _ => colors::NEUTRAL,
    }
}
