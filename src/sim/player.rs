//! The runner: physics and pose state machine
//!
//! Grounded running, airborne (with one mid-air jump) and ducking, which is
//! only reachable from the ground. The x position never changes.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Rect;
use crate::consts::*;

/// Which impulse a jump request produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpKind {
    Ground,
    Air,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Top-left of the drawn sprite box
    pub pos: Vec2,
    pub size: Vec2,
    pub vel_y: f32,
    pub grounded: bool,
    pub ducking: bool,
    /// Mid-air jumps left before landing
    pub air_jumps: u8,
    pub run_frame: u8,
    run_timer: f32,
    /// Cosmetic flash after a fatal hit
    pub death_flash: f32,
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

impl Player {
    pub fn new() -> Self {
        Self {
            pos: Vec2::new(PLAYER_X, GROUND_Y - PLAYER_H),
            size: Vec2::new(PLAYER_W, PLAYER_H),
            vel_y: 0.0,
            grounded: true,
            ducking: false,
            air_jumps: AIR_JUMPS,
            run_frame: 0,
            run_timer: 0.0,
            death_flash: 0.0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Ground jump, or the weaker double jump if the air budget allows
    pub fn jump(&mut self) -> Option<JumpKind> {
        if self.grounded {
            self.unduck();
            self.vel_y = JUMP_VELOCITY;
            self.grounded = false;
            self.air_jumps = AIR_JUMPS;
            Some(JumpKind::Ground)
        } else if self.air_jumps > 0 {
            self.vel_y = JUMP_VELOCITY * DOUBLE_JUMP_FACTOR;
            self.air_jumps -= 1;
            Some(JumpKind::Air)
        } else {
            None
        }
    }

    /// Crouch, feet stay on the ground line. Returns whether it took effect.
    pub fn duck(&mut self) -> bool {
        if !self.grounded || self.ducking {
            return false;
        }
        self.ducking = true;
        self.size.y = PLAYER_DUCK_H;
        self.pos.y = GROUND_Y - PLAYER_DUCK_H;
        true
    }

    /// Stand back up. In the air the landing check handles the feet.
    pub fn unduck(&mut self) {
        if !self.ducking {
            return;
        }
        self.ducking = false;
        self.size.y = PLAYER_H;
        if self.grounded {
            self.pos.y = GROUND_Y - PLAYER_H;
        }
    }

    /// Advance one frame. `duck_held` mirrors the duck control.
    pub fn update(&mut self, dt: f32, duck_held: bool) {
        if duck_held && self.grounded {
            self.duck();
        } else if !duck_held && self.ducking {
            self.unduck();
        }

        if !self.grounded {
            self.vel_y += GRAVITY * dt;
            self.pos.y += self.vel_y * dt;
            let land = GROUND_Y - self.size.y;
            if self.pos.y >= land {
                self.pos.y = land;
                self.vel_y = 0.0;
                self.grounded = true;
                self.air_jumps = AIR_JUMPS;
            }
        }

        if self.grounded {
            self.run_timer += dt;
            if self.run_timer > RUN_FRAME_TIME {
                self.run_timer = 0.0;
                self.run_frame = (self.run_frame + 1) % RUN_FRAMES;
            }
        }

        self.update_flash(dt);
    }

    /// Decay the death flash (also runs after the run has ended)
    pub fn update_flash(&mut self, dt: f32) {
        if self.death_flash > 0.0 {
            self.death_flash = (self.death_flash - dt).max(0.0);
        }
    }

    pub fn trigger_death_flash(&mut self) {
        self.death_flash = DEATH_FLASH_TIME;
    }

    pub fn is_flashing(&self) -> bool {
        self.death_flash > 0.0
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.pos, self.size)
    }

    /// Collision box, inset from the sprite on every side
    pub fn hitbox(&self) -> Rect {
        self.bounds().inset(PLAYER_HITBOX_INSET)
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_until_grounded(p: &mut Player) {
        for _ in 0..600 {
            p.update(1.0 / 60.0, false);
            if p.grounded {
                return;
            }
        }
        panic!("player never landed");
    }

    #[test]
    fn test_jump_from_ground() {
        let mut p = Player::new();
        assert_eq!(p.jump(), Some(JumpKind::Ground));
        assert!(!p.grounded);
        assert_eq!(p.vel_y, JUMP_VELOCITY);
        assert_eq!(p.air_jumps, 1);
    }

    #[test]
    fn test_double_jump_budget() {
        let mut p = Player::new();
        p.jump();
        p.update(0.1, false);

        assert_eq!(p.jump(), Some(JumpKind::Air));
        assert_eq!(p.vel_y, JUMP_VELOCITY * DOUBLE_JUMP_FACTOR);
        assert_eq!(p.air_jumps, 0);

        // Budget exhausted: no velocity change
        p.update(0.05, false);
        let vel = p.vel_y;
        assert_eq!(p.jump(), None);
        assert_eq!(p.vel_y, vel);

        run_until_grounded(&mut p);
        assert_eq!(p.air_jumps, 1);
        assert_eq!(p.pos.y + p.size.y, GROUND_Y);
    }

    #[test]
    fn test_duck_keeps_feet_on_ground() {
        let mut p = Player::new();
        assert!(p.duck());
        assert_eq!(p.size.y, PLAYER_DUCK_H);
        assert_eq!(p.pos.y + p.size.y, GROUND_Y);
        assert!(!p.duck(), "already ducking");

        p.unduck();
        assert_eq!(p.size.y, PLAYER_H);
        assert_eq!(p.pos.y + p.size.y, GROUND_Y);
    }

    #[test]
    fn test_no_duck_in_air() {
        let mut p = Player::new();
        p.jump();
        assert!(!p.duck());
        p.update(0.016, true);
        assert!(!p.ducking);
    }

    #[test]
    fn test_jump_cancels_duck() {
        let mut p = Player::new();
        p.duck();
        p.jump();
        assert!(!p.ducking);
        assert_eq!(p.size.y, PLAYER_H);
    }

    #[test]
    fn test_held_duck_applies_on_landing() {
        let mut p = Player::new();
        p.jump();
        for _ in 0..600 {
            p.update(1.0 / 60.0, true);
            if p.grounded {
                break;
            }
        }
        // Landing frame sets grounded; the next frame ducks
        p.update(1.0 / 60.0, true);
        assert!(p.ducking);
        assert_eq!(p.pos.y + p.size.y, GROUND_Y);
    }

    #[test]
    fn test_hitbox_inset() {
        let p = Player::new();
        let hb = p.hitbox();
        assert_eq!(hb.min.x, PLAYER_X + PLAYER_HITBOX_INSET);
        assert_eq!(hb.size.x, PLAYER_W - 2.0 * PLAYER_HITBOX_INSET);
    }

    #[test]
    fn test_death_flash_decays() {
        let mut p = Player::new();
        p.trigger_death_flash();
        assert!(p.is_flashing());
        p.update_flash(0.2);
        assert!(p.is_flashing());
        p.update_flash(0.2);
        assert!(!p.is_flashing());
    }

    #[test]
    fn test_run_animation_advances_on_ground() {
        let mut p = Player::new();
        for _ in 0..3 {
            p.update(0.11, false);
        }
        assert_eq!(p.run_frame, 3);
    }
}
