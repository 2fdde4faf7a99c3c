//! On-screen announcements and floating score labels
//!
//! Both count down with the frame delta. The engine simply stops updating
//! them while paused, which freezes them in place.

use glam::Vec2;
use std::collections::VecDeque;

use crate::consts::*;

#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub text: String,
    /// 0xRRGGBB
    pub color: u32,
    pub timer: f32,
}

impl Popup {
    /// Opacity for a fade-out over the last half second
    pub fn alpha(&self) -> f32 {
        (self.timer / 0.5).clamp(0.0, 1.0)
    }
}

/// "+100" style label drifting up from a pickup
#[derive(Debug, Clone, PartialEq)]
pub struct FloatText {
    pub text: String,
    pub color: u32,
    pub pos: Vec2,
    pub timer: f32,
}

#[derive(Debug, Clone, Default)]
pub struct Popups {
    pub popups: Vec<Popup>,
    pub floats: VecDeque<FloatText>,
}

/// Popup colors
pub mod colors {
    pub const NEUTRAL: u32 = 0x535353;
    pub const GOLD: u32 = 0xFFD700;
    pub const BULL: u32 = 0xF7931A;
    pub const BEAR: u32 = 0xEF4444;
}

/// Message for a streak milestone, if `streak` is one
pub fn streak_milestone(streak: u32) -> Option<(&'static str, u32)> {
    match streak {
        5 => Some(("HOLDING THE LINE!", 0x556B2F)),
        10 => Some(("TRENCH WARRIOR!", 0x8B4513)),
        15 => Some(("DEGEN SOLDIER!", 0x2D4A1E)),
        20 => Some(("BATTLE HARDENED!", 0x1A1A1A)),
        _ => None,
    }
}

impl Popups {
    pub fn show(&mut self, text: impl Into<String>, color: u32) {
        self.popups.push(Popup {
            text: text.into(),
            color,
            timer: POPUP_TIME,
        });
    }

    /// Add a floating label, dropping the oldest beyond the cap
    pub fn float(&mut self, text: impl Into<String>, pos: Vec2, color: u32) {
        if self.floats.len() >= MAX_FLOATS {
            self.floats.pop_front();
        }
        self.floats.push_back(FloatText {
            text: text.into(),
            color,
            pos,
            timer: FLOAT_TIME,
        });
    }

    pub fn update(&mut self, dt: f32) {
        for p in &mut self.popups {
            p.timer -= dt;
        }
        self.popups.retain(|p| p.timer > 0.0);

        for f in &mut self.floats {
            f.timer -= dt;
            f.pos.y -= FLOAT_DRIFT * dt;
        }
        self.floats.retain(|f| f.timer > 0.0);
    }

    pub fn clear(&mut self) {
        self.popups.clear();
        self.floats.clear();
    }

    /// Most recent announcement (the one drawn on top)
    pub fn current(&self) -> Option<&Popup> {
        self.popups.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_popup_expires() {
        let mut p = Popups::default();
        p.show("MAGNET!", colors::NEUTRAL);
        p.update(1.0);
        assert_eq!(p.popups.len(), 1);
        p.update(1.0);
        assert!(p.popups.is_empty());
    }

    #[test]
    fn test_zero_dt_freezes() {
        let mut p = Popups::default();
        p.show("PAUSED", colors::NEUTRAL);
        p.float("+100", Vec2::new(10.0, 100.0), colors::GOLD);
        for _ in 0..100 {
            p.update(0.0);
        }
        assert_eq!(p.popups[0].timer, POPUP_TIME);
        assert_eq!(p.floats[0].pos.y, 100.0);
    }

    #[test]
    fn test_float_cap_and_drift() {
        let mut p = Popups::default();
        for i in 0..5 {
            p.float(format!("+{i}"), Vec2::new(0.0, 100.0), colors::GOLD);
        }
        assert_eq!(p.floats.len(), MAX_FLOATS);
        assert_eq!(p.floats[0].text, "+2");

        p.update(0.5);
        assert!((p.floats[0].pos.y - (100.0 - FLOAT_DRIFT * 0.5)).abs() < 1e-4);
    }

    #[test]
    fn test_streak_milestones() {
        assert!(streak_milestone(5).is_some());
        assert!(streak_milestone(20).is_some());
        assert!(streak_milestone(25).is_none());
        assert!(streak_milestone(7).is_none());
    }
}
