//! Audio system using Web Audio API
//!
//! Procedurally generated cues and a chiptune loop, no external files. The
//! context is created lazily on the first user gesture; until then every
//! call is a silent no-op.

use web_sys::{AudioContext, AudioContextState, GainNode, OscillatorType};

use crate::settings::Settings;
use crate::sim::{Cue, GameEvent, MusicCommand};

/// Music loop tempo
const BPM: f64 = 138.0;
/// Schedule the next chunk this far ahead of the current one ending
const LOOKAHEAD: f64 = 0.25;

const C3: f32 = 130.81;
const F3: f32 = 174.61;
const G3: f32 = 196.00;
const A3: f32 = 220.00;
const E4: f32 = 329.63;
const G4: f32 = 392.00;
const A4: f32 = 440.00;
const B4: f32 = 493.88;
const C5: f32 = 523.25;
const D5: f32 = 587.33;
const E5: f32 = 659.25;
const F5: f32 = 698.46;
const G5: f32 = 783.99;
const A5: f32 = 880.00;
const REST: f32 = 0.0;

/// (frequency, length in sixteenths)
const THEME_A: &[(f32, u8)] = &[
    (E5, 2), (REST, 1), (E5, 1), (REST, 2), (E5, 2), (REST, 2), (C5, 2), (E5, 4),
    (G5, 4), (REST, 4), (G4, 4), (REST, 4),
    (C5, 4), (REST, 4), (G4, 4), (REST, 4),
    (E4, 4), (REST, 4), (A4, 4), (B4, 4),
    (A4, 2), (REST, 1), (A4, 1), (G4, 2), (E5, 2), (G5, 4),
    (A5, 2), (F5, 2), (G5, 2), (REST, 2), (E5, 4), (C5, 2), (D5, 2), (B4, 4), (REST, 4),
];

const THEME_B: &[(f32, u8)] = &[
    (G5, 2), (F5, 2), (E5, 4), (C5, 2), (E5, 2),
    (G5, 4), (A5, 2), (G5, 2), (E5, 4),
    (D5, 2), (E5, 2), (F5, 4), (E5, 2), (D5, 2),
    (C5, 4), (REST, 2), (E5, 2), (G5, 2), (A5, 2),
    (G5, 2), (A5, 2), (G5, 4), (E5, 4),
    (D5, 4), (C5, 2), (D5, 2), (E5, 8),
];

const BASS: &[(f32, u8)] = &[
    (C3, 4), (C3, 4), (G3, 4), (G3, 4),
    (A3, 4), (A3, 4), (F3, 4), (F3, 4),
    (C3, 4), (C3, 4), (G3, 4), (G3, 4),
    (A3, 4), (F3, 4), (G3, 4), (REST, 4),
];

struct Graph {
    ctx: AudioContext,
    master: GainNode,
    music: GainNode,
    sfx: GainNode,
}

/// Audio manager for the game
pub struct AudioManager {
    graph: Option<Graph>,
    master_volume: f32,
    sfx_volume: f32,
    music_volume: f32,
    muted: bool,
    music_running: bool,
    /// Context time the scheduled music runs out
    music_until: f64,
    music_phase: u32,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioManager {
    pub fn new() -> Self {
        Self {
            graph: None,
            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.5,
            muted: false,
            music_running: false,
            music_until: 0.0,
            music_phase: 0,
        }
    }

    /// Copy volumes and mute from settings
    pub fn apply_settings(&mut self, settings: &Settings) {
        self.master_volume = settings.master_volume.clamp(0.0, 1.0);
        self.sfx_volume = settings.sfx_volume.clamp(0.0, 1.0);
        self.music_volume = settings.music_volume.clamp(0.0, 1.0);
        self.muted = settings.muted;
        self.sync_gains();
    }

    fn sync_gains(&self) {
        if let Some(g) = &self.graph {
            g.master
                .gain()
                .set_value(if self.muted { 0.0 } else { self.master_volume });
            g.music.gain().set_value(self.music_volume);
            g.sfx.gain().set_value(self.sfx_volume);
        }
    }

    /// Create or resume the context (call from a user gesture)
    pub fn unlock(&mut self) {
        if let Some(g) = &self.graph {
            if g.ctx.state() == AudioContextState::Suspended {
                let _ = g.ctx.resume();
            }
            return;
        }
        match Self::build_graph() {
            Some(graph) => {
                log::info!("Audio context created");
                self.graph = Some(graph);
                self.sync_gains();
            }
            None => log::warn!("Failed to create AudioContext - audio disabled"),
        }
    }

    fn build_graph() -> Option<Graph> {
        let ctx = AudioContext::new().ok()?;
        let master = ctx.create_gain().ok()?;
        master.connect_with_audio_node(&ctx.destination()).ok()?;
        let music = ctx.create_gain().ok()?;
        music.connect_with_audio_node(&master).ok()?;
        let sfx = ctx.create_gain().ok()?;
        sfx.connect_with_audio_node(&master).ok()?;
        Some(Graph {
            ctx,
            master,
            music,
            sfx,
        })
    }

    /// React to one engine event
    pub fn handle(&mut self, event: &GameEvent) {
        match event {
            GameEvent::Cue(cue) => self.play(*cue),
            GameEvent::Music(MusicCommand::Start) => self.start_music(),
            GameEvent::Music(MusicCommand::Stop) => self.stop_music(),
            GameEvent::Music(MusicCommand::Pause) => self.pause_music(),
            GameEvent::Music(MusicCommand::Resume) => self.resume_music(),
            _ => {}
        }
    }

    /// Play a cue
    pub fn play(&self, cue: Cue) {
        let Some(g) = &self.graph else { return };
        if self.muted {
            return;
        }
        let t = g.ctx.current_time();
        let square = OscillatorType::Square;

        match cue {
            Cue::Jump => self.sweep(g, 200.0, 700.0, 0.18, 0.28, square, t),
            Cue::DoubleJump => self.sequence(g, &[(300.0, 0.0), (500.0, 0.09)], 0.08, 0.22, t),
            Cue::Coin => {
                self.sequence(g, &[(880.0, 0.0), (1108.0, 0.07), (1320.0, 0.14)], 0.09, 0.22, t)
            }
            Cue::Streak => self.sequence(
                g,
                &[(659.0, 0.0), (784.0, 0.055), (988.0, 0.11), (1319.0, 0.165)],
                0.10,
                0.20,
                t,
            ),
            Cue::Powerup => self.sequence(
                g,
                &[(523.0, 0.0), (659.0, 0.09), (784.0, 0.18), (1047.0, 0.27)],
                0.14,
                0.28,
                t,
            ),
            Cue::PowerupRare => self.sequence(
                g,
                &[
                    (523.0, 0.0),
                    (659.0, 0.09),
                    (784.0, 0.18),
                    (1047.0, 0.27),
                    (1319.0, 0.36),
                    (1047.0, 0.48),
                ],
                0.12,
                0.30,
                t,
            ),
            Cue::ShieldBreak => {
                self.sweep(g, 300.0, 150.0, 0.18, 0.30, OscillatorType::Sawtooth, t)
            }
            Cue::Death => self.sweep(g, 440.0, 55.0, 0.6, 0.38, OscillatorType::Sawtooth, t),
            Cue::GameOver => {
                self.sequence(
                    g,
                    &[(784.0, 0.0), (659.0, 0.19), (523.0, 0.38), (392.0, 0.57), (330.0, 0.76)],
                    0.20,
                    0.28,
                    t,
                );
                self.sweep(g, 60.0, 40.0, 1.0, 0.12, OscillatorType::Sawtooth, t + 0.1);
            }
            Cue::MenuSelect => self.sequence(g, &[(880.0, 0.0), (1760.0, 0.07)], 0.07, 0.18, t),
        }
    }

    // === Sound generators ===

    /// One enveloped tone into `dest`
    #[allow(clippy::too_many_arguments)]
    fn tone(
        &self,
        g: &Graph,
        dest: &GainNode,
        freq: f32,
        dur: f64,
        level: f32,
        osc_type: OscillatorType,
        t: f64,
    ) -> Option<()> {
        let osc = g.ctx.create_oscillator().ok()?;
        let gain = g.ctx.create_gain().ok()?;
        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(dest).ok()?;

        gain.gain().set_value_at_time(0.001, t).ok()?;
        gain.gain()
            .linear_ramp_to_value_at_time(level, t + 0.005)
            .ok()?;
        gain.gain().set_value_at_time(level, t + dur * 0.8).ok()?;
        gain.gain()
            .exponential_ramp_to_value_at_time(0.001, t + dur)
            .ok()?;

        osc.start_with_when(t).ok()?;
        osc.stop_with_when(t + dur + 0.02).ok()
    }

    /// Notes as (frequency, offset seconds), all the same length
    fn sequence(&self, g: &Graph, notes: &[(f32, f64)], dur: f64, level: f32, t: f64) {
        for (freq, offset) in notes {
            self.tone(g, &g.sfx, *freq, dur, level, OscillatorType::Square, t + offset);
        }
    }

    /// Exponential pitch sweep
    #[allow(clippy::too_many_arguments)]
    fn sweep(
        &self,
        g: &Graph,
        from: f32,
        to: f32,
        dur: f64,
        level: f32,
        osc_type: OscillatorType,
        t: f64,
    ) {
        let Ok(osc) = g.ctx.create_oscillator() else {
            return;
        };
        let Ok(gain) = g.ctx.create_gain() else {
            return;
        };
        osc.set_type(osc_type);
        if osc.connect_with_audio_node(&gain).is_err()
            || gain.connect_with_audio_node(&g.sfx).is_err()
        {
            return;
        }
        osc.frequency().set_value_at_time(from, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(to, t + dur * 0.9)
            .ok();
        gain.gain().set_value_at_time(level, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.001, t + dur)
            .ok();
        osc.start_with_when(t).ok();
        osc.stop_with_when(t + dur + 0.05).ok();
    }

    // === Music ===

    pub fn start_music(&mut self) {
        self.unlock();
        if self.music_running {
            return;
        }
        let Some(g) = &self.graph else { return };
        g.music.gain().cancel_scheduled_values(0.0).ok();
        g.music.gain().set_value(self.music_volume);
        self.music_running = true;
        self.music_phase = 0;
        self.music_until = g.ctx.current_time() + 0.05;
    }

    pub fn stop_music(&mut self) {
        self.music_running = false;
        if let Some(g) = &self.graph {
            let now = g.ctx.current_time();
            g.music.gain().set_value_at_time(self.music_volume.max(0.001), now).ok();
            g.music
                .gain()
                .exponential_ramp_to_value_at_time(0.001, now + 0.4)
                .ok();
        }
    }

    pub fn pause_music(&self) {
        if let Some(g) = &self.graph {
            let _ = g.ctx.suspend();
        }
    }

    pub fn resume_music(&self) {
        if let Some(g) = &self.graph {
            let _ = g.ctx.resume();
        }
    }

    /// Keep the loop fed; call once per frame
    pub fn update(&mut self) {
        if !self.music_running {
            return;
        }
        let Some(g) = &self.graph else { return };
        if g.ctx.state() != AudioContextState::Running {
            return;
        }
        let now = g.ctx.current_time();
        if now + LOOKAHEAD < self.music_until {
            return;
        }
        let start = self.music_until.max(now + 0.05);
        let lead = if self.music_phase % 2 == 0 {
            THEME_A
        } else {
            THEME_B
        };
        self.music_until = start + self.schedule_chunk(g, lead, start);
        self.music_phase = self.music_phase.wrapping_add(1);
    }

    /// Schedule one lead phrase with bass underneath; returns its length
    fn schedule_chunk(&self, g: &Graph, lead: &[(f32, u8)], start: f64) -> f64 {
        let sixteenth = 60.0 / BPM / 4.0;
        let mut t = start;
        for &(freq, len) in lead {
            let dur = len as f64 * sixteenth;
            if freq > 0.0 {
                self.tone(g, &g.music, freq, dur, 0.18, OscillatorType::Square, t);
            }
            t += dur;
        }
        let end = t;

        t = start;
        'bass: loop {
            for &(freq, len) in BASS {
                if t >= end {
                    break 'bass;
                }
                let dur = len as f64 * sixteenth;
                if freq > 0.0 {
                    self.tone(g, &g.music, freq, dur * 0.9, 0.12, OscillatorType::Triangle, t);
                }
                t += dur;
            }
        }
        end - start
    }
}
