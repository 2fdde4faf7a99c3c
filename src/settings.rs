//! Player preferences
//!
//! Persisted separately from scores in LocalStorage.

use serde::{Deserialize, Serialize};

/// Particle density preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ParticleDensity {
    Low,
    #[default]
    Medium,
    High,
}

impl ParticleDensity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticleDensity::Low => "Low",
            ParticleDensity::Medium => "Medium",
            ParticleDensity::High => "High",
        }
    }

    /// Next preset, wrapping
    pub fn next(self) -> Self {
        match self {
            ParticleDensity::Low => ParticleDensity::Medium,
            ParticleDensity::Medium => ParticleDensity::High,
            ParticleDensity::High => ParticleDensity::Low,
        }
    }

    /// Live particle cap for this preset
    pub fn max_particles(&self) -> usize {
        match self {
            ParticleDensity::Low => 60,
            ParticleDensity::Medium => 200,
            ParticleDensity::High => 600,
        }
    }
}

/// Player preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,
    pub muted: bool,
    /// Pause the run when the tab is hidden
    pub pause_on_hide: bool,

    // === Visual Effects ===
    /// Coin bursts
    pub particles: bool,
    pub density: ParticleDensity,
    /// Show FPS counter
    pub show_fps: bool,

    // === Accessibility ===
    /// Reduced motion (no death flash, no coin bob)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.5,
            muted: false,
            pause_on_hide: true,

            particles: true,
            density: ParticleDensity::Medium,
            show_fps: false,

            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Effective particle count cap
    pub fn max_particles(&self) -> usize {
        if !self.particles {
            0
        } else {
            self.density.max_particles()
        }
    }

    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "punch_run_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match serde_json::from_str(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Discarding stored settings: {}", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_particles_off_means_zero_cap() {
        let mut s = Settings::default();
        assert_eq!(s.max_particles(), 200);
        s.particles = false;
        assert_eq!(s.max_particles(), 0);
    }

    #[test]
    fn test_mute_toggles() {
        let mut s = Settings::default();
        assert!(!s.muted);
        s.toggle_mute();
        assert!(s.muted);
        s.toggle_mute();
        assert!(!s.muted);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let s: Settings = serde_json::from_str(r#"{"muted":true}"#).unwrap_or_default();
        assert!(s.muted);
        assert_eq!(s.density, ParticleDensity::Medium);
        assert_eq!(ParticleDensity::High.next(), ParticleDensity::Low);
    }
}
