//! Scene assembly: engine state to a world-space vertex list
//!
//! Pure function of the engine, so it runs (and is tested) natively. Text
//! (score, popups, menus) is drawn by the DOM overlay, not here.

use glam::Vec2;

use super::shapes::{circle, gradient_rect, rect, ring, triangle};
use super::vertex::{Vertex, colors, hex, with_alpha};
use crate::consts::*;
use crate::sim::{BiomeFx, GameEngine, GamePhase, Obstacle, ObstacleKind};

/// Presentation switches from settings
#[derive(Debug, Clone, Copy, Default)]
pub struct SceneOptions {
    pub reduced_motion: bool,
}

/// Build every vertex for one frame
pub fn build_scene(engine: &GameEngine, options: SceneOptions) -> Vec<Vertex> {
    let mut out = Vec::with_capacity(4096);
    let t = engine.time as f32;

    background(&mut out, engine, t);

    if engine.phase == GamePhase::Menu {
        return out;
    }

    for o in engine.spawn.obstacles.iter() {
        out.extend(obstacle(o));
    }

    for c in engine.spawn.coins.iter() {
        let bob = if options.reduced_motion {
            0.0
        } else {
            c.bob_offset()
        };
        let center = c.center() + Vec2::new(0.0, bob);
        let r = c.size.x / 2.0;
        out.extend(circle(center, r, c.tier.color(), 16));
        out.extend(ring(center, r * 0.6, r * 0.75, with_alpha(0xFFFFFF, 0.45), 16));
    }

    for p in engine.spawn.powerups.iter() {
        let pulse = if options.reduced_motion {
            0.0
        } else {
            (t * 6.0).sin() * 1.5
        };
        out.extend(circle(p.center, p.radius + 4.0 + pulse, with_alpha(0xFFFFFF, 0.3), 16));
        out.extend(circle(p.center, p.radius, p.kind.color(), 16));
    }

    for p in engine.spawn.particles.iter() {
        let mut color = p.color;
        color[3] *= p.alpha();
        out.extend(rect(p.pos - Vec2::splat(p.size / 2.0), Vec2::splat(p.size), color));
    }

    player(&mut out, engine, options);
    effect_bars(&mut out, engine);

    if engine.phase == GamePhase::Paused {
        out.extend(rect(Vec2::ZERO, Vec2::new(WORLD_W, WORLD_H), colors::OVERLAY));
    }

    out
}

/// Cheap deterministic scatter for decorative dots
fn scatter(i: u32, salt: u32) -> f32 {
    let mut x = i.wrapping_mul(0x9E37_79B9) ^ salt.wrapping_mul(0x85EB_CA6B);
    x ^= x >> 15;
    x = x.wrapping_mul(0x2C1B_3C6D);
    x ^= x >> 12;
    (x & 0xFFFF) as f32 / 65535.0
}

fn background(out: &mut Vec<Vertex>, engine: &GameEngine, t: f32) {
    let biome = engine.biome();

    out.extend(gradient_rect(
        Vec2::ZERO,
        Vec2::new(WORLD_W, GROUND_Y),
        hex(biome.sky_top),
        hex(biome.sky_bottom),
    ));

    match biome.fx {
        Some(BiomeFx::Stars) => {
            for i in 0..40 {
                let pos = Vec2::new(scatter(i, 1) * WORLD_W, scatter(i, 2) * (GROUND_Y - 40.0));
                let twinkle = 0.5 + 0.5 * (t * 2.0 + i as f32).sin();
                out.extend(rect(pos, Vec2::splat(2.0), with_alpha(0xFFFFFF, twinkle)));
            }
        }
        Some(BiomeFx::Snow) => {
            for i in 0..50 {
                let x = (scatter(i, 3) * WORLD_W + (t * 12.0 + i as f32).sin() * 8.0)
                    .rem_euclid(WORLD_W);
                let y = (scatter(i, 4) * GROUND_Y + t * (20.0 + 25.0 * scatter(i, 5)))
                    .rem_euclid(GROUND_Y);
                out.extend(rect(Vec2::new(x, y), Vec2::splat(3.0), with_alpha(0xFFFFFF, 0.85)));
            }
        }
        Some(BiomeFx::Matrix) => {
            for i in 0..26 {
                let x = i as f32 * (WORLD_W / 26.0) + 6.0;
                let head = (scatter(i, 6) * GROUND_Y + t * (60.0 + 80.0 * scatter(i, 7)))
                    .rem_euclid(GROUND_Y + 60.0);
                for k in 0..6 {
                    let y = head - k as f32 * 10.0;
                    if (0.0..GROUND_Y).contains(&y) {
                        let alpha = 1.0 - k as f32 / 6.0;
                        out.extend(rect(Vec2::new(x, y), Vec2::new(4.0, 7.0), with_alpha(0x00FF41, alpha)));
                    }
                }
            }
        }
        Some(BiomeFx::Lava) => {
            for i in 0..12 {
                let x = scatter(i, 8) * WORLD_W;
                let rise = (t * 30.0 + scatter(i, 9) * GROUND_Y).rem_euclid(GROUND_Y);
                out.extend(circle(
                    Vec2::new(x, GROUND_Y - rise),
                    2.5,
                    with_alpha(0xFF6600, 1.0 - rise / GROUND_Y),
                    8,
                ));
            }
        }
        Some(BiomeFx::Beach) => {
            out.extend(circle(Vec2::new(680.0, 60.0), 28.0, hex(0xFFE066), 24));
        }
        Some(BiomeFx::Storm) => {
            // A short flash every few seconds
            if (t % 4.0) < 0.08 {
                out.extend(rect(Vec2::ZERO, Vec2::new(WORLD_W, GROUND_Y), with_alpha(0xCCCCFF, 0.35)));
            }
        }
        None => {}
    }

    let ground_h = WORLD_H - GROUND_Y;
    out.extend(rect(Vec2::new(0.0, GROUND_Y), Vec2::new(WORLD_W, 6.0), hex(biome.ground_top)));
    out.extend(rect(
        Vec2::new(0.0, GROUND_Y + 6.0),
        Vec2::new(WORLD_W, ground_h - 6.0),
        hex(biome.ground_mid),
    ));
    out.extend(rect(Vec2::new(0.0, GROUND_Y), Vec2::new(WORLD_W, 2.0), hex(biome.ground_line)));

    // Scrolling stripes
    let mut x = -engine.ground_offset;
    while x < WORLD_W {
        out.extend(rect(
            Vec2::new(x, GROUND_Y + 14.0),
            Vec2::new(24.0, 3.0),
            with_alpha(biome.ground_line, 0.5),
        ));
        x += 60.0;
    }
}

fn obstacle(o: &Obstacle) -> Vec<Vertex> {
    let mut out = Vec::new();
    match o.kind {
        ObstacleKind::GreenCandle | ObstacleKind::RedCandle | ObstacleKind::TallCandle => {
            let body = if o.kind == ObstacleKind::RedCandle {
                colors::RED_CANDLE
            } else {
                colors::GREEN_CANDLE
            };
            let wick_x = o.pos.x + o.size.x / 2.0 - 1.0;
            out.extend(rect(Vec2::new(wick_x, o.pos.y - 8.0), Vec2::new(2.0, o.size.y + 14.0), colors::WICK));
            out.extend(rect(o.pos, o.size, body));
        }
        ObstacleKind::SpikeCluster => {
            let spikes = 3;
            let w = o.size.x / spikes as f32;
            let base = o.pos.y + o.size.y;
            for i in 0..spikes {
                let x = o.pos.x + i as f32 * w;
                out.extend(triangle(
                    Vec2::new(x, base),
                    Vec2::new(x + w / 2.0, o.pos.y),
                    Vec2::new(x + w, base),
                    colors::SPIKE,
                ));
            }
        }
        ObstacleKind::CrashBar => {
            out.extend(rect(o.pos, o.size, colors::CRASH_BAR));
            out.extend(rect(o.pos, Vec2::new(o.size.x, 3.0), with_alpha(0xFFFFFF, 0.3)));
        }
        ObstacleKind::DuckBar | ObstacleKind::FlyingBar => {
            out.extend(rect(o.pos, o.size, colors::BAR));
            out.extend(rect(o.pos, Vec2::new(o.size.x, 3.0), with_alpha(0xFFFFFF, 0.2)));
        }
    }
    out
}

fn player(out: &mut Vec<Vertex>, engine: &GameEngine, options: SceneOptions) {
    let p = &engine.player;
    let flash_on = p.is_flashing() && !options.reduced_motion && ((p.death_flash * 20.0) as u32) % 2 == 0;
    let (body, helmet) = if flash_on {
        (colors::FLASH, colors::FLASH)
    } else {
        (colors::PLAYER, colors::PLAYER_HELMET)
    };

    // Legs alternate with the run frame
    let stride = if p.grounded { (p.run_frame % 2) as f32 * 4.0 } else { 2.0 };
    let leg_y = p.pos.y + p.size.y - 8.0;
    out.extend(rect(Vec2::new(p.pos.x + 12.0 + stride, leg_y), Vec2::new(8.0, 8.0), body));
    out.extend(rect(Vec2::new(p.pos.x + p.size.x - 20.0 - stride, leg_y), Vec2::new(8.0, 8.0), body));

    out.extend(rect(p.pos + Vec2::new(4.0, 10.0), Vec2::new(p.size.x - 8.0, p.size.y - 18.0), body));
    out.extend(rect(p.pos + Vec2::new(8.0, 0.0), Vec2::new(p.size.x - 16.0, 12.0), helmet));

    let center = p.center();
    if engine.powerups.shield {
        let r = p.size.x.max(p.size.y) / 2.0 + 6.0;
        out.extend(ring(center, r, r + 3.0, colors::SHIELD, 32));
    }
    if engine.powerups.magnet.active {
        let r = engine.powerups.magnet_radius();
        out.extend(ring(center, r - 2.0, r, colors::MAGNET, 48));
    }
}

/// Timer bars for active effects, top right
fn effect_bars(out: &mut Vec<Vertex>, engine: &GameEngine) {
    let width = 90.0;
    let mut y = 12.0;
    for item in engine.powerups.hud_items() {
        let Some(fraction) = item.fraction else {
            continue;
        };
        let x = WORLD_W - width - 12.0;
        out.extend(rect(Vec2::new(x, y), Vec2::new(width, 6.0), colors::BAR_TRACK));
        out.extend(rect(Vec2::new(x, y), Vec2::new(width * fraction, 6.0), item.kind.color()));
        y += 10.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{CoinTier, EngineConfig, PowerUpKind};
    use crate::wallet::NoWallet;

    fn running() -> GameEngine {
        let mut e = GameEngine::new(EngineConfig::default());
        e.restart(&NoWallet);
        e
    }

    #[test]
    fn test_menu_draws_background_only() {
        let e = GameEngine::new(EngineConfig::default());
        let v = build_scene(&e, SceneOptions::default());
        assert!(!v.is_empty());
        assert_eq!(v.len() % 3, 0);
        // Sky uses the first biome's top color
        assert_eq!(v[0].color, hex(crate::sim::BIOMES[0].sky_top));
    }

    #[test]
    fn test_entities_add_geometry() {
        let mut e = running();
        let base = build_scene(&e, SceneOptions::default()).len();
        e.spawn.coins.acquire().spawn(CoinTier::Btc, 400.0, 200.0, 0.0);
        let with_coin = build_scene(&e, SceneOptions::default()).len();
        assert!(with_coin > base);
        assert_eq!(with_coin % 3, 0);
    }

    #[test]
    fn test_shield_ring_and_bars() {
        let mut e = running();
        let base = build_scene(&e, SceneOptions::default()).len();
        e.powerups.activate(PowerUpKind::Shield);
        e.powerups.activate(PowerUpKind::Pump);
        let v = build_scene(&e, SceneOptions::default());
        // 32-segment ring plus two bar quads
        assert_eq!(v.len(), base + 32 * 6 + 12);
    }

    #[test]
    fn test_reduced_motion_pins_coins() {
        let mut e = running();
        e.spawn.coins.acquire().spawn(CoinTier::Sol, 400.0, 200.0, 0.7);
        let opts = SceneOptions {
            reduced_motion: true,
        };
        let v = build_scene(&e, opts);
        assert!(v.iter().any(|v| v.position == [400.0 + 10.0, 200.0]));
    }
}
