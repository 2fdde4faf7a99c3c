//! Vertex types for 2D rendering

use bytemuck::{Pod, Zeroable};

/// Simple 2D vertex with position and color
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// 0xRRGGBB to an opaque RGBA color
pub const fn hex(rgb: u32) -> [f32; 4] {
    with_alpha(rgb, 1.0)
}

/// 0xRRGGBB plus alpha
pub const fn with_alpha(rgb: u32, alpha: f32) -> [f32; 4] {
    [
        ((rgb >> 16) & 0xFF) as f32 / 255.0,
        ((rgb >> 8) & 0xFF) as f32 / 255.0,
        (rgb & 0xFF) as f32 / 255.0,
        alpha,
    ]
}

/// Colors for game elements
pub mod colors {
    use super::hex;

    pub const GREEN_CANDLE: [f32; 4] = hex(0x22C55E);
    pub const RED_CANDLE: [f32; 4] = hex(0xEF4444);
    pub const WICK: [f32; 4] = hex(0x1A1A1A);
    pub const BAR: [f32; 4] = hex(0x3B4A1F);
    pub const CRASH_BAR: [f32; 4] = hex(0xB91C1C);
    pub const SPIKE: [f32; 4] = hex(0x535353);
    pub const PLAYER: [f32; 4] = hex(0x8B5A2B);
    pub const PLAYER_HELMET: [f32; 4] = hex(0x556B2F);
    pub const FLASH: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
    pub const SHIELD: [f32; 4] = [0.35, 0.75, 1.0, 0.7];
    pub const MAGNET: [f32; 4] = [0.9, 0.2, 0.3, 0.25];
    pub const BAR_TRACK: [f32; 4] = [0.0, 0.0, 0.0, 0.35];
    pub const OVERLAY: [f32; 4] = [0.03, 0.05, 0.02, 0.72];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex() {
        assert_eq!(hex(0xFF0000), [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(with_alpha(0x0000FF, 0.5), [0.0, 0.0, 1.0, 0.5]);
    }
}
