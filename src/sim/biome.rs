//! Biome catalog
//!
//! Purely cosmetic themes picked from the accumulated score. The engine only
//! remembers the last index it saw so it can announce changes.

use crate::consts::BIOME_SCORE_SPAN;

/// Decorative effect layered over a biome's sky
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiomeFx {
    Stars,
    Matrix,
    Snow,
    Lava,
    Beach,
    Storm,
}

/// Colors are 0xRRGGBB
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Biome {
    pub name: &'static str,
    pub sky_top: u32,
    pub sky_bottom: u32,
    pub ground_top: u32,
    pub ground_mid: u32,
    pub ground_line: u32,
    pub fx: Option<BiomeFx>,
}

const fn biome(
    name: &'static str,
    sky: (u32, u32),
    ground: (u32, u32, u32),
    fx: Option<BiomeFx>,
) -> Biome {
    Biome {
        name,
        sky_top: sky.0,
        sky_bottom: sky.1,
        ground_top: ground.0,
        ground_mid: ground.1,
        ground_line: ground.2,
        fx,
    }
}

pub const BIOMES: [Biome; 12] = [
    biome("THE FIELDS", (0x87CEEB, 0xC8E8F8), (0x6DC040, 0x5AAB32, 0x3D7022), None),
    biome("MIDNIGHT", (0x040820, 0x0A1030), (0x1A1A2A, 0x0F0F1F, 0x555588), Some(BiomeFx::Stars)),
    biome("THE MATRIX", (0x000800, 0x001500), (0x003300, 0x002200, 0x00FF00), Some(BiomeFx::Matrix)),
    biome("THE DESERT", (0xE8A844, 0xF0C878), (0xD4A855, 0xC49840, 0xA07830), None),
    biome("ARCTIC", (0xB0C4DE, 0xE8EEF5), (0xE8E8F0, 0xD0D0E0, 0xA0A0B0), Some(BiomeFx::Snow)),
    biome("VOLCANO", (0x2A0A0A, 0x5A1A0A), (0x3A1A0A, 0x2A0F05, 0xFF4400), Some(BiomeFx::Lava)),
    biome("DEEP SPACE", (0x000005, 0x0A0A20), (0x2A2A3A, 0x1A1A2A, 0x4A4A6A), Some(BiomeFx::Stars)),
    biome("CYBERPUNK", (0x1A0030, 0x2A0050), (0x2A1040, 0x1A0830, 0xFF00FF), None),
    biome("UNDERWATER", (0x003050, 0x004070), (0x002A4A, 0x001A3A, 0x0080A0), None),
    biome("HELL", (0x1A0000, 0x4A0000), (0x2A0A0A, 0x1A0505, 0xFF2200), Some(BiomeFx::Lava)),
    biome("TROPICAL BEACH", (0x00BFFF, 0x87EEFD), (0xF0D060, 0xE8C040, 0xC8A020), Some(BiomeFx::Beach)),
    biome("ELECTRIC STORM", (0x080818, 0x101028), (0x1A1A30, 0x101020, 0x8888FF), Some(BiomeFx::Storm)),
];

/// `floor(score / 1000) mod N`
pub fn biome_index(score: f64) -> usize {
    let band = (score.max(0.0) / BIOME_SCORE_SPAN).floor() as u64;
    (band % BIOMES.len() as u64) as usize
}

pub fn biome_for_score(score: f64) -> &'static Biome {
    &BIOMES[biome_index(score)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_biome_boundaries() {
        assert_eq!(biome_index(0.0), 0);
        assert_eq!(biome_index(999.0), 0);
        assert_eq!(biome_index(999.999), 0);
        assert_eq!(biome_index(1000.0), 1);
        assert_eq!(biome_index(2500.0), 2);
    }

    #[test]
    fn test_biome_wraps() {
        assert_eq!(biome_index(12_000.0), 0);
        assert_eq!(biome_index(13_500.0), 1);
        assert_eq!(biome_for_score(11_000.0).name, "ELECTRIC STORM");
    }

    proptest! {
        #[test]
        fn prop_biome_matches_formula(score in 0u32..1_000_000) {
            let expected = (score / 1000) as usize % BIOMES.len();
            prop_assert_eq!(biome_index(score as f64), expected);
        }
    }
}
