use crate::error::EngineError;
use footprint_common::EntityIndex;
use glam::{UVec2, Vec2};

/// Texels reserved per entity in a horizontal run.
pub const RUN_WIDTH: u32 = 3;

/// Placement of entities in the square metadata/state textures.
///
/// Entity `i` owns the run starting at column `(3i) mod S`, row `floor(3i / S)`.
/// `S` is a multiple of three, so runs never wrap across rows and the flat
/// texel index of slot `k` is `3i + k`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureLayout {
    entity_count: u32,
    side: u32,
}

impl TextureLayout {
    /// Layout for `entity_count` entities with side `ceil(sqrt(N)) * 3`
    /// (at least one run, so an empty list still gets a 3x3 texture).
    pub fn new(entity_count: usize, max_side: u32) -> Result<Self, EngineError> {
        let side = ceil_sqrt(entity_count as u64).max(1) * RUN_WIDTH as u64;
        if side > max_side as u64 || entity_count > u32::MAX as usize {
            return Err(EngineError::TextureTooLarge {
                entities: entity_count,
                side,
                max: max_side,
            });
        }
        Ok(Self {
            entity_count: entity_count as u32,
            side: side as u32,
        })
    }

    pub fn entity_count(&self) -> usize {
        self.entity_count as usize
    }

    pub fn side(&self) -> u32 {
        self.side
    }

    /// Total texels in one texture.
    pub fn texel_count(&self) -> usize {
        self.side as usize * self.side as usize
    }

    /// Normalized width of one texel.
    pub fn texel_size(&self) -> f32 {
        1.0 / self.side as f32
    }

    /// First texel of an entity's run.
    pub fn texel(&self, index: EntityIndex) -> UVec2 {
        let flat = index.0 as u64 * RUN_WIDTH as u64;
        let side = self.side as u64;
        UVec2::new((flat % side) as u32, (flat / side) as u32)
    }

    /// Normalized texture coordinate of an entity, in `[0, 1)^2`.
    pub fn coordinate(&self, index: EntityIndex) -> Vec2 {
        self.texel(index).as_vec2() / self.side as f32
    }

    /// Flat texel index of `slot` within an entity's run.
    pub fn flat_index(&self, index: EntityIndex, slot: u32) -> usize {
        index.as_usize() * RUN_WIDTH as usize + slot as usize
    }

    /// Entity whose run starts at the given flat texel index, if any.
    pub fn entity_at(&self, flat: usize) -> Option<EntityIndex> {
        if flat % RUN_WIDTH as usize != 0 {
            return None;
        }
        let i = flat / RUN_WIDTH as usize;
        (i < self.entity_count as usize).then_some(EntityIndex(i as u32))
    }

    /// Coordinates for every entity, in list order.
    pub fn coordinates(&self) -> Vec<Vec2> {
        (0..self.entity_count)
            .map(|i| self.coordinate(EntityIndex(i)))
            .collect()
    }
}

fn ceil_sqrt(n: u64) -> u64 {
    let mut r = (n as f64).sqrt() as u64;
    while r * r < n {
        r += 1;
    }
    while r > 0 && (r - 1) * (r - 1) >= n {
        r -= 1;
    }
    r
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn side_is_three_times_ceil_sqrt() {
        assert_eq!(TextureLayout::new(0, 8192).unwrap().side(), 3);
        assert_eq!(TextureLayout::new(1, 8192).unwrap().side(), 3);
        assert_eq!(TextureLayout::new(4, 8192).unwrap().side(), 6);
        assert_eq!(TextureLayout::new(5, 8192).unwrap().side(), 9);
        assert_eq!(TextureLayout::new(1_000_000, 8192).unwrap().side(), 3000);
    }

    #[test]
    fn run_placement() {
        let layout = TextureLayout::new(5, 8192).unwrap();
        assert_eq!(layout.texel(EntityIndex(0)), UVec2::new(0, 0));
        assert_eq!(layout.texel(EntityIndex(2)), UVec2::new(6, 0));
        assert_eq!(layout.texel(EntityIndex(3)), UVec2::new(0, 1));
        assert_eq!(layout.texel(EntityIndex(4)), UVec2::new(3, 1));
        assert_eq!(layout.coordinate(EntityIndex(4)), Vec2::new(3.0 / 9.0, 1.0 / 9.0));
    }

    #[test]
    fn coordinates_are_injective_and_in_unit_square() {
        for n in (0..200).chain([997, 1024, 4099]) {
            let layout = TextureLayout::new(n, 8192).unwrap();
            let mut seen = HashSet::new();
            for i in 0..n as u32 {
                let texel = layout.texel(EntityIndex(i));
                assert!(texel.x + RUN_WIDTH <= layout.side(), "run wraps for n={n} i={i}");
                assert!(texel.y < layout.side());
                assert!(seen.insert(texel), "collision for n={n} i={i}");

                let uv = layout.coordinate(EntityIndex(i));
                assert!((0.0..1.0).contains(&uv.x) && (0.0..1.0).contains(&uv.y));
            }
            assert_eq!(layout.coordinates().len(), n);
        }
    }

    #[test]
    fn entity_at_inverts_placement() {
        let layout = TextureLayout::new(7, 8192).unwrap();
        for i in 0..7 {
            let texel = layout.texel(EntityIndex(i));
            let flat = (texel.y * layout.side() + texel.x) as usize;
            assert_eq!(flat, layout.flat_index(EntityIndex(i), 0));
            assert_eq!(layout.entity_at(flat), Some(EntityIndex(i)));
            assert_eq!(layout.entity_at(flat + 1), None);
        }
        assert_eq!(layout.entity_at(7 * 3), None);
    }

    #[test]
    fn oversized_layout_is_rejected() {
        let err = TextureLayout::new(10_000, 30).unwrap_err();
        assert!(matches!(err, EngineError::TextureTooLarge { side: 300, max: 30, .. }));
    }
}
