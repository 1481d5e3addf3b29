use crate::error::EngineError;
use crate::layout::{RUN_WIDTH, TextureLayout};
use footprint_common::{ColorCodeField, EngineConfig, EntityIndex, EntityMetadata};
use footprint_palette::{CategoryCounter, ColorMapper};
use glam::{Vec2, Vec3};

/// Static RGBA8 texture holding every entity's three target colors and its
/// packed distance scalar (alpha of slot 0).
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataTexture {
    side: u32,
    texels: Vec<[u8; 4]>,
}

impl MetadataTexture {
    fn zeroed(side: u32) -> Self {
        Self {
            side,
            texels: vec![[0; 4]; side as usize * side as usize],
        }
    }

    pub fn side(&self) -> u32 {
        self.side
    }

    pub fn texels(&self) -> &[[u8; 4]] {
        &self.texels
    }

    /// Raw bytes in row-major RGBA order, ready for upload.
    pub fn as_bytes(&self) -> &[u8] {
        self.texels.as_flattened()
    }

    /// Quantized target color of `field` for the entity whose run starts at `flat`.
    pub fn target_at(&self, flat: usize, field: ColorCodeField) -> Vec3 {
        let [r, g, b, _] = self.texels[flat + field.slot() as usize];
        Vec3::new(r as f32, g as f32, b as f32) / 255.0
    }

    /// Normalized distance scalar for the entity whose run starts at `flat`.
    pub fn distance_at(&self, flat: usize) -> f32 {
        self.texels[flat][3] as f32 / 255.0
    }
}

/// Output of [`MetadataEncoder::encode`]; immutable for the engine's lifetime.
#[derive(Debug, Clone)]
pub struct EncodedMetadata {
    pub layout: TextureLayout,
    pub texture: MetadataTexture,
    /// Normalized texture coordinate per entity, parallel to the input list.
    pub indexes: Vec<Vec2>,
}

/// Packs entity metadata into a [`MetadataTexture`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataEncoder {
    config: EngineConfig,
}

impl MetadataEncoder {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Encode all entities. Absent records and fields degrade to gray; the only
    /// failure is an entity count too large for the texture limit.
    pub fn encode<C: CategoryCounter>(
        &self,
        entities: &[Option<EntityMetadata>],
        mapper: &mut ColorMapper<C>,
    ) -> Result<EncodedMetadata, EngineError> {
        let layout = TextureLayout::new(entities.len(), self.config.max_texture_side)?;
        let mut texture = MetadataTexture::zeroed(layout.side());

        for (i, metadata) in entities.iter().enumerate() {
            let index = EntityIndex(i as u32);
            for field in ColorCodeField::ALL {
                let value = metadata.as_ref().and_then(|m| m.field(field));
                let color = mapper.map(field, value);
                let texel = &mut texture.texels[layout.flat_index(index, field.slot())];
                texel[..3].copy_from_slice(&quantize(color));
            }
            texture.texels[layout.flat_index(index, 0)][3] = self.distance_byte(metadata.as_ref());
        }

        tracing::debug!(
            entities = entities.len(),
            side = layout.side(),
            runs_per_row = layout.side() / RUN_WIDTH,
            "encoded metadata texture"
        );

        Ok(EncodedMetadata {
            layout,
            indexes: layout.coordinates(),
            texture,
        })
    }

    /// Scaled distance from the configured center, saturated to a byte.
    /// Entities without a centroid sit at the center.
    fn distance_byte(&self, metadata: Option<&EntityMetadata>) -> u8 {
        let Some(centroid) = metadata.and_then(|m| m.centroid) else {
            return 0;
        };
        let scaled = centroid.distance(self.config.center) * self.config.distance_scale;
        scaled.clamp(0.0, 255.0) as u8
    }
}

/// Normalized color to bytes, truncating like a typed-array store.
fn quantize(color: Vec3) -> [u8; 3] {
    let c = color * 255.0;
    [c.x as u8, c.y as u8, c.z as u8]
}

#[cfg(test)]
mod tests {
    use super::*;
    use footprint_common::RawValue;
    use footprint_palette::CategoryTally;

    fn building(year: f64, zone: &str, class: &str, centroid: Vec2) -> Option<EntityMetadata> {
        Some(
            EntityMetadata::new()
                .with_centroid(centroid)
                .with("YearBuilt", year)
                .with("ZoneDist1", zone)
                .with("BldgClass", class),
        )
    }

    fn encode(entities: &[Option<EntityMetadata>]) -> EncodedMetadata {
        MetadataEncoder::default()
            .encode(entities, &mut ColorMapper::new())
            .unwrap()
    }

    #[test]
    fn packs_three_slots_per_entity() {
        let center = EngineConfig::default().center;
        let entities = vec![
            building(1820.0, "C6-4", "A1", center),
            building(1700.0, "PARK", "D3", center + Vec2::new(3.1, 4.1)),
        ];
        let encoded = encode(&entities);
        let t = encoded.texture.texels();

        // entity 0
        assert_eq!(t[0], [7, 63, 128, 0]);
        assert_eq!(t[1][..3], [48, 129, 188]);
        assert_eq!(t[2][..3], [255, 0, 255]);
        // entity 1: excluded year, park, elevator apartments, distance ~5.14 * 4
        assert_eq!(t[3], [0, 0, 0, 20]);
        assert_eq!(t[4][..3], [228, 244, 223]);
        assert_eq!(t[5][..3], [0, 0, 255]);
        // padding
        assert!(t[6..].iter().all(|texel| *texel == [0; 4]));
    }

    #[test]
    fn absent_metadata_is_gray_at_center() {
        let entities = vec![None, Some(EntityMetadata::new().with("BldgClass", RawValue::Null))];
        let encoded = encode(&entities);
        let gray = [102, 102, 102];
        for flat in 0..6 {
            assert_eq!(encoded.texture.texels()[flat][..3], gray);
        }
        assert_eq!(encoded.texture.distance_at(0), 0.0);
        assert_eq!(encoded.texture.distance_at(3), 0.0);
    }

    #[test]
    fn unsupported_attributes_are_gray() {
        let entity = EntityMetadata::new()
            .with_centroid(EngineConfig::default().center)
            .with("YearBuilt", RawValue::Unsupported)
            .with("ZoneDist1", RawValue::Unsupported)
            .with("BldgClass", RawValue::Unsupported)
            .with("Landmark", RawValue::Unsupported);
        let encoded = encode(&[Some(entity)]);
        for flat in 0..3 {
            assert_eq!(encoded.texture.texels()[flat][..3], [102, 102, 102]);
        }
    }

    #[test]
    fn distance_saturates() {
        let far = building(1990.0, "R6", "B1", Vec2::new(1000.0, 1000.0));
        let encoded = encode(&[far]);
        assert_eq!(encoded.texture.texels()[0][3], 255);
        assert_eq!(encoded.texture.distance_at(0), 1.0);
    }

    #[test]
    fn indexes_follow_layout() {
        let entities: Vec<_> = (0..10).map(|_| None).collect();
        let encoded = encode(&entities);
        assert_eq!(encoded.layout.side(), 12);
        assert_eq!(encoded.indexes.len(), 10);
        assert_eq!(encoded.indexes[4], Vec2::new(0.0, 1.0 / 12.0));
        assert_eq!(encoded.texture.as_bytes().len(), 12 * 12 * 4);
    }

    #[test]
    fn target_lookup_by_field() {
        let entities = vec![building(1820.0, "M1", "S9", Vec2::ZERO)];
        let encoded = encode(&entities);
        let tex = &encoded.texture;
        assert_eq!(tex.target_at(0, ColorCodeField::BldgClass), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(
            tex.target_at(0, ColorCodeField::ZoneDist1),
            Vec3::new(253.0, 177.0, 75.0) / 255.0
        );
    }

    #[test]
    fn injected_counter_sees_every_class() {
        let entities = vec![
            building(1900.0, "R6", "A1", Vec2::ZERO),
            building(1900.0, "R6", "A1", Vec2::ZERO),
            None,
        ];
        let mut mapper = ColorMapper::with_counter(CategoryTally::new());
        MetadataEncoder::default()
            .encode(&entities, &mut mapper)
            .unwrap();
        assert_eq!(mapper.counter().get(ColorCodeField::BldgClass, "A1"), 2);
        assert_eq!(mapper.counter().total(), 2);
    }

    #[test]
    fn too_many_entities_fails() {
        let config = EngineConfig {
            max_texture_side: 6,
            ..EngineConfig::default()
        };
        let entities: Vec<_> = (0..5).map(|_| None).collect();
        let result = MetadataEncoder::new(config).encode(&entities, &mut ColorMapper::new());
        assert!(matches!(result, Err(EngineError::TextureTooLarge { .. })));
    }
}
