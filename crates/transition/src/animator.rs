use crate::encoder::MetadataTexture;
use crate::layout::TextureLayout;
use footprint_common::{AnimationSettings, ColorCodeField, FrameContext};
use glam::Vec3;

/// Inputs of one blend pass. Times are milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendParams {
    pub active_field: Option<ColorCodeField>,
    pub animation_speed: f32,
    pub animation_spread: f32,
    pub time_ms: f32,
    pub last_change_ms: f32,
}

/// Tracks the selected field and the animation epoch across ticks.
///
/// The epoch is recorded on the first tick and whenever the selected field
/// differs from the one seen on the previous tick.
#[derive(Debug, Clone)]
pub struct TransitionAnimator {
    last_field: Option<ColorCodeField>,
    last_change: Option<f64>,
}

impl TransitionAnimator {
    pub fn new(initial: &AnimationSettings) -> Self {
        Self {
            last_field: initial.color_code_field,
            last_change: None,
        }
    }

    /// Time (seconds) of the most recent field change, once a tick has run.
    pub fn epoch(&self) -> Option<f64> {
        self.last_change
    }

    pub fn last_field(&self) -> Option<ColorCodeField> {
        self.last_field
    }

    /// Observe this frame's settings, resetting the epoch on a field change,
    /// and return the parameters for the pass.
    pub fn prepare(&mut self, frame: FrameContext, settings: &AnimationSettings) -> BlendParams {
        let field = settings.color_code_field;
        let epoch = match self.last_change {
            Some(epoch) if field == self.last_field => epoch,
            _ => {
                tracing::debug!(
                    from = ?self.last_field,
                    to = ?field,
                    time = frame.time,
                    "color field changed, new animation epoch"
                );
                self.last_field = field;
                self.last_change = Some(frame.time);
                frame.time
            }
        };

        BlendParams {
            active_field: field,
            animation_speed: settings.animation_speed,
            animation_spread: settings.animation_spread,
            time_ms: frame.time_ms(),
            last_change_ms: (epoch * 1000.0) as f32,
        }
    }
}

/// Time at which an entity at normalized `distance` starts moving.
pub fn onset_ms(distance: f32, spread: f32, last_change_ms: f32) -> f32 {
    distance.powf(1.5) * spread + last_change_ms
}

/// One step of the blend for a single entity.
pub fn blend_color(current: Vec3, target: Vec3, distance: f32, params: &BlendParams) -> Vec3 {
    let start = onset_ms(distance, params.animation_spread, params.last_change_ms);
    let rate = if params.time_ms > start { 1.0 } else { 0.0 };
    current + (target - current) * params.animation_speed * rate
}

/// Reference blend pass over whole textures: reads `current`, writes `next`.
///
/// Only texels that start an entity run carry state; every other texel is
/// written as zero. Output channels are clamped to `[0, 1]` and rounded to
/// 8 bits; NaN becomes 0.
pub fn blend_pass(
    layout: &TextureLayout,
    metadata: &MetadataTexture,
    current: &[[u8; 4]],
    next: &mut [[u8; 4]],
    params: &BlendParams,
) {
    debug_assert_eq!(current.len(), layout.texel_count());
    debug_assert_eq!(next.len(), layout.texel_count());

    for (flat, out) in next.iter_mut().enumerate() {
        if layout.entity_at(flat).is_none() {
            *out = [0; 4];
            continue;
        }
        let target = params
            .active_field
            .map_or(Vec3::ZERO, |field| metadata.target_at(flat, field));
        let next_color = blend_color(
            unorm_to_vec(current[flat]),
            target,
            metadata.distance_at(flat),
            params,
        );
        *out = vec_to_unorm(next_color);
    }
}

fn unorm_to_vec(texel: [u8; 4]) -> Vec3 {
    Vec3::new(texel[0] as f32, texel[1] as f32, texel[2] as f32) / 255.0
}

fn vec_to_unorm(color: Vec3) -> [u8; 4] {
    let byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    [byte(color.x), byte(color.y), byte(color.z), 0]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(field: Option<ColorCodeField>, time_ms: f32, last_change_ms: f32) -> BlendParams {
        BlendParams {
            active_field: field,
            animation_speed: 0.5,
            animation_spread: 1000.0,
            time_ms,
            last_change_ms,
        }
    }

    #[test]
    fn first_prepare_sets_epoch() {
        let settings = AnimationSettings::default();
        let mut animator = TransitionAnimator::new(&settings);
        assert_eq!(animator.epoch(), None);

        let p = animator.prepare(FrameContext::at(2.0), &settings);
        assert_eq!(animator.epoch(), Some(2.0));
        assert_eq!(p.last_change_ms, 2000.0);
        assert_eq!(p.time_ms, 2000.0);
    }

    #[test]
    fn epoch_resets_once_per_field_change() {
        let year = AnimationSettings::default();
        let class = year.with_field(Some(ColorCodeField::BldgClass));
        let mut animator = TransitionAnimator::new(&year);

        animator.prepare(FrameContext::at(1.0), &year);
        animator.prepare(FrameContext::at(1.5), &year);
        assert_eq!(animator.epoch(), Some(1.0));

        let p = animator.prepare(FrameContext::at(3.0), &class);
        assert_eq!(animator.epoch(), Some(3.0));
        assert_eq!(p.active_field, Some(ColorCodeField::BldgClass));

        animator.prepare(FrameContext::at(4.0), &class);
        animator.prepare(FrameContext::at(5.0), &class);
        assert_eq!(animator.epoch(), Some(3.0));
        assert_eq!(animator.last_field(), Some(ColorCodeField::BldgClass));
    }

    #[test]
    fn switching_to_no_field_is_a_change() {
        let year = AnimationSettings::default();
        let mut animator = TransitionAnimator::new(&year);
        animator.prepare(FrameContext::at(1.0), &year);
        animator.prepare(FrameContext::at(2.0), &year.with_field(None));
        assert_eq!(animator.epoch(), Some(2.0));
    }

    #[test]
    fn unknown_fields_share_one_epoch() {
        let year = AnimationSettings::default();
        let mut animator = TransitionAnimator::new(&year);
        animator.prepare(FrameContext::at(1.0), &year);

        let lot_area = year.with_field(ColorCodeField::parse("LotArea"));
        let num_floors = year.with_field(ColorCodeField::parse("NumFloors"));
        animator.prepare(FrameContext::at(2.0), &lot_area);
        let p = animator.prepare(FrameContext::at(3.0), &num_floors);
        assert_eq!(animator.epoch(), Some(2.0));
        assert_eq!(p.active_field, None);
    }

    #[test]
    fn onset_is_staggered_by_distance() {
        assert_eq!(onset_ms(0.0, 1000.0, 500.0), 500.0);
        assert_eq!(onset_ms(1.0, 1000.0, 500.0), 1500.0);
        let near = onset_ms(0.25, 1000.0, 0.0);
        let far = onset_ms(0.81, 1000.0, 0.0);
        assert!((near - 125.0).abs() < 1e-3);
        assert!((far - 729.0).abs() < 1e-3);
    }

    #[test]
    fn blend_waits_for_onset() {
        let cur = Vec3::ZERO;
        let target = Vec3::ONE;
        // onset at 1000 + 1000 * 0.25^1.5 = 1125
        let before = params(Some(ColorCodeField::YearBuilt), 1124.0, 1000.0);
        assert_eq!(blend_color(cur, target, 0.25, &before), cur);
        let after = params(Some(ColorCodeField::YearBuilt), 1126.0, 1000.0);
        assert_eq!(blend_color(cur, target, 0.25, &after), Vec3::splat(0.5));
    }

    #[test]
    fn pass_targets_selected_slot_and_zeroes_padding() {
        use crate::encoder::MetadataEncoder;
        use footprint_common::{EntityMetadata, RawValue};
        use footprint_palette::ColorMapper;

        let entities = vec![
            Some(EntityMetadata::new().with("BldgClass", RawValue::from("A1"))),
            Some(EntityMetadata::new().with("BldgClass", RawValue::from("D1"))),
        ];
        let encoded = MetadataEncoder::default()
            .encode(&entities, &mut ColorMapper::new())
            .unwrap();
        let layout = encoded.layout;
        let current = vec![[9u8; 4]; layout.texel_count()];
        let mut next = vec![[0u8; 4]; layout.texel_count()];

        let mut p = params(Some(ColorCodeField::BldgClass), 10.0, 0.0);
        p.animation_speed = 1.0;
        blend_pass(&layout, &encoded.texture, &current, &mut next, &p);

        assert_eq!(next[0], [255, 0, 255, 0]);
        assert_eq!(next[3], [0, 0, 255, 0]);
        for flat in [1, 2, 4, 5, 6, 20, layout.texel_count() - 1] {
            assert_eq!(next[flat], [0; 4], "texel {flat} should be zero");
        }
    }

    #[test]
    fn unknown_field_fades_to_black() {
        use crate::encoder::MetadataEncoder;
        use footprint_palette::ColorMapper;

        let encoded = MetadataEncoder::default()
            .encode(&[None], &mut ColorMapper::new())
            .unwrap();
        let layout = encoded.layout;
        let current = vec![[200u8, 100, 50, 0]; layout.texel_count()];
        let mut next = vec![[0u8; 4]; layout.texel_count()];

        blend_pass(&layout, &encoded.texture, &current, &mut next, &params(None, 10.0, 0.0));
        assert_eq!(next[0], [100, 50, 25, 0]);
    }

    #[test]
    fn nan_speed_writes_black() {
        use crate::encoder::MetadataEncoder;
        use footprint_palette::ColorMapper;

        let encoded = MetadataEncoder::default()
            .encode(&[None], &mut ColorMapper::new())
            .unwrap();
        let layout = encoded.layout;
        let current = vec![[200u8, 100, 50, 0]; layout.texel_count()];
        let mut next = vec![[1u8; 4]; layout.texel_count()];

        let mut p = params(Some(ColorCodeField::YearBuilt), 10.0, 0.0);
        p.animation_speed = f32::NAN;
        blend_pass(&layout, &encoded.texture, &current, &mut next, &p);
        assert_eq!(next[0], [0, 0, 0, 0]);
    }
}
