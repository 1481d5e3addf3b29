use crate::counter::{CategoryCounter, NoopCounter};
use crate::scale::SequentialScale;
use footprint_common::{ColorCodeField, RawValue};
use glam::Vec3;

/// Color for absent, null or unrecognized values.
pub const NEUTRAL_GRAY: Vec3 = Vec3::splat(0.4);
/// Sentinel for years before the scale domain.
pub const EXCLUDED: Vec3 = Vec3::ZERO;

const fn rgb256(r: f32, g: f32, b: f32) -> Vec3 {
    Vec3::new(r / 256.0, g / 256.0, b / 256.0)
}

// Building class, by first character.
pub const BLDG_CLASS_A: Vec3 = rgb256(256.0, 0.0, 256.0); // one family dwellings
pub const BLDG_CLASS_B: Vec3 = rgb256(0.0, 256.0, 256.0); // two family dwellings
pub const BLDG_CLASS_C: Vec3 = rgb256(256.0, 256.0, 0.0); // walk up apartments
pub const BLDG_CLASS_D: Vec3 = rgb256(0.0, 0.0, 256.0); // elevator apartments
pub const BLDG_CLASS_R: Vec3 = rgb256(0.0, 256.0, 0.0); // condominiums
pub const BLDG_CLASS_S: Vec3 = rgb256(256.0, 0.0, 0.0); // residence, multiple use

// Zoning district.
pub const ZONE_RESIDENTIAL: Vec3 = rgb256(49.0, 163.0, 84.0);
pub const ZONE_COMMERCIAL: Vec3 = rgb256(49.0, 130.0, 189.0);
pub const ZONE_MANUFACTURING: Vec3 = rgb256(254.0, 178.0, 76.0);
pub const ZONE_PARK: Vec3 = rgb256(229.0, 245.0, 224.0);

/// Second characters accepted for condominium (`R`) building classes.
const CONDO_SUBCLASSES: [char; 9] = ['1', '2', '3', '4', '6', '9', 'D', 'M', 'R'];

/// Maps raw metadata values to target colors.
///
/// Building-class classifications are reported to the injected counter.
#[derive(Debug, Clone)]
pub struct ColorMapper<C = NoopCounter> {
    counter: C,
    year_scale: SequentialScale,
}

impl ColorMapper<NoopCounter> {
    pub fn new() -> Self {
        Self::with_counter(NoopCounter)
    }
}

impl Default for ColorMapper<NoopCounter> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: CategoryCounter> ColorMapper<C> {
    pub fn with_counter(counter: C) -> Self {
        Self {
            counter,
            year_scale: SequentialScale::year_built(),
        }
    }

    pub fn counter(&self) -> &C {
        &self.counter
    }

    pub fn into_counter(self) -> C {
        self.counter
    }

    /// Target color of `value` under `field`. `None` means the value is absent.
    pub fn map(&mut self, field: ColorCodeField, value: Option<&RawValue>) -> Vec3 {
        let Some(value) = value else {
            return NEUTRAL_GRAY;
        };
        match field {
            ColorCodeField::YearBuilt => value
                .as_number()
                .map_or(NEUTRAL_GRAY, |year| self.year_built(year)),
            ColorCodeField::ZoneDist1 => value.as_text().map_or(NEUTRAL_GRAY, zone_dist),
            ColorCodeField::BldgClass => match value.as_text() {
                Some(class) => {
                    self.counter.record(ColorCodeField::BldgClass, class);
                    bldg_class(class)
                }
                None => NEUTRAL_GRAY,
            },
        }
    }

    /// Year-built color. Years before the domain minimum are [`EXCLUDED`].
    pub fn year_built(&self, year: f64) -> Vec3 {
        if year.is_nan() {
            return NEUTRAL_GRAY;
        }
        let (_, earliest) = self.year_scale.domain();
        if year < earliest {
            return EXCLUDED;
        }
        self.year_scale.sample(year)
    }
}

/// Building-class color, classified by first character.
pub fn bldg_class(class: &str) -> Vec3 {
    let mut chars = class.chars();
    match chars.next() {
        Some('A') => BLDG_CLASS_A,
        Some('B') => BLDG_CLASS_B,
        Some('C') => BLDG_CLASS_C,
        Some('D') => BLDG_CLASS_D,
        Some('R') => match chars.next() {
            Some(sub) if CONDO_SUBCLASSES.contains(&sub) => BLDG_CLASS_R,
            _ => NEUTRAL_GRAY,
        },
        Some('S') => BLDG_CLASS_S,
        _ => NEUTRAL_GRAY,
    }
}

/// Zoning-district color, classified by first character or the `PARK` prefix.
pub fn zone_dist(zone: &str) -> Vec3 {
    match zone.chars().next() {
        Some('R') => ZONE_RESIDENTIAL,
        Some('C') => ZONE_COMMERCIAL,
        Some('M') => ZONE_MANUFACTURING,
        _ if zone.starts_with("PARK") => ZONE_PARK,
        _ => NEUTRAL_GRAY,
    }
}
