//! Palette: maps raw metadata values to normalized RGB target colors.
//!
//! # Invariants
//! - Mapping is pure apart from the injected category counter.
//! - Absent or unrecognized values map to [`NEUTRAL_GRAY`]; years before the
//!   scale domain map to [`EXCLUDED`] black.

mod counter;
mod mapper;
mod scale;

pub use counter::{CategoryCounter, CategoryTally, NoopCounter};
pub use mapper::{
    BLDG_CLASS_A, BLDG_CLASS_B, BLDG_CLASS_C, BLDG_CLASS_D, BLDG_CLASS_R, BLDG_CLASS_S,
    ColorMapper, EXCLUDED, NEUTRAL_GRAY, ZONE_COMMERCIAL, ZONE_MANUFACTURING, ZONE_PARK,
    ZONE_RESIDENTIAL,
};
pub use scale::{SequentialScale, YEAR_DOMAIN};

pub fn crate_info() -> &'static str {
    "footprint-palette v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("palette"));
    }
}
