use glam::Vec3;

/// Year-built domain `(start, end)`. The scale runs from the latest year at
/// `t = 0` to the earliest at `t = 1`.
pub const YEAR_DOMAIN: (f64, f64) = (2017.0, 1820.0);

/// Green-blue sequential scheme, light to dark, 8-bit sRGB stops.
const GN_BU: [[f64; 3]; 9] = [
    [247.0, 252.0, 240.0],
    [224.0, 243.0, 219.0],
    [204.0, 235.0, 197.0],
    [168.0, 221.0, 181.0],
    [123.0, 204.0, 196.0],
    [78.0, 179.0, 211.0],
    [43.0, 140.0, 190.0],
    [8.0, 104.0, 172.0],
    [8.0, 64.0, 129.0],
];

/// A continuous color scale: a linear domain mapped onto a uniform cubic
/// B-spline through a list of color stops.
#[derive(Debug, Clone, Copy)]
pub struct SequentialScale {
    domain: (f64, f64),
    stops: &'static [[f64; 3]],
}

impl SequentialScale {
    pub fn new(domain: (f64, f64), stops: &'static [[f64; 3]]) -> Self {
        assert!(stops.len() >= 2, "a scale needs at least two stops");
        Self { domain, stops }
    }

    /// The year-built scale over [`YEAR_DOMAIN`].
    pub fn year_built() -> Self {
        Self::new(YEAR_DOMAIN, &GN_BU)
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    /// Normalized position of `x` in the domain. Not clamped.
    pub fn normalize(&self, x: f64) -> f64 {
        let (d0, d1) = self.domain;
        (x - d0) / (d1 - d0)
    }

    /// Color at domain value `x`. Channels are rounded to 8 bits and divided
    /// by 256, matching how the categorical palettes are expressed.
    pub fn sample(&self, x: f64) -> Vec3 {
        let t = self.normalize(x);
        let channel = |c: usize| {
            let v = basis_spline(self.stops, c, t);
            let byte = if v.is_nan() { 0.0 } else { v.round().clamp(0.0, 255.0) };
            (byte / 256.0) as f32
        };
        Vec3::new(channel(0), channel(1), channel(2))
    }
}

/// Uniform cubic B-spline through channel `c` of `stops`, with `t` clamped to
/// `[0, 1]`. End segments reflect the neighbor so the curve passes through
/// the first and last stop exactly.
fn basis_spline(stops: &[[f64; 3]], c: usize, t: f64) -> f64 {
    let n = stops.len() - 1;
    let (t, i) = if t.is_nan() || t <= 0.0 {
        (0.0, 0)
    } else if t >= 1.0 {
        (1.0, n - 1)
    } else {
        (t, (t * n as f64).floor() as usize)
    };
    let v1 = stops[i][c];
    let v2 = stops[i + 1][c];
    let v0 = if i > 0 { stops[i - 1][c] } else { 2.0 * v1 - v2 };
    let v3 = if i < n - 1 { stops[i + 2][c] } else { 2.0 * v2 - v1 };
    basis((t - i as f64 / n as f64) * n as f64, v0, v1, v2, v3)
}

fn basis(t1: f64, v0: f64, v1: f64, v2: f64, v3: f64) -> f64 {
    let t2 = t1 * t1;
    let t3 = t2 * t1;
    ((1.0 - 3.0 * t1 + 3.0 * t2 - t3) * v0
        + (4.0 - 6.0 * t2 + 3.0 * t3) * v1
        + (1.0 + 3.0 * t1 + 3.0 * t2 - 3.0 * t3) * v2
        + t3 * v3)
        / 6.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgb256(r: f32, g: f32, b: f32) -> Vec3 {
        Vec3::new(r / 256.0, g / 256.0, b / 256.0)
    }

    #[test]
    fn endpoints_hit_first_and_last_stop() {
        let scale = SequentialScale::year_built();
        assert_eq!(scale.sample(2017.0), rgb256(247.0, 252.0, 240.0));
        assert_eq!(scale.sample(1820.0), rgb256(8.0, 64.0, 129.0));
    }

    #[test]
    fn out_of_domain_clamps_to_ends() {
        let scale = SequentialScale::year_built();
        assert_eq!(scale.sample(2030.0), scale.sample(2017.0));
        assert_eq!(scale.sample(1700.0), scale.sample(1820.0));
    }

    #[test]
    fn midpoint_blends_neighboring_stops() {
        let scale = SequentialScale::year_built();
        assert_eq!(scale.normalize(1918.5), 0.5);
        assert_eq!(scale.sample(1918.5), rgb256(123.0, 203.0, 196.0));
    }

    #[test]
    fn later_years_are_lighter() {
        let scale = SequentialScale::year_built();
        let old = scale.sample(1850.0);
        let new = scale.sample(2000.0);
        assert!(new.x + new.y + new.z > old.x + old.y + old.z);
    }
}
