//! Viridis colour scale

/// Viridis anchors at evenly spaced positions in [0, 1]
const VIRIDIS: [[u8; 3]; 9] = [
    [68, 1, 84],
    [71, 44, 122],
    [59, 81, 139],
    [44, 113, 142],
    [33, 144, 141],
    [39, 173, 129],
    [92, 200, 99],
    [170, 220, 50],
    [253, 231, 37],
];

/// RGB for `t` in [0, 1]; values outside are clamped, NaN maps to the low end
pub fn viridis(t: f64) -> [u8; 3] {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };

    let pos = t * (VIRIDIS.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = (lo + 1).min(VIRIDIS.len() - 1);
    let frac = pos - lo as f64;

    let mut rgb = [0u8; 3];
    for (c, out) in rgb.iter_mut().enumerate() {
        let a = VIRIDIS[lo][c] as f64;
        let b = VIRIDIS[hi][c] as f64;
        *out = (a + (b - a) * frac).round() as u8;
    }
    rgb
}

/// Position of `value` in `[lo, hi]`, 0.5 for a flat range
pub fn normalise(value: f64, lo: f64, hi: f64) -> f64 {
    if hi > lo {
        (value - lo) / (hi - lo)
    } else {
        0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viridis_endpoints() {
        assert_eq!(viridis(0.0), [68, 1, 84]);
        assert_eq!(viridis(1.0), [253, 231, 37]);
        assert_eq!(viridis(-3.0), viridis(0.0));
        assert_eq!(viridis(7.0), viridis(1.0));
        assert_eq!(viridis(f64::NAN), viridis(0.0));
        assert_eq!(viridis(0.5), [33, 144, 141]);
    }

    #[test]
    fn test_normalise() {
        assert!((normalise(0.3, 0.2, 0.4) - 0.5).abs() < 1e-12);
        assert_eq!(normalise(0.5, 0.5, 0.5), 0.5);
    }
}
