// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Math utilities

/// Fragment count used when no special variable yields one
pub const DEFAULT_FRAGMENTS: usize = 20;

/// Check if two floats are approximately equal
pub fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

/// Sine of an angle in degrees, exact at multiples of 90
pub fn sin_deg(deg: f64) -> f64 {
    let r = deg.rem_euclid(360.0);
    match r {
        x if x == 0.0 || x == 180.0 => 0.0,
        x if x == 90.0 => 1.0,
        x if x == 270.0 => -1.0,
        _ => deg.to_radians().sin(),
    }
}

/// Cosine of an angle in degrees, exact at multiples of 90
pub fn cos_deg(deg: f64) -> f64 {
    sin_deg(deg + 90.0)
}

/// Tangent of an angle in degrees
pub fn tan_deg(deg: f64) -> f64 {
    let r = deg.rem_euclid(180.0);
    if r == 0.0 {
        0.0
    } else if r == 90.0 {
        f64::INFINITY
    } else {
        deg.to_radians().tan()
    }
}

/// Circle subdivision from the `$fn`, `$fa` and `$fs` special variables
///
/// `$fn >= 3` wins; otherwise the larger of the angle and size limits,
/// falling back to [`DEFAULT_FRAGMENTS`]. Never less than 3.
pub fn fragments(radius: f64, fn_: f64, fa: f64, fs: f64) -> usize {
    if fn_ >= 3.0 {
        return fn_ as usize;
    }
    let by_angle = if fa > 0.1 { (360.0 / fa) as i64 } else { -1 };
    let by_size = if fs >= 0.01 {
        (std::f64::consts::PI * radius * 2.0 / fs) as i64
    } else {
        -1
    };
    let n = by_angle.max(by_size);
    if n > 0 {
        (n as usize).max(3)
    } else {
        DEFAULT_FRAGMENTS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approx_eq() {
        assert!(approx_eq(1.0, 1.0001, 0.001));
        assert!(!approx_eq(1.0, 1.1, 0.001));
    }

    #[test]
    fn test_degree_trig() {
        assert_eq!(sin_deg(180.0), 0.0);
        assert_eq!(cos_deg(90.0), 0.0);
        assert_eq!(cos_deg(-180.0), -1.0);
        assert!(approx_eq(sin_deg(30.0), 0.5, 1e-12));
        assert!(approx_eq(tan_deg(45.0), 1.0, 1e-12));
    }

    #[test]
    fn test_fragments() {
        assert_eq!(fragments(1.0, 16.0, 12.0, 2.0), 16);
        // Defaults: 360/12 beats 2*pi*r/2 for small radii
        assert_eq!(fragments(1.0, 0.0, 12.0, 2.0), 30);
        assert_eq!(fragments(100.0, 0.0, 12.0, 2.0), 314);
        assert_eq!(fragments(1.0, 0.0, 0.0, 0.0), DEFAULT_FRAGMENTS);
        assert_eq!(fragments(0.001, 0.0, 200.0, 2.0), 3);
    }
}
