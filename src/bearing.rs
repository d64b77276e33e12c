//! Circular bearing arithmetic.
//!
//! Bearings are compass headings in degrees, clockwise from north. All
//! comparisons happen in `[0, 360)` after a true (floored) modulo, so
//! `-721` and `359` are the same heading.

/// Map an angle in degrees into `[0, 360)`.
///
/// ```
/// use probematch::bearing::normalize_angle;
/// assert_eq!(normalize_angle(-721.0), 359.0);
/// assert_eq!(normalize_angle(720.0), 0.0);
/// ```
pub fn normalize_angle(angle: f64) -> f64 {
    let a = angle.rem_euclid(360.0);
    // rem_euclid rounds tiny negatives up to exactly 360
    if a >= 360.0 { 0.0 } else { a }
}

/// Check whether `bearing` lies within `range` degrees of `base`.
///
/// The acceptance window is `[base - range, base + range]` on the circle and
/// may cross the 0/360 seam. With `allow_reverse`, a bearing that fails the
/// forward test gets one more chance against `base + 180`, so a probe
/// travelling the opposite way along a segment still matches.
///
/// A `range` of 0 accepts only the exact heading; a negative `range` is an
/// empty window. Window ends are normalized like any other angle, so a
/// `range` of exactly 180 covers the whole circle while larger ranges wrap
/// around: `range = 190` gives the window `[170, 190]`.
///
/// # Example
/// ```
/// use probematch::bearing::compare_bearing;
///
/// assert!(compare_bearing(5.0, 359.0, 10.0, false));
/// assert!(!compare_bearing(5.0, 354.0, 10.0, false));
/// assert!(compare_bearing(3.0, 185.0, 8.0, true));
/// ```
pub fn compare_bearing(base: f64, bearing: f64, range: f64, allow_reverse: bool) -> bool {
    let bearing = normalize_angle(bearing);
    let base = normalize_angle(base);

    if within_window(base, bearing, range) {
        return true;
    }

    allow_reverse && within_window(normalize_angle(base + 180.0), bearing, range)
}

fn within_window(base: f64, bearing: f64, range: f64) -> bool {
    if range < 0.0 {
        return false;
    }
    if range == 0.0 {
        return bearing == base;
    }

    let min = normalize_angle(base - range);
    let max = normalize_angle(base + range);

    if min < max {
        min <= bearing && bearing <= max
    } else {
        bearing >= min || bearing <= max
    }
}
