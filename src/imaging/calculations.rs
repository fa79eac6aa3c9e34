//! Pure calculation functions for image dimensions and placement.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate the target size of a resize.
///
/// Precedence:
/// 1. `percent != 0` → both source dimensions scaled by `percent / 100`,
///    `width` and `height` ignored.
/// 2. Exactly one of `width`/`height` non-zero → the other is derived from
///    the source aspect ratio.
/// 3. Both non-zero → exactly `(width, height)`.
/// 4. Nothing set → `None` (no-op).
///
/// Derived dimensions are rounded to the nearest pixel and never below 1.
///
/// # Examples
/// ```
/// # use imgconv::imaging::calculate_resize_dimensions;
/// assert_eq!(calculate_resize_dimensions((100, 50), 0, 0, 50.0), Some((50, 25)));
/// assert_eq!(calculate_resize_dimensions((100, 50), 40, 0, 0.0), Some((40, 20)));
/// assert_eq!(calculate_resize_dimensions((100, 50), 0, 0, 0.0), None);
/// ```
pub fn calculate_resize_dimensions(
    source: (u32, u32),
    width: u32,
    height: u32,
    percent: f64,
) -> Option<(u32, u32)> {
    let (src_w, src_h) = source;

    if percent != 0.0 {
        let scale = percent / 100.0;
        return Some((scale_edge(src_w, scale), scale_edge(src_h, scale)));
    }

    match (width, height) {
        (0, 0) => None,
        (w, 0) => {
            let h = if src_w == 0 {
                src_h
            } else {
                (w as f64 * src_h as f64 / src_w as f64).round() as u32
            };
            Some((w, h.max(1)))
        }
        (0, h) => {
            let w = if src_h == 0 {
                src_w
            } else {
                (h as f64 * src_w as f64 / src_h as f64).round() as u32
            };
            Some((w.max(1), h))
        }
        (w, h) => Some((w, h)),
    }
}

fn scale_edge(edge: u32, scale: f64) -> u32 {
    ((edge as f64 * scale).round() as u32).max(1)
}

/// Decide which axis of `base` a watermark `mark` is fitted against.
///
/// Returns true iff `base.w / base.h < mark.w / mark.h`, i.e. the base is
/// narrower relative to the mark, so the mark must be fitted to the base's
/// width. Equal aspect ratios return false. Computed by cross-multiplication
/// so the result is exact.
pub fn calc_resize_xy(base: (u32, u32), mark: (u32, u32)) -> bool {
    let (base_w, base_h) = (base.0 as u64, base.1 as u64);
    let (mark_w, mark_h) = (mark.0 as u64, mark.1 as u64);
    base_w * mark_h < mark_w * base_h
}

/// Dimensions of a mark auto-fitted onto `base`.
///
/// The mark is scaled, aspect preserved, to half the base width when
/// [`calc_resize_xy`] is true and to half the base height otherwise.
pub fn calculate_fit_dimensions(base: (u32, u32), mark: (u32, u32)) -> (u32, u32) {
    let (base_w, base_h) = base;
    let target = if calc_resize_xy(base, mark) {
        calculate_resize_dimensions(mark, (base_w / 2).max(1), 0, 0.0)
    } else {
        calculate_resize_dimensions(mark, 0, (base_h / 2).max(1), 0.0)
    };
    target.unwrap_or(mark)
}

/// Largest offset that keeps a `mark`-sized span inside a `base`-sized one.
///
/// Zero when the mark is larger than the base on that axis.
pub fn max_offset(base: u32, mark: u32) -> u32 {
    base.saturating_sub(mark)
}

/// Clip a requested offset into `[0, max_offset(base, mark)]`.
pub fn clamp_offset(offset: i64, base: u32, mark: u32) -> u32 {
    offset.clamp(0, max_offset(base, mark) as i64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // calculate_resize_dimensions tests
    // =========================================================================

    #[test]
    fn resize_percent_scales_both() {
        assert_eq!(
            calculate_resize_dimensions((100, 50), 0, 0, 50.0),
            Some((50, 25))
        );
    }

    #[test]
    fn resize_percent_ignores_width_and_height() {
        assert_eq!(
            calculate_resize_dimensions((100, 50), 10, 10, 200.0),
            Some((200, 100))
        );
    }

    #[test]
    fn resize_percent_rounds_to_nearest() {
        // 33 * 0.5 = 16.5 → 17, 11 * 0.5 = 5.5 → 6
        assert_eq!(
            calculate_resize_dimensions((33, 11), 0, 0, 50.0),
            Some((17, 6))
        );
    }

    #[test]
    fn resize_percent_never_below_one() {
        assert_eq!(
            calculate_resize_dimensions((10, 3), 0, 0, 1.0),
            Some((1, 1))
        );
    }

    #[test]
    fn resize_width_only_derives_height() {
        // 800x600 → width 400 → height 300
        assert_eq!(
            calculate_resize_dimensions((800, 600), 400, 0, 0.0),
            Some((400, 300))
        );
    }

    #[test]
    fn resize_height_only_derives_width() {
        // 800x600 → height 150 → width 200
        assert_eq!(
            calculate_resize_dimensions((800, 600), 0, 150, 0.0),
            Some((200, 150))
        );
    }

    #[test]
    fn resize_both_is_exact() {
        assert_eq!(
            calculate_resize_dimensions((800, 600), 100, 100, 0.0),
            Some((100, 100))
        );
    }

    #[test]
    fn resize_nothing_set_is_noop() {
        assert_eq!(calculate_resize_dimensions((800, 600), 0, 0, 0.0), None);
    }

    #[test]
    fn resize_upscale() {
        assert_eq!(
            calculate_resize_dimensions((50, 25), 0, 100, 0.0),
            Some((200, 100))
        );
    }

    // =========================================================================
    // calc_resize_xy tests
    // =========================================================================

    #[test]
    fn resize_xy_landscape_base_square_mark() {
        assert!(!calc_resize_xy((100, 50), (200, 200)));
    }

    #[test]
    fn resize_xy_portrait_base_square_mark() {
        assert!(calc_resize_xy((50, 100), (200, 200)));
    }

    #[test]
    fn resize_xy_equal_ratio_is_false() {
        assert!(!calc_resize_xy((100, 50), (200, 100)));
        assert!(!calc_resize_xy((64, 64), (3, 3)));
    }

    #[test]
    fn resize_xy_wide_mark_on_square_base() {
        assert!(calc_resize_xy((100, 100), (300, 100)));
    }

    // =========================================================================
    // calculate_fit_dimensions tests
    // =========================================================================

    #[test]
    fn fit_on_portrait_base_uses_half_width() {
        // base 50x100 narrower than square mark → mark width = 25
        assert_eq!(calculate_fit_dimensions((50, 100), (200, 200)), (25, 25));
    }

    #[test]
    fn fit_on_landscape_base_uses_half_height() {
        // base 100x50 wider than square mark → mark height = 25
        assert_eq!(calculate_fit_dimensions((100, 50), (200, 200)), (25, 25));
    }

    #[test]
    fn fit_preserves_mark_aspect() {
        // square base, 4:1 mark → width-constrained: 50 wide, 13 high (12.5 rounds up)
        assert_eq!(calculate_fit_dimensions((100, 100), (400, 100)), (50, 13));
    }

    // =========================================================================
    // offset tests
    // =========================================================================

    #[test]
    fn max_offset_is_zero_when_mark_larger() {
        assert_eq!(max_offset(10, 20), 0);
        assert_eq!(max_offset(20, 20), 0);
        assert_eq!(max_offset(20, 5), 15);
    }

    #[test]
    fn clamp_offset_clips_both_ends() {
        assert_eq!(clamp_offset(-5, 100, 10), 0);
        assert_eq!(clamp_offset(5, 100, 10), 5);
        assert_eq!(clamp_offset(95, 100, 10), 90);
        assert_eq!(clamp_offset(3, 4, 8), 0);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
