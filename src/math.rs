/// `ln(sqrt(2π))`.
pub(crate) const LN_SQRT_2PI: f64 = 0.918_938_533_204_672_7;

const STIRLING_CUTOFF: u64 = 256;

/// `ln(k!)`, exact summation for small `k` and a Stirling series above that.
pub(crate) fn ln_factorial(k: u64) -> f64 {
    if k < 2 {
        return 0.;
    }
    if k <= STIRLING_CUTOFF {
        return (2..=k).map(|i| (i as f64).ln()).sum();
    }
    let n = k as f64;
    let inv = 1. / n;
    let inv2 = inv * inv;
    n * n.ln() - n + LN_SQRT_2PI + 0.5 * n.ln() + inv / 12. - inv * inv2 / 360.
        + inv * inv2 * inv2 / 1260.
}

/// Column-major coordinates (zero-based) of the flat position `pos`.
pub(crate) fn column_major_coords(mut pos: usize, dims: &[usize], out: &mut [usize]) {
    assert!(out.len() == dims.len());
    for (c, &d) in out.iter_mut().zip(dims) {
        *c = pos % d;
        pos /= d;
    }
}

/// Inverse of `column_major_coords`. `None` if any coordinate is out of range.
pub(crate) fn column_major_pos(coords: &[usize], dims: &[usize]) -> Option<usize> {
    if coords.len() != dims.len() {
        return None;
    }
    let mut pos = 0;
    let mut stride = 1;
    for (&c, &d) in coords.iter().zip(dims) {
        if c >= d {
            return None;
        }
        pos = c.checked_mul(stride)?.checked_add(pos)?;
        stride = stride.saturating_mul(d);
    }
    Some(pos)
}
