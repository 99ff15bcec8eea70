//! Crossfades and 2D blends.

/*
Interpolation
=============

Both blends here are weighted sums whose weights add to 1.0, so blending
two (or four) signals never boosts the overall level.

Linear
------

    output = from × (1 - t) + to × t

Written as two products rather than `from + (to - from) × t` so that the end
points are exact: t = 0 gives `from` bit for bit, t = 1 gives `to`.

Callers that feed `t` from a modulation sum clamp it first; an unclamped
t = 1.5 would extrapolate past `to`.

Bilinear
--------

Four corner values span a square. The position (x, y) is given in [-1, 1]
on both axes and mapped onto [0, 1]:

          x = -1              x = +1
   y = -1  top_left ───────── top_right
              │                  │
              │      (x, y)      │
              │                  │
   y = +1  bottom_left ─────── bottom_right

    top    = lerp(top_left,    top_right,    u)
    bottom = lerp(bottom_left, bottom_right, u)
    output = lerp(top, bottom, v)

    where u = (x + 1) / 2, v = (y + 1) / 2

At each corner the output equals that corner exactly. At the centre it is
the mean of all four.
*/

/// Linear interpolation from `from` to `to`. `t` is not clamped.
#[inline]
pub fn interpolate(from: f32, to: f32, t: f32) -> f32 {
    from * (1.0 - t) + to * t
}

/// Clamp a blend fraction into [0, 1]. NaN maps to 0.
#[inline]
pub fn clamp_fraction(t: f32) -> f32 {
    if t.is_nan() {
        0.0
    } else {
        t.clamp(0.0, 1.0)
    }
}

/// Map a position in [-1, 1] to a clamped fraction in [0, 1].
#[inline]
pub fn position_to_fraction(position: f32) -> f32 {
    clamp_fraction((position + 1.0) * 0.5)
}

/// Blend four corners at position (x, y), both in [-1, 1] and clamped.
#[inline]
pub fn bilinear(
    top_left: f32,
    top_right: f32,
    bottom_left: f32,
    bottom_right: f32,
    x: f32,
    y: f32,
) -> f32 {
    let u = position_to_fraction(x);
    let v = position_to_fraction(y);

    let top = interpolate(top_left, top_right, u);
    let bottom = interpolate(bottom_left, bottom_right, u);
    interpolate(top, bottom, v)
}

/// Add signal B into signal A in-place (summing).
///
/// ⚠️ WARNING: Can exceed [-1.0, +1.0] range!
#[inline]
pub fn sum_in_place(a: &mut [f32], b: &[f32]) {
    debug_assert_eq!(a.len(), b.len());

    for (sa, &sb) in a.iter_mut().zip(b.iter()) {
        *sa += sb;
    }
}
