//! Octahedral mapping of unit vectors onto the unit square.
//!
//! The unit sphere is projected onto the octahedron `|x| + |y| + |z| = 1`, the
//! lower half is folded over the upper half, and the result is flattened onto
//! `[0, 1]²`. Precision is roughly uniform over the sphere.

use super::{Encoding, Vec2, Vec3};

/// Unit [`Vec3`] to [`Vec2`] in `[0, 1]²`.
#[derive(Debug, Clone, Copy)]
pub struct Octahedral;

/// `1.0` for zero of either sign, so directions on the fold seam (such as
/// straight down) do not collapse onto the center of the square.
fn sign_not_zero(v: f32) -> f32 {
    if v < 0.0 {
        -1.0
    } else {
        1.0
    }
}

impl Encoding<Vec3, Vec2> for Octahedral {
    fn encode(value: Vec3) -> Vec2 {
        let abs = value.abs();
        let scaled = value * (1.0 / (abs.x + abs.y + abs.z));

        let folded = if scaled.y >= 0.0 {
            Vec2::new(scaled.x, scaled.z)
        } else {
            Vec2::new(
                (1.0 - scaled.z.abs()) * sign_not_zero(value.x),
                (1.0 - scaled.x.abs()) * sign_not_zero(value.z),
            )
        };

        folded * 0.5 + Vec2::splat(0.5)
    }

    fn decode(value: Vec2) -> Vec3 {
        let mapped = value * 2.0 - Vec2::splat(1.0);
        let mut result = Vec3::new(mapped.x, 1.0 - mapped.x.abs() - mapped.y.abs(), mapped.y);

        if result.y < 0.0 {
            result.x += result.y * sign_not_zero(result.x);
            result.z += result.y * sign_not_zero(result.z);
        }

        result.normalize()
    }
}
