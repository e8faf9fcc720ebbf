use glam::{Affine2, Mat2, Vec2};

use crate::config::TransformFormat;

/// Encode a 2D affine as two vec4 rows.
///
/// Layout: `[m00, m01, 0, tx, m10, m11, 0, ty]` where `m` is row-major,
/// so a shader reconstructs `p' = (dot(row0.xy, p) + row0.w, dot(row1.xy, p) + row1.w)`.
pub fn encode_transform_2d(t: Affine2) -> [f32; 8] {
    let m = t.matrix2;
    [
        m.x_axis.x,
        m.y_axis.x,
        0.0,
        t.translation.x,
        m.x_axis.y,
        m.y_axis.y,
        0.0,
        t.translation.y,
    ]
}

/// Encode a 2D affine as three vec4 rows, embedded in the XY plane.
pub fn encode_transform_3d(t: Affine2) -> [f32; 12] {
    let m = t.matrix2;
    [
        m.x_axis.x,
        m.y_axis.x,
        0.0,
        t.translation.x,
        m.x_axis.y,
        m.y_axis.y,
        0.0,
        t.translation.y,
        0.0,
        0.0,
        1.0,
        0.0,
    ]
}

/// Write `t` into the leading transform floats of a record.
///
/// `out` must hold at least `format.floats()` values.
pub fn encode_transform(format: TransformFormat, t: Affine2, out: &mut [f32]) {
    match format {
        TransformFormat::Transform2D => out[..8].copy_from_slice(&encode_transform_2d(t)),
        TransformFormat::Transform3D => out[..12].copy_from_slice(&encode_transform_3d(t)),
    }
}

/// Read the 2D affine back out of an encoded record.
///
/// Both formats share the first two rows, so decoding only looks at those.
pub fn decode_transform(floats: &[f32]) -> Affine2 {
    let m = Mat2::from_cols(
        Vec2::new(floats[0], floats[4]),
        Vec2::new(floats[1], floats[5]),
    );
    Affine2::from_mat2_translation(m, Vec2::new(floats[3], floats[7]))
}

/// Whether an encoded transform is the degenerate all-zero transform used
/// to hide an instance.
pub fn is_hidden_transform(floats: &[f32]) -> bool {
    floats.iter().all(|&f| f == 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_encoding() {
        assert_eq!(
            encode_transform_2d(Affine2::IDENTITY),
            [1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0]
        );
    }

    #[test]
    fn test_translation_lands_in_w() {
        let t = Affine2::from_translation(Vec2::new(3.0, -2.0));
        let e = encode_transform_2d(t);
        assert_eq!(e[3], 3.0);
        assert_eq!(e[7], -2.0);
    }

    #[test]
    fn test_rows_transform_point_like_glam() {
        let t = Affine2::from_angle_translation(0.7, Vec2::new(1.5, 4.0));
        let e = encode_transform_2d(t);
        let p = Vec2::new(2.0, -1.0);
        let expected = t.transform_point2(p);
        let x = e[0] * p.x + e[1] * p.y + e[3];
        let y = e[4] * p.x + e[5] * p.y + e[7];
        assert!((x - expected.x).abs() < 1e-5);
        assert!((y - expected.y).abs() < 1e-5);
    }

    #[test]
    fn test_decode_inverts_encode() {
        let t = Affine2::from_scale_angle_translation(Vec2::splat(2.0), 1.1, Vec2::new(-7.0, 9.0));
        for format in [TransformFormat::Transform2D, TransformFormat::Transform3D] {
            let mut out = [0.0f32; 12];
            encode_transform(format, t, &mut out);
            let back = decode_transform(&out);
            assert!(back.abs_diff_eq(t, 1e-6), "{format:?}");
        }
    }

    #[test]
    fn test_zero_transform_is_hidden() {
        assert!(is_hidden_transform(&encode_transform_2d(Affine2::ZERO)));
        assert!(!is_hidden_transform(&encode_transform_2d(Affine2::IDENTITY)));
    }

    #[test]
    fn test_3d_embeds_unit_z_row() {
        let e = encode_transform_3d(Affine2::IDENTITY);
        assert_eq!(&e[8..12], &[0.0, 0.0, 1.0, 0.0]);
    }
}
