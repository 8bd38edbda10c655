//! Small column-major matrix / quaternion helpers.
//!
//! Column-major like GLSL: `m[12..15]` holds the translation.

pub type Vec3 = [f32; 3];

/// Quaternion, xyzw.
pub type Quat = [f32; 4];

pub const QUAT_IDENTITY: Quat = [0.0, 0.0, 0.0, 1.0];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4(pub [f32; 16]);

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4([
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    ]);

    #[cfg(test)]
    pub fn from_translation(t: Vec3) -> Self {
        let mut m = Self::IDENTITY;
        m.0[12] = t[0];
        m.0[13] = t[1];
        m.0[14] = t[2];
        m
    }

    /// Compose translation * rotation * scale.
    pub fn from_trs(t: Vec3, r: Quat, s: Vec3) -> Self {
        let [x, y, z, w] = r;
        let (x2, y2, z2) = (x + x, y + y, z + z);
        let (xx, xy, xz) = (x * x2, x * y2, x * z2);
        let (yy, yz, zz) = (y * y2, y * z2, z * z2);
        let (wx, wy, wz) = (w * x2, w * y2, w * z2);

        Self([
            (1.0 - (yy + zz)) * s[0],
            (xy + wz) * s[0],
            (xz - wy) * s[0],
            0.0,
            (xy - wz) * s[1],
            (1.0 - (xx + zz)) * s[1],
            (yz + wx) * s[1],
            0.0,
            (xz + wy) * s[2],
            (yz - wx) * s[2],
            (1.0 - (xx + yy)) * s[2],
            0.0,
            t[0],
            t[1],
            t[2],
            1.0,
        ])
    }

    pub fn from_rotation_x(radians: f32) -> Self {
        let (s, c) = radians.sin_cos();
        Self([
            1.0, 0.0, 0.0, 0.0, //
            0.0, c, s, 0.0, //
            0.0, -s, c, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    /// Translation column.
    pub fn translation(&self) -> Vec3 {
        [self.0[12], self.0[13], self.0[14]]
    }

    pub fn mul(&self, rhs: &Mat4) -> Mat4 {
        let a = &self.0;
        let b = &rhs.0;
        let mut out = [0.0f32; 16];
        for col in 0..4 {
            for row in 0..4 {
                out[col * 4 + row] = (0..4).map(|k| a[k * 4 + row] * b[col * 4 + k]).sum();
            }
        }
        Mat4(out)
    }

    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        let m = &self.0;
        [
            m[0] * p[0] + m[4] * p[1] + m[8] * p[2] + m[12],
            m[1] * p[0] + m[5] * p[1] + m[9] * p[2] + m[13],
            m[2] * p[0] + m[6] * p[1] + m[10] * p[2] + m[14],
        ]
    }
}

pub fn quat_mul(a: Quat, b: Quat) -> Quat {
    let (ax, ay, az, aw) = (a[0], a[1], a[2], a[3]);
    let (bx, by, bz, bw) = (b[0], b[1], b[2], b[3]);
    [
        aw * bx + ax * bw + ay * bz - az * by,
        aw * by - ax * bz + ay * bw + az * bx,
        aw * bz + ax * by - ay * bx + az * bw,
        aw * bw - ax * bx - ay * by - az * bz,
    ]
}

pub fn quat_from_axis_angle(axis: Vec3, radians: f32) -> Quat {
    let axis = normalize(axis);
    let (s, c) = (0.5 * radians).sin_cos();
    [axis[0] * s, axis[1] * s, axis[2] * s, c]
}

pub fn quat_rotate(q: Quat, v: Vec3) -> Vec3 {
    // v' = v + 2w(u x v) + 2(u x (u x v))
    let u = [q[0], q[1], q[2]];
    let t = scale(cross(u, v), 2.0);
    add(add(v, scale(t, q[3])), cross(u, t))
}

/// Shortest-arc rotation taking unit vector `from` onto unit vector `to`.
pub fn quat_from_unit_vectors(from: Vec3, to: Vec3) -> Quat {
    let from = normalize(from);
    let to = normalize(to);
    let d = dot(from, to);

    if d < -0.999_999 {
        // Opposite: rotate half a turn around any perpendicular axis.
        let mut axis = cross([1.0, 0.0, 0.0], from);
        if dot(axis, axis) < 1e-6 {
            axis = cross([0.0, 1.0, 0.0], from);
        }
        return quat_from_axis_angle(axis, std::f32::consts::PI);
    }

    let c = cross(from, to);
    let q = [c[0], c[1], c[2], 1.0 + d];
    let len = q.iter().map(|v| v * v).sum::<f32>().sqrt();
    [q[0] / len, q[1] / len, q[2] / len, q[3] / len]
}

pub fn add(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

pub fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub fn scale(a: Vec3, s: f32) -> Vec3 {
    [a[0] * s, a[1] * s, a[2] * s]
}

pub fn dot(a: Vec3, b: Vec3) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

pub fn normalize(a: Vec3) -> Vec3 {
    let len = dot(a, a).sqrt();
    if len <= f32::EPSILON {
        return a;
    }
    scale(a, 1.0 / len)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-5)
    }

    #[test]
    fn trs_translation_lands_in_last_column() {
        let m = Mat4::from_trs([1.0, 2.0, 3.0], QUAT_IDENTITY, [1.0; 3]);
        assert_eq!(m.translation(), [1.0, 2.0, 3.0]);
        assert_eq!(m.transform_point([0.0; 3]), [1.0, 2.0, 3.0]);
    }

    #[test]
    fn rotate_y_axis_onto_z() {
        let q = quat_from_unit_vectors([0.0, 1.0, 0.0], [0.0, 0.0, 1.0]);
        assert!(approx(quat_rotate(q, [0.0, 1.0, 0.0]), [0.0, 0.0, 1.0]));

        let m = Mat4::from_trs([0.0; 3], q, [1.0; 3]);
        assert!(approx(m.transform_point([0.0, 1.0, 0.0]), [0.0, 0.0, 1.0]));
    }

    #[test]
    fn opposite_vectors_still_rotate() {
        let q = quat_from_unit_vectors([0.0, 1.0, 0.0], [0.0, -1.0, 0.0]);
        assert!(approx(quat_rotate(q, [0.0, 1.0, 0.0]), [0.0, -1.0, 0.0]));
    }

    #[test]
    fn mul_composes_translations() {
        let a = Mat4::from_translation([1.0, 0.0, 0.0]);
        let b = Mat4::from_translation([0.0, 2.0, 0.0]);
        assert_eq!(a.mul(&b).translation(), [1.0, 2.0, 0.0]);
    }
}
