// q_shared.rs — foundational math types shared by all modules

// ============================================================
// Basic types
// ============================================================

pub type Vec3 = [f32; 3];

// ============================================================
// Plane
// ============================================================

/// Axial plane types; anything >= PLANE_ANYX needs the general dot product.
pub const PLANE_X: u8 = 0;
pub const PLANE_Y: u8 = 1;
pub const PLANE_Z: u8 = 2;
pub const PLANE_ANYX: u8 = 3;

#[derive(Debug, Clone, Copy)]
pub struct CPlane {
    pub normal: Vec3,
    pub dist: f32,
    pub plane_type: u8,
    pub signbits: u8, // signx + (signy<<1) + (signz<<2), for fast box tests
}

impl Default for CPlane {
    fn default() -> Self {
        Self {
            normal: [0.0; 3],
            dist: 0.0,
            plane_type: 0,
            signbits: 0,
        }
    }
}

impl CPlane {
    /// Build a plane from a normal and distance, filling in the
    /// precomputed type and signbits fields.
    pub fn from_normal_dist(normal: Vec3, dist: f32) -> Self {
        let mut p = Self {
            normal,
            dist,
            plane_type: PLANE_ANYX,
            signbits: 0,
        };
        if normal[0] == 1.0 {
            p.plane_type = PLANE_X;
        } else if normal[1] == 1.0 {
            p.plane_type = PLANE_Y;
        } else if normal[2] == 1.0 {
            p.plane_type = PLANE_Z;
        }
        p.signbits = signbits_for_plane(&p);
        p
    }
}

pub fn signbits_for_plane(p: &CPlane) -> u8 {
    let mut bits = 0u8;
    for j in 0..3 {
        if p.normal[j] < 0.0 {
            bits |= 1 << j;
        }
    }
    bits
}

/// Returns 1, 2, or 1+2 for which side(s) of the plane the box is on.
pub fn box_on_plane_side(emins: &Vec3, emaxs: &Vec3, p: &CPlane) -> i32 {
    // fast axial cases
    if (p.plane_type as usize) < 3 {
        let t = p.plane_type as usize;
        if p.dist <= emins[t] {
            return 1;
        }
        if p.dist >= emaxs[t] {
            return 2;
        }
        return 3;
    }

    // general case: pick the near/far box corners from signbits
    let mut corner_max = [0.0f32; 3];
    let mut corner_min = [0.0f32; 3];
    for j in 0..3 {
        if p.signbits & (1 << j) != 0 {
            corner_max[j] = emins[j];
            corner_min[j] = emaxs[j];
        } else {
            corner_max[j] = emaxs[j];
            corner_min[j] = emins[j];
        }
    }
    let dist1 = dot_product(&p.normal, &corner_max);
    let dist2 = dot_product(&p.normal, &corner_min);

    let mut sides = 0;
    if dist1 >= p.dist {
        sides = 1;
    }
    if dist2 < p.dist {
        sides |= 2;
    }
    sides
}

// ============================================================
// MATHLIB — vector operations
// ============================================================

#[inline]
pub fn dot_product(a: &Vec3, b: &Vec3) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
pub fn vector_subtract(a: &Vec3, b: &Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
pub fn vector_add(a: &Vec3, b: &Vec3) -> Vec3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

#[inline]
pub fn vector_scale(v: &Vec3, s: f32) -> Vec3 {
    [v[0] * s, v[1] * s, v[2] * s]
}

#[inline]
pub fn vector_length(v: &Vec3) -> f32 {
    dot_product(v, v).sqrt()
}

pub fn vector_normalize(v: &mut Vec3) -> f32 {
    let length = vector_length(v);
    if length != 0.0 {
        let ilength = 1.0 / length;
        v[0] *= ilength;
        v[1] *= ilength;
        v[2] *= ilength;
    }
    length
}

pub fn cross_product(a: &Vec3, b: &Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Rotate `forward` towards `side` by `angle` degrees.
/// Used to construct the view frustum side planes.
pub fn turn_vector(forward: &Vec3, side: &Vec3, angle: f32) -> Vec3 {
    let rad = angle.to_radians();
    let scale_forward = rad.cos();
    let scale_side = rad.sin();
    [
        scale_forward * forward[0] + scale_side * side[0],
        scale_forward * forward[1] + scale_side * side[1],
        scale_forward * forward[2] + scale_side * side[2],
    ]
}

/// Build forward/right/up basis vectors from pitch/yaw/roll in degrees.
pub fn angle_vectors(angles: &Vec3) -> (Vec3, Vec3, Vec3) {
    let (sy, cy) = angles[1].to_radians().sin_cos();
    let (sp, cp) = angles[0].to_radians().sin_cos();
    let (sr, cr) = angles[2].to_radians().sin_cos();

    let forward = [cp * cy, cp * sy, -sp];
    let right = [
        -sr * sp * cy + cr * sy,
        -sr * sp * sy - cr * cy,
        -sr * cp,
    ];
    let up = [
        cr * sp * cy + sr * sy,
        cr * sp * sy - sr * cy,
        cr * cp,
    ];
    (forward, right, up)
}

// =============================================================
//  Tests
// =============================================================
