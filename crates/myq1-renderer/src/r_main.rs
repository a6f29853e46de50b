// r_main.rs — view frustum construction and box rejection

use myq1_common::q_shared::{
    box_on_plane_side, dot_product, signbits_for_plane, turn_vector, CPlane, Vec3, PLANE_ANYX,
};

/// The four side planes of the view frustum. The default value rejects
/// nothing, so state can be constructed before the first frame.
#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    pub planes: [CPlane; 4],
}

impl Default for Frustum {
    fn default() -> Self {
        let p = CPlane {
            normal: [0.0; 3],
            dist: 0.0,
            plane_type: PLANE_ANYX,
            signbits: 0,
        };
        Self { planes: [p; 4] }
    }
}

impl Frustum {
    /// Build the frustum from the view origin, the view basis vectors, and
    /// the field of view in degrees.
    pub fn from_view(origin: Vec3, forward: Vec3, right: Vec3, up: Vec3, fov_x: f32, fov_y: f32) -> Self {
        let normals = [
            turn_vector(&forward, &right, fov_x / 2.0 - 90.0), // left
            turn_vector(&forward, &right, 90.0 - fov_x / 2.0), // right
            turn_vector(&forward, &up, 90.0 - fov_y / 2.0),    // bottom
            turn_vector(&forward, &up, fov_y / 2.0 - 90.0),    // top
        ];
        let mut planes = [CPlane::default(); 4];
        for (plane, normal) in planes.iter_mut().zip(normals) {
            plane.normal = normal;
            plane.dist = dot_product(&origin, &normal);
            plane.plane_type = PLANE_ANYX;
            plane.signbits = signbits_for_plane(plane);
        }
        Self { planes }
    }

    /// Returns true if the box is completely outside the frustum.
    pub fn cull_box(&self, mins: &Vec3, maxs: &Vec3) -> bool {
        for plane in &self.planes {
            if box_on_plane_side(mins, maxs, plane) == 2 {
                return true;
            }
        }
        false
    }
}

// =============================================================
//  Tests
// =============================================================
