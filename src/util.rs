use float_ord::FloatOrd;

use crate::frames::{Quat, Vec3};

pub fn vec_to_glam(v: &boxcars::Vector3f) -> glam::f32::Vec3 {
    glam::f32::Vec3::new(v.x, v.y, v.z)
}

pub fn glam_to_vec3(v: glam::f32::Vec3) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

pub fn boxcars_vec3(v: &boxcars::Vector3f) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

pub fn boxcars_quat(q: &boxcars::Quaternion) -> Quat {
    Quat::new(q.x, q.y, q.z, q.w)
}

impl Vec3 {
    pub fn to_glam(self) -> glam::f32::Vec3 {
        glam::f32::Vec3::new(self.x, self.y, self.z)
    }

    pub fn length(self) -> f32 {
        self.to_glam().length()
    }

    pub fn distance(self, other: Vec3) -> f32 {
        self.to_glam().distance(other.to_glam())
    }

    pub fn xy_length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

impl Quat {
    pub fn to_glam(self) -> glam::f32::Quat {
        glam::f32::Quat::from_xyzw(self.x, self.y, self.z, self.w)
    }

    /// Car-forward unit vector (local +x rotated into world space).
    pub fn forward(self) -> glam::f32::Vec3 {
        self.to_glam() * glam::f32::Vec3::X
    }

    /// Car-up unit vector (local +z rotated into world space).
    pub fn up(self) -> glam::f32::Vec3 {
        self.to_glam() * glam::f32::Vec3::Z
    }

    /// Car-right unit vector (local +y rotated into world space).
    pub fn right(self) -> glam::f32::Vec3 {
        self.to_glam() * glam::f32::Vec3::Y
    }

    /// Derived intrinsic (pitch, yaw, roll) in radians.
    pub fn euler(self) -> (f32, f32, f32) {
        let (yaw, pitch, roll) = self.to_glam().to_euler(glam::EulerRot::ZYX);
        (pitch, yaw, roll)
    }
}

/// Expresses a world-space point in car-local coordinates (x forward, y
/// right, z up). All mechanic footprint checks go through this.
pub fn world_to_car_local(
    car_position: Vec3,
    car_rotation: Quat,
    point: Vec3,
) -> glam::f32::Vec3 {
    let offset = point.to_glam() - car_position.to_glam();
    car_rotation.to_glam().inverse() * offset
}

/// Angular-velocity components about the car's local axes: (roll rate, pitch
/// rate, yaw rate) in rad/s.
pub fn car_local_angular_rates(rotation: Quat, angular_velocity: Vec3) -> (f32, f32, f32) {
    let inv = rotation.to_glam().inverse();
    let local = inv * angular_velocity.to_glam();
    (local.x, local.y, local.z)
}

/// Median of a non-empty f32 slice; 0.0 for an empty one.
pub fn median_f32(samples: &mut [f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.sort_by_key(|s| FloatOrd(*s));
    let mid = samples.len() / 2;
    if samples.len() % 2 == 1 {
        samples[mid]
    } else {
        (samples[mid - 1] + samples[mid]) / 2.0
    }
}

/// Lowercases, strips non-alphanumerics to single dashes, and trims the
/// result, producing the `slug:` identity component.
pub fn sanitize_slug(display_name: &str) -> String {
    let mut out = String::with_capacity(display_name.len());
    let mut last_dash = true;
    for c in display_name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    if out.is_empty() {
        out.push_str("unknown");
    }
    out
}

/// Strips control characters from a display name without otherwise altering
/// it.
pub fn sanitize_display_name(display_name: &str) -> String {
    display_name.chars().filter(|c| !c.is_control()).collect()
}

/// Whether a car at `position` is in contact with a drivable surface: the
/// floor, a wall, or the ceiling.
pub fn surface_contact(position: Vec3) -> bool {
    use crate::constants::{BACK_WALL_Y, CEILING_Z, GROUNDED_Z, SIDE_WALL_X};
    const WALL_MARGIN: f32 = 60.0;
    position.z < GROUNDED_Z
        || position.x.abs() > SIDE_WALL_X - WALL_MARGIN
        || position.y.abs() > BACK_WALL_Y - WALL_MARGIN
        || position.z > CEILING_Z - WALL_MARGIN
}

/// Angle between two direction vectors in degrees; 0.0 when either is
/// degenerate.
pub fn angle_between_deg(a: glam::f32::Vec3, b: glam::f32::Vec3) -> f32 {
    let (na, nb) = (a.normalize_or_zero(), b.normalize_or_zero());
    if na == glam::f32::Vec3::ZERO || nb == glam::f32::Vec3::ZERO {
        return 0.0;
    }
    na.dot(nb).clamp(-1.0, 1.0).acos().to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_of_odd_and_even_slices() {
        assert_eq!(median_f32(&mut [3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median_f32(&mut [4.0, 1.0, 2.0, 3.0]), 2.5);
        assert_eq!(median_f32(&mut []), 0.0);
    }

    #[test]
    fn slug_normalizes_names() {
        assert_eq!(sanitize_slug("Some Player!"), "some-player");
        assert_eq!(sanitize_slug("__"), "unknown");
        assert_eq!(sanitize_slug("A--B"), "a-b");
    }

    #[test]
    fn identity_quat_axes() {
        let q = Quat::new(0.0, 0.0, 0.0, 1.0);
        assert!((q.forward() - glam::f32::Vec3::X).length() < 1e-6);
        assert!((q.up() - glam::f32::Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn car_local_round_trip() {
        let pos = Vec3::new(100.0, 0.0, 17.0);
        let rot = Quat::new(0.0, 0.0, 0.0, 1.0);
        let local = world_to_car_local(pos, rot, Vec3::new(150.0, 0.0, 17.0));
        assert!((local - glam::f32::Vec3::new(50.0, 0.0, 0.0)).length() < 1e-4);
    }
}
