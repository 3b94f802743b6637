//! Plain-data value types carried inline in variants.
//!
//! These are layout mirrors only; arithmetic belongs to the surface crates
//! built on top of the bridge.

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector2 {
    pub x: f32,
    pub y: f32,
}

impl Vector2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Vector2i {
    pub x: i32,
    pub y: i32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Vector3i {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Vector4i {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub w: i32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect2 {
    pub position: Vector2,
    pub size: Vector2,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rect2i {
    pub position: Vector2i,
    pub size: Vector2i,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Plane {
    pub normal: Vector3,
    pub d: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            w: 1.0,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::rgba(0.0, 0.0, 0.0, 1.0)
    }
}

/// Resource identifier. The engine reclaims the resource; the host never frees it.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rid(pub u64);

impl Rid {
    pub const INVALID: Rid = Rid(0);

    pub fn is_valid(self) -> bool {
        self.0 != 0
    }
}

// Types the engine keeps out of line inside a variant. Only their layout is mirrored.

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2D {
    pub x: Vector2,
    pub y: Vector2,
    pub origin: Vector2,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self {
            x: Vector2::new(1.0, 0.0),
            y: Vector2::new(0.0, 1.0),
            origin: Vector2::default(),
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Aabb {
    pub position: Vector3,
    pub size: Vector3,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Basis {
    pub rows: [Vector3; 3],
}

impl Default for Basis {
    fn default() -> Self {
        Self {
            rows: [
                Vector3::new(1.0, 0.0, 0.0),
                Vector3::new(0.0, 1.0, 0.0),
                Vector3::new(0.0, 0.0, 1.0),
            ],
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Transform3D {
    pub basis: Basis,
    pub origin: Vector3,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub columns: [Vector4; 4],
}

impl Default for Projection {
    fn default() -> Self {
        let mut columns = [Vector4::default(); 4];
        columns[0].x = 1.0;
        columns[1].y = 1.0;
        columns[2].z = 1.0;
        columns[3].w = 1.0;
        Self { columns }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::VariantType;
    use std::mem::size_of;

    #[test]
    fn layouts_match_engine_sizes() {
        assert_eq!(size_of::<Vector2>(), VariantType::Vector2.ptr_size());
        assert_eq!(size_of::<Vector3i>(), VariantType::Vector3i.ptr_size());
        assert_eq!(size_of::<Rect2>(), VariantType::Rect2.ptr_size());
        assert_eq!(size_of::<Plane>(), VariantType::Plane.ptr_size());
        assert_eq!(size_of::<Color>(), VariantType::Color.ptr_size());
        assert_eq!(size_of::<Transform2D>(), VariantType::Transform2D.ptr_size());
        assert_eq!(size_of::<Aabb>(), VariantType::Aabb.ptr_size());
        assert_eq!(size_of::<Basis>(), VariantType::Basis.ptr_size());
        assert_eq!(size_of::<Transform3D>(), VariantType::Transform3D.ptr_size());
        assert_eq!(size_of::<Projection>(), VariantType::Projection.ptr_size());
        assert_eq!(size_of::<Rid>(), VariantType::Rid.ptr_size());
    }

    #[test]
    fn identity_defaults() {
        assert_eq!(Quaternion::default().w, 1.0);
        assert_eq!(Color::default().a, 1.0);
        assert_eq!(Basis::default().rows[2].z, 1.0);
        assert_eq!(Projection::default().columns[3].w, 1.0);
        assert!(!Rid::INVALID.is_valid());
    }
}
