use crate::fit::Geometry;
use glam::{Quat, Vec3};

/// World transform of the reference the surface is placed against,
/// typically the viewer's camera
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BillboardFrame {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl BillboardFrame {
    pub fn new(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    pub fn local_to_world(&self, local: Vec3) -> Vec3 {
        self.translation + self.rotation * local
    }
}

/// The scene object an image surface is attached to
pub trait SceneHost {
    /// Current world transform of the billboard reference
    fn billboard(&self) -> BillboardFrame;

    /// Declared size of the plane geometry
    fn geometry(&self) -> Geometry;

    fn set_geometry(&mut self, width: f32, height: f32);

    fn set_shape_half_extents(&mut self, half_extents: Vec3);

    /// Show a static image straight from `url`
    fn set_material_source(&mut self, url: &str);

    /// Show the component's animated texture instead of any static source
    fn set_material_texture(&mut self, width: u32, height: u32);

    fn set_transform(&mut self, position: Vec3, rotation: Quat);

    /// Orientation of the physics body
    fn set_body_orientation(&mut self, rotation: Quat);
}

/// Host without a renderer that keeps whatever it is told
#[derive(Clone, Debug, Default)]
pub struct HeadlessHost {
    pub billboard: BillboardFrame,
    pub geometry: Geometry,
    pub half_extents: Option<Vec3>,
    pub material_source: Option<String>,
    /// Size of the animated texture the material shows, if any
    pub material_texture: Option<(u32, u32)>,
    pub position: Vec3,
    pub rotation: Quat,
    pub body_rotation: Option<Quat>,
}

impl HeadlessHost {
    pub fn with_billboard(billboard: BillboardFrame) -> Self {
        Self {
            billboard,
            ..Self::default()
        }
    }
}

impl SceneHost for HeadlessHost {
    fn billboard(&self) -> BillboardFrame {
        self.billboard
    }

    fn geometry(&self) -> Geometry {
        self.geometry
    }

    fn set_geometry(&mut self, width: f32, height: f32) {
        self.geometry = Geometry::new(width, height);
    }

    fn set_shape_half_extents(&mut self, half_extents: Vec3) {
        self.half_extents = Some(half_extents);
    }

    fn set_material_source(&mut self, url: &str) {
        self.material_source = Some(url.to_string());
        self.material_texture = None;
    }

    fn set_material_texture(&mut self, width: u32, height: u32) {
        self.material_source = None;
        self.material_texture = Some((width, height));
    }

    fn set_transform(&mut self, position: Vec3, rotation: Quat) {
        self.position = position;
        self.rotation = rotation;
    }

    fn set_body_orientation(&mut self, rotation: Quat) {
        self.body_rotation = Some(rotation);
    }
}
