pub mod animated;
pub mod surface;

pub use animated::AnimatedTexture;
pub use surface::DrawingSurface;
