pub mod glb;
pub mod loader;

pub use glb::{GlbInfo, parse_glb};
pub use loader::{LoadedModel, ModelLoader};
