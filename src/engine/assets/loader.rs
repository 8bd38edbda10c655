use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::engine::EngineResult;
use crate::engine::assets::{GlbInfo, parse_glb};
use crate::engine::event_queue::{Event, EventQueue};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedModel {
    pub path: String,
    pub info: GlbInfo,
}

/// Loads models relative to a base directory.
///
/// Results are delivered through the event queue so callers see the same
/// "resolves on a later tick" behaviour a real async loader has.
#[derive(Debug, Clone)]
pub struct ModelLoader {
    base_dir: PathBuf,
}

impl ModelLoader {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn resolve(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.base_dir.join(p)
        }
    }

    pub fn load_now(&self, path: &str) -> EngineResult<LoadedModel> {
        let full = self.resolve(path);
        let bytes = std::fs::read(&full)?;
        let info = parse_glb(&bytes)?;
        Ok(LoadedModel {
            path: path.to_string(),
            info,
        })
    }

    /// Load `path` and queue `ModelLoaded` / `ModelLoadFailed`.
    pub fn load(&self, path: &str, queue: &mut EventQueue) {
        match self.load_now(path) {
            Ok(model) => {
                let info = &model.info;
                info!(
                    path,
                    meshes = info.meshes,
                    nodes = info.nodes,
                    generator = info.generator.as_deref().unwrap_or("unknown"),
                    bin_bytes = info.bin_len.unwrap_or(0),
                    "model loaded"
                );
                queue.push(Event::ModelLoaded { model });
            }
            Err(e) => {
                warn!(path, "model load failed: {e}");
                queue.push(Event::ModelLoadFailed {
                    path: path.to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::assets::glb::{TRIANGLE, build_glb};

    #[test]
    fn queues_loaded_model() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("chair.glb"),
            build_glb(TRIANGLE, Some(&[0u8; 36])),
        )
        .unwrap();

        let loader = ModelLoader::new(dir.path());
        let mut q = EventQueue::new();
        loader.load("chair.glb", &mut q);

        match q.pop() {
            Some(Event::ModelLoaded { model }) => {
                assert_eq!(model.path, "chair.glb");
                assert_eq!(model.info.meshes, 1);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn missing_file_queues_failure() {
        let dir = tempfile::tempdir().unwrap();
        let loader = ModelLoader::new(dir.path());
        let mut q = EventQueue::new();
        loader.load("nope.glb", &mut q);

        assert!(matches!(q.pop(), Some(Event::ModelLoadFailed { .. })));
    }
}
