use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Result;

use crate::error::ImportError;
use crate::host::{HostScene, Image, ImageId};

/// Images loaded during one import, keyed by file name relative to the source directory.
#[derive(Debug)]
pub struct ImageStore {
    source_dir: PathBuf,
    pack: bool,
    by_name: HashMap<String, ImageId>,
}

impl ImageStore {
    pub fn new(source_dir: impl Into<PathBuf>, pack: bool) -> Self {
        Self {
            source_dir: source_dir.into(),
            pack,
            by_name: HashMap::new(),
        }
    }

    /// Load `name` once; later calls return the cached image.
    pub fn get(&mut self, host: &mut HostScene, name: &str) -> Result<ImageId> {
        if let Some(id) = self.by_name.get(name) {
            return Ok(*id);
        }

        let path = self.source_dir.join(name);
        let (width, height) =
            image::image_dimensions(&path).map_err(|source| ImportError::ResourceLoad {
                path: path.clone(),
                source,
            })?;
        let packed = if self.pack {
            let bytes = std::fs::read(&path).map_err(|e| ImportError::ResourceLoad {
                path: path.clone(),
                source: image::ImageError::IoError(e),
            })?;
            Some(bytes)
        } else {
            None
        };

        tracing::debug!(path = %path.display(), width, height, packed = self.pack, "loaded image");
        let id = host.new_image(Image {
            name: name.to_string(),
            filepath: path,
            size: [width, height],
            packed,
        });
        self.by_name.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostCapabilities;

    #[test]
    fn loads_once_and_packs_bytes() {
        let dir = tempfile::tempdir().expect("tempdir");
        image::RgbaImage::new(4, 2)
            .save(dir.path().join("a.png"))
            .expect("write png");

        let mut host = HostScene::empty(HostCapabilities::default());
        let mut store = ImageStore::new(dir.path(), true);
        let a = store.get(&mut host, "a.png").expect("load");
        let again = store.get(&mut host, "a.png").expect("cached");
        assert_eq!(a, again);
        assert_eq!(host.images.len(), 1);
        assert_eq!(host.image(a).size, [4, 2]);
        assert!(host.image(a).is_packed());
    }

    #[test]
    fn missing_file_is_a_resource_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut host = HostScene::empty(HostCapabilities::default());
        let mut store = ImageStore::new(dir.path(), false);
        let err = store.get(&mut host, "missing.png").expect_err("missing");
        assert!(matches!(
            err.downcast_ref::<ImportError>(),
            Some(ImportError::ResourceLoad { .. })
        ));
        assert!(err.to_string().contains("Cannot load image"));
    }
}
