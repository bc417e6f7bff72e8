//! Kind-specific sub-loaders.
//!
//! The loader keeps one shared sub-loader per [`AssetKind`], created from
//! its factory the first time an asset of that kind is dispatched. The
//! default factories read from the asset root on disk; tests and tools can
//! register their own.

use log::debug;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::descriptor::{AssetDescriptor, AssetKind};
use super::handle::{
    AssetData, AudioClip, CubeTexture, FontFace, Model, TextureImage, VectorGraphic,
};
use super::loader::LoadError;

/// Loads one asset. Runs on a loader worker thread.
pub trait SubLoader: Send + Sync {
    fn load(&self, descriptor: &AssetDescriptor) -> Result<AssetData, LoadError>;
}

/// Builds the sub-loader for a kind, given the asset root.
pub type SubLoaderFactory = Box<dyn Fn(&Path) -> Arc<dyn SubLoader> + Send + Sync>;

fn read(root: &Path, descriptor: &AssetDescriptor, path: &Path) -> Result<Vec<u8>, LoadError> {
    let full = root.join(path);
    debug!("Reading {} asset '{}' from {:?}", descriptor.kind, descriptor.name, full);
    std::fs::read(&full).map_err(|source| LoadError::Io {
        name: descriptor.name.clone(),
        path: full,
        source: Arc::new(source),
    })
}

fn single_path(descriptor: &AssetDescriptor) -> Result<&Path, LoadError> {
    descriptor
        .locator
        .path()
        .ok_or_else(|| LoadError::UnsupportedLocator {
            name: descriptor.name.clone(),
            kind: descriptor.kind,
        })
}

fn decoded<T>(descriptor: &AssetDescriptor, result: Result<T, String>) -> Result<T, LoadError> {
    result.map_err(|reason| LoadError::Parse {
        name: descriptor.name.clone(),
        reason,
    })
}

/// Reads a single file and hands the bytes to a decoder.
struct FileLoader {
    root: PathBuf,
    decode: fn(Vec<u8>) -> Result<AssetData, String>,
}

impl SubLoader for FileLoader {
    fn load(&self, descriptor: &AssetDescriptor) -> Result<AssetData, LoadError> {
        let bytes = read(&self.root, descriptor, single_path(descriptor)?)?;
        decoded(descriptor, (self.decode)(bytes))
    }
}

/// Reads the six faces of a cube texture.
struct CubeTextureLoader {
    root: PathBuf,
}

impl SubLoader for CubeTextureLoader {
    fn load(&self, descriptor: &AssetDescriptor) -> Result<AssetData, LoadError> {
        let mut faces = Vec::with_capacity(descriptor.locator.paths().len());
        for path in descriptor.locator.paths() {
            let bytes = read(&self.root, descriptor, path)?;
            faces.push(decoded(descriptor, TextureImage::from_bytes(bytes))?);
        }
        decoded(descriptor, CubeTexture::from_faces(faces)).map(AssetData::CubeTexture)
    }
}

fn decode_audio(bytes: Vec<u8>) -> Result<AssetData, String> {
    Ok(AssetData::Audio(AudioClip::from_bytes(bytes)))
}

fn decode_font(bytes: Vec<u8>) -> Result<AssetData, String> {
    FontFace::parse(&bytes).map(AssetData::Font)
}

fn decode_model(bytes: Vec<u8>) -> Result<AssetData, String> {
    Model::parse(&bytes).map(AssetData::Model)
}

fn decode_vector_graphic(bytes: Vec<u8>) -> Result<AssetData, String> {
    VectorGraphic::parse(&bytes).map(AssetData::VectorGraphic)
}

fn decode_texture(bytes: Vec<u8>) -> Result<AssetData, String> {
    TextureImage::from_bytes(bytes).map(AssetData::Texture)
}

/// Default, file-backed sub-loader for `kind`.
pub fn default_sub_loader(kind: AssetKind, root: &Path) -> Arc<dyn SubLoader> {
    let root = root.to_path_buf();
    let decode: fn(Vec<u8>) -> Result<AssetData, String> = match kind {
        AssetKind::Audio => decode_audio,
        AssetKind::Font => decode_font,
        AssetKind::Model => decode_model,
        AssetKind::VectorGraphic => decode_vector_graphic,
        AssetKind::Texture => decode_texture,
        AssetKind::CubeTexture => return Arc::new(CubeTextureLoader { root }),
    };
    Arc::new(FileLoader { root, decode })
}

/// Per-kind factories and the lazily created instances.
pub struct SubLoaders {
    root: PathBuf,
    factories: FxHashMap<AssetKind, SubLoaderFactory>,
    instances: FxHashMap<AssetKind, Arc<dyn SubLoader>>,
}

impl SubLoaders {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            factories: FxHashMap::default(),
            instances: FxHashMap::default(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Replace the factory used for `kind`.
    pub fn register(
        &mut self,
        kind: AssetKind,
        factory: impl Fn(&Path) -> Arc<dyn SubLoader> + Send + Sync + 'static,
    ) {
        self.factories.insert(kind, Box::new(factory));
        self.instances.remove(&kind);
    }

    /// Shared sub-loader for `kind`, created on first use.
    pub fn get_or_create(&mut self, kind: AssetKind) -> Arc<dyn SubLoader> {
        if let Some(existing) = self.instances.get(&kind) {
            return existing.clone();
        }
        debug!("Creating {} sub-loader", kind);
        let created = match self.factories.get(&kind) {
            Some(factory) => factory(&self.root),
            None => default_sub_loader(kind, &self.root),
        };
        self.instances.insert(kind, created.clone());
        created
    }

    /// Whether the sub-loader for `kind` has been created yet.
    pub fn is_created(&self, kind: AssetKind) -> bool {
        self.instances.contains_key(&kind)
    }
}
