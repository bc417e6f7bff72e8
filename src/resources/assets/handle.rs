//! Loaded asset handles and their decoded payloads.
//!
//! A [`LoadedAsset`] is a cheap, cloneable handle. Every clone points at the
//! same decoded data, so identity is stable for the lifetime of the loader
//! (compare with [`LoadedAsset::ptr_eq`]).

use arrayvec::ArrayVec;
use image::{ImageFormat, ImageReader};
use serde::Deserialize;
use std::io::Cursor;
use std::sync::Arc;

use super::descriptor::{AssetKind, CUBE_FACES};

/// Decoding failure, without the asset context the sub-loader adds.
pub type DecodeResult<T> = Result<T, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Wav,
    Ogg,
    Mp3,
    Unknown,
}

/// Raw audio clip. Playback is up to the audio collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub bytes: Vec<u8>,
    pub format: AudioFormat,
}

impl AudioClip {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let format = if bytes.starts_with(b"RIFF") {
            AudioFormat::Wav
        } else if bytes.starts_with(b"OggS") {
            AudioFormat::Ogg
        } else if bytes.starts_with(b"ID3") || bytes.starts_with(&[0xFF, 0xFB]) {
            AudioFormat::Mp3
        } else {
            AudioFormat::Unknown
        };
        Self { bytes, format }
    }
}

/// Typeface JSON font (the format produced by facetype.js).
#[derive(Debug, Clone, PartialEq)]
pub struct FontFace {
    pub family_name: String,
    pub resolution: u32,
    pub glyph_count: usize,
    pub document: serde_json::Value,
}

#[derive(Deserialize)]
struct TypefaceHeader {
    #[serde(rename = "familyName", default)]
    family_name: Option<String>,
    #[serde(default)]
    resolution: Option<u32>,
    glyphs: serde_json::Map<String, serde_json::Value>,
}

impl FontFace {
    pub fn parse(bytes: &[u8]) -> DecodeResult<Self> {
        let document: serde_json::Value =
            serde_json::from_slice(bytes).map_err(|e| format!("invalid typeface JSON: {e}"))?;
        let header: TypefaceHeader = serde_json::from_value(document.clone())
            .map_err(|e| format!("not a typeface font: {e}"))?;
        Ok(Self {
            family_name: header.family_name.unwrap_or_default(),
            resolution: header.resolution.unwrap_or(1000),
            glyph_count: header.glyphs.len(),
            document,
        })
    }
}

/// glTF 2.0 model, from either a `.gltf` document or a `.glb` container.
#[derive(Debug, Clone)]
pub struct Model {
    pub document: gltf::Document,
    /// Embedded binary buffer of a `.glb` container.
    pub blob: Option<Vec<u8>>,
}

impl Model {
    pub fn parse(bytes: &[u8]) -> DecodeResult<Self> {
        let gltf = gltf::Gltf::from_slice(bytes).map_err(|e| format!("invalid glTF: {e}"))?;
        Ok(Self {
            document: gltf.document,
            blob: gltf.blob,
        })
    }

    /// `asset.version` of the document.
    pub fn version(&self) -> &str {
        &self.document.as_json().asset.version
    }

    pub fn mesh_count(&self) -> usize {
        self.document.meshes().count()
    }

    pub fn node_count(&self) -> usize {
        self.document.nodes().count()
    }
}

/// SVG source, tessellation is left to the rendering collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorGraphic {
    pub source: String,
}

impl VectorGraphic {
    pub fn parse(bytes: &[u8]) -> DecodeResult<Self> {
        let source = std::str::from_utf8(bytes)
            .map_err(|e| format!("SVG is not UTF-8: {e}"))?
            .to_owned();
        if !source.contains("<svg") {
            return Err("no <svg> root element".into());
        }
        Ok(Self { source })
    }

    pub fn path_count(&self) -> usize {
        self.source.matches("<path").count()
    }
}

/// Encoded image bytes. The container and the pixel size are read from
/// the header only; decoding pixels is left to the rendering collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureImage {
    pub bytes: Vec<u8>,
    /// `None` when the container is not one `image` recognises.
    pub format: Option<ImageFormat>,
    dimensions: Option<(u32, u32)>,
}

impl TextureImage {
    pub fn from_bytes(bytes: Vec<u8>) -> DecodeResult<Self> {
        if bytes.is_empty() {
            return Err("empty image".into());
        }
        let format = image::guess_format(&bytes).ok();
        let dimensions = match format {
            Some(_) => ImageReader::new(Cursor::new(bytes.as_slice()))
                .with_guessed_format()
                .ok()
                .and_then(|reader| reader.into_dimensions().ok()),
            None => None,
        };
        Ok(Self {
            bytes,
            format,
            dimensions,
        })
    }

    /// Width and height, if the header could be read.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.dimensions
    }
}

/// Six faces in `px, nx, py, ny, pz, nz` order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CubeTexture {
    pub faces: ArrayVec<TextureImage, CUBE_FACES>,
}

impl CubeTexture {
    pub fn from_faces(faces: impl IntoIterator<Item = TextureImage>) -> DecodeResult<Self> {
        let mut collected = ArrayVec::new();
        for face in faces {
            collected
                .try_push(face)
                .map_err(|_| format!("a cube texture has exactly {CUBE_FACES} faces"))?;
        }
        if !collected.is_full() {
            return Err(format!(
                "a cube texture has exactly {CUBE_FACES} faces, got {}",
                collected.len()
            ));
        }
        Ok(Self { faces: collected })
    }
}

/// Decoded payload of one asset.
#[derive(Debug, Clone)]
pub enum AssetData {
    Audio(AudioClip),
    Font(FontFace),
    Model(Model),
    VectorGraphic(VectorGraphic),
    Texture(TextureImage),
    CubeTexture(CubeTexture),
}

impl AssetData {
    pub fn kind(&self) -> AssetKind {
        match self {
            AssetData::Audio(_) => AssetKind::Audio,
            AssetData::Font(_) => AssetKind::Font,
            AssetData::Model(_) => AssetKind::Model,
            AssetData::VectorGraphic(_) => AssetKind::VectorGraphic,
            AssetData::Texture(_) => AssetKind::Texture,
            AssetData::CubeTexture(_) => AssetKind::CubeTexture,
        }
    }
}

/// Shared handle to a loaded asset.
#[derive(Debug, Clone)]
pub struct LoadedAsset {
    name: Arc<str>,
    data: Arc<AssetData>,
}

impl LoadedAsset {
    pub fn new(name: &str, data: AssetData) -> Self {
        Self {
            name: Arc::from(name),
            data: Arc::new(data),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> AssetKind {
        self.data.kind()
    }

    pub fn data(&self) -> &AssetData {
        &self.data
    }

    /// True if both handles point at the same loaded asset.
    pub fn ptr_eq(&self, other: &LoadedAsset) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    pub fn as_audio(&self) -> Option<&AudioClip> {
        match self.data() {
            AssetData::Audio(clip) => Some(clip),
            _ => None,
        }
    }

    pub fn as_font(&self) -> Option<&FontFace> {
        match self.data() {
            AssetData::Font(font) => Some(font),
            _ => None,
        }
    }

    pub fn as_model(&self) -> Option<&Model> {
        match self.data() {
            AssetData::Model(model) => Some(model),
            _ => None,
        }
    }

    pub fn as_vector_graphic(&self) -> Option<&VectorGraphic> {
        match self.data() {
            AssetData::VectorGraphic(svg) => Some(svg),
            _ => None,
        }
    }

    pub fn as_texture(&self) -> Option<&TextureImage> {
        match self.data() {
            AssetData::Texture(texture) => Some(texture),
            _ => None,
        }
    }

    pub fn as_cube_texture(&self) -> Option<&CubeTexture> {
        match self.data() {
            AssetData::CubeTexture(cube) => Some(cube),
            _ => None,
        }
    }
}

/// Result of [`ResourceLoader::get_asset`].
///
/// [`ResourceLoader::get_asset`]: crate::resources::assets::ResourceLoader::get_asset
#[derive(Debug, Clone)]
pub enum AssetLookup {
    Ready(LoadedAsset),
    NotLoaded,
    KindMismatch {
        expected: AssetKind,
        actual: AssetKind,
    },
}

impl AssetLookup {
    pub fn ready(self) -> Option<LoadedAsset> {
        match self {
            AssetLookup::Ready(asset) => Some(asset),
            AssetLookup::NotLoaded | AssetLookup::KindMismatch { .. } => None,
        }
    }

    pub fn is_not_loaded(&self) -> bool {
        matches!(self, AssetLookup::NotLoaded)
    }
}
