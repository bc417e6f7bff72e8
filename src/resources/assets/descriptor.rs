//! Declarative asset set.
//!
//! An [`AssetSet`] is fixed when the loader is built. It is usually read
//! from a JSON manifest:
//!
//! ```json
//! {
//!   "interFont": { "kind": "font", "path": "fonts/inter.typeface.json" },
//!   "menuTrack": { "kind": "audio", "path": "audio/menu.ogg", "tier": "low" },
//!   "skybox": { "kind": "cube-texture",
//!               "path": ["px.png", "nx.png", "py.png", "ny.png", "pz.png", "nz.png"] }
//! }
//! ```
//!
//! `tier` defaults to `high`.

use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Number of faces a cube texture is made of.
pub const CUBE_FACES: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetKind {
    Audio,
    Font,
    #[serde(alias = "gltf")]
    Model,
    #[serde(alias = "svg")]
    VectorGraphic,
    Texture,
    #[serde(alias = "cubeTexture")]
    CubeTexture,
}

impl AssetKind {
    pub const ALL: [AssetKind; 6] = [
        AssetKind::Audio,
        AssetKind::Font,
        AssetKind::Model,
        AssetKind::VectorGraphic,
        AssetKind::Texture,
        AssetKind::CubeTexture,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AssetKind::Audio => "audio",
            AssetKind::Font => "font",
            AssetKind::Model => "model",
            AssetKind::VectorGraphic => "vector-graphic",
            AssetKind::Texture => "texture",
            AssetKind::CubeTexture => "cube-texture",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Priority class of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    High,
    Low,
}

/// Where an asset lives, relative to the loader's asset root.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Locator {
    Path(PathBuf),
    Faces(Vec<PathBuf>),
}

impl Locator {
    /// The single path, if this is not a list.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Locator::Path(path) => Some(path),
            Locator::Faces(_) => None,
        }
    }

    pub fn paths(&self) -> &[PathBuf] {
        match self {
            Locator::Path(path) => std::slice::from_ref(path),
            Locator::Faces(faces) => faces,
        }
    }
}

impl From<&str> for Locator {
    fn from(path: &str) -> Self {
        Locator::Path(PathBuf::from(path))
    }
}

impl From<PathBuf> for Locator {
    fn from(path: PathBuf) -> Self {
        Locator::Path(path)
    }
}

impl From<Vec<PathBuf>> for Locator {
    fn from(faces: Vec<PathBuf>) -> Self {
        Locator::Faces(faces)
    }
}

impl From<[&str; CUBE_FACES]> for Locator {
    fn from(faces: [&str; CUBE_FACES]) -> Self {
        Locator::Faces(faces.iter().map(PathBuf::from).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetDescriptor {
    pub name: String,
    pub kind: AssetKind,
    pub locator: Locator,
    pub tier: Tier,
}

impl AssetDescriptor {
    pub fn new(
        name: impl Into<String>,
        kind: AssetKind,
        locator: impl Into<Locator>,
        tier: Tier,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            locator: locator.into(),
            tier,
        }
    }

    fn validate(&self) -> Result<(), AssetSetError> {
        if self.name.is_empty() {
            return Err(AssetSetError::EmptyName);
        }
        match (self.kind, &self.locator) {
            (AssetKind::CubeTexture, Locator::Faces(faces)) if faces.len() == CUBE_FACES => Ok(()),
            (AssetKind::CubeTexture, _) => Err(AssetSetError::CubeFaces {
                name: self.name.clone(),
                found: self.locator.paths().len(),
            }),
            (_, Locator::Path(_)) => Ok(()),
            (kind, Locator::Faces(_)) => Err(AssetSetError::UnexpectedFaces {
                name: self.name.clone(),
                kind,
            }),
        }
    }
}

#[derive(Debug, Error)]
pub enum AssetSetError {
    #[error("asset names must not be empty")]
    EmptyName,
    #[error("asset '{0}' is declared twice")]
    Duplicate(String),
    #[error("cube texture '{name}' needs 6 faces, found {found}")]
    CubeFaces { name: String, found: usize },
    #[error("{kind} asset '{name}' takes a single path, not a list")]
    UnexpectedFaces { name: String, kind: AssetKind },
    #[error("failed to read manifest {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestEntry {
    kind: AssetKind,
    path: Locator,
    #[serde(default)]
    tier: Tier,
}

/// Immutable set of declared assets.
#[derive(Debug, Clone, Default)]
pub struct AssetSet {
    descriptors: Vec<AssetDescriptor>,
    index: FxHashMap<String, usize>,
    high: usize,
    low: usize,
}

impl AssetSet {
    pub fn new(
        descriptors: impl IntoIterator<Item = AssetDescriptor>,
    ) -> Result<Self, AssetSetError> {
        let mut set = AssetSet::default();
        for descriptor in descriptors {
            descriptor.validate()?;
            if set.index.contains_key(&descriptor.name) {
                return Err(AssetSetError::Duplicate(descriptor.name));
            }
            match descriptor.tier {
                Tier::High => set.high += 1,
                Tier::Low => set.low += 1,
            }
            set.index
                .insert(descriptor.name.clone(), set.descriptors.len());
            set.descriptors.push(descriptor);
        }
        Ok(set)
    }

    /// Parse a JSON manifest (see the module docs).
    pub fn from_manifest_str(json: &str) -> Result<Self, AssetSetError> {
        let entries: BTreeMap<String, ManifestEntry> = serde_json::from_str(json)?;
        Self::new(entries.into_iter().map(|(name, entry)| AssetDescriptor {
            name,
            kind: entry.kind,
            locator: entry.path,
            tier: entry.tier,
        }))
    }

    pub fn from_manifest_file(path: impl AsRef<Path>) -> Result<Self, AssetSetError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| AssetSetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_manifest_str(&json)
    }

    pub fn get(&self, name: &str) -> Option<&AssetDescriptor> {
        self.index.get(name).map(|&i| &self.descriptors[i])
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Number of assets declared in `tier`.
    pub fn count(&self, tier: Tier) -> usize {
        match tier {
            Tier::High => self.high,
            Tier::Low => self.low,
        }
    }

    /// Descriptors in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &AssetDescriptor> {
        self.descriptors.iter()
    }

    /// Descriptors with the high tier first, declaration order within a tier.
    pub fn by_priority(&self) -> impl Iterator<Item = &AssetDescriptor> {
        let high = self.descriptors.iter().filter(|d| d.tier == Tier::High);
        let low = self.descriptors.iter().filter(|d| d.tier == Tier::Low);
        high.chain(low)
    }

    /// Kinds used by at least one declared asset.
    pub fn kinds(&self) -> Vec<AssetKind> {
        AssetKind::ALL
            .into_iter()
            .filter(|kind| self.descriptors.iter().any(|d| d.kind == *kind))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_parsing_defaults_tier_to_high() {
        let set = AssetSet::from_manifest_str(
            r#"{
                "interFont": { "kind": "font", "path": "inter.json" },
                "menuTrack": { "kind": "audio", "path": "menu.ogg", "tier": "low" },
                "fox": { "kind": "gltf", "path": "fox.glb" },
                "logo": { "kind": "svg", "path": "logo.svg" },
                "sky": { "kind": "cubeTexture", "path": ["a", "b", "c", "d", "e", "f"] }
            }"#,
        )
        .unwrap();
        assert_eq!(set.len(), 5);
        assert_eq!(set.count(Tier::High), 4);
        assert_eq!(set.count(Tier::Low), 1);
        assert_eq!(set.get("fox").unwrap().kind, AssetKind::Model);
        assert_eq!(set.get("logo").unwrap().kind, AssetKind::VectorGraphic);
        assert_eq!(set.get("sky").unwrap().locator.paths().len(), 6);
        assert_eq!(set.get("interFont").unwrap().tier, Tier::High);
    }

    #[test]
    fn test_by_priority_puts_high_tier_first() {
        let set = AssetSet::new([
            AssetDescriptor::new("c", AssetKind::Audio, "c.ogg", Tier::Low),
            AssetDescriptor::new("a", AssetKind::Texture, "a.png", Tier::High),
            AssetDescriptor::new("b", AssetKind::Texture, "b.png", Tier::High),
        ])
        .unwrap();
        let names: Vec<&str> = set.by_priority().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(set.kinds(), vec![AssetKind::Audio, AssetKind::Texture]);
    }

    #[test]
    fn test_cube_texture_requires_six_faces() {
        let err = AssetSet::new([AssetDescriptor::new(
            "sky",
            AssetKind::CubeTexture,
            Locator::Faces(vec![PathBuf::from("px.png")]),
            Tier::High,
        )])
        .unwrap_err();
        assert!(matches!(err, AssetSetError::CubeFaces { found: 1, .. }));

        let err = AssetSet::new([AssetDescriptor::new(
            "sky",
            AssetKind::CubeTexture,
            "sky.png",
            Tier::High,
        )])
        .unwrap_err();
        assert!(matches!(err, AssetSetError::CubeFaces { .. }));
    }

    #[test]
    fn test_faces_only_for_cube_textures() {
        let err = AssetSet::new([AssetDescriptor::new(
            "track",
            AssetKind::Audio,
            ["a", "b", "c", "d", "e", "f"],
            Tier::High,
        )])
        .unwrap_err();
        assert!(matches!(err, AssetSetError::UnexpectedFaces { .. }));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = AssetSet::new([
            AssetDescriptor::new("a", AssetKind::Texture, "a.png", Tier::High),
            AssetDescriptor::new("a", AssetKind::Texture, "b.png", Tier::Low),
        ])
        .unwrap_err();
        assert!(matches!(err, AssetSetError::Duplicate(name) if name == "a"));
    }

    #[test]
    fn test_unknown_kind_is_a_manifest_error() {
        let err = AssetSet::from_manifest_str(r#"{ "x": { "kind": "video", "path": "x.mp4" } }"#)
            .unwrap_err();
        assert!(matches!(err, AssetSetError::Manifest(_)));
    }
}
