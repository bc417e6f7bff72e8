//! Declared assets and the loader that fetches them.
//!
//! - [`descriptor`] – asset kinds, tiers, locators and the validated [`AssetSet`]
//! - [`handle`] – decoded payloads and the shared [`LoadedAsset`] handle
//! - [`subloader`] – one lazily created [`SubLoader`] per asset kind
//! - [`loader`] – the [`ResourceLoader`] resource and its tier readiness

pub mod descriptor;
pub mod handle;
pub mod loader;
pub mod subloader;

pub use descriptor::{AssetDescriptor, AssetKind, AssetSet, AssetSetError, Locator, Tier};
pub use handle::{AssetData, AssetLookup, LoadedAsset};
pub use loader::{EnvironmentError, LoadError, LoadProgress, LoaderTasks, ResourceLoader};
pub use subloader::{SubLoader, SubLoaderFactory, SubLoaders};
