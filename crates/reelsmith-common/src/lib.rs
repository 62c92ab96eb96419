//! Reelsmith-Common: Shared types and error kinds for the montage pipeline.
//!
//! This crate provides the vocabulary every pipeline stage speaks:
//!
//! - **Licensing**: [`License`] and [`LicenseSet`], the CC0 / CC-BY filter
//! - **Assets**: [`Asset`] with its provenance sidecar, and [`LicensedAsset`],
//!   the only form of asset the assembler accepts
//! - **Scene plans**: [`ScenePlanEntry`] and [`SceneRole`]
//! - **Path Utilities**: media kind detection and sidecar naming
//! - **Error Handling**: the pipeline error kinds and result alias
//!
//! # Examples
//!
//! ```
//! use reelsmith_common::{Asset, License, LicenseSet, MediaKind};
//!
//! let asset = Asset::new("clip.mp4", "pexels", License::Cc0, "Jane Doe", MediaKind::Video);
//! let licensed = asset.into_licensed(&LicenseSet::default()).unwrap();
//! assert_eq!(licensed.license, License::Cc0);
//! ```

pub mod asset;
pub mod error;
pub mod license;
pub mod paths;
pub mod scene;

pub use asset::{Asset, LicensedAsset, MediaKind};
pub use error::{Error, Result};
pub use license::{License, LicenseSet};
pub use scene::{ScenePlanEntry, SceneRole};
