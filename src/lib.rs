//! Multi-view texturing core: camera rating, visibility, chart unwrapping,
//! packing and atlas colouring for a calibrated 3D mesh.
//!
//! This crate implements the camera-rating/visibility engine and the
//! chart-packing/atlas-rasterization/colouring pipeline described in
//! `SPEC_FULL.md`. Mesh and image I/O, command-line parsing and
//! face-detection are external collaborators: this crate consumes a
//! [`mesh::Mesh`], a list of [`camera::Camera`]s and an [`config::Options`]
//! record, and produces either a textured atlas or per-vertex colours.

pub mod atlas;
pub mod camera;
pub mod config;
pub mod error;
pub mod geometry;
pub mod image_cache;
pub mod math;
pub mod mesh;
pub mod occlusion;
pub mod pack;
pub mod pipeline;
pub mod rating;
pub mod unwrap;

pub use camera::Camera;
pub use config::{CamAssignMode, MappingMode, Options};
pub use error::{Diagnostic, Diagnostics, TexturingError};
pub use mesh::{Mesh, Triangle};
pub use pipeline::{texture_mesh, TexturingOutput};
