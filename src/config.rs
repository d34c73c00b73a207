//! Pipeline configuration (spec §6).
//!
//! `Options` is the single record every pipeline stage reads its knobs
//! from. Loading it from a config file or argv is an external collaborator
//! (spec §1); this module only defines the record and its defaults, which
//! mirror the original `SSMVtex::Multitexturer` defaults.

use serde::{Deserialize, Serialize};

/// Rating strategy (spec §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CamAssignMode {
    /// Per-triangle face normal vs. view vector.
    NormalVertex,
    /// Per-vertex normal vs. view vector, averaged.
    NormalBaricenter,
    /// Projected triangle area in pixel space.
    Area,
    /// Projected area, zeroed where any vertex is occluded.
    AreaOccl,
}

impl Default for CamAssignMode {
    fn default() -> Self {
        CamAssignMode::AreaOccl
    }
}

/// Output mapping mode (spec §6 `m_mode`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MappingMode {
    /// Pack charts into a texture atlas.
    Texture,
    /// Colour per vertex, no atlas.
    Vertex,
    /// One solid colour per chart (debug visualisation).
    Flat,
}

impl Default for MappingMode {
    fn default() -> Self {
        MappingMode::Texture
    }
}

/// Input representation mode (spec §6 `in_mode`). Only `Mesh` is
/// implemented by this crate; `Splat` is accepted for forward
/// compatibility with callers but rejected at the pipeline entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputMode {
    Mesh,
    Splat,
}

impl Default for InputMode {
    fn default() -> Self {
        InputMode::Mesh
    }
}

/// Chosen output serializer. Serialization itself is out of scope for this
/// crate; this is carried through so a caller's exporter can dispatch on
/// it without duplicating the enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutExtension {
    Obj,
    Ply,
    Vrml,
}

impl Default for OutExtension {
    fn default() -> Self {
        OutExtension::Obj
    }
}

/// All tunables of a texturing run (spec §6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Options {
    pub ca_mode: CamAssignMode,
    pub m_mode: MappingMode,
    pub in_mode: InputMode,

    /// Cap on cameras blended per texel (must be >= 1).
    pub num_cam_mix: usize,
    /// Shaping cutoff, spec §4.4; must be in `[0, 1)`.
    pub alpha: f32,
    /// Shaping curvature, spec §4.4; must be > 0.
    pub beta: f32,
    /// Target atlas area in texels.
    pub dimension: u32,
    /// LRU capacity of the image cache, in images.
    pub image_cache_size: usize,

    /// Tint occluded-but-unrated regions instead of leaving them as
    /// background (debug aid, spec §6).
    pub highlight_occlusions: bool,
    /// Round the final atlas extents up to powers of two.
    pub power_of_two_im_size: bool,
    /// Run the photoconsistency outlier filter (spec §4.9).
    pub photoconsistency: bool,

    pub out_extension: OutExtension,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            ca_mode: CamAssignMode::default(),
            m_mode: MappingMode::default(),
            in_mode: InputMode::default(),
            num_cam_mix: 1,
            alpha: 0.5,
            beta: 1.0,
            dimension: 10_000_000,
            image_cache_size: 75,
            highlight_occlusions: false,
            power_of_two_im_size: false,
            photoconsistency: true,
            out_extension: OutExtension::default(),
        }
    }
}

impl Options {
    /// Validates the numeric ranges spec.md documents as invariants
    /// (`alpha in [0,1)`, `beta > 0`, `num_cam_mix >= 1`). Returns a
    /// human-readable reason on failure; does not mutate `self`.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..1.0).contains(&self.alpha) {
            return Err(format!("alpha must be in [0, 1), got {}", self.alpha));
        }
        if self.beta <= 0.0 {
            return Err(format!("beta must be > 0, got {}", self.beta));
        }
        if self.num_cam_mix == 0 {
            return Err("num_cam_mix must be >= 1".to_string());
        }
        if self.dimension == 0 {
            return Err("dimension must be > 0".to_string());
        }
        Ok(())
    }
}
