//! Top-level orchestration (spec §2 data flow): rating, unwrapping,
//! packing, rasterizing, colouring and dilating, tied together behind one
//! entry point.

use tracing::instrument;

use crate::atlas::{self, Atlas};
use crate::camera::Camera;
use crate::config::{CamAssignMode, MappingMode, Options};
use crate::error::{Diagnostics, TexturingError};
use crate::image_cache::{FileImageDecoder, ImageCache};
use crate::mesh::Mesh;
use crate::occlusion::OcclusionGrid;
use crate::rating::RatingMatrix;
use crate::unwrap::{self, Chart};

/// Iterations of border dilation run after colouring (spec §4.10); not
/// currently exposed through [`Options`], since the original tool fixes
/// it rather than tuning it per run.
const DILATION_ITERATIONS: u32 = 4;

/// Everything a caller needs after a texturing run. Exactly one of
/// `atlas` or `vertex_colors` carries the run's colour output, chosen by
/// `options.m_mode`: `Texture` and `Flat` pack and colour an atlas (flat
/// with one solid colour per chart); `Vertex` skips packing entirely and
/// colours each mesh vertex directly.
#[derive(Debug)]
pub struct TexturingOutput {
    pub atlas: Option<Atlas>,
    /// One colour per mesh vertex, present only when `options.m_mode ==
    /// MappingMode::Vertex`. Vertices with no visible, rated camera (an
    /// empty camera set, or every incident triangle unseen) fall back to
    /// a default grey rather than being left unset.
    pub vertex_colors: Option<Vec<[u8; 3]>>,
    pub charts: Vec<Chart>,
    pub ratings: RatingMatrix,
    pub diagnostics: Diagnostics,
}

/// Runs the full pipeline over `mesh` and `cameras` under `options`.
///
/// Returns [`TexturingError`] for conditions the caller must act on
/// (invalid options, a packing overflow with no remaining room to grow);
/// everything else recoverable is folded into
/// [`TexturingOutput::diagnostics`] instead of aborting the run.
#[instrument(skip(mesh, cameras), fields(triangles = mesh.triangle_count(), cameras = cameras.len()))]
pub fn texture_mesh(mesh: &Mesh, cameras: &[Camera], options: &Options) -> Result<TexturingOutput, TexturingError> {
    options.validate().map_err(TexturingError::InputInvalid)?;
    if mesh.triangle_count() == 0 {
        return Err(TexturingError::InputInvalid("mesh has no triangles".to_string()));
    }

    let mut diagnostics = Diagnostics::new();
    let adjacency = mesh.build_adjacency();

    let occlusion = if options.ca_mode == CamAssignMode::AreaOccl {
        tracing::debug!("building occlusion grid");
        Some(OcclusionGrid::build(mesh, cameras))
    } else {
        None
    };
    let occlusion_query: Option<&dyn crate::rating::OcclusionQuery> =
        occlusion.as_ref().map(|o| o as &dyn crate::rating::OcclusionQuery);

    tracing::debug!(mode = ?options.ca_mode, "rating cameras");
    let mut ratings = RatingMatrix::compute(mesh, cameras, options.ca_mode, occlusion_query);
    ratings.normalize_by_row_max();
    ratings.shape(options.alpha, options.beta);
    let ratings = ratings.smooth(&adjacency);

    for triangle in 0..mesh.triangle_count() {
        if ratings.is_unseen(triangle) {
            diagnostics.push(crate::error::Diagnostic::Degenerate {
                triangle_index: triangle,
                camera_index: None,
                reason: "no camera rated this triangle above the shaping cutoff".to_string(),
            });
        }
    }

    tracing::debug!("unwrapping charts");
    let charts = unwrap::build_charts(mesh, &ratings, &adjacency, cameras);
    tracing::info!(chart_count = charts.len(), unseen = unwrap::unseen_triangle_count(&charts), "charts built");

    if options.m_mode == MappingMode::Vertex {
        tracing::debug!("colouring per vertex");
        let mut cache: ImageCache<FileImageDecoder> = ImageCache::new(options.image_cache_size);
        let vertex_colors = atlas::colour_vertices(mesh, &ratings, cameras, &mut cache, options, &mut diagnostics);
        return Ok(TexturingOutput { atlas: None, vertex_colors: Some(vertex_colors), charts, ratings, diagnostics });
    }

    tracing::debug!(target_area = options.dimension, "packing charts");
    let packing = crate::pack::pack_charts(&charts, options.dimension, options.power_of_two_im_size)?;

    tracing::debug!(width = packing.width, height = packing.height, "rasterizing atlas");
    let mut atlas = atlas::rasterize_charts(&charts, &packing);

    let mut cache: ImageCache<FileImageDecoder> = ImageCache::new(options.image_cache_size);
    atlas::colour_atlas(&mut atlas, mesh, &charts, &packing, &ratings, cameras, &mut cache, options, &mut diagnostics);

    tracing::debug!(iterations = DILATION_ITERATIONS, "dilating atlas borders");
    atlas::dilate::dilate(&mut atlas, DILATION_ITERATIONS);

    Ok(TexturingOutput { atlas: Some(atlas), vertex_colors: None, charts, ratings, diagnostics })
}
