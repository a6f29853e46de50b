// r_local.rs — renderer-local frame state
//
// Per-frame renderer state (visibility epoch, previous view leaf, lightmap
// chain heads, frame stats) lives on WorldRenderer and is threaded through
// the pipeline entry points.

use myq1_common::bspfile::MAX_LIGHTSTYLES;
use myq1_common::q_shared::Vec3;

use crate::device::DeviceCaps;
use crate::model_types::{ChainType, NUM_CHAIN_TYPES};
use crate::r_main::Frustum;

/// Lightmap atlas page count.
pub const MAX_LIGHTMAPS: usize = 128;

/// Rendering-mode switches as plain data; the field docs name the cvars
/// they descend from.
#[derive(Debug, Clone, Copy)]
pub struct WorldSettings {
    /// Disable PVS culling entirely (r_novis).
    pub novis: bool,
    /// Master world-drawing switch (r_drawworld).
    pub draw_world: bool,
    /// Flat-color debug view (r_drawflat).
    pub drawflat: bool,
    /// Texture-only debug view (r_fullbright).
    pub fullbright: bool,
    /// Lightmap visualization debug view (r_lightmap).
    pub lightmap_only: bool,
    /// Scale lightmap contribution 2x (gl_overbright).
    pub overbright: bool,
    /// Draw fullbright overlay textures (gl_fullbrights).
    pub gl_fullbrights: bool,
    /// CPU-warped subdivided water instead of warp images (r_oldwater).
    pub oldwater: bool,
    /// Treat sky leaves as ordinary geometry (r_oldskyleaf).
    pub oldskyleaf: bool,
    /// Refresh lightmaps for style/dlight changes (r_dynamic).
    pub dynamic_lightmaps: bool,
    /// World water transparency (r_wateralpha).
    pub wateralpha: f32,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            novis: false,
            draw_world: true,
            drawflat: false,
            fullbright: false,
            lightmap_only: false,
            overbright: true,
            gl_fullbrights: true,
            oldwater: false,
            oldskyleaf: false,
            dynamic_lightmaps: true,
            wateralpha: 1.0,
        }
    }
}

/// Per-frame counters (rs_brushpolys / rs_brushpasses).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Surfaces surviving visibility + culling this frame.
    pub brushpolys: u32,
    /// Polygons actually submitted, across all passes.
    pub brushpasses: u32,
}

pub struct WorldRenderer {
    pub settings: WorldSettings,
    pub caps: DeviceCaps,

    // view state for this frame
    pub vieworg: Vec3,
    pub frustum: Frustum,
    pub time: f32,

    // visibility epoch bookkeeping
    pub(crate) visframecount: u32,
    pub(crate) framecount: u32,
    pub(crate) oldviewleaf: Option<usize>,
    pub(crate) vis_changed: bool,

    // lightmap chain heads per chain type, indexed by atlas slot
    pub(crate) lightmap_chains: [[Option<u32>; MAX_LIGHTMAPS]; NUM_CHAIN_TYPES],
    pub(crate) lightmap_modified: [bool; MAX_LIGHTMAPS],

    pub lightstyles: [f32; MAX_LIGHTSTYLES],

    /// Entities re-attached from visible leaves' efrags this frame.
    pub visedicts: Vec<u32>,

    pub stats: FrameStats,
}

impl WorldRenderer {
    pub fn new(caps: DeviceCaps) -> Self {
        Self {
            settings: WorldSettings::default(),
            caps,
            vieworg: [0.0; 3],
            frustum: Frustum::default(),
            time: 0.0,
            visframecount: 0,
            // starts at 1 so dlightframe fields initialized to 0 don't match
            framecount: 1,
            oldviewleaf: None,
            vis_changed: false,
            lightmap_chains: [[None; MAX_LIGHTMAPS]; NUM_CHAIN_TYPES],
            lightmap_modified: [false; MAX_LIGHTMAPS],
            lightstyles: [1.0; MAX_LIGHTSTYLES],
            visedicts: Vec::new(),
            stats: FrameStats::default(),
        }
    }

    /// Reset per-frame state; call once before the pipeline runs.
    pub fn begin_frame(&mut self, vieworg: Vec3, frustum: Frustum, time: f32) {
        self.vieworg = vieworg;
        self.frustum = frustum;
        self.time = time;
        self.framecount = self.framecount.wrapping_add(1);
        self.visedicts.clear();
        self.stats = FrameStats::default();
    }

    /// Force the next mark_surfaces to rebuild chains even if the viewer
    /// leaf is unchanged (lightstyle changes, level reload, etc.).
    pub fn invalidate_vis(&mut self) {
        self.vis_changed = true;
    }

    /// Current visibility epoch; a surface is visible this frame iff its
    /// stamp equals this.
    pub fn epoch(&self) -> u32 {
        self.visframecount
    }

    pub fn lightmap_chain_head(&self, chain: ChainType, slot: usize) -> Option<u32> {
        self.lightmap_chains[chain.index()][slot]
    }

    /// Re-attach a visible leaf's efrag entities to the frame's entity list.
    pub(crate) fn store_efrags(&mut self, efrags: &[u32]) {
        self.visedicts.extend_from_slice(efrags);
    }
}

// =============================================================
//  Tests
// =============================================================
