// Copyright (C) 1996-2001 Id Software, Inc.
// GPL-2.0-or-later
//
// model_types.rs — in-memory world model structures
//
// Surfaces, textures, leaves and nodes live in flat arenas owned by the
// Model; all cross-references are arena indices. The per-frame draw chains
// are index-based singly linked lists: each surface carries one next-link
// per chain type, the heads live on Texture (texture chains) and on the
// frame context (lightmap chains).

use bitflags::bitflags;
use bytemuck::{Pod, Zeroable};
use myq1_common::bspfile::{MAXLIGHTMAPS, MAX_LIGHTSTYLES, MAX_MAP_LEAFS};
use myq1_common::q_shared::{CPlane, Vec3};

use crate::r_local::MAX_LIGHTMAPS;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SurfaceFlags: u32 {
        /// Precomputed plane orientation: surface faces the back of its plane.
        const PLANEBACK  = 0x2;
        const DRAWSKY    = 0x4;
        /// Liquid surface, warp-animated.
        const DRAWTURB   = 0x10;
        /// Drawn without a lightmap (set alongside DRAWSKY and DRAWTURB).
        const DRAWTILED  = 0x20;
        /// Texture was missing from the BSP; drawn with a placeholder.
        const NOTEXTURE  = 0x100;
    }
}

/// Discriminator for the two independent sets of draw-chain state, so world
/// geometry and brush-model entities can rebuild chains without clobbering
/// each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainType {
    World = 0,
    Model = 1,
}

pub const NUM_CHAIN_TYPES: usize = 2;

impl ChainType {
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Handle to a texture object owned by the device/resource layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// One polygon vertex: position, base texture coords, lightmap coords.
#[derive(Debug, Clone, Copy, Default, Pod, Zeroable)]
#[repr(C)]
pub struct PolyVert {
    pub pos: Vec3,
    pub st: [f32; 2],
    pub lm_st: [f32; 2],
}

#[derive(Debug, Clone, Default)]
pub struct Poly {
    pub verts: Vec<PolyVert>,
}

/// A planar polygon belonging to one texture and one lightmap slot.
///
/// `polys[0]` is the base polygon; for warped liquids, `polys[1..]` hold the
/// subdivided sub-polygons used by the legacy water path. Only the transient
/// fields (visframe, culled, chain links) mutate after level load.
#[derive(Debug, Clone)]
pub struct Surface {
    pub plane: u32,
    pub flags: SurfaceFlags,
    pub texture: u32,

    pub mins: Vec3,
    pub maxs: Vec3,

    pub polys: Vec<Poly>,

    // lighting info
    pub lightmaptexturenum: i32, // -1 for unlightmapped (tiled) surfaces
    pub styles: [u8; MAXLIGHTMAPS],
    pub cached_light: [f32; MAXLIGHTMAPS], // lightstyle values baked into the atlas
    pub dlightframe: u32,
    pub cached_dlight: bool,

    // transient per-frame state
    pub visframe: u32, // visible when equal to the current epoch
    pub culled: bool,  // meaningful only when visframe matches the epoch
    pub texturechain: [Option<u32>; NUM_CHAIN_TYPES],
    pub lightmapchain: [Option<u32>; NUM_CHAIN_TYPES],
}

impl Surface {
    pub fn new(plane: u32, texture: u32, flags: SurfaceFlags) -> Self {
        Self {
            plane,
            flags,
            texture,
            mins: [0.0; 3],
            maxs: [0.0; 3],
            polys: Vec::new(),
            lightmaptexturenum: -1,
            styles: [255; MAXLIGHTMAPS],
            cached_light: [0.0; MAXLIGHTMAPS],
            dlightframe: 0,
            cached_dlight: false,
            visframe: 0,
            culled: false,
            texturechain: [None; NUM_CHAIN_TYPES],
            lightmapchain: [None; NUM_CHAIN_TYPES],
        }
    }
}

#[derive(Debug, Clone)]
pub struct Texture {
    pub name: String,
    pub gltexture: TextureHandle,
    /// Fullbright overlay frame, if the base texture has fullbright texels.
    pub fullbright: Option<TextureHandle>,
    /// Continuously warp-animated image for liquids (modern water path).
    pub warpimage: Option<TextureHandle>,
    /// Tells the warp-image updater to refresh warpimage this frame.
    pub update_warp: bool,

    // animation chain
    pub numframes: i32,
    pub anim_next: Option<u32>,

    // transient per-frame chain heads, reset on every chain rebuild
    pub texturechains: [Option<u32>; NUM_CHAIN_TYPES],
}

impl Texture {
    pub fn new(name: &str, gltexture: TextureHandle) -> Self {
        Self {
            name: name.to_string(),
            gltexture,
            fullbright: None,
            warpimage: None,
            update_warp: false,
            numframes: 1,
            anim_next: None,
            texturechains: [None; NUM_CHAIN_TYPES],
        }
    }
}

/// Terminal node of the spatial partition.
///
/// `efrags` holds ids of static entities currently fragmented into this
/// leaf; it changes independently of the static surface set.
#[derive(Debug, Clone)]
pub struct Leaf {
    pub contents: i32,
    pub mins: Vec3,
    pub maxs: Vec3,
    pub first_mark_surface: u32,
    pub num_mark_surfaces: u32,
    pub efrags: Vec<u32>,
}

impl Leaf {
    pub fn new(contents: i32) -> Self {
        Self {
            contents,
            mins: [0.0; 3],
            maxs: [0.0; 3],
            first_mark_surface: 0,
            num_mark_surfaces: 0,
            efrags: Vec::new(),
        }
    }
}

/// Interior tree node; only the surface range matters to chain rebuilding,
/// which walks surfaces in node order.
#[derive(Debug, Clone, Copy, Default)]
pub struct Node {
    pub first_surface: u32,
    pub num_surfaces: u32,
}

/// Entity state the pipeline cares about: animation frame and encoded alpha.
#[derive(Debug, Clone, Copy, Default)]
pub struct Entity {
    pub frame: i32,
    pub alpha: u8, // 0 = default (opaque), else 1..=255 maps to 0.0..=1.0
}

/// Decode an entity alpha byte to a blend factor.
pub fn entalpha_decode(alpha: u8) -> f32 {
    if alpha == 0 {
        1.0
    } else {
        (alpha - 1) as f32 / 254.0
    }
}

#[derive(Debug)]
pub enum ModelError {
    PlaneOutOfRange { surface: usize, plane: u32 },
    TextureOutOfRange { surface: usize, texture: u32 },
    LightmapOutOfRange { surface: usize, slot: i32 },
    StyleOutOfRange { surface: usize, style: u8 },
    NodeSurfacesOutOfRange { node: usize },
    TooManyLeafs { count: usize },
    MarkSurfaceOutOfRange { leaf: usize },
    ModelSurfacesOutOfRange,
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::PlaneOutOfRange { surface, plane } => {
                write!(f, "surface {} references plane {} out of range", surface, plane)
            }
            ModelError::TextureOutOfRange { surface, texture } => {
                write!(f, "surface {} references texture {} out of range", surface, texture)
            }
            ModelError::LightmapOutOfRange { surface, slot } => {
                write!(f, "surface {} references lightmap slot {} out of range", surface, slot)
            }
            ModelError::StyleOutOfRange { surface, style } => {
                write!(f, "surface {} has lightstyle {} out of range", surface, style)
            }
            ModelError::TooManyLeafs { count } => {
                write!(f, "{} leafs exceeds the map format limit", count)
            }
            ModelError::NodeSurfacesOutOfRange { node } => {
                write!(f, "node {} surface range out of bounds", node)
            }
            ModelError::MarkSurfaceOutOfRange { leaf } => {
                write!(f, "leaf {} mark-surface range out of bounds", leaf)
            }
            ModelError::ModelSurfacesOutOfRange => {
                write!(f, "model surface range out of bounds")
            }
        }
    }
}

impl std::error::Error for ModelError {}

/// A brush model: the world, or an inline submodel (door, platform).
///
/// Surfaces are allocated once at level load and never destroyed while
/// rendering; leaf 0 is the universal solid leaf and visibility bit `i`
/// corresponds to `leafs[i + 1]`.
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub name: String,
    pub is_world: bool,

    pub planes: Vec<CPlane>,
    pub textures: Vec<Option<Texture>>,
    pub surfaces: Vec<Surface>,
    pub marksurfaces: Vec<u32>,
    pub leafs: Vec<Leaf>,
    pub nodes: Vec<Node>,

    pub firstmodelsurface: u32,
    pub nummodelsurfaces: u32,
}

impl Model {
    /// Number of visibility leaves, not counting the solid leaf 0.
    pub fn num_vis_leafs(&self) -> usize {
        self.leafs.len().saturating_sub(1)
    }

    /// Surface index range belonging to this model.
    pub fn surface_range(&self) -> std::ops::Range<usize> {
        let first = self.firstmodelsurface as usize;
        first..first + self.nummodelsurfaces as usize
    }

    /// Check every cross-arena index once at load; the render loop indexes
    /// without rechecking afterwards.
    pub fn validate(&self) -> Result<(), ModelError> {
        for (i, s) in self.surfaces.iter().enumerate() {
            if s.plane as usize >= self.planes.len() {
                return Err(ModelError::PlaneOutOfRange { surface: i, plane: s.plane });
            }
            if s.texture as usize >= self.textures.len() {
                return Err(ModelError::TextureOutOfRange { surface: i, texture: s.texture });
            }
            if !s.flags.contains(SurfaceFlags::DRAWTILED)
                && (s.lightmaptexturenum < 0 || s.lightmaptexturenum as usize >= MAX_LIGHTMAPS)
            {
                return Err(ModelError::LightmapOutOfRange {
                    surface: i,
                    slot: s.lightmaptexturenum,
                });
            }
            // 255 terminates the style list; the rest index the style table
            for &style in &s.styles {
                if style != 255 && style as usize >= MAX_LIGHTSTYLES {
                    return Err(ModelError::StyleOutOfRange { surface: i, style });
                }
            }
        }
        if self.leafs.len() > MAX_MAP_LEAFS {
            return Err(ModelError::TooManyLeafs { count: self.leafs.len() });
        }
        for (i, n) in self.nodes.iter().enumerate() {
            if (n.first_surface + n.num_surfaces) as usize > self.surfaces.len() {
                return Err(ModelError::NodeSurfacesOutOfRange { node: i });
            }
        }
        for (i, l) in self.leafs.iter().enumerate() {
            let end = (l.first_mark_surface + l.num_mark_surfaces) as usize;
            if end > self.marksurfaces.len() {
                return Err(ModelError::MarkSurfaceOutOfRange { leaf: i });
            }
        }
        if self.marksurfaces.iter().any(|&m| m as usize >= self.surfaces.len()) {
            return Err(ModelError::ModelSurfacesOutOfRange);
        }
        if self.surface_range().end > self.surfaces.len() {
            return Err(ModelError::ModelSurfacesOutOfRange);
        }
        Ok(())
    }
}

// =============================================================
//  Tests
// =============================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surf_flags_are_distinct_bits() {
        let flags = [
            SurfaceFlags::PLANEBACK,
            SurfaceFlags::DRAWSKY,
            SurfaceFlags::DRAWTURB,
            SurfaceFlags::DRAWTILED,
            SurfaceFlags::NOTEXTURE,
        ];
        for i in 0..flags.len() {
            for j in (i + 1)..flags.len() {
                assert!((flags[i] & flags[j]).is_empty());
            }
        }
    }

    #[test]
    fn test_chain_type_indices() {
        assert_eq!(ChainType::World.index(), 0);
        assert_eq!(ChainType::Model.index(), 1);
        assert_eq!(NUM_CHAIN_TYPES, 2);
    }

    #[test]
    fn test_entalpha_decode() {
        // 0 means "no alpha set" and decodes to opaque
        assert_eq!(entalpha_decode(0), 1.0);
        assert_eq!(entalpha_decode(1), 0.0);
        assert_eq!(entalpha_decode(255), 1.0);
        assert!((entalpha_decode(128) - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_new_surface_has_clear_transient_state() {
        let s = Surface::new(0, 0, SurfaceFlags::empty());
        assert_eq!(s.visframe, 0);
        assert!(!s.culled);
        assert_eq!(s.texturechain, [None; NUM_CHAIN_TYPES]);
        assert_eq!(s.lightmapchain, [None; NUM_CHAIN_TYPES]);
        assert_eq!(s.styles, [255; MAXLIGHTMAPS]);
    }

    #[test]
    fn test_poly_vert_is_pod() {
        let v = PolyVert {
            pos: [1.0, 2.0, 3.0],
            st: [0.5, 0.5],
            lm_st: [0.25, 0.75],
        };
        let bytes: &[u8] = bytemuck::bytes_of(&v);
        assert_eq!(bytes.len(), 7 * std::mem::size_of::<f32>());
    }

    #[test]
    fn test_validate_empty_model() {
        let model = Model::default();
        assert!(model.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_plane() {
        let mut model = Model::default();
        model.textures.push(Some(Texture::new("wall", TextureHandle(1))));
        let mut s = Surface::new(3, 0, SurfaceFlags::empty());
        s.lightmaptexturenum = 0;
        model.surfaces.push(s);
        model.nummodelsurfaces = 1;
        assert!(matches!(
            model.validate(),
            Err(ModelError::PlaneOutOfRange { surface: 0, plane: 3 })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_lightmap_slot() {
        let mut model = Model::default();
        model.planes.push(CPlane::default());
        model.textures.push(Some(Texture::new("wall", TextureHandle(1))));
        let s = Surface::new(0, 0, SurfaceFlags::empty()); // lightmaptexturenum = -1
        model.surfaces.push(s);
        model.nummodelsurfaces = 1;
        assert!(matches!(
            model.validate(),
            Err(ModelError::LightmapOutOfRange { surface: 0, slot: -1 })
        ));
    }

    #[test]
    fn test_validate_tiled_surface_needs_no_lightmap() {
        let mut model = Model::default();
        model.planes.push(CPlane::default());
        model.textures.push(Some(Texture::new("*water", TextureHandle(1))));
        let s = Surface::new(0, 0, SurfaceFlags::DRAWTURB | SurfaceFlags::DRAWTILED);
        model.surfaces.push(s);
        model.nummodelsurfaces = 1;
        assert!(model.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_style() {
        let mut model = Model::default();
        model.planes.push(CPlane::default());
        model.textures.push(Some(Texture::new("wall", TextureHandle(1))));
        let mut s = Surface::new(0, 0, SurfaceFlags::empty());
        s.lightmaptexturenum = 0;
        s.styles[0] = 100; // past the style table, not the 255 terminator
        model.surfaces.push(s);
        model.nummodelsurfaces = 1;
        assert!(matches!(
            model.validate(),
            Err(ModelError::StyleOutOfRange { surface: 0, style: 100 })
        ));
    }

    #[test]
    fn test_validate_rejects_too_many_leafs() {
        let mut model = Model::default();
        model.leafs = vec![Leaf::new(myq1_common::bspfile::CONTENTS_SOLID); MAX_MAP_LEAFS + 1];
        assert!(matches!(model.validate(), Err(ModelError::TooManyLeafs { .. })));
    }

    #[test]
    fn test_validate_rejects_bad_marksurface() {
        let mut model = Model::default();
        model.planes.push(CPlane::default());
        model.textures.push(Some(Texture::new("wall", TextureHandle(1))));
        let mut s = Surface::new(0, 0, SurfaceFlags::empty());
        s.lightmaptexturenum = 0;
        model.surfaces.push(s);
        model.nummodelsurfaces = 1;
        model.marksurfaces.push(5); // only one surface exists
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_node_range() {
        let mut model = Model::default();
        model.nodes.push(Node { first_surface: 0, num_surfaces: 2 });
        assert!(matches!(
            model.validate(),
            Err(ModelError::NodeSurfacesOutOfRange { node: 0 })
        ));
    }

    #[test]
    fn test_model_error_display() {
        let err = ModelError::TextureOutOfRange { surface: 7, texture: 42 };
        let msg = format!("{}", err);
        assert!(msg.contains('7') && msg.contains("42"));
    }
}
