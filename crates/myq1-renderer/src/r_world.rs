// Copyright (C) 1996-2001 Id Software, Inc.
// GPL-2.0-or-later
//
// r_world.rs — world model rendering: chain setup and draw chains

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use myq1_common::bspfile::{CONTENTS_SKY, CONTENTS_SOLID};
use myq1_common::q_shared::{dot_product, PLANE_X, PLANE_Y, PLANE_Z};

use crate::device::{BlendFunc, DeviceCaps, RenderDevice, TexCoords, TexEnv};
use crate::model_types::{
    entalpha_decode, ChainType, Entity, Model, Surface, SurfaceFlags,
};
use crate::r_local::{WorldRenderer, MAX_LIGHTMAPS};
use crate::vis::{VisBits, VisProvider};
use crate::warp::warp_poly_verts;

const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

//==============================================================================
//
// SETUP CHAINS
//
//==============================================================================

/// Add a surface to the head of the texture chain of its texture.
pub(crate) fn chain_surface(model: &mut Model, surf_idx: u32, chain: ChainType) {
    let ct = chain.index();
    let tex = model.surfaces[surf_idx as usize].texture as usize;
    let head = match model.textures.get(tex).and_then(|t| t.as_ref()) {
        Some(t) => t.texturechains[ct],
        None => {
            log::debug!("surface {} references missing texture {}, not chained", surf_idx, tex);
            return;
        }
    };
    model.surfaces[surf_idx as usize].texturechain[ct] = head;
    if let Some(Some(t)) = model.textures.get_mut(tex) {
        t.texturechains[ct] = Some(surf_idx);
    }
}

/// Select the animation frame of a texture for the given entity frame.
pub fn texture_animation(model: &Model, tex: usize, frame: i32) -> usize {
    let base = match model.textures.get(tex).and_then(|t| t.as_ref()) {
        Some(t) => t,
        None => return tex,
    };
    if base.anim_next.is_none() || base.numframes <= 0 {
        return tex;
    }

    let mut count = frame % base.numframes;
    let mut current = tex;
    while count > 0 {
        match model.textures.get(current).and_then(|t| t.as_ref()).and_then(|t| t.anim_next) {
            Some(next) => current = next as usize,
            None => break,
        }
        count -= 1;
    }
    current
}

/// Compositing strategy for the normal (non-debug) draw path, fixed once
/// per draw call from the capability flags and the entity's transparency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldDrawStrategy {
    /// Texture and lightmap in one pass, overbright via texture combiners.
    CombinedOverbright,
    /// Just the texture; multi-pass compositing can't blend with entity alpha.
    TextureOnly,
    /// Texture and lightmap in one pass, regular modulation.
    Combined,
    /// Texture pass, blended lightmap pass, optional fog correction pass.
    MultiPass { overbright: bool },
}

impl WorldDrawStrategy {
    pub fn select(caps: DeviceCaps, overbright: bool, entalpha: f32) -> Self {
        if overbright {
            if caps.texture_combine && caps.multitexture {
                WorldDrawStrategy::CombinedOverbright
            } else if entalpha < 1.0 {
                WorldDrawStrategy::TextureOnly
            } else {
                WorldDrawStrategy::MultiPass { overbright: true }
            }
        } else if caps.multitexture {
            WorldDrawStrategy::Combined
        } else if entalpha < 1.0 {
            WorldDrawStrategy::TextureOnly
        } else {
            WorldDrawStrategy::MultiPass { overbright: false }
        }
    }
}

/// Deterministic pseudo-random debug color, seeded from the polygon's
/// identity in the surface arena so the flat view is stable across runs.
fn flat_color(surf_idx: usize, poly_idx: usize) -> [f32; 4] {
    let seed = ((surf_idx as u64) << 16) | poly_idx as u64;
    let mut rng = StdRng::seed_from_u64(seed);
    [
        rng.gen_range(0..256) as f32 / 255.0,
        rng.gen_range(0..256) as f32 / 255.0,
        rng.gen_range(0..256) as f32 / 255.0,
        1.0,
    ]
}

fn begin_transparent_drawing<D: RenderDevice>(device: &mut D, entalpha: f32) {
    if entalpha < 1.0 {
        device.set_depth_mask(false);
        device.set_blend(true);
        device.set_tex_env(TexEnv::Modulate);
        device.set_color([1.0, 1.0, 1.0, entalpha]);
    }
}

fn end_transparent_drawing<D: RenderDevice>(device: &mut D, entalpha: f32) {
    if entalpha < 1.0 {
        device.set_depth_mask(true);
        device.set_blend(false);
        device.set_tex_env(TexEnv::Replace);
        device.set_color(WHITE);
    }
}

impl WorldRenderer {
    /// Clear the lightmap chains and texture chains a model will use.
    pub fn clear_texture_chains(&mut self, model: &mut Model, chain: ChainType) {
        self.clear_lightmap_chains(chain);
        for tex in model.textures.iter_mut().flatten() {
            tex.texturechains[chain.index()] = None;
        }
    }

    /// Mark surfaces based on the PVS and rebuild the world texture chains.
    ///
    /// Skipped entirely (except for efrag re-attachment) when the viewer is
    /// still in last frame's leaf, nothing invalidated the visibility set,
    /// and no water portal is adjacent.
    pub fn mark_surfaces(&mut self, world: &mut Model, viewleaf: usize, vis: &dyn VisProvider) {
        // clear lightmap chains
        self.clear_lightmap_chains(ChainType::World);

        // check this leaf for water portals
        // TODO: loop through all water surfs and use distance to leaf cullbox
        let mut nearwaterportal = false;
        {
            let leaf = &world.leafs[viewleaf];
            let first = leaf.first_mark_surface as usize;
            for m in 0..leaf.num_mark_surfaces as usize {
                let s = world.marksurfaces[first + m] as usize;
                if world.surfaces[s].flags.contains(SurfaceFlags::DRAWTURB) {
                    nearwaterportal = true;
                    break;
                }
            }
        }

        // choose vis data
        let contents = world.leafs[viewleaf].contents;
        let visdata = if self.settings.novis || contents == CONTENTS_SOLID || contents == CONTENTS_SKY
        {
            VisBits::all_visible(world.num_vis_leafs())
        } else if nearwaterportal {
            vis.fat_pvs(self.vieworg, world)
        } else {
            vis.leaf_pvs(viewleaf, world)
        };

        // if surface chains don't need regenerating, just add static entities
        if self.oldviewleaf == Some(viewleaf) && !self.vis_changed && !nearwaterportal {
            for i in 0..world.num_vis_leafs() {
                if visdata.test(i) && !world.leafs[i + 1].efrags.is_empty() {
                    self.store_efrags(&world.leafs[i + 1].efrags);
                }
            }
            return;
        }

        self.vis_changed = false;
        self.visframecount += 1;
        self.oldviewleaf = Some(viewleaf);

        // iterate through leaves, marking surfaces
        for i in 0..world.num_vis_leafs() {
            if !visdata.test(i) {
                continue;
            }
            let (contents, first, count) = {
                let leaf = &world.leafs[i + 1];
                (
                    leaf.contents,
                    leaf.first_mark_surface as usize,
                    leaf.num_mark_surfaces as usize,
                )
            };
            if self.settings.oldskyleaf || contents != CONTENTS_SKY {
                for m in 0..count {
                    let s = world.marksurfaces[first + m] as usize;
                    world.surfaces[s].visframe = self.visframecount;
                }
            }

            // add static models
            if !world.leafs[i + 1].efrags.is_empty() {
                self.store_efrags(&world.leafs[i + 1].efrags);
            }
        }

        // set all chains to null
        self.clear_texture_chains(world, ChainType::World);

        // rebuild chains: iterate through surfaces one node at a time, so
        // surfaces stripped from the geometry by external tools (which leave
        // stale leaf mark-surface references behind) are skipped safely
        for node_idx in 0..world.nodes.len() {
            let node = world.nodes[node_idx];
            for j in 0..node.num_surfaces {
                let s = (node.first_surface + j) as usize;
                if world.surfaces[s].visframe == self.visframecount {
                    chain_surface(world, s as u32, ChainType::World);
                }
            }
        }
    }

    /// Returns true if the surface is facing away from the view origin.
    pub fn back_face_cull(&self, model: &Model, surf: &Surface) -> bool {
        let plane = &model.planes[surf.plane as usize];
        let dot = match plane.plane_type {
            PLANE_X => self.vieworg[0] - plane.dist,
            PLANE_Y => self.vieworg[1] - plane.dist,
            PLANE_Z => self.vieworg[2] - plane.dist,
            _ => dot_product(&self.vieworg, &plane.normal) - plane.dist,
        };
        (dot < 0.0) ^ surf.flags.contains(SurfaceFlags::PLANEBACK)
    }

    /// Frustum- and back-face-cull every surface stamped this frame.
    pub fn cull_surfaces(&mut self, world: &mut Model) {
        if !self.settings.draw_world {
            return;
        }

        for s in world.surface_range() {
            if world.surfaces[s].visframe != self.visframecount {
                continue;
            }
            let culled = {
                let surf = &world.surfaces[s];
                self.frustum.cull_box(&surf.mins, &surf.maxs) || self.back_face_cull(world, surf)
            };
            world.surfaces[s].culled = culled;
            if !culled {
                self.stats.brushpolys += 1; // count wpolys here
                let tex = world.surfaces[s].texture as usize;
                if let Some(Some(t)) = world.textures.get_mut(tex) {
                    if t.warpimage.is_some() {
                        t.update_warp = true;
                    }
                }
            }
        }
    }

    /// Rebuild the lightmap chains for a model; used as a side effect of the
    /// multi-pass draw strategies and standalone for lightmap visualization.
    pub fn build_lightmap_chains(&mut self, model: &mut Model, chain: ChainType) {
        let isworld = model.is_world;

        // cleared in mark_surfaces already, but this can also run standalone
        self.clear_lightmap_chains(chain);

        for s in model.surface_range() {
            let eligible = if !isworld {
                // non-world models have no leaf-based culling
                true
            } else {
                let surf = &model.surfaces[s];
                surf.visframe == self.visframecount
                    && !self.frustum.cull_box(&surf.mins, &surf.maxs)
                    && !self.back_face_cull(model, surf)
            };
            if eligible {
                self.render_dynamic_lightmaps(model, s, chain);
            }
        }
    }

    //==========================================================================
    //
    // DRAW CHAINS
    //
    //==========================================================================

    /// Wireframe debug pass: outline every surviving surface. Legacy water
    /// draws its warped sub-polygon chain instead of the base polygon.
    pub fn draw_showtris<D: RenderDevice>(&mut self, model: &Model, chain: ChainType, device: &mut D) {
        let ct = chain.index();
        for tex_idx in 0..model.textures.len() {
            let head = match &model.textures[tex_idx] {
                Some(t) => t.texturechains[ct],
                None => continue,
            };
            let head_flags = match head {
                Some(h) => model.surfaces[h as usize].flags,
                None => continue,
            };

            if self.settings.oldwater && head_flags.contains(SurfaceFlags::DRAWTURB) {
                let mut cursor = head;
                while let Some(si) = cursor {
                    let surf = &model.surfaces[si as usize];
                    cursor = surf.texturechain[ct];
                    if surf.culled {
                        continue;
                    }
                    for p in surf.polys.iter().skip(1) {
                        device.submit_fan(&p.verts);
                    }
                }
            } else {
                let mut cursor = head;
                while let Some(si) = cursor {
                    let surf = &model.surfaces[si as usize];
                    cursor = surf.texturechain[ct];
                    if surf.culled {
                        continue;
                    }
                    if let Some(p) = surf.polys.first() {
                        device.submit_fan(&p.verts);
                    }
                }
            }
        }
    }

    /// Flat-color debug pass: each polygon in a solid color derived from its
    /// identity. Texturing is expected to be disabled by the caller.
    fn draw_chains_drawflat<D: RenderDevice>(&mut self, model: &Model, chain: ChainType, device: &mut D) {
        let ct = chain.index();
        for tex_idx in 0..model.textures.len() {
            let head = match &model.textures[tex_idx] {
                Some(t) => t.texturechains[ct],
                None => continue,
            };
            let head_flags = match head {
                Some(h) => model.surfaces[h as usize].flags,
                None => continue,
            };

            if self.settings.oldwater && head_flags.contains(SurfaceFlags::DRAWTURB) {
                let mut cursor = head;
                while let Some(si) = cursor {
                    let surf = &model.surfaces[si as usize];
                    cursor = surf.texturechain[ct];
                    if surf.culled {
                        continue;
                    }
                    for (j, p) in surf.polys.iter().enumerate().skip(1) {
                        device.set_color(flat_color(si as usize, j));
                        device.submit_polygon(&p.verts, TexCoords::Base);
                        self.stats.brushpasses += 1;
                    }
                }
            } else {
                let mut cursor = head;
                while let Some(si) = cursor {
                    let surf = &model.surfaces[si as usize];
                    cursor = surf.texturechain[ct];
                    if surf.culled {
                        continue;
                    }
                    if let Some(p) = surf.polys.first() {
                        device.set_color(flat_color(si as usize, 0));
                        device.submit_polygon(&p.verts, TexCoords::Base);
                        self.stats.brushpasses += 1;
                    }
                }
            }
        }
        device.set_color(WHITE);
    }

    /// Fullbright overlay polygons, modulated by whatever color the caller
    /// set up. Binds each texture's fullbright frame lazily.
    fn draw_chains_glow<D: RenderDevice>(
        &mut self,
        model: &Model,
        ent: Option<&Entity>,
        chain: ChainType,
        device: &mut D,
    ) {
        let ct = chain.index();
        let frame = ent.map_or(0, |e| e.frame);
        for tex_idx in 0..model.textures.len() {
            let head = match &model.textures[tex_idx] {
                Some(t) => t.texturechains[ct],
                None => continue,
            };
            if head.is_none() {
                continue;
            }
            let anim = texture_animation(model, tex_idx, frame);
            let fullbright = match model.textures[anim].as_ref().and_then(|t| t.fullbright) {
                Some(h) => h,
                None => continue,
            };

            let mut bound = false;
            let mut cursor = head;
            while let Some(si) = cursor {
                let surf = &model.surfaces[si as usize];
                cursor = surf.texturechain[ct];
                if surf.culled {
                    continue;
                }
                if !bound {
                    // only bind once we are sure we need this texture
                    device.bind_texture(fullbright);
                    bound = true;
                }
                if let Some(p) = surf.polys.first() {
                    device.submit_polygon(&p.verts, TexCoords::Base);
                    self.stats.brushpasses += 1;
                }
            }
        }
    }

    /// Combined texture+lightmap pass using both texture units.
    fn draw_chains_multitexture<D: RenderDevice>(
        &mut self,
        model: &mut Model,
        ent: Option<&Entity>,
        chain: ChainType,
        device: &mut D,
    ) {
        let ct = chain.index();
        let frame = ent.map_or(0, |e| e.frame);
        for tex_idx in 0..model.textures.len() {
            let head = match &model.textures[tex_idx] {
                Some(t) => t.texturechains[ct],
                None => continue,
            };
            let head_flags = match head {
                Some(h) => model.surfaces[h as usize].flags,
                None => continue,
            };
            if head_flags.intersects(SurfaceFlags::DRAWTILED | SurfaceFlags::NOTEXTURE) {
                continue;
            }
            let anim = texture_animation(model, tex_idx, frame);
            let handle = match model.textures[anim].as_ref() {
                Some(t) => t.gltexture,
                None => continue,
            };

            let mut bound = false;
            let mut cursor = head;
            while let Some(si) = cursor {
                let s = si as usize;
                cursor = model.surfaces[s].texturechain[ct];
                if model.surfaces[s].culled {
                    continue;
                }
                if !bound {
                    // only bind once we are sure we need this texture
                    device.bind_texture(handle);
                    device.enable_multitexture(true); // selects the lightmap unit
                    bound = true;
                }
                self.render_dynamic_lightmaps(model, s, chain);
                let slot = model.surfaces[s].lightmaptexturenum;
                if slot >= 0 && (slot as usize) < MAX_LIGHTMAPS {
                    device.bind_lightmap(slot as usize);
                    self.upload_lightmap(device, slot as usize);
                }
                if let Some(p) = model.surfaces[s].polys.first() {
                    device.submit_polygon_multitexture(&p.verts);
                    self.stats.brushpasses += 1;
                }
            }
            device.enable_multitexture(false);
        }
    }

    /// Placeholder pass for surfaces whose textures were missing from the BSP.
    fn draw_chains_no_texture<D: RenderDevice>(&mut self, model: &Model, chain: ChainType, device: &mut D) {
        let ct = chain.index();
        for tex_idx in 0..model.textures.len() {
            let head = match &model.textures[tex_idx] {
                Some(t) => t.texturechains[ct],
                None => continue,
            };
            let head_flags = match head {
                Some(h) => model.surfaces[h as usize].flags,
                None => continue,
            };
            if !head_flags.contains(SurfaceFlags::NOTEXTURE) {
                continue;
            }
            let handle = match model.textures[tex_idx].as_ref() {
                Some(t) => t.gltexture,
                None => continue,
            };

            let mut bound = false;
            let mut cursor = head;
            while let Some(si) = cursor {
                let surf = &model.surfaces[si as usize];
                cursor = surf.texturechain[ct];
                if surf.culled {
                    continue;
                }
                if !bound {
                    device.bind_texture(handle);
                    bound = true;
                }
                if let Some(p) = surf.polys.first() {
                    device.submit_polygon(&p.verts, TexCoords::Base);
                    self.stats.brushpasses += 1;
                }
            }
        }
    }

    /// Base-texture-only pass; feeds the lightmap chains as it goes so a
    /// following lightmap pass has something to blend.
    fn draw_chains_texture_only<D: RenderDevice>(
        &mut self,
        model: &mut Model,
        ent: Option<&Entity>,
        chain: ChainType,
        device: &mut D,
    ) {
        let ct = chain.index();
        let frame = ent.map_or(0, |e| e.frame);
        for tex_idx in 0..model.textures.len() {
            let head = match &model.textures[tex_idx] {
                Some(t) => t.texturechains[ct],
                None => continue,
            };
            let head_flags = match head {
                Some(h) => model.surfaces[h as usize].flags,
                None => continue,
            };
            if head_flags.intersects(SurfaceFlags::DRAWTURB | SurfaceFlags::DRAWSKY) {
                continue;
            }
            let anim = texture_animation(model, tex_idx, frame);
            let handle = match model.textures[anim].as_ref() {
                Some(t) => t.gltexture,
                None => continue,
            };

            let mut bound = false;
            let mut cursor = head;
            while let Some(si) = cursor {
                let s = si as usize;
                cursor = model.surfaces[s].texturechain[ct];
                if model.surfaces[s].culled {
                    continue;
                }
                if !bound {
                    device.bind_texture(handle);
                    bound = true;
                }
                self.render_dynamic_lightmaps(model, s, chain); // adds to lightmap chain
                if let Some(p) = model.surfaces[s].polys.first() {
                    device.submit_polygon(&p.verts, TexCoords::Base);
                    self.stats.brushpasses += 1;
                }
            }
        }
    }

    /// Draw sky and water surfaces as untextured white polys (lightmap
    /// visualization mode).
    fn draw_chains_white<D: RenderDevice>(&mut self, model: &Model, chain: ChainType, device: &mut D) {
        let ct = chain.index();
        device.set_texturing(false);
        for tex_idx in 0..model.textures.len() {
            let head = match &model.textures[tex_idx] {
                Some(t) => t.texturechains[ct],
                None => continue,
            };
            let head_flags = match head {
                Some(h) => model.surfaces[h as usize].flags,
                None => continue,
            };
            if !head_flags.contains(SurfaceFlags::DRAWTILED) {
                continue;
            }

            let mut cursor = head;
            while let Some(si) = cursor {
                let surf = &model.surfaces[si as usize];
                cursor = surf.texturechain[ct];
                if surf.culled {
                    continue;
                }
                if let Some(p) = surf.polys.first() {
                    device.submit_polygon(&p.verts, TexCoords::Base);
                    self.stats.brushpasses += 1;
                }
            }
        }
        device.set_texturing(true);
    }

    /// Draw the populated lightmap chains, sampling the lightmap UV set.
    fn draw_lightmap_chains<D: RenderDevice>(&mut self, model: &Model, chain: ChainType, device: &mut D) {
        let ct = chain.index();
        for slot in 0..MAX_LIGHTMAPS {
            let head = match self.lightmap_chains[ct][slot] {
                Some(h) => h,
                None => continue,
            };
            device.bind_lightmap(slot);
            self.upload_lightmap(device, slot);

            let mut cursor = Some(head);
            while let Some(si) = cursor {
                let surf = &model.surfaces[si as usize];
                cursor = surf.lightmapchain[ct];
                if let Some(p) = surf.polys.first() {
                    device.submit_polygon(&p.verts, TexCoords::Lightmap);
                    self.stats.brushpasses += 1;
                }
            }
        }
    }

    /// The composition engine: pick a rendering mode and issue its ordered
    /// device-state changes and polygon submissions.
    pub fn draw_texture_chains<D: RenderDevice>(
        &mut self,
        model: &mut Model,
        ent: Option<&Entity>,
        chain: ChainType,
        device: &mut D,
    ) {
        let entalpha = ent.map_or(1.0, |e| entalpha_decode(e.alpha));

        if self.settings.drawflat {
            device.set_texturing(false);
            self.draw_chains_drawflat(model, chain, device);
            device.set_texturing(true);
            return;
        }

        if self.settings.fullbright {
            begin_transparent_drawing(device, entalpha);
            self.draw_chains_texture_only(model, ent, chain, device);
            end_transparent_drawing(device, entalpha);
            self.draw_fullbrights(model, ent, chain, entalpha, device);
            return;
        }

        if self.settings.lightmap_only {
            self.build_lightmap_chains(model, chain);
            if !self.settings.overbright {
                device.set_tex_env(TexEnv::Modulate);
                device.set_color([0.5, 0.5, 0.5, 1.0]);
            }
            self.draw_lightmap_chains(model, chain, device);
            if !self.settings.overbright {
                device.set_color(WHITE);
                device.set_tex_env(TexEnv::Replace);
            }
            self.draw_chains_white(model, chain, device);
            return;
        }

        begin_transparent_drawing(device, entalpha);

        self.draw_chains_no_texture(model, chain, device);

        match WorldDrawStrategy::select(self.caps, self.settings.overbright, entalpha) {
            WorldDrawStrategy::CombinedOverbright => {
                device.enable_multitexture(true);
                device.set_tex_env(TexEnv::CombineScale2);
                device.enable_multitexture(false);
                self.draw_chains_multitexture(model, ent, chain, device);
                device.enable_multitexture(true);
                device.set_tex_env(TexEnv::Modulate);
                device.enable_multitexture(false);
                device.set_tex_env(TexEnv::Replace);
            }
            WorldDrawStrategy::TextureOnly => {
                self.draw_chains_texture_only(model, ent, chain, device);
            }
            WorldDrawStrategy::Combined => {
                device.enable_multitexture(true);
                device.set_tex_env(TexEnv::Modulate);
                device.enable_multitexture(false);
                self.draw_chains_multitexture(model, ent, chain, device);
                device.set_tex_env(TexEnv::Replace);
            }
            WorldDrawStrategy::MultiPass { overbright } => {
                // to make fog work with multipass lightmapping: one pass with
                // no fog, one modulate pass with additive fog, and one
                // additive pass with black geometry and normal fog
                device.fog_enable(false);
                self.draw_chains_texture_only(model, ent, chain, device);
                device.fog_enable(true);
                device.set_depth_mask(false);
                device.set_blend(true);
                device.set_blend_func(if overbright {
                    BlendFunc::Modulate2x
                } else {
                    BlendFunc::Modulate
                });
                device.fog_set_additive(true);
                self.draw_lightmap_chains(model, chain, device);
                device.fog_set_additive(false);
                if device.fog_density() > 0.0 {
                    device.set_blend_func(BlendFunc::Additive);
                    device.set_tex_env(TexEnv::Modulate);
                    device.set_color([0.0, 0.0, 0.0, 1.0]);
                    self.draw_chains_texture_only(model, ent, chain, device);
                    device.set_color(WHITE);
                    device.set_tex_env(TexEnv::Replace);
                }
                device.set_blend_func(BlendFunc::Alpha);
                device.set_blend(false);
                device.set_depth_mask(true);
            }
        }

        end_transparent_drawing(device, entalpha);

        self.draw_fullbrights(model, ent, chain, entalpha, device);
    }

    fn draw_fullbrights<D: RenderDevice>(
        &mut self,
        model: &Model,
        ent: Option<&Entity>,
        chain: ChainType,
        entalpha: f32,
        device: &mut D,
    ) {
        if !self.settings.gl_fullbrights {
            return;
        }
        device.set_depth_mask(false);
        device.set_blend(true);
        device.set_blend_func(BlendFunc::Additive);
        device.set_tex_env(TexEnv::Modulate);
        device.set_color([entalpha, entalpha, entalpha, 1.0]);
        device.fog_set_additive(true);
        self.draw_chains_glow(model, ent, chain, device);
        device.fog_set_additive(false);
        device.set_color(WHITE);
        device.set_tex_env(TexEnv::Replace);
        device.set_blend_func(BlendFunc::Alpha);
        device.set_blend(false);
        device.set_depth_mask(true);
    }

    /// Liquid surface pass. Legacy mode warps each subdivided sub-polygon on
    /// the CPU; modern mode binds the continuously warp-animated image.
    pub fn draw_water<D: RenderDevice>(
        &mut self,
        model: &mut Model,
        ent: Option<&Entity>,
        chain: ChainType,
        device: &mut D,
    ) {
        if self.settings.drawflat || self.settings.lightmap_only {
            return;
        }

        let entalpha = if model.is_world {
            self.settings.wateralpha
        } else {
            match ent {
                Some(e) => entalpha_decode(e.alpha),
                None => 1.0,
            }
        };

        begin_transparent_drawing(device, entalpha);

        let ct = chain.index();
        let isworld = model.is_world;
        if self.settings.oldwater {
            for tex_idx in 0..model.textures.len() {
                let head = match &model.textures[tex_idx] {
                    Some(t) => t.texturechains[ct],
                    None => continue,
                };
                let head_flags = match head {
                    Some(h) => model.surfaces[h as usize].flags,
                    None => continue,
                };
                if !head_flags.contains(SurfaceFlags::DRAWTURB) {
                    continue;
                }
                let handle = match model.textures[tex_idx].as_ref() {
                    Some(t) => t.gltexture,
                    None => continue,
                };

                let mut bound = false;
                let mut cursor = head;
                while let Some(si) = cursor {
                    let surf = &model.surfaces[si as usize];
                    cursor = surf.texturechain[ct];
                    if surf.culled {
                        continue;
                    }
                    if !bound {
                        device.bind_texture(handle);
                        bound = true;
                    }
                    for p in surf.polys.iter().skip(1) {
                        device.submit_polygon(&warp_poly_verts(p, self.time), TexCoords::Base);
                        self.stats.brushpasses += 1;
                    }
                }
            }
        } else {
            for tex_idx in 0..model.textures.len() {
                let head = match &model.textures[tex_idx] {
                    Some(t) => t.texturechains[ct],
                    None => continue,
                };
                let head_flags = match head {
                    Some(h) => model.surfaces[h as usize].flags,
                    None => continue,
                };
                if !head_flags.contains(SurfaceFlags::DRAWTURB) {
                    continue;
                }
                let warpimage = match model.textures[tex_idx].as_ref().and_then(|t| t.warpimage) {
                    Some(h) => h,
                    None => {
                        log::warn!("liquid texture {} has no warp image, skipping", tex_idx);
                        continue;
                    }
                };

                let mut bound = false;
                let mut cursor = head;
                while let Some(si) = cursor {
                    let s = si as usize;
                    cursor = model.surfaces[s].texturechain[ct];
                    if model.surfaces[s].culled {
                        continue;
                    }
                    if !bound {
                        device.bind_texture(warpimage);
                        if !isworld {
                            // non-world models are not visited by the
                            // per-frame world refresh; request the update
                            // here (one frame late)
                            if let Some(Some(t)) = model.textures.get_mut(tex_idx) {
                                t.update_warp = true;
                            }
                        }
                        bound = true;
                    }
                    if let Some(p) = model.surfaces[s].polys.first() {
                        device.submit_polygon(&p.verts, TexCoords::Base);
                        self.stats.brushpasses += 1;
                    }
                }
            }
        }

        end_transparent_drawing(device, entalpha);
    }

    //==========================================================================
    //
    // WORLD WRAPPERS
    //
    //==========================================================================

    pub fn draw_world<D: RenderDevice>(&mut self, world: &mut Model, device: &mut D) {
        if !self.settings.draw_world {
            return;
        }
        self.draw_texture_chains(world, None, ChainType::World, device);
    }

    pub fn draw_world_water<D: RenderDevice>(&mut self, world: &mut Model, device: &mut D) {
        if !self.settings.draw_world {
            return;
        }
        self.draw_water(world, None, ChainType::World, device);
    }

    pub fn draw_world_showtris<D: RenderDevice>(&mut self, world: &Model, device: &mut D) {
        if !self.settings.draw_world {
            return;
        }
        self.draw_showtris(world, ChainType::World, device);
    }
}

// =============================================================
//  Tests
// =============================================================
