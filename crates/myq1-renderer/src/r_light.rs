// Copyright (C) 1996-2001 Id Software, Inc.
// GPL-2.0-or-later
//
// r_light.rs — lightstyle tracking and dynamic lightmap refresh

use myq1_common::bspfile::{MAXLIGHTMAPS, MAX_LIGHTSTYLES};

use crate::device::RenderDevice;
use crate::model_types::{ChainType, Model, SurfaceFlags};
use crate::r_local::{WorldRenderer, MAX_LIGHTMAPS};

impl WorldRenderer {
    pub fn set_lightstyle(&mut self, style: usize, value: f32) {
        if style < MAX_LIGHTSTYLES {
            self.lightstyles[style] = value;
        }
    }

    pub(crate) fn clear_lightmap_chains(&mut self, chain: ChainType) {
        self.lightmap_chains[chain.index()] = [None; MAX_LIGHTMAPS];
    }

    /// Chain a surface's lightmap polygon onto its atlas slot and flag the
    /// slot for re-upload when its lighting went stale (animated lightstyle
    /// value drifted from what was baked, or the surface was dynamically
    /// lit this frame or the last).
    pub fn render_dynamic_lightmaps(&mut self, model: &mut Model, surf_idx: usize, chain: ChainType) {
        let ct = chain.index();
        let framecount = self.framecount;
        let surf = &mut model.surfaces[surf_idx];

        if surf.flags.contains(SurfaceFlags::DRAWTILED) {
            return; // not a lightmapped surface
        }
        let slot = surf.lightmaptexturenum;
        if slot < 0 || slot as usize >= MAX_LIGHTMAPS {
            log::warn!(
                "surface {} has lightmap slot {} out of range, skipping",
                surf_idx,
                slot
            );
            return;
        }
        let slot = slot as usize;

        // add to lightmap chain
        surf.lightmapchain[ct] = self.lightmap_chains[ct][slot];
        self.lightmap_chains[ct][slot] = Some(surf_idx as u32);

        // check for lightmap modification
        let mut stale = false;
        for m in 0..MAXLIGHTMAPS {
            let style = surf.styles[m];
            if style == 255 {
                break;
            }
            // styles past the table never animate, so they never go stale
            match self.lightstyles.get(style as usize) {
                Some(value) if *value != surf.cached_light[m] => {
                    stale = true;
                    break;
                }
                _ => {}
            }
        }

        let dlit = surf.dlightframe == framecount;
        if (stale || dlit || surf.cached_dlight) && self.settings.dynamic_lightmaps {
            self.lightmap_modified[slot] = true;
            surf.cached_dlight = dlit;
            for m in 0..MAXLIGHTMAPS {
                let style = surf.styles[m];
                if style == 255 {
                    break;
                }
                if let Some(value) = self.lightstyles.get(style as usize) {
                    surf.cached_light[m] = *value;
                }
            }
        }
    }

    /// Push a modified atlas page to the device; no-op for clean slots.
    pub fn upload_lightmap<D: RenderDevice>(&mut self, device: &mut D, slot: usize) {
        if self.lightmap_modified[slot] {
            self.lightmap_modified[slot] = false;
            device.upload_lightmap(slot);
        }
    }
}

// =============================================================
//  Tests
// =============================================================
