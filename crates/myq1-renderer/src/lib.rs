//! World-geometry visibility and draw-chain pipeline.
//!
//! The flow per rendered frame is fixed:
//! mark_surfaces (PVS + chain rebuild) -> cull_surfaces ->
//! draw_world / draw_world_water / draw_world_showtris, with
//! draw_texture_chains reused for non-world brush models.
//! The graphics device sits behind the [`device::RenderDevice`] trait.

pub mod device;
pub mod model_types;
pub mod r_light;
pub mod r_local;
pub mod r_main;
pub mod r_world;
pub mod vis;
pub mod warp;
