// device.rs — the seam between the draw-chain dispatcher and the graphics
// device. Everything the pipeline knows how to ask of hardware goes through
// this trait; the exact API (GL, Vulkan, a test recorder) is the backend's
// business.

use crate::model_types::{PolyVert, TextureHandle};

/// Blend function selection, named for what the pass uses it for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendFunc {
    /// src_alpha, one_minus_src_alpha — the resting state.
    Alpha,
    /// zero, src_color — plain lightmap modulate.
    Modulate,
    /// dst_color, src_color — 2x modulate for overbright lightmaps.
    Modulate2x,
    /// one, one — fullbright overlays and the fog correction pass.
    Additive,
}

/// Texture environment for the active texture unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TexEnv {
    Replace,
    Modulate,
    /// Combiner setup: previous * texture * 2, for single-pass overbright.
    CombineScale2,
}

/// Which UV pair of [`PolyVert`] a polygon submission samples with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TexCoords {
    Base,
    Lightmap,
}

/// Hardware capability flags probed at device init.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceCaps {
    pub multitexture: bool,
    pub texture_combine: bool,
}

pub trait RenderDevice {
    // resource binding
    fn bind_texture(&mut self, tex: TextureHandle);
    /// Bind the lightmap atlas page for the given slot to the active unit.
    fn bind_lightmap(&mut self, slot: usize);
    /// Re-upload a modified lightmap atlas page.
    fn upload_lightmap(&mut self, slot: usize);

    // fixed-function state
    fn set_depth_mask(&mut self, enabled: bool);
    fn set_blend(&mut self, enabled: bool);
    fn set_blend_func(&mut self, func: BlendFunc);
    fn set_tex_env(&mut self, env: TexEnv);
    fn set_color(&mut self, color: [f32; 4]);
    fn set_texturing(&mut self, enabled: bool);
    /// Select the second texture unit; tex_env/bind calls while enabled
    /// address that unit.
    fn enable_multitexture(&mut self, enabled: bool);

    // polygon submission
    fn submit_polygon(&mut self, verts: &[PolyVert], coords: TexCoords);
    /// Submit with both UV sets active (combined texture+lightmap pass).
    fn submit_polygon_multitexture(&mut self, verts: &[PolyVert]);
    /// Submit as an outlined triangle fan (wireframe debug pass).
    fn submit_fan(&mut self, verts: &[PolyVert]);

    // fog collaborator
    fn fog_enable(&mut self, enabled: bool);
    fn fog_set_additive(&mut self, enabled: bool);
    fn fog_density(&self) -> f32;
}

// =============================================================
//  Test recorder
// =============================================================

#[cfg(test)]
pub(crate) mod trace {
    use super::*;

    /// Every device interaction, in order.
    #[derive(Debug, Clone, PartialEq)]
    pub enum DeviceCall {
        BindTexture(TextureHandle),
        BindLightmap(usize),
        UploadLightmap(usize),
        DepthMask(bool),
        Blend(bool),
        BlendFunc(BlendFunc),
        TexEnv(TexEnv),
        Color([f32; 4]),
        Texturing(bool),
        Multitexture(bool),
        Polygon { verts: usize, coords: TexCoords },
        PolygonMultitexture { verts: usize },
        Fan { verts: usize },
        FogEnable(bool),
        FogAdditive(bool),
    }

    /// Records the device call stream so tests can assert pass ordering.
    #[derive(Debug, Default)]
    pub struct TraceDevice {
        pub calls: Vec<DeviceCall>,
        pub density: f32,
    }

    impl TraceDevice {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_fog(density: f32) -> Self {
            Self { calls: Vec::new(), density }
        }

        pub fn polygons(&self) -> usize {
            self.calls
                .iter()
                .filter(|c| {
                    matches!(
                        c,
                        DeviceCall::Polygon { .. } | DeviceCall::PolygonMultitexture { .. }
                    )
                })
                .count()
        }

        pub fn count(&self, pred: impl Fn(&DeviceCall) -> bool) -> usize {
            self.calls.iter().filter(|c| pred(c)).count()
        }

        /// True if `wanted` appears in `calls` in order (gaps allowed).
        pub fn contains_sequence(&self, wanted: &[DeviceCall]) -> bool {
            let mut it = wanted.iter();
            let mut next = it.next();
            for call in &self.calls {
                match next {
                    Some(w) if w == call => next = it.next(),
                    Some(_) => {}
                    None => break,
                }
            }
            next.is_none()
        }
    }

    impl RenderDevice for TraceDevice {
        fn bind_texture(&mut self, tex: TextureHandle) {
            self.calls.push(DeviceCall::BindTexture(tex));
        }
        fn bind_lightmap(&mut self, slot: usize) {
            self.calls.push(DeviceCall::BindLightmap(slot));
        }
        fn upload_lightmap(&mut self, slot: usize) {
            self.calls.push(DeviceCall::UploadLightmap(slot));
        }
        fn set_depth_mask(&mut self, enabled: bool) {
            self.calls.push(DeviceCall::DepthMask(enabled));
        }
        fn set_blend(&mut self, enabled: bool) {
            self.calls.push(DeviceCall::Blend(enabled));
        }
        fn set_blend_func(&mut self, func: BlendFunc) {
            self.calls.push(DeviceCall::BlendFunc(func));
        }
        fn set_tex_env(&mut self, env: TexEnv) {
            self.calls.push(DeviceCall::TexEnv(env));
        }
        fn set_color(&mut self, color: [f32; 4]) {
            self.calls.push(DeviceCall::Color(color));
        }
        fn set_texturing(&mut self, enabled: bool) {
            self.calls.push(DeviceCall::Texturing(enabled));
        }
        fn enable_multitexture(&mut self, enabled: bool) {
            self.calls.push(DeviceCall::Multitexture(enabled));
        }
        fn submit_polygon(&mut self, verts: &[PolyVert], coords: TexCoords) {
            self.calls.push(DeviceCall::Polygon { verts: verts.len(), coords });
        }
        fn submit_polygon_multitexture(&mut self, verts: &[PolyVert]) {
            self.calls.push(DeviceCall::PolygonMultitexture { verts: verts.len() });
        }
        fn submit_fan(&mut self, verts: &[PolyVert]) {
            self.calls.push(DeviceCall::Fan { verts: verts.len() });
        }
        fn fog_enable(&mut self, enabled: bool) {
            self.calls.push(DeviceCall::FogEnable(enabled));
        }
        fn fog_set_additive(&mut self, enabled: bool) {
            self.calls.push(DeviceCall::FogAdditive(enabled));
        }
        fn fog_density(&self) -> f32 {
            self.density
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_contains_sequence() {
            let mut dev = TraceDevice::new();
            dev.set_blend(true);
            dev.set_blend_func(BlendFunc::Modulate);
            dev.set_blend(false);

            assert!(dev.contains_sequence(&[
                DeviceCall::Blend(true),
                DeviceCall::Blend(false),
            ]));
            assert!(!dev.contains_sequence(&[
                DeviceCall::Blend(false),
                DeviceCall::Blend(true),
            ]));
        }

        #[test]
        fn test_polygon_count() {
            let mut dev = TraceDevice::new();
            let verts = vec![PolyVert::default(); 4];
            dev.submit_polygon(&verts, TexCoords::Base);
            dev.submit_polygon_multitexture(&verts);
            dev.submit_fan(&verts);
            assert_eq!(dev.polygons(), 2); // fans are not polygons
        }
    }
}
