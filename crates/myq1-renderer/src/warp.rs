// Copyright (C) 1996-2001 Id Software, Inc.
// GPL-2.0-or-later
//
// warp.rs — turbulent texture-coordinate warp for legacy liquid drawing
//
// The modern water path binds a continuously re-rendered warp image; this
// is the CPU fallback that distorts the UVs of each subdivided sub-polygon
// through the classic 256-step turbulent sine.

use crate::model_types::{Poly, PolyVert};

const TURB_STEPS: f32 = 256.0;
const TURBSCALE: f32 = TURB_STEPS / (2.0 * std::f32::consts::PI);

/// Amplitude of the turbulence curve.
const TURB_AMPLITUDE: f32 = 8.0;

/// The turbulent sine, quantized to 256 steps per cycle like a baked
/// lookup table.
fn turbsin(index: f32) -> f32 {
    let i = (index as i32) & 255;
    TURB_AMPLITUDE * (i as f32 * std::f32::consts::TAU / TURB_STEPS).sin()
}

/// Warp one texture coordinate pair. Input coordinates are in texel space
/// (as stored on subdivided liquid polys); output is normalized for a
/// 64-texel tile.
pub fn warp_st(s: f32, t: f32, time: f32) -> [f32; 2] {
    let phase = time * TURBSCALE;
    [
        (s + turbsin(t * 2.0 + phase)) / 64.0,
        (t + turbsin(s * 2.0 + phase)) / 64.0,
    ]
}

/// Copy a sub-polygon's vertices with warped base UVs.
pub fn warp_poly_verts(poly: &Poly, time: f32) -> Vec<PolyVert> {
    poly.verts
        .iter()
        .map(|v| {
            let mut out = *v;
            out.st = warp_st(v.st[0], v.st[1], time);
            out
        })
        .collect()
}

// =============================================================
//  Tests
// =============================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turbsin_periodic() {
        for i in [0.0f32, 17.0, 100.5, 255.0] {
            assert_eq!(turbsin(i), turbsin(i + 256.0));
        }
    }

    #[test]
    fn test_turbsin_amplitude() {
        for i in 0..512 {
            let v = turbsin(i as f32);
            assert!(v.abs() <= TURB_AMPLITUDE + 1e-4);
        }
        // quarter cycle hits the peak
        assert!((turbsin(64.0) - TURB_AMPLITUDE).abs() < 1e-4);
    }

    #[test]
    fn test_warp_st_zero_phase() {
        // turbsin(0) == 0, so a vertex at the texture origin maps to 0
        let st = warp_st(0.0, 0.0, 0.0);
        assert_eq!(st, [0.0, 0.0]);
    }

    #[test]
    fn test_warp_st_is_deterministic() {
        assert_eq!(warp_st(12.0, 34.0, 1.5), warp_st(12.0, 34.0, 1.5));
        // and moves with time
        assert_ne!(warp_st(12.0, 34.0, 0.0), warp_st(12.0, 34.0, 1.0));
    }

    #[test]
    fn test_warp_poly_verts_touches_only_base_uv() {
        let poly = Poly {
            verts: vec![PolyVert {
                pos: [1.0, 2.0, 3.0],
                st: [64.0, 32.0],
                lm_st: [0.5, 0.5],
            }],
        };
        let warped = warp_poly_verts(&poly, 2.0);
        assert_eq!(warped.len(), 1);
        assert_eq!(warped[0].pos, [1.0, 2.0, 3.0]);
        assert_eq!(warped[0].lm_st, [0.5, 0.5]);
        // normalized into tile space, plus/minus the turbulence
        assert!((warped[0].st[0] - 1.0).abs() <= TURB_AMPLITUDE / 64.0);
        assert!((warped[0].st[1] - 0.5).abs() <= TURB_AMPLITUDE / 64.0);
    }
}
