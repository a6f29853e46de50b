// bspfile.rs — on-disk BSP constants
// Quake 1 values; contents are negative numbers, unlike Quake 2

// leaf contents
pub const CONTENTS_EMPTY: i32 = -1;
pub const CONTENTS_SOLID: i32 = -2;
pub const CONTENTS_WATER: i32 = -3;
pub const CONTENTS_SLIME: i32 = -4;
pub const CONTENTS_LAVA: i32 = -5;
pub const CONTENTS_SKY: i32 = -6;

// map limits
pub const MAX_MAP_LEAFS: usize = 70000;

/// Light style slots per surface.
pub const MAXLIGHTMAPS: usize = 4;

pub const MAX_LIGHTSTYLES: usize = 64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contents_are_negative() {
        for c in [
            CONTENTS_EMPTY,
            CONTENTS_SOLID,
            CONTENTS_WATER,
            CONTENTS_SLIME,
            CONTENTS_LAVA,
            CONTENTS_SKY,
        ] {
            assert!(c < 0);
        }
    }

    #[test]
    fn test_contents_are_distinct() {
        let all = [
            CONTENTS_EMPTY,
            CONTENTS_SOLID,
            CONTENTS_WATER,
            CONTENTS_SLIME,
            CONTENTS_LAVA,
            CONTENTS_SKY,
        ];
        for i in 0..all.len() {
            for j in (i + 1)..all.len() {
                assert_ne!(all[i], all[j]);
            }
        }
    }
}
