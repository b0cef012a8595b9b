//! Crop and bounded-resize planning.
//!
//! Pure arithmetic, kept apart from pixel work so the policy can be checked
//! without decoding anything.

use crate::common::{MAX_DIM, MIN_DIM};
use crate::models::CropPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Crop window on the source, then the size the crop is resized to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropPlan {
    pub region: Region,
    pub target: (u32, u32),
}

impl CropPlan {
    pub fn needs_resize(&self) -> bool {
        self.target != (self.region.width, self.region.height)
    }
}

// ────────────────────────────────────────────────────────────────
// Public API
// ────────────────────────────────────────────────────────────────

pub fn plan_crop(policy: CropPolicy, width: u32, height: u32) -> CropPlan {
    match policy {
        CropPolicy::Square => plan_square(width, height),
        CropPolicy::Ratio4x5 => plan_ratio_4x5(width, height),
        CropPolicy::Keep => plan_keep(width, height),
    }
}

// ────────────────────────────────────────────────────────────────
// Policies
// ────────────────────────────────────────────────────────────────

fn plan_square(width: u32, height: u32) -> CropPlan {
    let side = width.min(height);
    let target = if side >= MAX_DIM {
        MAX_DIM
    } else {
        side.max(MIN_DIM)
    };

    CropPlan {
        region: Region {
            x: (width - side) / 2,
            y: (height - side) / 2,
            width: side,
            height: side,
        },
        target: (target, target),
    }
}

/// 4:5 portrait. `w/h > 4/5` is compared as `5w > 4h` to stay exact.
fn plan_ratio_4x5(width: u32, height: u32) -> CropPlan {
    let (w, h) = (u64::from(width), u64::from(height));

    if w * 5 > h * 4 {
        // Too wide: trim the sides, height drives the bounds.
        let new_width = (h * 4 / 5).max(1) as u32;
        let target = match clamp_dim(height) {
            Clamp::Unchanged => (new_width, height),
            Clamp::To(side) => (ratio_width(side), side),
        };
        CropPlan {
            region: Region {
                x: (width - new_width) / 2,
                y: 0,
                width: new_width,
                height,
            },
            target,
        }
    } else {
        // Too tall (or exact): trim top and bottom, width drives the bounds.
        let new_height = ((w * 5 / 4) as u32).min(height).max(1);
        let target = match clamp_dim(width) {
            Clamp::Unchanged => (width, new_height),
            Clamp::To(side) => (side, ratio_height(side)),
        };
        CropPlan {
            region: Region {
                x: 0,
                y: (height - new_height) / 2,
                width,
                height: new_height,
            },
            target,
        }
    }
}

fn plan_keep(width: u32, height: u32) -> CropPlan {
    let longest = width.max(height);
    let target = match clamp_dim(longest) {
        Clamp::Unchanged => (width, height),
        Clamp::To(side) => scale_longest_to(width, height, side),
    };

    CropPlan {
        region: Region {
            x: 0,
            y: 0,
            width,
            height,
        },
        target,
    }
}

// ────────────────────────────────────────────────────────────────
// Helper Functions
// ────────────────────────────────────────────────────────────────

enum Clamp {
    Unchanged,
    To(u32),
}

/// At or above `MAX_DIM` caps, below `MIN_DIM` raises, otherwise leaves alone.
fn clamp_dim(side: u32) -> Clamp {
    if side >= MAX_DIM {
        Clamp::To(MAX_DIM)
    } else if side < MIN_DIM {
        Clamp::To(MIN_DIM)
    } else {
        Clamp::Unchanged
    }
}

fn ratio_width(height: u32) -> u32 {
    (u64::from(height) * 4 / 5) as u32
}

fn ratio_height(width: u32) -> u32 {
    (u64::from(width) * 5 / 4) as u32
}

/// Scale so the longer side equals `side`; a square follows the height branch.
fn scale_longest_to(width: u32, height: u32, side: u32) -> (u32, u32) {
    let (w, h, s) = (u64::from(width), u64::from(height), u64::from(side));
    if width > height {
        (side, (h * s / w).max(1) as u32)
    } else {
        ((w * s / h).max(1) as u32, side)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_crops_center_and_raises_small_side() {
        let plan = plan_crop(CropPolicy::Square, 2000, 1000);
        assert_eq!(
            plan.region,
            Region {
                x: 500,
                y: 0,
                width: 1000,
                height: 1000
            }
        );
        assert_eq!(plan.target, (1200, 1200));
        assert!(plan.needs_resize());
    }

    #[test]
    fn square_caps_large_side_and_keeps_in_range() {
        assert_eq!(plan_crop(CropPolicy::Square, 4000, 3000).target, (1920, 1920));
        assert_eq!(plan_crop(CropPolicy::Square, 1920, 2500).target, (1920, 1920));
        let plan = plan_crop(CropPolicy::Square, 1500, 1600);
        assert_eq!(plan.target, (1500, 1500));
        assert_eq!(plan.region.y, 50);
        assert!(!plan.needs_resize());
    }

    #[test]
    fn ratio_crops_tall_source_vertically() {
        let plan = plan_crop(CropPolicy::Ratio4x5, 1000, 2000);
        assert_eq!(
            plan.region,
            Region {
                x: 0,
                y: 375,
                width: 1000,
                height: 1250
            }
        );
        assert_eq!(plan.target, (1200, 1500));
        assert_eq!(plan.target.0 * 5, plan.target.1 * 4);
    }

    #[test]
    fn ratio_crops_wide_source_horizontally() {
        let plan = plan_crop(CropPolicy::Ratio4x5, 3000, 2000);
        assert_eq!(plan.region.width, 1600);
        assert_eq!(plan.region.x, 700);
        assert_eq!(plan.region.height, 2000);
        assert_eq!(plan.target, (1536, 1920));

        let in_range = plan_crop(CropPolicy::Ratio4x5, 2000, 1500);
        assert_eq!(in_range.target, (1200, 1500));
        assert!(!in_range.needs_resize());

        let small = plan_crop(CropPolicy::Ratio4x5, 900, 800);
        assert_eq!(small.region.width, 640);
        assert_eq!(small.target, (960, 1200));
    }

    #[test]
    fn ratio_caps_wide_limiting_side() {
        let plan = plan_crop(CropPolicy::Ratio4x5, 2400, 4000);
        assert_eq!(plan.region.height, 3000);
        assert_eq!(plan.target, (1920, 2400));
    }

    #[test]
    fn keep_bounds_longest_side() {
        assert_eq!(plan_crop(CropPolicy::Keep, 3000, 1500).target, (1920, 960));
        assert_eq!(plan_crop(CropPolicy::Keep, 1000, 2000).target, (960, 1920));
        assert_eq!(plan_crop(CropPolicy::Keep, 800, 600).target, (1200, 900));
        assert_eq!(plan_crop(CropPolicy::Keep, 600, 600).target, (1200, 1200));

        let plan = plan_crop(CropPolicy::Keep, 1600, 1200);
        assert_eq!(plan.target, (1600, 1200));
        assert!(!plan.needs_resize());
    }
}
