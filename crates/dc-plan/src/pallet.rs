//! Pallet generation from a shift's box totals.

use dc_core::{DcError, DcResult, PalletCategory, PalletId, ShiftRng};

/// Inclusive range of boxes per pallet.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoxRange {
    pub min: u32,
    pub max: u32,
}

impl BoxRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn validate(&self, what: &str) -> DcResult<()> {
        if self.min == 0 || self.min > self.max {
            return Err(DcError::Config(format!(
                "{what}: box range [{}, {}] must satisfy 1 <= min <= max",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

/// Per-category pallet size ranges.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PalletMix {
    pub mixed:    BoxRange,
    pub complete: BoxRange,
}

impl Default for PalletMix {
    fn default() -> Self {
        Self { mixed: BoxRange::new(25, 45), complete: BoxRange::new(35, 55) }
    }
}

impl PalletMix {
    pub fn range(&self, category: PalletCategory) -> BoxRange {
        match category {
            PalletCategory::Mixed => self.mixed,
            PalletCategory::Complete => self.complete,
        }
    }

    pub fn validate(&self) -> DcResult<()> {
        self.mixed.validate("mixed pallets")?;
        self.complete.validate("complete pallets")
    }
}

/// A pallet.  Immutable once generated.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pallet {
    pub id:    PalletId,
    pub boxes: u32,
}

impl Pallet {
    pub fn new(category: PalletCategory, seq: u32, boxes: u32) -> Self {
        Self { id: PalletId::new(category, seq), boxes }
    }

    #[inline]
    pub fn category(&self) -> PalletCategory {
        self.id.category
    }

    #[inline]
    pub fn is_mixed(&self) -> bool {
        self.id.category.is_mixed()
    }
}

/// Counts and box totals per category.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PalletSummary {
    pub mixed_pallets:    u32,
    pub complete_pallets: u32,
    pub mixed_boxes:      u64,
    pub complete_boxes:   u64,
}

impl PalletSummary {
    pub fn of(pallets: &[Pallet]) -> Self {
        pallets.iter().fold(Self::default(), |mut s, p| {
            if p.is_mixed() {
                s.mixed_pallets += 1;
                s.mixed_boxes += u64::from(p.boxes);
            } else {
                s.complete_pallets += 1;
                s.complete_boxes += u64::from(p.boxes);
            }
            s
        })
    }

    pub fn total_pallets(&self) -> u32 {
        self.mixed_pallets + self.complete_pallets
    }

    pub fn total_boxes(&self) -> u64 {
        self.mixed_boxes + self.complete_boxes
    }

    pub fn mean_mixed_boxes(&self) -> f64 {
        mean(self.mixed_boxes, self.mixed_pallets)
    }

    pub fn mean_complete_boxes(&self) -> f64 {
        mean(self.complete_boxes, self.complete_pallets)
    }
}

fn mean(total: u64, count: u32) -> f64 {
    if count == 0 { 0.0 } else { total as f64 / f64::from(count) }
}

/// Split a shift's boxes into pallets.
///
/// `boxes_for_pick` boxes go to mixed pallets, the rest to complete pallets.
/// Each step draws a category with probability proportional to its remaining
/// boxes, then a size from that category's range; the last pallet of each
/// category is clipped to the exact remainder so per-category sums are
/// conserved.
pub fn generate_pallets(
    total_boxes:    u32,
    boxes_for_pick: u32,
    mix:            &PalletMix,
    rng:            &mut ShiftRng,
) -> DcResult<Vec<Pallet>> {
    if total_boxes == 0 {
        return Err(DcError::InvalidInput("total_boxes must be greater than zero".into()));
    }
    if boxes_for_pick > total_boxes {
        return Err(DcError::InvalidInput(format!(
            "boxes_for_pick ({boxes_for_pick}) exceeds total_boxes ({total_boxes})"
        )));
    }
    mix.validate()?;

    const CATEGORIES: [PalletCategory; 2] = [PalletCategory::Mixed, PalletCategory::Complete];
    let mut remaining = [boxes_for_pick, total_boxes - boxes_for_pick];
    let mut seq = [0u32; 2];
    let mut pallets = Vec::new();

    while remaining[0] + remaining[1] > 0 {
        let k = if remaining[1] == 0 {
            0
        } else if remaining[0] == 0 {
            1
        } else {
            let p_mixed = f64::from(remaining[0]) / f64::from(remaining[0] + remaining[1]);
            if rng.gen_bool(p_mixed) { 0 } else { 1 }
        };
        let category = CATEGORIES[k];
        let range = mix.range(category);
        let boxes = rng.uniform_int(range.min, range.max).min(remaining[k]);
        seq[k] += 1;
        pallets.push(Pallet::new(category, seq[k], boxes));
        remaining[k] -= boxes;
    }

    Ok(pallets)
}
