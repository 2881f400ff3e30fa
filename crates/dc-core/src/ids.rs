//! Strongly typed identifier wrappers.
//!
//! Numeric IDs are `Copy + Ord + Hash` so they can be used as map keys and
//! sorted collection elements without ceremony.  Truck identities are
//! human-assigned fleet labels (`E44`, `T1-0007`) and therefore wrap a
//! `String`.

use std::fmt;

// ── RoundNo ───────────────────────────────────────────────────────────────────

/// A dispatch round ("vuelta").  Round 1 loads trucks; later rounds stage
/// pallets for the following shift.  Round 0 is the sentinel "before the
/// first round" whose gate is always satisfied.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoundNo(pub u32);

impl RoundNo {
    pub const NONE: RoundNo = RoundNo(0);
    pub const FIRST: RoundNo = RoundNo(1);

    #[inline]
    pub fn is_first(self) -> bool {
        self == Self::FIRST
    }

    /// The round whose gate this round waits on.  `RoundNo(1).previous()` is
    /// the pre-satisfied round 0.
    #[inline]
    pub fn previous(self) -> RoundNo {
        RoundNo(self.0.saturating_sub(1))
    }

    #[inline]
    pub fn next(self) -> RoundNo {
        RoundNo(self.0 + 1)
    }
}

impl fmt::Display for RoundNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.0)
    }
}

// ── Pallets ───────────────────────────────────────────────────────────────────

/// Pallet category.  Mixed pallets are hand-picked; complete pallets leave
/// the rack as-is and only need a crane dispatch.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PalletCategory {
    Mixed,
    Complete,
}

impl PalletCategory {
    /// Label prefix used in pallet IDs.
    pub fn prefix(self) -> &'static str {
        match self {
            PalletCategory::Mixed => "MX",
            PalletCategory::Complete => "CP",
        }
    }

    #[inline]
    pub fn is_mixed(self) -> bool {
        self == PalletCategory::Mixed
    }
}

impl fmt::Display for PalletCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PalletCategory::Mixed => "mixed",
            PalletCategory::Complete => "complete",
        })
    }
}

/// Pallet identifier: a category plus a 1-based sequence number within that
/// category.  Displays as `MX12` / `CP3`.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PalletId {
    pub category: PalletCategory,
    pub seq:      u32,
}

impl PalletId {
    pub fn new(category: PalletCategory, seq: u32) -> Self {
        Self { category, seq }
    }
}

impl fmt::Display for PalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.category.prefix(), self.seq)
    }
}

// ── TruckId ───────────────────────────────────────────────────────────────────

/// Fleet label of a truck.  Cheap to clone relative to the work a truck
/// performs; never used as a hot-path map key.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TruckId(pub String);

impl TruckId {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// Ad-hoc arrival label, e.g. `T1-0007`.
    pub fn adhoc(prefix: &str, seq: u32) -> Self {
        Self(format!("{prefix}-{seq:04}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TruckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TruckId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}
