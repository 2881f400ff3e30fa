//! Operation records: one per resource usage, append-only.

use std::fmt;

use dc_core::{PalletId, RoundNo, SimTime, TruckId};

/// A shared, capacity-limited station of the distribution center.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Station {
    Picker,
    Crane,
    Checker,
    Yard,
    RackAdjuster,
    Mover,
    Gate,
}

impl Station {
    pub const ALL: [Station; 7] = [
        Station::Picker,
        Station::Crane,
        Station::Checker,
        Station::Yard,
        Station::RackAdjuster,
        Station::Mover,
        Station::Gate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Station::Picker => "picker",
            Station::Crane => "crane",
            Station::Checker => "checker",
            Station::Yard => "yard",
            Station::RackAdjuster => "rack_adjuster",
            Station::Mover => "mover",
            Station::Gate => "gate",
        }
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an operation did.  Each label belongs to exactly one station.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum OpLabel {
    /// Mixed-pallet preparation by a picker.
    Pick,
    /// Crane moves a complete pallet out of the rack.
    Dispatch,
    /// Crane places a pallet at the dock (round 1).
    Placement,
    Check,
    /// Crane reworks a pallet that failed its check.
    Correction,
    Recheck,
    /// Crane loads a kept pallet onto its truck.
    Load,
    RackAdjust,
    Move,
    StageMixed,
    StageComplete,
    GateIn,
    /// Ad-hoc truck served by a checker.
    AdhocCheck,
    GateOut,
    /// Time a truck held yard units.
    YardStay,
    DayCheck,
    DayLoad,
}

impl OpLabel {
    pub fn station(self) -> Station {
        match self {
            OpLabel::Pick => Station::Picker,
            OpLabel::Dispatch
            | OpLabel::Placement
            | OpLabel::Correction
            | OpLabel::Load
            | OpLabel::StageMixed
            | OpLabel::StageComplete
            | OpLabel::DayLoad => Station::Crane,
            OpLabel::Check | OpLabel::Recheck | OpLabel::AdhocCheck | OpLabel::DayCheck => {
                Station::Checker
            }
            OpLabel::RackAdjust => Station::RackAdjuster,
            OpLabel::Move => Station::Mover,
            OpLabel::GateIn | OpLabel::GateOut => Station::Gate,
            OpLabel::YardStay => Station::Yard,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OpLabel::Pick => "pick",
            OpLabel::Dispatch => "dispatch",
            OpLabel::Placement => "placement",
            OpLabel::Check => "check",
            OpLabel::Correction => "correction",
            OpLabel::Recheck => "recheck",
            OpLabel::Load => "load",
            OpLabel::RackAdjust => "rack-adjust",
            OpLabel::Move => "move",
            OpLabel::StageMixed => "stage-mixed",
            OpLabel::StageComplete => "stage-complete",
            OpLabel::GateIn => "gate-in",
            OpLabel::AdhocCheck => "adhoc-check",
            OpLabel::GateOut => "gate-out",
            OpLabel::YardStay => "yard-stay",
            OpLabel::DayCheck => "day-check",
            OpLabel::DayLoad => "day-load",
        }
    }
}

impl fmt::Display for OpLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One resource usage.  `hold` is `end − start`; `units` is how many slots of
/// the station were held (yard stays of ad-hoc trucks hold two).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OperationRecord {
    pub label:  OpLabel,
    pub round:  RoundNo,
    pub truck:  TruckId,
    pub pallet: Option<PalletId>,
    pub units:  u32,
    pub wait:   f64,
    pub hold:   f64,
    pub start:  SimTime,
    pub end:    SimTime,
}

impl OperationRecord {
    /// Build a record from the request instant and the grant/release instants.
    pub fn new(
        label:     OpLabel,
        round:     RoundNo,
        truck:     TruckId,
        requested: SimTime,
        start:     SimTime,
        end:       SimTime,
    ) -> Self {
        Self {
            label,
            round,
            truck,
            pallet: None,
            units: 1,
            wait: start.since(requested),
            hold: end.since(start),
            start,
            end,
        }
    }

    pub fn with_pallet(mut self, pallet: PalletId) -> Self {
        self.pallet = Some(pallet);
        self
    }

    pub fn with_units(mut self, units: u32) -> Self {
        self.units = units;
        self
    }

    #[inline]
    pub fn station(&self) -> Station {
        self.label.station()
    }
}

/// Append-only log of operation records, in completion order.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OperationLog {
    records: Vec<OperationRecord>,
}

impl OperationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: OperationRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[OperationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OperationRecord> {
        self.records.iter()
    }

    pub fn by_station(&self, station: Station) -> impl Iterator<Item = &OperationRecord> {
        self.records.iter().filter(move |r| r.station() == station)
    }

    pub fn by_label(&self, label: OpLabel) -> impl Iterator<Item = &OperationRecord> {
        self.records.iter().filter(move |r| r.label == label)
    }

    /// Latest end instant, or zero for an empty log.
    pub fn last_end(&self) -> SimTime {
        self.records.iter().map(|r| r.end).max().unwrap_or(SimTime::ZERO)
    }

    pub fn into_vec(self) -> Vec<OperationRecord> {
        self.records
    }
}
