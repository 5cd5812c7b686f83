use core::fmt;
use core::num::NonZeroU32;

use serde::{Deserialize, Serialize};

/// Compact, stable identifier for one row of a user-facing element table.
///
/// - `u32` keeps memory small
/// - `NonZero` enables `Option<Id>` to be pointer-optimized
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id(NonZeroU32);

impl Id {
    /// Create an Id from a 0-based table index by storing index+1.
    pub fn from_index(index: u32) -> Self {
        Self(NonZeroU32::new(index + 1).expect("index+1 is nonzero"))
    }

    /// Recover the 0-based table index.
    pub fn index(self) -> u32 {
        self.0.get() - 1
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.index())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// Table-specific ID aliases for clarity (no runtime cost).
pub type JunctionId = Id;
pub type PipeId = Id;
pub type ValveId = Id;
pub type PumpId = Id;
pub type CompressorId = Id;
pub type HeatExchangerId = Id;
pub type HeatConsumerId = Id;
pub type FlowControlId = Id;
pub type PressureControlId = Id;
pub type CircPumpMassId = Id;
pub type CircPumpPressureId = Id;
pub type ExtGridId = Id;
pub type SinkId = Id;
pub type SourceId = Id;
pub type MassStorageId = Id;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_round_trip_index() {
        for i in [0_u32, 1, 2, 42, 10_000] {
            let id = Id::from_index(i);
            assert_eq!(id.index(), i);
        }
    }

    #[test]
    fn option_id_is_small() {
        assert_eq!(
            core::mem::size_of::<Id>(),
            core::mem::size_of::<Option<Id>>()
        );
    }
}
