use serde::Serialize;

use crate::error::{ClockError, Result};

/// A clock known to the firmware, with the name used in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClockDescriptor {
    pub id: u32,
    pub name: &'static str,
}

impl ClockDescriptor {
    pub const fn new(id: u32, name: &'static str) -> Self {
        Self { id, name }
    }
}

/// GPU clocks, in bring-up order.
pub const GPU_CLOCKS: &[ClockDescriptor] = &[
    ClockDescriptor::new(30, "gpuclk_400M"),
    ClockDescriptor::new(31, "gpu_top"),
    ClockDescriptor::new(32, "gpu_core"),
    ClockDescriptor::new(230, "gpupll_top"),
    ClockDescriptor::new(231, "gpupll_core"),
    ClockDescriptor::new(272, "gpuclk_200M"),
];

/// Look up a GPU clock by id.
pub fn find_clock(id: u32) -> Option<ClockDescriptor> {
    GPU_CLOCKS.iter().copied().find(|clock| clock.id == id)
}

/// Resolve ids against [`GPU_CLOCKS`], keeping the caller's order.
pub fn resolve_clocks(ids: &[u32]) -> Result<Vec<ClockDescriptor>> {
    ids.iter()
        .map(|&id| find_clock(id).ok_or(ClockError::UnknownClock(id)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpu_clock_list_is_stable() {
        let ids: Vec<u32> = GPU_CLOCKS.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![30, 31, 32, 230, 231, 272]);
    }

    #[test]
    fn resolve_keeps_order() {
        let clocks = resolve_clocks(&[272, 30]).unwrap();
        assert_eq!(clocks[0].name, "gpuclk_200M");
        assert_eq!(clocks[1].name, "gpuclk_400M");
    }

    #[test]
    fn resolve_rejects_unknown() {
        assert!(matches!(
            resolve_clocks(&[30, 99]),
            Err(ClockError::UnknownClock(99))
        ));
    }
}
