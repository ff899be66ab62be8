use crate::analysis::{self, GraphStats};
use crate::graph_state::NodeId;
use crate::hotspot::{self, Hotspot};
use crate::projection::{self, NeighborBearing};
use crate::store::Store;
use crate::validation::ValidationResult;
use crate::versioned::Memoized;

type ViewKey = (u64, Option<NodeId>);
type OverlayKey = (u64, Option<NodeId>, u64);

pub struct Cache {
    pub bearings: Memoized<Store, ViewKey, Vec<NeighborBearing>>,
    pub hotspots: Memoized<Store, OverlayKey, Vec<Hotspot>>,
    pub stats: Memoized<Store, u64, GraphStats>,
    pub validation: Memoized<Store, u64, ValidationResult>,
}

impl Cache {
    pub fn new() -> Self {
        let bearings = Memoized::new(
            |s: &Store| (s.graph.version(), s.selected.clone()),
            |s: &Store| match &s.selected {
                Some(id) => projection::neighbor_bearings(s.graph.get(), id),
                None => Vec::new(),
            },
        );

        let hotspots = Memoized::new(
            |s: &Store| {
                (
                    s.graph.version(),
                    s.selected.clone(),
                    s.background_offset().to_bits(),
                )
            },
            |s: &Store| match &s.selected {
                Some(id) => hotspot::build_hotspots(s.graph.get(), id, &s.config),
                None => Vec::new(),
            },
        );

        let stats = Memoized::new(
            |s: &Store| s.graph.version(),
            |s: &Store| analysis::stats(s.graph.get()),
        );

        let validation = Memoized::new(
            |s: &Store| s.graph.version(),
            |s: &Store| s.graph.get().validate(),
        );

        Self {
            bearings,
            hotspots,
            stats,
            validation,
        }
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self::new()
    }
}
