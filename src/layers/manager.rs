use crate::layers::marker::{Marker, MarkerId, MarkerInput};

use fxhash::FxHashMap as HashMap;

/// Authoritative set of markers currently drawn on one surface
///
/// Insertion order is kept so bounds and redraws are deterministic.
#[derive(Debug, Default)]
pub struct MarkerRegistry {
    /// All markers indexed by ID
    markers: HashMap<MarkerId, Marker>,
    /// IDs in insertion order
    order: Vec<MarkerId>,
    next_id: u64,
}

impl MarkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a marker under a fresh ID and returns the stored copy
    pub fn add(&mut self, input: MarkerInput) -> Marker {
        self.next_id += 1;
        let id = MarkerId::new(self.next_id);
        let marker = Marker::from_input(id, input);

        self.markers.insert(id, marker.clone());
        self.order.push(id);
        marker
    }

    /// Empties the registry, returning the removed IDs in insertion order
    pub fn remove_all(&mut self) -> Vec<MarkerId> {
        self.markers.clear();
        std::mem::take(&mut self.order)
    }

    /// Gets a marker by ID
    pub fn get(&self, id: MarkerId) -> Option<&Marker> {
        self.markers.get(&id)
    }

    /// Read-only view in insertion order
    pub fn list(&self) -> impl Iterator<Item = &Marker> + '_ {
        self.order.iter().filter_map(|id| self.markers.get(id))
    }

    /// Owned copy of the current contents, for callers that mutate afterwards
    pub fn snapshot(&self) -> Vec<Marker> {
        self.list().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
