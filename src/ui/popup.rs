use crate::{layers::marker::Marker, providers::VendorHandle};

/// Keeps at most one marker popup open per surface
///
/// Opening a popup reports the previously open one so the adapter can close
/// it first. A second click on the same marker leaves it open.
#[derive(Debug, Default, Clone)]
pub struct PopupTracker {
    open: Option<VendorHandle>,
}

impl PopupTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `handle` as open; returns the popup that must be closed, if any
    pub fn open(&mut self, handle: &VendorHandle) -> Option<VendorHandle> {
        match self.open.replace(handle.clone()) {
            Some(previous) if previous != *handle => Some(previous),
            _ => None,
        }
    }

    /// Forgets the open popup if it belongs to one of `handles`
    pub fn forget(&mut self, handles: &[VendorHandle]) {
        if self.open.as_ref().is_some_and(|open| handles.contains(open)) {
            self.open = None;
        }
    }

    pub fn is_open(&self, handle: &VendorHandle) -> bool {
        self.open.as_ref() == Some(handle)
    }

    pub fn current(&self) -> Option<&VendorHandle> {
        self.open.as_ref()
    }
}

/// Popup body: the title and the coordinates
pub fn popup_text(marker: &Marker) -> String {
    let position = marker.position();
    format!(
        "{}\nLat: {:.6}, Lng: {:.6}",
        marker.title().unwrap_or_default(),
        position.lat,
        position.lng
    )
}
