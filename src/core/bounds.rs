use crate::{
    core::geo::LatLngBounds,
    layers::marker::Marker,
    MapError, Result,
};

/// Derives the fit-to-all-markers viewport request
///
/// Naive min/max over latitude and longitude. Markers on both sides of the
/// antimeridian yield a box spanning the globe instead of the short way
/// round; each vendor expresses wrapped bounds differently, so no attempt is
/// made here.
pub struct BoundsCalculator;

impl BoundsCalculator {
    /// Bounds covering every marker, or `EmptyRegistry` when there is none.
    /// A single marker gives a zero-area box; adapters expand it.
    pub fn fit_bounds<'a, I>(markers: I) -> Result<LatLngBounds>
    where
        I: IntoIterator<Item = &'a Marker>,
    {
        let mut markers = markers.into_iter();
        let first = markers.next().ok_or(MapError::EmptyRegistry)?;

        Ok(markers.fold(LatLngBounds::from_point(first.position()), |mut bounds, marker| {
            bounds.extend(&marker.position());
            bounds
        }))
    }
}
