use foundation::LngLat;

use crate::SearchError;

/// What the search box needs from the map.
pub trait SearchHost {
    type Marker;

    fn add_marker(&mut self, at: LngLat) -> Result<Self::Marker, SearchError>;
    fn remove_marker(&mut self, marker: Self::Marker);
    fn fly_to(&mut self, center: LngLat, zoom: f64);
}

/// Search result markers currently on the map. Holds at most one.
#[derive(Debug)]
pub struct MarkerSet<M> {
    current: Option<(M, LngLat)>,
}

impl<M> Default for MarkerSet<M> {
    fn default() -> Self {
        Self { current: None }
    }
}

impl<M> MarkerSet<M> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        usize::from(self.current.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }

    pub fn position(&self) -> Option<LngLat> {
        self.current.as_ref().map(|(_, p)| *p)
    }

    /// Removes the existing marker, if any, then places one at `at`.
    pub fn replace<H>(&mut self, host: &mut H, at: LngLat) -> Result<(), SearchError>
    where
        H: SearchHost<Marker = M> + ?Sized,
    {
        self.clear(host);
        let marker = host.add_marker(at)?;
        self.current = Some((marker, at));
        Ok(())
    }

    pub fn clear<H>(&mut self, host: &mut H)
    where
        H: SearchHost<Marker = M> + ?Sized,
    {
        if let Some((marker, _)) = self.current.take() {
            host.remove_marker(marker);
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Records markers and camera moves.
    #[derive(Debug, Default)]
    pub struct RecordingHost {
        next_id: u32,
        pub markers: Vec<(u32, LngLat)>,
        pub flights: Vec<(LngLat, f64)>,
        pub fail_markers: bool,
    }

    impl SearchHost for RecordingHost {
        type Marker = u32;

        fn add_marker(&mut self, at: LngLat) -> Result<u32, SearchError> {
            if self.fail_markers {
                return Err(SearchError::Marker("no map".to_string()));
            }
            self.next_id += 1;
            self.markers.push((self.next_id, at));
            Ok(self.next_id)
        }

        fn remove_marker(&mut self, marker: u32) {
            self.markers.retain(|(id, _)| *id != marker);
        }

        fn fly_to(&mut self, center: LngLat, zoom: f64) {
            self.flights.push((center, zoom));
        }
    }
}
