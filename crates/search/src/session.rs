use foundation::LngLat;
use runtime::{Notice, NoticeBus, NoticeKind};

use crate::markers::{MarkerSet, SearchHost};
use crate::protocol::GeocodeResponse;
use crate::request::{GeocodeConfig, GeocodeRequest, RequestId, RequestSequence};
use crate::suggestions::SuggestionPanel;
use crate::SearchError;

/// What the caller should do after the search input changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputAction {
    /// Abort whatever is in flight and issue this request.
    Fetch(GeocodeRequest),
    /// Abort whatever is in flight; the panel has been hidden.
    Hide,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ResponseOutcome {
    /// The panel now shows this many rows.
    Shown(usize),
    /// No results, or the request failed; the panel is hidden.
    Hidden,
    /// Superseded by a newer query; nothing changed.
    Stale,
}

/// Search box state: the request sequence guard, the suggestion panel and
/// the result marker.
#[derive(Debug)]
pub struct SearchSession<M> {
    config: GeocodeConfig,
    sequence: RequestSequence,
    panel: SuggestionPanel,
    markers: MarkerSet<M>,
    notices: NoticeBus,
}

impl<M> SearchSession<M> {
    pub fn new(config: GeocodeConfig) -> Self {
        if config.access_token.is_empty() {
            tracing::warn!("geocoding access token is empty; searches will be rejected");
        }
        Self {
            config,
            sequence: RequestSequence::new(),
            panel: SuggestionPanel::new(),
            markers: MarkerSet::new(),
            notices: NoticeBus::new(),
        }
    }

    pub fn config(&self) -> &GeocodeConfig {
        &self.config
    }

    pub fn panel(&self) -> &SuggestionPanel {
        &self.panel
    }

    pub fn markers(&self) -> &MarkerSet<M> {
        &self.markers
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain()
    }

    pub fn on_input(&mut self, query: &str) -> InputAction {
        if !self.config.accepts(query) {
            self.sequence.invalidate();
            self.panel.hide();
            return InputAction::Hide;
        }
        let id = self.sequence.issue();
        let url = self.config.url(query);
        tracing::debug!(request = id.0, query = query.trim(), "geocode request");
        InputAction::Fetch(GeocodeRequest { id, url })
    }

    pub fn on_response(
        &mut self,
        id: RequestId,
        result: Result<GeocodeResponse, SearchError>,
    ) -> ResponseOutcome {
        if !self.sequence.is_current(id) {
            tracing::trace!(request = id.0, "stale geocode response dropped");
            return ResponseOutcome::Stale;
        }
        match result {
            Ok(response) => {
                self.panel.show(&response.features, self.config.max_suggestions);
                if self.panel.is_visible() {
                    ResponseOutcome::Shown(self.panel.rows().len())
                } else {
                    ResponseOutcome::Hidden
                }
            }
            Err(err) => {
                tracing::warn!(request = id.0, %err, "geocode failed");
                self.panel.hide();
                self.notices
                    .emit(NoticeKind::GeocodeFailed, "Address search is unavailable right now");
                ResponseOutcome::Hidden
            }
        }
    }

    /// A suggestion was picked: hide the panel, move the single marker there
    /// and fly the camera in. Returns the chosen position, or `None` when the
    /// index no longer refers to a row.
    pub fn select<H>(&mut self, host: &mut H, index: usize) -> Result<Option<LngLat>, SearchError>
    where
        H: SearchHost<Marker = M> + ?Sized,
    {
        let Some(row) = self.panel.row(index) else {
            return Ok(None);
        };
        let at = row.position;
        tracing::debug!(label = %row.label, "suggestion selected");
        self.sequence.invalidate();
        self.panel.hide();
        self.markers.replace(host, at)?;
        host.fly_to(at, self.config.select_zoom);
        Ok(Some(at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markers::testing::RecordingHost;
    use crate::protocol::{GeocodeFeature, PointGeometry};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn session() -> SearchSession<u32> {
        SearchSession::new(GeocodeConfig {
            access_token: "pk.test".to_string(),
            ..GeocodeConfig::default()
        })
    }

    fn response(names: &[&str]) -> GeocodeResponse {
        GeocodeResponse {
            features: names
                .iter()
                .enumerate()
                .map(|(i, n)| GeocodeFeature {
                    place_name: n.to_string(),
                    geometry: PointGeometry {
                        coordinates: LngLat::new(144.5 + i as f64 * 0.01, -37.7),
                    },
                })
                .collect(),
        }
    }

    fn fetch(s: &mut SearchSession<u32>, q: &str) -> GeocodeRequest {
        match s.on_input(q) {
            InputAction::Fetch(req) => req,
            other => panic!("expected fetch for {q:?}, got {other:?}"),
        }
    }

    #[test]
    fn renders_suggestions_for_current_query() {
        let mut s = session();
        let req = fetch(&mut s, "Melton");
        assert!(req.url.contains("/Melton.json?bbox="));

        let out = s.on_response(
            req.id,
            Ok(response(&["Melton, VIC", "Melton South, VIC", "Melton West, VIC"])),
        );
        assert_eq!(out, ResponseOutcome::Shown(3));
        let rows = s.panel().rows();
        assert!(rows[0].rounded_top && !rows[0].rounded_bottom);
        assert!(rows[2].rounded_bottom);
    }

    #[test]
    fn late_response_for_older_query_is_dropped() {
        let mut s = session();
        let t1 = fetch(&mut s, "Mel");
        let t2 = fetch(&mut s, "Melton");

        assert_eq!(s.on_response(t2.id, Ok(response(&["Melton, VIC"]))), ResponseOutcome::Shown(1));
        assert_eq!(s.on_response(t1.id, Ok(response(&["Melbourne", "Melba"]))), ResponseOutcome::Stale);
        assert_eq!(s.panel().rows().len(), 1);
        assert_eq!(s.panel().rows()[0].label, "Melton, VIC");
    }

    #[test]
    fn short_query_hides_and_invalidates_in_flight() {
        let mut s = session();
        let req = fetch(&mut s, "Melton");
        assert_eq!(s.on_input("Me"), InputAction::Hide);
        assert_eq!(s.on_response(req.id, Ok(response(&["Melton"]))), ResponseOutcome::Stale);
        assert!(!s.panel().is_visible());
    }

    #[test]
    fn failure_hides_panel_and_notifies() {
        let mut s = session();
        let first = fetch(&mut s, "Melton");
        s.on_response(first.id, Ok(response(&["Melton"])));
        let second = fetch(&mut s, "Meltonx");

        let out = s.on_response(second.id, Err(SearchError::Http { status: 401 }));
        assert_eq!(out, ResponseOutcome::Hidden);
        assert!(s.panel().rows().is_empty());
        let notices = s.drain_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].kind, NoticeKind::GeocodeFailed);
    }

    #[test]
    fn caps_suggestions() {
        let mut s = session();
        let req = fetch(&mut s, "Street");
        let names: Vec<String> = (0..25).map(|i| format!("{i} Street")).collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        assert_eq!(s.on_response(req.id, Ok(response(&names))), ResponseOutcome::Shown(10));
    }

    #[test]
    fn repeated_selection_leaves_one_marker() {
        let mut s = session();
        let mut host = RecordingHost::default();
        for i in 0..4 {
            let req = fetch(&mut s, &format!("query {i}"));
            s.on_response(req.id, Ok(response(&["a", "b", "c"])));
            let at = s.select(&mut host, i % 3).unwrap();
            assert!(at.is_some());
            assert!(!s.panel().is_visible());
        }
        assert_eq!(host.markers.len(), 1);
        assert_eq!(s.markers().len(), 1);
        assert_eq!(host.flights.len(), 4);
        assert_eq!(host.flights[3].1, 16.0);
        assert_eq!(host.markers[0].1, host.flights[3].0);
    }

    #[test]
    fn selecting_closes_panel_against_late_responses() {
        let mut s = session();
        let mut host = RecordingHost::default();
        let req = fetch(&mut s, "Melton");
        s.on_response(req.id, Ok(response(&["Melton"])));
        s.select(&mut host, 0).unwrap();
        assert_eq!(s.on_response(req.id, Ok(response(&["Melton"]))), ResponseOutcome::Stale);
        assert!(!s.panel().is_visible());
    }

    #[test]
    fn out_of_range_selection_is_ignored() {
        let mut s = session();
        let mut host = RecordingHost::default();
        assert_eq!(s.select(&mut host, 3).unwrap(), None);
        assert!(host.flights.is_empty());
    }

    proptest! {
        // Whatever order responses arrive in, the panel only ever shows the
        // answer to the last query issued.
        #[test]
        fn panel_reflects_last_query(order in Just((0..6usize).collect::<Vec<_>>()).prop_shuffle()) {
            let mut s = session();
            let reqs: Vec<_> = (0..6).map(|i| fetch(&mut s, &format!("query {i}"))).collect();
            for i in order {
                let label = format!("result {i}");
                s.on_response(reqs[i].id, Ok(response(&[label.as_str()])));
            }
            prop_assert_eq!(s.panel().rows().len(), 1);
            prop_assert_eq!(s.panel().rows()[0].label.as_str(), "result 5");
        }
    }
}
