use foundation::LngLatBounds;
use serde::{Deserialize, Serialize};

/// Geocoding endpoint and search box limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodeConfig {
    /// Base URL; the encoded query and `.json` are appended.
    pub endpoint: String,
    pub access_token: String,
    /// Results are restricted to this box.
    pub bbox: LngLatBounds,
    /// Queries must be longer than this many characters (after trimming).
    pub min_query_chars: usize,
    pub max_suggestions: usize,
    /// Zoom the camera flies to on selection.
    pub select_zoom: f64,
}

impl Default for GeocodeConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.mapbox.com/geocoding/v5/mapbox.places/".to_string(),
            access_token: String::new(),
            bbox: LngLatBounds::new(144.439004, -37.857166, 144.829723, -37.4645),
            min_query_chars: 2,
            max_suggestions: 10,
            select_zoom: 16.0,
        }
    }
}

impl GeocodeConfig {
    pub fn accepts(&self, query: &str) -> bool {
        query.trim().chars().count() > self.min_query_chars
    }

    pub fn url(&self, query: &str) -> String {
        format!(
            "{}{}.json?bbox={}&access_token={}",
            self.endpoint,
            encode_component(query.trim()),
            self.bbox.to_query_value(),
            encode_component(&self.access_token),
        )
    }
}

/// Percent-encodes everything except the characters `encodeURIComponent`
/// leaves alone.
pub fn encode_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(b as char),
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

/// Issues monotonically increasing request ids; only the newest is current.
#[derive(Debug, Default)]
pub struct RequestSequence {
    latest: u64,
    live: bool,
}

impl RequestSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self) -> RequestId {
        self.latest += 1;
        self.live = true;
        RequestId(self.latest)
    }

    /// Makes every issued id stale without issuing a new one.
    pub fn invalidate(&mut self) {
        self.live = false;
    }

    pub fn is_current(&self, id: RequestId) -> bool {
        self.live && id.0 == self.latest
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeocodeRequest {
    pub id: RequestId,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn url_encodes_query_and_scopes_to_bbox() {
        let cfg = GeocodeConfig {
            access_token: "pk.abc".to_string(),
            ..GeocodeConfig::default()
        };
        assert_eq!(
            cfg.url(" 12 High St/Melton "),
            "https://api.mapbox.com/geocoding/v5/mapbox.places/12%20High%20St%2FMelton.json\
             ?bbox=144.439004,-37.857166,144.829723,-37.4645&access_token=pk.abc"
        );
    }

    #[test]
    fn encode_component_matches_browser_behaviour() {
        assert_eq!(encode_component("a-b_c.d!e~f*g'h(i)j"), "a-b_c.d!e~f*g'h(i)j");
        assert_eq!(encode_component("a&b=c#d"), "a%26b%3Dc%23d");
        assert_eq!(encode_component("Café"), "Caf%C3%A9");
    }

    #[test]
    fn accepts_only_queries_longer_than_two_chars() {
        let cfg = GeocodeConfig::default();
        assert!(!cfg.accepts("ab"));
        assert!(!cfg.accepts("  ab  "));
        assert!(cfg.accepts("abc"));
        assert!(cfg.accepts("Mél"));
    }

    #[test]
    fn only_latest_id_is_current() {
        let mut seq = RequestSequence::new();
        let a = seq.issue();
        let b = seq.issue();
        assert!(!seq.is_current(a));
        assert!(seq.is_current(b));
        seq.invalidate();
        assert!(!seq.is_current(b));
        let c = seq.issue();
        assert!(c > b);
        assert!(seq.is_current(c));
    }
}
