/// What a transient notice is about.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum NoticeKind {
    /// A basemap style did not finish loading; the previous style is restored.
    StyleLoadFailed,
    /// The geocoding service could not be reached or answered garbage.
    GeocodeFailed,
    /// The theme preference could not be read or written.
    PreferenceUnavailable,
}

impl NoticeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NoticeKind::StyleLoadFailed => "style_load_failed",
            NoticeKind::GeocodeFailed => "geocode_failed",
            NoticeKind::PreferenceUnavailable => "preference_unavailable",
        }
    }
}

/// A user-visible message, ordered by emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub sequence: u64,
    pub kind: NoticeKind,
    pub message: String,
}

/// Owned queue of notices waiting to be shown.
///
/// Components push into their own bus; the UI drains after every event and
/// shows the newest one.
#[derive(Debug, Default)]
pub struct NoticeBus {
    next_sequence: u64,
    notices: Vec<Notice>,
}

impl NoticeBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, kind: NoticeKind, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(kind = kind.as_str(), %message, "notice");
        self.notices.push(Notice {
            sequence: self.next_sequence,
            kind,
            message,
        });
        self.next_sequence += 1;
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    pub fn drain(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}

#[cfg(test)]
mod tests {
    use super::{NoticeBus, NoticeKind};

    #[test]
    fn records_notices_in_emission_order() {
        let mut bus = NoticeBus::new();
        bus.emit(NoticeKind::GeocodeFailed, "first");
        bus.emit(NoticeKind::StyleLoadFailed, "second");
        assert_eq!(bus.notices().len(), 2);
        assert!(bus.notices()[0].sequence < bus.notices()[1].sequence);
        assert_eq!(bus.notices()[1].kind, NoticeKind::StyleLoadFailed);
    }

    #[test]
    fn drain_clears_but_keeps_sequence_running() {
        let mut bus = NoticeBus::new();
        bus.emit(NoticeKind::GeocodeFailed, "m");
        let drained = bus.drain();
        assert_eq!(drained.len(), 1);
        assert!(bus.is_empty());

        bus.emit(NoticeKind::GeocodeFailed, "n");
        assert_eq!(bus.notices()[0].sequence, 1);
    }
}
