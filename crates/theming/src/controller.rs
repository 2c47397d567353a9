//! Basemap style switching.
//!
//! A style swap destroys every source and layer on the map, so switching is a
//! strict sequence: tear down custom layers, load the new style, wait for its
//! load signal, then re-add layers, re-apply legend visibility and recolor the
//! page chrome. The controller owns that sequence as a small state machine:
//!
//! ```text
//!   Idle ──request──▶ Switching(g) ──loaded(g)──▶ Ready
//!                         │   ▲                     │
//!                         │   └──────request────────┘
//!                         └──failed(g)──▶ Switching(g+1, previous style) | Idle
//! ```
//!
//! Every load is tagged with a [`Generation`]. Load and failure signals that
//! carry an older generation are ignored, so a slow or abandoned load can
//! never repopulate a newer style. Requests that arrive while a load is in
//! flight do not interleave with it; only the newest one is remembered and
//! started once the in-flight generation settles.
//!
//! The one exception to dropping late signals is an initial style that was
//! given up on: with nothing to fall back to, the map keeps loading it, so if
//! it does finish before any other request it is adopted as the current style.

use foundation::Generation;
use layers::{HostError, LayerRegistry, LegendVisibility, Visibility};
use runtime::{Notice, NoticeBus, NoticeKind};

use crate::palette::{ThemeChrome, palette_for};
use crate::selection::{StyleKey, StyleSelection, StyleTable};
use crate::surface::MapSurface;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchState {
    /// No style has been adopted yet, or the last one could not be restored.
    Idle,
    Switching {
        generation: Generation,
        target: StyleSelection,
        /// What to fall back to if `target` never loads.
        previous: Option<StyleSelection>,
    },
    Ready {
        current: StyleSelection,
    },
}

/// Handed out whenever a style load starts. The caller arms exactly one load
/// listener and one timeout for it, both reporting back with `generation`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub generation: Generation,
    pub selection: StyleSelection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchStep {
    Started(LoadTicket),
    /// The surface's initial style is still loading. When `arm_continuation`
    /// is set the caller registers one continuation that calls
    /// [`StyleSwitchController::resume`] once it has loaded; otherwise one is
    /// already registered.
    Deferred { arm_continuation: bool },
    /// A load is in flight; the request is picked up when it settles.
    Queued,
    /// The requested style is already showing.
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Ready {
        selection: StyleSelection,
        /// Set when a newer request was queued behind this load.
        follow_up: Option<SwitchStep>,
    },
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadFailure {
    TimedOut,
    Error(String),
}

impl std::fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadFailure::TimedOut => write!(f, "timed out"),
            LoadFailure::Error(msg) => write!(f, "{msg}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureOutcome {
    /// The previous style is being reloaded under a new generation.
    Fallback(LoadTicket),
    /// Nothing to fall back to; the controller is `Idle` again. A late load
    /// signal for the abandoned generation is still accepted, so the caller
    /// should keep listening for it.
    Abandoned,
    Stale,
}

#[derive(Debug)]
pub struct StyleSwitchController {
    table: StyleTable,
    registry: LayerRegistry,
    legend: LegendVisibility,
    notices: NoticeBus,
    state: SwitchState,
    generation: Generation,
    desired: Option<StyleKey>,
    continuation_armed: bool,
    /// Initial load that failed with no fallback, until another load starts.
    abandoned: Option<LoadTicket>,
}

impl StyleSwitchController {
    pub fn new(table: StyleTable, registry: LayerRegistry, legend: LegendVisibility) -> Self {
        Self {
            table,
            registry,
            legend,
            notices: NoticeBus::new(),
            state: SwitchState::Idle,
            generation: Generation::ZERO,
            desired: None,
            continuation_armed: false,
            abandoned: None,
        }
    }

    pub fn state(&self) -> &SwitchState {
        &self.state
    }

    pub fn table(&self) -> &StyleTable {
        &self.table
    }

    pub fn registry(&self) -> &LayerRegistry {
        &self.registry
    }

    pub fn legend(&self) -> &LegendVisibility {
        &self.legend
    }

    /// The newest requested key, which the controller converges on.
    pub fn desired(&self) -> Option<StyleKey> {
        self.desired
    }

    /// Generation of the most recently started load.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn current(&self) -> Option<&StyleSelection> {
        match &self.state {
            SwitchState::Ready { current } => Some(current),
            _ => None,
        }
    }

    /// The theme the page should be drawn in right now: the rendered one, or
    /// the one being loaded.
    pub fn visible_key(&self) -> Option<StyleKey> {
        match &self.state {
            SwitchState::Ready { current } => Some(current.key),
            SwitchState::Switching { target, .. } => Some(target.key),
            SwitchState::Idle => self.desired,
        }
    }

    pub fn notices_mut(&mut self) -> &mut NoticeBus {
        &mut self.notices
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain()
    }

    /// Adopts the style a freshly constructed map is already loading.
    pub fn attach(&mut self, key: StyleKey) -> LoadTicket {
        let selection = self.table.select(key);
        self.desired = Some(key);
        self.generation = self.generation.next();
        self.state = SwitchState::Switching {
            generation: self.generation,
            target: selection.clone(),
            previous: None,
        };
        tracing::debug!(generation = %self.generation, url = %selection.url, "attached initial style");
        LoadTicket {
            generation: self.generation,
            selection,
        }
    }

    pub fn request_switch<S: MapSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        key: StyleKey,
    ) -> SwitchStep {
        self.desired = Some(key);
        self.drive(surface)
    }

    /// Continuation for [`SwitchStep::Deferred`]. Re-derives the switch from
    /// the newest request rather than replaying the one that deferred.
    pub fn resume<S: MapSurface + ?Sized>(&mut self, surface: &mut S) -> SwitchStep {
        self.continuation_armed = false;
        self.drive(surface)
    }

    fn drive<S: MapSurface + ?Sized>(&mut self, surface: &mut S) -> SwitchStep {
        let Some(key) = self.desired else {
            return SwitchStep::Unchanged;
        };
        match &self.state {
            SwitchState::Switching { .. } => SwitchStep::Queued,
            SwitchState::Ready { current } if current.key == key => SwitchStep::Unchanged,
            SwitchState::Ready { current } => {
                let previous = Some(current.clone());
                SwitchStep::Started(self.begin(surface, key, previous))
            }
            SwitchState::Idle if self.generation.is_zero() && !surface.is_style_loaded() => {
                let arm_continuation = !self.continuation_armed;
                self.continuation_armed = true;
                SwitchStep::Deferred { arm_continuation }
            }
            SwitchState::Idle => SwitchStep::Started(self.begin(surface, key, None)),
        }
    }

    fn begin<S: MapSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        key: StyleKey,
        previous: Option<StyleSelection>,
    ) -> LoadTicket {
        let selection = self.table.select(key);
        if let Err(err) = self.registry.remove_all(surface) {
            // The style swap below discards whatever is left anyway.
            tracing::warn!(%err, "teardown before style swap incomplete");
        }
        self.generation = self.generation.next();
        self.abandoned = None;
        surface.set_style(&selection.url);
        self.state = SwitchState::Switching {
            generation: self.generation,
            target: selection.clone(),
            previous,
        };
        tracing::debug!(
            generation = %self.generation,
            theme = key.theme.as_str(),
            view = key.view.as_str(),
            "style switch started"
        );
        LoadTicket {
            generation: self.generation,
            selection,
        }
    }

    /// The surface reported that the style issued under `generation` loaded.
    pub fn on_style_loaded<S, C>(
        &mut self,
        surface: &mut S,
        chrome: &mut C,
        generation: Generation,
    ) -> LoadOutcome
    where
        S: MapSurface + ?Sized,
        C: ThemeChrome + ?Sized,
    {
        let target = match &self.state {
            SwitchState::Switching {
                generation: g,
                target,
                ..
            } if *g == generation => target.clone(),
            SwitchState::Idle
                if self
                    .abandoned
                    .as_ref()
                    .is_some_and(|t| t.generation == generation) =>
            {
                let Some(late) = self.abandoned.take() else {
                    return LoadOutcome::Stale;
                };
                tracing::info!(%generation, url = %late.selection.url, "abandoned style loaded late");
                self.desired.get_or_insert(late.selection.key);
                late.selection
            }
            _ => {
                tracing::debug!(%generation, current = %self.generation, "stale style load ignored");
                return LoadOutcome::Stale;
            }
        };

        if let Err(err) = self.registry.add_all(surface) {
            tracing::warn!(%err, "could not restore custom layers");
            self.notices
                .emit(NoticeKind::StyleLoadFailed, "Aerial imagery could not be added to the map");
        }
        if let Err(err) = self.legend.apply(surface) {
            tracing::warn!(%err, "could not restore legend visibility");
        }
        chrome.apply_palette(&palette_for(target.key.theme));

        self.state = SwitchState::Ready {
            current: target.clone(),
        };
        tracing::info!(%generation, url = %target.url, "style ready");

        let follow_up = match self.desired {
            Some(key) if key != target.key => Some(self.drive(surface)),
            _ => None,
        };
        LoadOutcome::Ready {
            selection: target,
            follow_up,
        }
    }

    /// The load issued under `generation` failed or timed out.
    pub fn on_style_failed<S: MapSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        generation: Generation,
        failure: LoadFailure,
    ) -> FailureOutcome {
        let (target, previous) = match &self.state {
            SwitchState::Switching {
                generation: g,
                target,
                previous,
            } if *g == generation => (target.clone(), previous.clone()),
            _ => return FailureOutcome::Stale,
        };

        tracing::warn!(%generation, url = %target.url, %failure, "style load failed");
        if self.desired == Some(target.key) {
            self.desired = previous.as_ref().map(|p| p.key);
        }

        match previous {
            Some(prev) => {
                self.notices.emit(
                    NoticeKind::StyleLoadFailed,
                    format!("Map style failed to load ({failure}); restoring the previous style"),
                );
                self.state = SwitchState::Idle;
                FailureOutcome::Fallback(self.begin(surface, prev.key, None))
            }
            None => {
                self.notices.emit(
                    NoticeKind::StyleLoadFailed,
                    format!("Map style failed to load ({failure})"),
                );
                self.state = SwitchState::Idle;
                self.abandoned = Some(LoadTicket {
                    generation,
                    selection: target,
                });
                FailureOutcome::Abandoned
            }
        }
    }

    /// Records a legend toggle and applies it if the layer is on the map.
    pub fn set_layer_visible<S: MapSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        layer_id: &str,
        visible: bool,
    ) -> Result<(), HostError> {
        self.legend.set(layer_id, visible);
        if matches!(self.state, SwitchState::Ready { .. }) && surface.has_layer(layer_id) {
            surface.set_visibility(layer_id, Visibility::from_visible(visible))?;
        }
        Ok(())
    }
}
