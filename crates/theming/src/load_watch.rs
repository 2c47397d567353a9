//! Host callbacks that report back on one style load.
//!
//! Each started load gets one load listener and, optionally, one timeout,
//! both tagged with the load's [`Generation`]. Arming a new load tears the
//! previous pair down first, so at most one pair is ever registered with the
//! host.

use foundation::Generation;

/// Registers and cancels the host-side callbacks for a load.
pub trait LoadHooks {
    type Listener;
    type Timer;

    fn listen(&mut self, generation: Generation) -> Self::Listener;
    fn start_timer(&mut self, generation: Generation) -> Self::Timer;
    fn unlisten(&mut self, listener: Self::Listener);
    fn cancel_timer(&mut self, timer: Self::Timer);
}

#[derive(Debug)]
struct Armed<L, T> {
    generation: Generation,
    listener: L,
    timer: Option<T>,
}

#[derive(Debug)]
pub struct LoadWatch<L, T> {
    armed: Option<Armed<L, T>>,
}

impl<L, T> Default for LoadWatch<L, T> {
    fn default() -> Self {
        Self { armed: None }
    }
}

impl<L, T> LoadWatch<L, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generation the registered callbacks report for, if any.
    pub fn generation(&self) -> Option<Generation> {
        self.armed.as_ref().map(|a| a.generation)
    }

    pub fn has_timer(&self) -> bool {
        self.armed.as_ref().is_some_and(|a| a.timer.is_some())
    }

    /// Replaces whatever is armed with a listener for `generation`, plus a
    /// timeout when `with_timeout` is set.
    pub fn arm<H>(&mut self, hooks: &mut H, generation: Generation, with_timeout: bool)
    where
        H: LoadHooks<Listener = L, Timer = T> + ?Sized,
    {
        self.disarm(hooks);
        let listener = hooks.listen(generation);
        let timer = with_timeout.then(|| hooks.start_timer(generation));
        tracing::trace!(%generation, with_timeout, "load callbacks armed");
        self.armed = Some(Armed {
            generation,
            listener,
            timer,
        });
    }

    /// Tears down the callbacks for `generation`. Returns false, leaving the
    /// armed pair alone, when a different generation is armed.
    pub fn settle<H>(&mut self, hooks: &mut H, generation: Generation) -> bool
    where
        H: LoadHooks<Listener = L, Timer = T> + ?Sized,
    {
        if self.generation() != Some(generation) {
            tracing::trace!(%generation, armed = ?self.generation(), "stale load callback");
            return false;
        }
        self.disarm(hooks);
        true
    }

    pub fn disarm<H>(&mut self, hooks: &mut H)
    where
        H: LoadHooks<Listener = L, Timer = T> + ?Sized,
    {
        if let Some(armed) = self.armed.take() {
            hooks.unlisten(armed.listener);
            if let Some(timer) = armed.timer {
                hooks.cancel_timer(timer);
            }
        }
    }
}
