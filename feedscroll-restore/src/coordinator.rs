use crate::key::ScrollKey;
use crate::options::RestoreOptions;
use crate::storage::DurableStorage;
use crate::store::ScrollPositionStore;
use crate::surface::{RestoreToken, ScrollBehavior, ScrollCommand, ScrollSurface};

/// Where the coordinator is in restoring the active key.
#[derive(Clone, Debug, PartialEq)]
pub enum RestorePhase {
    Idle,
    Restoring {
        key: ScrollKey,
        /// Saved `(x, y)` being restored.
        target: (f64, f64),
        /// Index of the next attempt.
        attempt: u32,
        due_ms: u64,
        token: RestoreToken,
    },
}

/// How a restore ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// The live offset reached the target. `attempts` counts the attempts that ran before it did.
    Converged { attempts: u32 },
    /// The document was tall enough but the offset never settled within tolerance; the last
    /// scroll was left in place.
    BestEffort,
    /// The document never grew tall enough. One best-effort scroll was issued.
    GaveUp,
}

#[derive(Clone, Debug)]
struct PendingSave {
    key: ScrollKey,
    x: f64,
    y: f64,
    due_ms: u64,
}

/// Saves the active key's scroll offset while the user scrolls and restores it when the key
/// becomes active again, retrying while content is still loading.
///
/// Time never passes on its own: the adapter reports scroll events through
/// [`Self::on_scroll`] and drives deadlines with [`Self::tick`].
///
/// `activate` must be called while the surface still shows the outgoing key's content, so the
/// outgoing offset can be saved.
#[derive(Debug)]
pub struct RestoreCoordinator<S> {
    store: ScrollPositionStore<S>,
    options: RestoreOptions,
    active: Option<ScrollKey>,
    phase: RestorePhase,
    generation: u64,

    last_capture_ms: Option<u64>,
    trailing_capture_ms: Option<u64>,
    pending_save: Option<PendingSave>,
}

impl<S: DurableStorage> RestoreCoordinator<S> {
    pub fn new(store: ScrollPositionStore<S>, options: RestoreOptions) -> Self {
        Self {
            store,
            options,
            active: None,
            phase: RestorePhase::Idle,
            generation: 0,
            last_capture_ms: None,
            trailing_capture_ms: None,
            pending_save: None,
        }
    }

    pub fn options(&self) -> &RestoreOptions {
        &self.options
    }

    pub fn store(&self) -> &ScrollPositionStore<S> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ScrollPositionStore<S> {
        &mut self.store
    }

    pub fn phase(&self) -> &RestorePhase {
        &self.phase
    }

    pub fn active_key(&self) -> Option<&ScrollKey> {
        self.active.as_ref()
    }

    pub fn is_restoring(&self) -> bool {
        matches!(self.phase, RestorePhase::Restoring { .. })
    }

    /// Whether `token` belongs to the restore still in flight.
    pub fn is_current(&self, token: RestoreToken) -> bool {
        matches!(self.phase, RestorePhase::Restoring { token: t, .. } if t == token)
    }

    /// Whether `tick` has any deadline to run.
    pub fn needs_tick(&self) -> bool {
        self.is_restoring() || self.trailing_capture_ms.is_some() || self.pending_save.is_some()
    }

    /// Switches the active key.
    ///
    /// Saves the outgoing key's live offset, cancels any restore in flight, sweeps expired
    /// records, then schedules a restore of `key` if it has a saved position. Returns the new
    /// restore's token. Re-activating the active key is a no-op.
    pub fn activate(
        &mut self,
        key: ScrollKey,
        now_ms: u64,
        surface: &impl ScrollSurface,
    ) -> Option<RestoreToken> {
        if self.active.as_ref() == Some(&key) {
            return self.current_token();
        }

        if let Some(prev) = self.active.take() {
            if !self.is_restoring() {
                // A capture still waiting out its debounce must land even when the live offset
                // is back at the top.
                let unsaved = self.pending_save.take().is_some_and(|p| p.key == prev);
                let (x, y) = surface.scroll_position();
                if y > 0.0 || unsaved {
                    self.store.save(&prev, x, y, now_ms);
                }
            }
        }

        self.cancel();
        self.clear_capture_state();
        self.store.sweep_expired(self.options.retention_ms, now_ms);

        vdebug!(key = %key, now_ms, "activate");
        let record = self.store.get(&key, now_ms);
        self.active = Some(key.clone());
        let Some(record) = record else {
            vtrace!(key = %key, "no saved position");
            return None;
        };
        self.store.touch(&key, now_ms);

        self.generation = self.generation.wrapping_add(1);
        let token = RestoreToken(self.generation);
        self.phase = RestorePhase::Restoring {
            key,
            target: (record.x, record.y),
            attempt: 0,
            due_ms: now_ms,
            token,
        };
        Some(token)
    }

    /// Runs whatever is due at `now_ms`: a trailing scroll capture, a restore attempt, and the
    /// debounced save. Returns the outcome when a restore finishes during this tick.
    pub fn tick(
        &mut self,
        now_ms: u64,
        surface: &mut impl ScrollSurface,
    ) -> Option<RestoreOutcome> {
        if self.trailing_capture_ms.is_some_and(|due| due <= now_ms) {
            self.capture(now_ms, &*surface);
        }

        let attempt_due = match self.phase {
            RestorePhase::Restoring { due_ms, .. } => due_ms <= now_ms,
            RestorePhase::Idle => false,
        };
        let outcome = if attempt_due {
            self.run_attempt(now_ms, surface)
        } else {
            None
        };

        if self.is_restoring() {
            return outcome;
        }
        if self.pending_save.as_ref().is_some_and(|p| p.due_ms <= now_ms) {
            if let Some(p) = self.pending_save.take() {
                self.store.save(&p.key, p.x, p.y, now_ms);
            }
        }

        outcome
    }

    /// Reports a scroll event. Captures the live offset at most once per throttle window (with a
    /// trailing capture run by `tick`) and schedules a debounced save.
    pub fn on_scroll(&mut self, now_ms: u64, surface: &impl ScrollSurface) {
        if self.active.is_none() {
            return;
        }
        if let Some(last) = self.last_capture_ms {
            let next = last.saturating_add(self.options.scroll_throttle_ms);
            if now_ms < next {
                self.trailing_capture_ms = Some(next);
                return;
            }
        }
        self.capture(now_ms, surface);
    }

    /// Saves the live offset immediately, bypassing throttling. Skipped (returns `false`) with
    /// no active key or while a restore is in flight.
    pub fn save_now(&mut self, now_ms: u64, surface: &impl ScrollSurface) -> bool {
        if self.is_restoring() {
            return false;
        }
        self.save_live(now_ms, surface)
    }

    /// Saves the live offset unconditionally, even mid-restore, and drops all scheduled work.
    /// The next `activate` starts fresh.
    pub fn teardown(&mut self, now_ms: u64, surface: &impl ScrollSurface) {
        self.save_live(now_ms, surface);
        self.cancel();
        self.clear_capture_state();
        self.active = None;
    }

    /// Abandons the restore in flight, if any. Its token is never current again.
    pub fn cancel(&mut self) {
        if self.is_restoring() {
            vdebug!(phase = ?self.phase, "restore cancelled");
            self.generation = self.generation.wrapping_add(1);
            self.phase = RestorePhase::Idle;
        }
    }

    /// Forgets every saved position along with anything scheduled to be saved.
    pub fn clear_all(&mut self) {
        self.pending_save = None;
        self.trailing_capture_ms = None;
        self.store.clear_all();
    }

    fn save_live(&mut self, now_ms: u64, surface: &impl ScrollSurface) -> bool {
        let Some(key) = self.active.as_ref() else {
            return false;
        };
        let (x, y) = surface.scroll_position();
        self.store.save(key, x, y, now_ms);
        self.clear_capture_state();
        true
    }

    fn current_token(&self) -> Option<RestoreToken> {
        match self.phase {
            RestorePhase::Restoring { token, .. } => Some(token),
            RestorePhase::Idle => None,
        }
    }

    fn clear_capture_state(&mut self) {
        self.last_capture_ms = None;
        self.trailing_capture_ms = None;
        self.pending_save = None;
    }

    fn capture(&mut self, now_ms: u64, surface: &impl ScrollSurface) {
        self.last_capture_ms = Some(now_ms);
        self.trailing_capture_ms = None;
        let Some(key) = self.active.clone() else {
            return;
        };
        let (x, y) = surface.scroll_position();
        self.pending_save = Some(PendingSave {
            key,
            x,
            y,
            due_ms: now_ms.saturating_add(self.options.save_debounce_ms),
        });
    }

    fn run_attempt(
        &mut self,
        now_ms: u64,
        surface: &mut impl ScrollSurface,
    ) -> Option<RestoreOutcome> {
        let RestorePhase::Restoring {
            key,
            target,
            attempt,
            token,
            ..
        } = self.phase.clone()
        else {
            return None;
        };
        let (target_x, target_y) = target;
        let last_attempt = attempt.saturating_add(1) >= self.options.max_attempts;

        let (_, y) = surface.scroll_position();
        if (y - target_y).abs() <= self.options.tolerance_px {
            vdebug!(key = %key, attempt, y, "restore converged");
            let outcome = RestoreOutcome::Converged { attempts: attempt };
            return Some(self.finish(now_ms, &*surface, outcome));
        }

        let behavior = if attempt < self.options.instant_attempts {
            ScrollBehavior::Instant
        } else {
            ScrollBehavior::Smooth
        };
        let command = ScrollCommand {
            x: target_x,
            y: target_y,
            behavior,
            token,
            issued_at_ms: now_ms,
        };

        let needed = target_y + surface.viewport_height();
        let document_height = surface.document_height();
        if document_height < needed {
            if last_attempt {
                vdebug!(key = %key, document_height, needed, "restore gave up");
                surface.scroll_to(command);
                return Some(self.finish(now_ms, &*surface, RestoreOutcome::GaveUp));
            }
            vtrace!(key = %key, attempt, document_height, needed, "document too short");
        } else {
            vtrace!(key = %key, attempt, y = target_y, ?behavior, "restore scroll");
            surface.scroll_to(command);
            if last_attempt {
                vdebug!(key = %key, "restore attempts exhausted");
                return Some(self.finish(now_ms, &*surface, RestoreOutcome::BestEffort));
            }
        }

        let delay = self.options.retry_delay_ms(attempt);
        self.phase = RestorePhase::Restoring {
            key,
            target,
            attempt: attempt + 1,
            due_ms: now_ms.saturating_add(delay),
            token,
        };
        None
    }

    /// Returns to `Idle`. A capture held during the restore is refreshed from the live offset,
    /// so only the post-restore position is ever saved.
    fn finish(
        &mut self,
        now_ms: u64,
        surface: &impl ScrollSurface,
        outcome: RestoreOutcome,
    ) -> RestoreOutcome {
        self.phase = RestorePhase::Idle;
        if let Some(pending) = self.pending_save.as_mut() {
            let (x, y) = surface.scroll_position();
            pending.x = x;
            pending.y = y;
            pending.due_ms = now_ms.saturating_add(self.options.save_debounce_ms);
        }
        outcome
    }
}
