//! Periodic and event-driven reloads with last-triggered-wins ordering.
//!
//! Every load gets a fresh [`RequestToken`]. A settled load is rendered only
//! if its token is still the outstanding one for its view; anything older is
//! dropped on arrival. There is no request cancellation beyond that.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use serde_json::json;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::error::{ClientError, CoordError};
use crate::logging::{log, obj, v_str, Domain, Level};
use crate::render::ViewRenderer;
use crate::view::{Payload, RefreshEvent, View, ViewId, ViewRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestToken(u64);

/// How a single load attempt ended.
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    /// Rendered as the view's content.
    Applied,
    /// A newer load for the same view was triggered first; result dropped.
    Stale,
    /// Load or decode failed; the failure was rendered.
    Failed(CoordError),
    /// The load task itself did not finish.
    Aborted,
}

impl LoadOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, LoadOutcome::Applied)
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, LoadOutcome::Stale)
    }
}

/// A triggered load. Dropping it does not cancel the load.
#[derive(Debug)]
pub struct LoadHandle {
    view_id: ViewId,
    token: RequestToken,
    task: JoinHandle<LoadOutcome>,
}

impl LoadHandle {
    pub fn view_id(&self) -> &ViewId {
        &self.view_id
    }

    pub fn token(&self) -> RequestToken {
        self.token
    }

    pub async fn outcome(self) -> LoadOutcome {
        self.task.await.unwrap_or(LoadOutcome::Aborted)
    }
}

#[derive(Default)]
struct SchedState {
    next_token: u64,
    outstanding: HashMap<ViewId, RequestToken>,
    timers: HashMap<ViewId, JoinHandle<()>>,
    active: HashSet<ViewId>,
    last_applied: HashMap<ViewId, Payload>,
}

struct Inner {
    registry: Arc<ViewRegistry>,
    renderer: Arc<ViewRenderer>,
    state: Mutex<SchedState>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, SchedState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn trigger(self: &Arc<Self>, id: &ViewId) -> Result<LoadHandle, CoordError> {
        let view = self.registry.resolve(id)?;
        let token = {
            let mut state = self.lock();
            state.next_token += 1;
            let token = RequestToken(state.next_token);
            if let Some(prev) = state.outstanding.insert(id.clone(), token) {
                log(
                    Level::Debug,
                    Domain::Load,
                    "superseded",
                    obj(&[("view_id", v_str(id.as_str())), ("token", json!(prev.0))]),
                );
            }
            // Loading only replaces content before the first successful render.
            if !state.last_applied.contains_key(id) {
                self.renderer.apply_loading(id);
            }
            token
        };
        log(
            Level::Info,
            Domain::Load,
            "load_triggered",
            obj(&[("view_id", v_str(id.as_str())), ("token", json!(token.0))]),
        );

        let inner = Arc::clone(self);
        let view_id = id.clone();
        let task = tokio::spawn(async move { inner.run(view_id, view, token).await });
        Ok(LoadHandle {
            view_id: id.clone(),
            token,
            task,
        })
    }

    async fn run(self: Arc<Self>, id: ViewId, view: Arc<dyn View>, token: RequestToken) -> LoadOutcome {
        let started = Instant::now();
        let result = view.load().await;
        let outcome = self.settle(&id, token, result);
        let (level, status) = match &outcome {
            LoadOutcome::Applied => (Level::Info, "applied"),
            LoadOutcome::Stale => (Level::Debug, "stale"),
            LoadOutcome::Failed(_) => (Level::Warn, "failed"),
            LoadOutcome::Aborted => (Level::Warn, "aborted"),
        };
        let mut fields = obj(&[
            ("view_id", v_str(id.as_str())),
            ("token", json!(token.0)),
            ("status", v_str(status)),
            ("elapsed_ms", json!(started.elapsed().as_millis() as u64)),
        ]);
        if let LoadOutcome::Failed(err) = &outcome {
            fields.insert("msg".to_string(), v_str(&err.to_string()));
        }
        log(level, Domain::Load, "load_settled", fields);
        outcome
    }

    /// Applies a finished load if `token` is still current. The state lock is
    /// held while rendering so an older result can never land after a newer one.
    fn settle(&self, id: &ViewId, token: RequestToken, result: Result<Payload, ClientError>) -> LoadOutcome {
        let mut state = self.lock();
        if state.outstanding.get(id) != Some(&token) {
            return LoadOutcome::Stale;
        }
        state.outstanding.remove(id);

        let rendered = result
            .map_err(|cause| CoordError::Load {
                view_id: id.clone(),
                cause,
            })
            .and_then(|payload| self.renderer.apply(id, &payload).map(|()| payload));
        match rendered {
            Ok(payload) => {
                state.last_applied.insert(id.clone(), payload);
                LoadOutcome::Applied
            }
            // No target to draw on.
            Err(err @ CoordError::UnknownView(_)) => LoadOutcome::Failed(err),
            Err(err) => {
                match state.last_applied.get(id) {
                    Some(prior) => {
                        let message = format!("Refresh failed. {}", err.display_message());
                        self.renderer.apply_notice(id, prior, &message);
                    }
                    None => self.renderer.apply_error(id, &err),
                }
                LoadOutcome::Failed(err)
            }
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(|p| p.into_inner());
        for (_, timer) in state.timers.drain() {
            timer.abort();
        }
    }
}

/// Owns request tokens, periodic timers and the set of views whose
/// handlers are attached.
pub struct RefreshScheduler {
    inner: Arc<Inner>,
}

impl RefreshScheduler {
    pub fn new(registry: Arc<ViewRegistry>, renderer: Arc<ViewRenderer>) -> Self {
        Self {
            inner: Arc::new(Inner {
                registry,
                renderer,
                state: Mutex::new(SchedState::default()),
            }),
        }
    }

    /// Starts a load for `id`, invalidating any load still outstanding for it.
    /// Must be called from within a tokio runtime.
    pub fn trigger_load(&self, id: &ViewId) -> Result<LoadHandle, CoordError> {
        self.inner.trigger(id)
    }

    /// Starts polling `id` at its policy interval. Returns `false` when the
    /// view has no interval or is already polling.
    pub fn start_periodic(&self, id: &ViewId) -> Result<bool, CoordError> {
        let policy = self.inner.registry.policy(id)?;
        let Some(period) = policy.interval.filter(|d| !d.is_zero()) else {
            return Ok(false);
        };

        let mut state = self.inner.lock();
        if state.timers.contains_key(id) {
            return Ok(false);
        }
        let timer = spawn_timer(Arc::downgrade(&self.inner), id.clone(), period);
        state.timers.insert(id.clone(), timer);
        log(
            Level::Info,
            Domain::Load,
            "periodic_started",
            obj(&[("view_id", v_str(id.as_str())), ("period_ms", json!(period.as_millis() as u64))]),
        );
        Ok(true)
    }

    pub fn stop_periodic(&self, id: &ViewId) -> bool {
        let timer = self.inner.lock().timers.remove(id);
        match timer {
            Some(timer) => {
                timer.abort();
                log(Level::Info, Domain::Load, "periodic_stopped", obj(&[("view_id", v_str(id.as_str()))]));
                true
            }
            None => false,
        }
    }

    /// Reloads every attached view whose policy listens for `event`.
    pub fn on_external_event(&self, event: RefreshEvent) -> Vec<LoadHandle> {
        let mut targets: Vec<ViewId> = self.inner.lock().active.iter().cloned().collect();
        targets.sort();
        targets.retain(|id| {
            self.inner
                .registry
                .policy(id)
                .map(|p| p.listens_to(event))
                .unwrap_or(false)
        });
        log(
            Level::Info,
            Domain::Action,
            "external_event",
            obj(&[("event", v_str(event.as_str())), ("targets", json!(targets.len()))]),
        );

        let mut handles = Vec::with_capacity(targets.len());
        for id in &targets {
            match self.trigger_load(id) {
                Ok(handle) => handles.push(handle),
                Err(e) => log(
                    Level::Warn,
                    Domain::Load,
                    "event_trigger_failed",
                    obj(&[("view_id", v_str(id.as_str())), ("msg", v_str(&e.to_string()))]),
                ),
            }
        }
        handles
    }

    /// Marks `id` attached, loads it and starts its timer.
    pub fn on_attached(&self, id: &ViewId) -> Result<LoadHandle, CoordError> {
        self.inner.lock().active.insert(id.clone());
        let handle = self.trigger_load(id)?;
        self.start_periodic(id)?;
        Ok(handle)
    }

    pub fn on_detached(&self, id: &ViewId) {
        self.inner.lock().active.remove(id);
        self.stop_periodic(id);
    }

    /// Shows `message` on the view without discarding what it last rendered.
    pub fn report_notice(&self, id: &ViewId, message: &str) {
        let state = self.inner.lock();
        match state.last_applied.get(id) {
            Some(prior) => self.inner.renderer.apply_notice(id, prior, message),
            None => self.inner.renderer.apply_failure(id, message),
        }
    }

    pub fn last_payload(&self, id: &ViewId) -> Option<Payload> {
        self.inner.lock().last_applied.get(id).cloned()
    }

    pub fn outstanding(&self, id: &ViewId) -> Option<RequestToken> {
        self.inner.lock().outstanding.get(id).copied()
    }

    pub fn is_periodic(&self, id: &ViewId) -> bool {
        self.inner.lock().timers.contains_key(id)
    }

    pub fn is_active(&self, id: &ViewId) -> bool {
        self.inner.lock().active.contains(id)
    }
}

fn spawn_timer(weak: Weak<Inner>, id: ViewId, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let Some(inner) = weak.upgrade() else {
                break;
            };
            if let Err(e) = inner.trigger(&id) {
                log(
                    Level::Warn,
                    Domain::Load,
                    "periodic_trigger_failed",
                    obj(&[("view_id", v_str(id.as_str())), ("msg", v_str(&e.to_string()))]),
                );
            }
        }
    })
}
