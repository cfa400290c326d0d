//! # Supervisor: fans out worker slots and aggregates their outcome.
//!
//! The [`Supervisor`] owns the configuration and the subscriber list. Each call
//! to [`Supervisor::run`] creates a fresh [`Bus`] and [`CancellationToken`],
//! spawns exactly `workers` [`WorkerActor`]s bound to them, and waits until
//! every one of them has settled. Runs never share a bus, so overlapping runs
//! on one supervisor deliver only their own events.
//!
//! ## High-level architecture
//! ```text
//! run(task):
//!   - bus = Bus::new(), token = CancellationToken::new()
//!   - event_listener(bus): subscribe ─► SubscriberSet::emit(&Event) until RunFinished
//!
//! Spawn slots (JoinSet):
//!   slot 0      slot 1      ...      slot N-1
//!     │           │                     │
//!     └──► WorkerActor::run(token.clone())
//!              └──► on Err: first one publishes CancellationRequested,
//!                           then token.cancel()  (idempotent)
//!
//! Aggregate (join loop, single writer):
//!   running  ── first Err joined ──► record it
//!   draining ── remaining slots settle (in-flight children are never killed)
//!   done     ── publish RunFinished, drain subscribers, return first Err or Ok
//! ```
//!
//! ## Ordering
//! The reported error is the first one **joined**, which is not necessarily the
//! one whose slot cancelled the token first.

use std::ffi::OsString;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::{sync::broadcast::error::RecvError, task::JoinHandle, task::JoinSet};
use tokio_util::sync::CancellationToken;

use crate::core::{
    actor::{WorkerActor, WorkerParams},
    config::Config,
};
use crate::error::{RunError, WorkerError};
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::{Subscribe, SubscriberSet};
use crate::tasks::{CommandSpec, CommandTask, TaskRef};

/// Coordinates worker slots and event delivery for one or more runs.
pub struct Supervisor {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl Supervisor {
    /// Creates a new supervisor with the given config and subscribers.
    pub fn new(cfg: Config, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        Self { cfg, subscribers }
    }

    /// Configuration used for every run.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Runs `task` in every slot until all slots have settled.
    ///
    /// Returns `Ok(())` only if every slot had a successful attempt; otherwise
    /// the first terminal error joined, verbatim.
    pub async fn run(&self, task: TaskRef) -> Result<(), WorkerError> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let listener = self.event_listener(&bus);
        let token = CancellationToken::new();

        let mut set = JoinSet::new();
        self.spawn_workers(&mut set, &bus, &token, task);
        let outcome = Self::aggregate(&mut set).await;

        let mut done = Event::new(EventKind::RunFinished);
        if let Err(e) = &outcome {
            done = done.with_reason(e.to_string());
        }
        bus.publish(done);
        let _ = listener.await;

        outcome
    }

    /// Runs the child described by `argv` (program first) in every slot.
    ///
    /// Fails with [`RunError::EmptyCommand`] before anything is spawned if
    /// `argv` is empty.
    pub async fn run_command<I, S>(&self, argv: I) -> Result<(), RunError>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let spec = CommandSpec::from_argv(argv)?;
        self.run(Arc::new(CommandTask::new(spec))).await?;
        Ok(())
    }

    /// Subscribes to `bus` and forwards events to the subscriber set until
    /// `RunFinished`, then drains every subscriber queue.
    fn event_listener(&self, bus: &Bus) -> JoinHandle<()> {
        let mut rx = bus.subscribe();
        let set = SubscriberSet::new(self.subscribers.clone(), bus.clone());
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => {
                        set.emit(&ev);
                        if ev.is_run_finished() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                }
            }
            set.shutdown().await;
        })
    }

    /// Spawns one actor per slot; an actor's terminal error cancels `token`.
    ///
    /// The first slot to fail publishes `CancellationRequested` right before
    /// cancelling; later failures only repeat the (idempotent) cancel.
    fn spawn_workers(
        &self,
        set: &mut JoinSet<Result<(), WorkerError>>,
        bus: &Bus,
        token: &CancellationToken,
        task: TaskRef,
    ) {
        let params = WorkerParams {
            restarts: self.cfg.restarts,
            backoff: self.cfg.backoff,
        };
        let requested = Arc::new(AtomicBool::new(false));

        for slot in 0..self.cfg.workers.get() {
            let actor = WorkerActor::new(slot, Arc::clone(&task), params, bus.clone());
            let bus = bus.clone();
            let token = token.clone();
            let requested = Arc::clone(&requested);
            set.spawn(async move {
                let res = actor.run(token.clone()).await;
                if let Err(e) = &res {
                    if !requested.swap(true, Ordering::AcqRel) {
                        bus.publish(
                            Event::new(EventKind::CancellationRequested)
                                .with_slot(e.slot())
                                .with_reason(e.to_string()),
                        );
                    }
                    token.cancel();
                }
                res
            });
        }
    }

    /// Joins every slot, keeping the first error that arrives.
    async fn aggregate(set: &mut JoinSet<Result<(), WorkerError>>) -> Result<(), WorkerError> {
        let mut first: Option<WorkerError> = None;

        while let Some(joined) = set.join_next().await {
            let res = match joined {
                Ok(res) => res,
                Err(e) => std::panic::resume_unwind(e.into_panic()),
            };
            if let Err(e) = res {
                first.get_or_insert(e);
            }
        }

        match first {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::time;

    use super::*;
    use crate::error::AttemptError;
    use crate::tasks::TaskFn;

    fn fail(n: u32) -> AttemptError {
        AttemptError::Fail {
            error: format!("boom #{n}"),
        }
    }

    /// Task whose outcome is decided by the global call number (1-based).
    fn scripted<F>(decide: F) -> (TaskRef, Arc<AtomicU32>)
    where
        F: Fn(u32) -> Result<(), AttemptError> + Send + Sync + 'static,
    {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let decide = Arc::new(decide);
        let task: TaskRef = TaskFn::arc("scripted", move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            let decide = Arc::clone(&decide);
            async move { decide(n) }
        });
        (task, calls)
    }

    /// Keeps every event delivered to it, in delivery order.
    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<Event>>,
    }

    impl Recorder {
        fn events(&self) -> Vec<Event> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, event: &Event) {
            self.seen.lock().unwrap().push(event.clone());
        }
    }

    fn recorded(cfg: Config) -> (Supervisor, Arc<Recorder>) {
        let rec = Arc::new(Recorder::default());
        let sup = Supervisor::new(cfg, vec![rec.clone() as Arc<dyn Subscribe>]);
        (sup, rec)
    }

    fn per_slot(events: &[Event], kind: EventKind) -> HashMap<usize, usize> {
        let mut map = HashMap::new();
        for ev in events.iter().filter(|e| e.kind == kind) {
            *map.entry(ev.slot.unwrap()).or_insert(0) += 1;
        }
        map
    }

    fn count(events: &[Event], kind: EventKind) -> usize {
        events.iter().filter(|e| e.kind == kind).count()
    }

    fn position(events: &[Event], kind: EventKind) -> usize {
        events.iter().position(|e| e.kind == kind).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_success_single_attempt_each() {
        for (workers, restarts) in [(1, 0), (4, 0), (3, 5)] {
            let (sup, rec) = recorded(Config::new(workers, restarts));
            let (task, calls) = scripted(|_| Ok(()));

            assert!(sup.run(task).await.is_ok());

            let events = rec.events();
            assert_eq!(calls.load(Ordering::SeqCst), workers as u32);
            assert_eq!(count(&events, EventKind::WorkerSucceeded), workers as usize);
            assert_eq!(count(&events, EventKind::BackoffScheduled), 0);
            assert_eq!(count(&events, EventKind::CancellationRequested), 0);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_worker_always_failing_makes_budget_plus_one_attempts() {
        for restarts in 0..4 {
            let sup = Supervisor::new(Config::new(1, restarts), Vec::new());
            let (task, calls) = scripted(|n| Err(fail(n)));

            let err = sup.run(task).await.unwrap_err();

            assert_eq!(calls.load(Ordering::SeqCst), restarts as u32 + 1);
            assert!(matches!(err, WorkerError::Exhausted { .. }));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_scenario_three_workers_single_shot() {
        let sup = Supervisor::new(Config::new(3, 0), Vec::new());
        let (task, calls) = scripted(|_| Ok(()));

        assert!(sup.run(task).await.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scenario_flaky_single_worker_recovers() {
        let (sup, rec) = recorded(Config::new(1, 2));
        let (task, calls) = scripted(|n| if n < 3 { Err(fail(n)) } else { Ok(()) });

        assert!(sup.run(task).await.is_ok());

        let events = rec.events();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(count(&events, EventKind::BackoffScheduled), 2);
        assert_eq!(count(&events, EventKind::WorkerSucceeded), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scenario_two_workers_exhaust_independently() {
        let (sup, rec) = recorded(Config::new(2, 1));
        let (task, calls) = scripted(|n| Err(fail(n)));

        let err = sup.run(task).await.unwrap_err();

        let events = rec.events();
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        let starts = per_slot(&events, EventKind::AttemptStarting);
        assert_eq!(starts.get(&0), Some(&2));
        assert_eq!(starts.get(&1), Some(&2));
        assert_eq!(count(&events, EventKind::WorkerExhausted), 2);
        assert_eq!(err.attempts(), 2);
        assert_eq!(count(&events, EventKind::CancellationRequested), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_worker_cancels_sibling_in_backoff() {
        // Call 1 is slow and fails mid-run of the other slot; the other slot
        // fails instantly and exhausts its 4 attempts at t=3s while the slow
        // slot is waiting out its backoff (t=2.5s..3.5s).
        let (sup, rec) = recorded(Config::new(2, 3));
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let task: TaskRef = TaskFn::arc("race", move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n == 1 {
                    time::sleep(Duration::from_millis(2500)).await;
                }
                Err(fail(n))
            }
        });

        let started = time::Instant::now();
        let err = sup.run(task).await.unwrap_err();
        let elapsed = started.elapsed();

        let events = rec.events();
        let starts = per_slot(&events, EventKind::AttemptStarting);
        let mut counts: Vec<usize> = starts.values().copied().collect();
        counts.sort_unstable();
        assert_eq!(counts, vec![1, 4]);
        assert_eq!(count(&events, EventKind::WorkerExhausted), 1);
        assert_eq!(count(&events, EventKind::WorkerCancelled), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert!(elapsed < Duration::from_millis(3500));
        assert!(err.attempts() == 4 || err.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_is_requested_by_the_slot_that_cancels() {
        // Same timeline as above: the fast slot exhausts while the slow one
        // waits, so the fast slot is the one that cancels the token.
        let (sup, rec) = recorded(Config::new(2, 3));
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let task: TaskRef = TaskFn::arc("race", move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n == 1 {
                    time::sleep(Duration::from_millis(2500)).await;
                }
                Err(fail(n))
            }
        });

        let _ = sup.run(task).await.unwrap_err();

        let events = rec.events();
        assert_eq!(count(&events, EventKind::CancellationRequested), 1);
        let requested = &events[position(&events, EventKind::CancellationRequested)];
        let exhausted = &events[position(&events, EventKind::WorkerExhausted)];
        assert_eq!(requested.slot, exhausted.slot);
        let last = exhausted.reason.as_deref().unwrap();
        assert!(requested.reason.as_deref().unwrap().ends_with(last));
        assert!(
            position(&events, EventKind::CancellationRequested)
                < position(&events, EventKind::WorkerCancelled)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_racing_failures_report_one_of_their_errors() {
        let (sup, rec) = recorded(Config::new(8, 0));
        let (task, _calls) = scripted(|n| Err(fail(n)));

        let err = sup.run(task).await.unwrap_err();

        let events = rec.events();
        assert_eq!(count(&events, EventKind::WorkerExhausted), 8);
        assert_eq!(count(&events, EventKind::CancellationRequested), 1);
        let reasons: Vec<String> = events
            .iter()
            .filter(|e| e.kind == EventKind::WorkerExhausted)
            .filter_map(|e| e.reason.as_deref().map(str::to_owned))
            .collect();
        assert!(reasons.contains(&err.last_error().to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_failing_slot_fails_the_run() {
        // Slot that receives call 2 never succeeds; the others succeed at once.
        let sup = Supervisor::new(Config::new(3, 1), Vec::new());
        let (task, calls) = scripted(|n| if n == 2 || n > 3 { Err(fail(n)) } else { Ok(()) });

        let err = sup.run(task).await.unwrap_err();
        assert!(matches!(err, WorkerError::Exhausted { attempts: 2, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_concurrent_runs_deliver_only_their_own_events() {
        let (sup, rec) = recorded(Config::new(2, 0));
        let (task, calls) = scripted(|_| Ok(()));

        let (a, b) = tokio::join!(sup.run(Arc::clone(&task)), sup.run(Arc::clone(&task)));

        assert!(a.is_ok());
        assert!(b.is_ok());
        let events = rec.events();
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(count(&events, EventKind::AttemptStarting), 4);
        assert_eq!(count(&events, EventKind::WorkerSucceeded), 4);
        assert_eq!(count(&events, EventKind::RunFinished), 2);
    }

    #[tokio::test]
    async fn test_sequential_runs_reuse_the_supervisor() {
        let (sup, rec) = recorded(Config::new(2, 0));
        let (task, _calls) = scripted(|n| if n <= 2 { Ok(()) } else { Err(fail(n)) });

        assert!(sup.run(Arc::clone(&task)).await.is_ok());
        assert!(sup.run(task).await.is_err());

        let events = rec.events();
        assert_eq!(count(&events, EventKind::RunFinished), 2);
        assert_eq!(count(&events, EventKind::CancellationRequested), 1);
    }

    #[tokio::test]
    async fn test_empty_command_spawns_nothing() {
        let (sup, rec) = recorded(Config::new(4, 2));

        let err = sup.run_command(Vec::<String>::new()).await.unwrap_err();

        assert!(matches!(err, RunError::EmptyCommand));
        assert!(rec.events().is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_command_with_real_children() {
        let (sup, rec) = recorded(Config::new(3, 0));
        assert!(sup.run_command(["true"]).await.is_ok());
        assert_eq!(count(&rec.events(), EventKind::AttemptStarting), 3);

        let sup = Supervisor::new(Config::new(2, 0), Vec::new());
        let err = sup.run_command(["sh", "-c", "exit 7"]).await.unwrap_err();
        match err {
            RunError::Worker(WorkerError::Exhausted { last, .. }) => {
                assert!(matches!(last, AttemptError::ExitStatus { code: 7, .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_missing_program_fails_every_attempt() {
        let (sup, rec) = recorded(Config::new(1, 1).with_backoff(Duration::from_millis(10)));

        let err = sup
            .run_command(["unleash-test-no-such-program-4f1c"])
            .await
            .unwrap_err();

        assert_eq!(err.as_label(), "worker_exhausted");
        assert_eq!(count(&rec.events(), EventKind::AttemptFailed), 2);
    }

    #[tokio::test]
    async fn test_subscribers_are_drained_before_run_returns() {
        let (sup, rec) = recorded(Config::new(2, 0));
        let (task, _calls) = scripted(|_| Ok(()));

        assert!(sup.run(task).await.is_ok());

        let events = rec.events();
        assert_eq!(events.last().map(|e| e.kind), Some(EventKind::RunFinished));
        assert_eq!(count(&events, EventKind::WorkerSucceeded), 2);
    }
}
