use crate::error::PotionError;
use crate::services::clock::Clock;
use crate::services::session::{LoopState, PotionSession, SessionSnapshot};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info};

/// Drives a [`PotionSession`] on the tokio runtime.
///
/// Exactly one loop runs per tracker. Readers get the snapshot published after each tick.
pub struct PotionTracker {
    session: Arc<Mutex<PotionSession>>,
    snapshot: Arc<RwLock<SessionSnapshot>>,
    stop_signal: Arc<AtomicBool>,
    /// Wakes the loop out of its inter-tick sleep
    wake: Arc<Notify>,
    running: Arc<AtomicBool>,
    clock: Arc<dyn Clock>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl PotionTracker {
    pub fn new(session: PotionSession, clock: Arc<dyn Clock>) -> Self {
        let snapshot = session.snapshot(LoopState::Stopped, clock.now());
        Self {
            session: Arc::new(Mutex::new(session)),
            snapshot: Arc::new(RwLock::new(snapshot)),
            stop_signal: Arc::new(AtomicBool::new(false)),
            wake: Arc::new(Notify::new()),
            running: Arc::new(AtomicBool::new(false)),
            clock,
            handle: Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.read().clone()
    }

    /// Scan every slot, then spawn the sampling loop
    pub async fn start(&self) -> Result<(), PotionError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(PotionError::AlreadyRunning);
        }
        self.stop_signal.store(false, Ordering::SeqCst);

        let session = Arc::clone(&self.session);
        let clock = Arc::clone(&self.clock);
        let initial = tokio::task::spawn_blocking(move || {
            let now = clock.now();
            let mut session = session.lock();
            session.start(now);
            let timing = session.config().timing.clone();
            (session.snapshot(LoopState::Running, now), timing)
        })
        .await;

        let (snapshot, timing) = match initial {
            Ok(result) => result,
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                return Err(PotionError::Task(e.to_string()));
            }
        };
        *self.snapshot.write() = snapshot;

        let session = Arc::clone(&self.session);
        let published = Arc::clone(&self.snapshot);
        let stop_signal = Arc::clone(&self.stop_signal);
        let wake = Arc::clone(&self.wake);
        let running = Arc::clone(&self.running);
        let clock = Arc::clone(&self.clock);
        let tick_interval = timing.tick_interval();
        let error_backoff = timing.error_backoff();

        let handle = tokio::spawn(async move {
            info!("Sampling loop started ({}ms tick)", tick_interval.as_millis());

            while !stop_signal.load(Ordering::SeqCst) {
                let session = Arc::clone(&session);
                let clock = Arc::clone(&clock);

                let result = tokio::task::spawn_blocking(move || {
                    let now = clock.now();
                    let mut session = session.lock();
                    let outcome = session.tick(now);
                    let loop_state = match &outcome {
                        Ok(o) if o.gated => LoopState::FocusGated,
                        _ => LoopState::Running,
                    };
                    (outcome, session.snapshot(loop_state, now))
                })
                .await;

                let delay = match result {
                    Ok((Ok(outcome), snapshot)) => {
                        if !outcome.consumed.is_empty() {
                            debug!("{}", snapshot.status_line());
                        }
                        *published.write() = snapshot;
                        tick_interval
                    }
                    Ok((Err(e), snapshot)) => {
                        error!("Tick failed: {}", e);
                        *published.write() = snapshot;
                        error_backoff
                    }
                    Err(e) => {
                        error!("Tick task panicked: {}", e);
                        error_backoff
                    }
                };

                tokio::select! {
                    _ = sleep(delay) => {}
                    _ = wake.notified() => {}
                }
            }

            published.write().loop_state = LoopState::Stopped;
            running.store(false, Ordering::SeqCst);
            info!("Sampling loop stopped");
        });

        *self.handle.lock() = Some(handle);
        Ok(())
    }

    /// Signal the loop to stop and wait for it to finish its current tick
    pub async fn stop(&self) {
        self.stop_signal.store(true, Ordering::SeqCst);
        self.wake.notify_one();
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("Sampling loop ended abnormally: {}", e);
            }
        }
        self.running.store(false, Ordering::SeqCst);
    }

    /// Re-read templates; the next tick rescans
    pub async fn reload_templates(&self) -> Result<(), PotionError> {
        let session = Arc::clone(&self.session);
        tokio::task::spawn_blocking(move || session.lock().reload_templates())
            .await
            .map_err(|e| PotionError::Task(e.to_string()))
    }
}
