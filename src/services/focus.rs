use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use xcap::Window;

/// Minimum spacing between two focus-failure warnings
const WARN_INTERVAL: Duration = Duration::from_secs(30);

/// Answers whether the foreground window belongs to the game
pub trait FocusOracle: Send + Sync {
    fn is_foreground_process_matching(&self, hints: &[String]) -> bool;
}

type FocusLookup = dyn Fn(&[String]) -> Result<bool, String> + Send + Sync;

/// Checks the focused window's app name and title through xcap.
///
/// Lookup runs on a helper thread bounded by `timeout`; any error or timeout reports focused.
/// At most one helper thread exists at a time. While a timed-out lookup is still stuck,
/// later calls report focused without starting another.
pub struct WindowFocusOracle {
    timeout: Duration,
    lookup: Arc<FocusLookup>,
    in_flight: Arc<AtomicBool>,
    last_warning: Mutex<Option<Instant>>,
}

impl WindowFocusOracle {
    pub fn new(timeout: Duration) -> Self {
        Self::with_lookup(timeout, focused_window_matches)
    }

    /// Oracle over a custom window lookup
    pub fn with_lookup<F>(timeout: Duration, lookup: F) -> Self
    where
        F: Fn(&[String]) -> Result<bool, String> + Send + Sync + 'static,
    {
        Self {
            timeout,
            lookup: Arc::new(lookup),
            in_flight: Arc::new(AtomicBool::new(false)),
            last_warning: Mutex::new(None),
        }
    }

    fn warn_limited(&self, message: &str) {
        let mut last = self.last_warning.lock();
        if last.is_some_and(|at| at.elapsed() < WARN_INTERVAL) {
            return;
        }
        *last = Some(Instant::now());
        warn!("Focus detection failed, assuming focused: {}", message);
    }
}

impl FocusOracle for WindowFocusOracle {
    fn is_foreground_process_matching(&self, hints: &[String]) -> bool {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            self.warn_limited("previous lookup still pending");
            return true;
        }

        let (tx, rx) = mpsc::channel();
        let hints = hints.to_vec();
        let lookup = Arc::clone(&self.lookup);
        let in_flight = Arc::clone(&self.in_flight);

        thread::spawn(move || {
            let result = lookup(&hints);
            in_flight.store(false, Ordering::SeqCst);
            let _ = tx.send(result);
        });

        match rx.recv_timeout(self.timeout) {
            Ok(Ok(matching)) => matching,
            Ok(Err(e)) => {
                self.warn_limited(&e);
                true
            }
            Err(_) => {
                self.warn_limited("timed out");
                true
            }
        }
    }
}

fn focused_window_matches(hints: &[String]) -> Result<bool, String> {
    let windows = Window::all().map_err(|e| format!("Failed to list windows: {}", e))?;

    for window in windows {
        if !window.is_focused().unwrap_or(false) {
            continue;
        }
        let app_name = window.app_name().unwrap_or_default();
        let title = window.title().unwrap_or_default();
        debug!("Focused window: {} ({})", app_name, title);
        return Ok(matches_hints(&app_name, &title, hints));
    }

    Err("no focused window found".to_string())
}

/// Case-insensitive substring match of any hint against the app name or title
pub fn matches_hints(app_name: &str, title: &str, hints: &[String]) -> bool {
    let app_name = app_name.to_lowercase();
    let title = title.to_lowercase();
    hints.iter().map(|h| h.to_lowercase()).any(|hint| {
        !hint.is_empty() && (app_name.contains(&hint) || title.contains(&hint))
    })
}

/// Oracle for runs where focus gating is disabled
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysFocused;

impl FocusOracle for AlwaysFocused {
    fn is_foreground_process_matching(&self, _hints: &[String]) -> bool {
        true
    }
}
