//! Interrupt deferral around store writes.
//!
//! While a `CriticalSection` is alive, SIGINT, SIGTERM and SIGHUP are
//! recorded instead of terminating the process.  When the outermost
//! section ends, a recorded signal gets its default action (normally
//! termination), so a Ctrl-C during a save lands after the rename rather
//! than between the temp-file write and the rename.
//!
//! Outside a critical section the signals behave exactly as if no handler
//! were installed.  On non-Unix targets the guard is a no-op; the
//! temp-file + rename strategy still keeps the file consistent there.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

/// Process-wide deferral state, installed on first use.
struct Deferral {
    /// True while no section is active: signals take their default action.
    allow_default: Arc<AtomicBool>,
    /// Number of the last signal seen, 0 when none is pending.
    pending: Arc<AtomicUsize>,
    depth: AtomicUsize,
}

static DEFERRAL: OnceLock<Option<Deferral>> = OnceLock::new();

#[cfg(unix)]
fn install() -> Option<Deferral> {
    use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};

    let allow_default = Arc::new(AtomicBool::new(true));
    let pending = Arc::new(AtomicUsize::new(0));

    for signal in [SIGINT, SIGTERM, SIGHUP] {
        // The default-action handler goes first: if recording fails after
        // it, the signal still terminates the process as usual.
        let installed =
            signal_hook::flag::register_conditional_default(signal, Arc::clone(&allow_default))
                .and_then(|_| {
                    signal_hook::flag::register_usize(
                        signal,
                        Arc::clone(&pending),
                        signal as usize,
                    )
                });

        if let Err(e) = installed {
            tracing::warn!(signal, error = %e, "cannot install interrupt deferral");
            return None;
        }
    }

    Some(Deferral {
        allow_default,
        pending,
        depth: AtomicUsize::new(0),
    })
}

#[cfg(not(unix))]
fn install() -> Option<Deferral> {
    None
}

fn deferral() -> Option<&'static Deferral> {
    DEFERRAL.get_or_init(install).as_ref()
}

/// RAII guard: interrupts are deferred until every guard is dropped.
#[must_use = "interrupts are only deferred while the guard is alive"]
pub struct CriticalSection {
    _private: (),
}

impl CriticalSection {
    /// Start deferring interrupts.  Sections nest.
    pub fn enter() -> Self {
        if let Some(d) = deferral() {
            if d.depth.fetch_add(1, Ordering::SeqCst) == 0 {
                d.allow_default.store(false, Ordering::SeqCst);
            }
        }
        Self { _private: () }
    }

    /// Whether any critical section is currently active.
    pub fn is_active() -> bool {
        deferral().is_some_and(|d| d.depth.load(Ordering::SeqCst) > 0)
    }
}

impl Drop for CriticalSection {
    fn drop(&mut self) {
        let Some(d) = deferral() else {
            return;
        };
        if d.depth.fetch_sub(1, Ordering::SeqCst) != 1 {
            return;
        }

        d.allow_default.store(true, Ordering::SeqCst);
        let signal = d.pending.swap(0, Ordering::SeqCst);
        if signal != 0 {
            redeliver(signal);
        }
    }
}

#[cfg(unix)]
fn redeliver(signal: usize) {
    tracing::warn!(signal, "delivering interrupt deferred during a store write");
    if let Ok(signal) = i32::try_from(signal) {
        if let Err(e) = signal_hook::low_level::emulate_default_handler(signal) {
            tracing::error!(signal, error = %e, "failed to deliver deferred interrupt");
        }
    }
}

#[cfg(not(unix))]
fn redeliver(_signal: usize) {}
