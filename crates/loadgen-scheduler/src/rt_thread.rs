//! Running an entry point under a requested scheduling class.

use crate::error::{RTError, RTResult};
use crate::rt_setup::RTSetup;
use std::any::Any;
use std::thread;
use tracing::{error, info, warn};

#[cfg(target_os = "linux")]
use crate::linux::apply_rt_setup;

#[cfg(not(target_os = "linux"))]
use crate::fallback::apply_rt_setup;

/// Run `entry` with the scheduling described by `setup` and return its result.
///
/// When `setup` requests no RT features the entry point runs on the calling
/// thread. Otherwise a named thread is spawned, the setup is applied to it,
/// and the call blocks until the thread finishes. A refused setup is logged
/// and the entry point still runs with whatever the OS granted.
///
/// # Errors
///
/// - `RTError::InvalidConfig` if `setup` fails validation
/// - `RTError::ThreadSpawn` if the thread cannot be created
/// - `RTError::ThreadPanicked` if `entry` panics on the spawned thread
pub fn run_with_class<F, T>(name: &str, setup: &RTSetup, entry: F) -> RTResult<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    setup.validate()?;

    if !setup.has_rt_features() {
        return Ok(entry());
    }

    let thread_setup = setup.clone();
    let handle = thread::Builder::new()
        .name(name.to_owned())
        .spawn(move || {
            match apply_rt_setup(&thread_setup) {
                Ok(()) => info!(class = ?thread_setup.class, "real-time setup applied"),
                Err(e) => warn!(error = %e, "continuing without full real-time setup"),
            }
            entry()
        })
        .map_err(|e| {
            error!(error = %e, "failed to spawn loop thread");
            RTError::ThreadSpawn
        })?;

    handle.join().map_err(|payload| {
        error!(panic = panic_message(payload.as_ref()), "loop thread panicked");
        RTError::ThreadPanicked
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "<non-string panic payload>"
    }
}
