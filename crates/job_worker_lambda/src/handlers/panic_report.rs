use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

static HOOK: Once = Once::new();

thread_local! {
    static CAPTURING: Cell<bool> = const { Cell::new(false) };
    static CAPTURED: RefCell<Option<(Option<String>, Backtrace)>> = const { RefCell::new(None) };
}

/// A caught panic with the location and stack it was raised from.
#[derive(Debug)]
pub struct PanicReport {
    pub message: String,
    pub location: Option<String>,
    pub backtrace: Option<Backtrace>,
}

impl fmt::Display for PanicReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Workload panicked at {}: {}",
            self.location.as_deref().unwrap_or("<unknown location>"),
            self.message
        )?;
        if let Some(backtrace) = &self.backtrace {
            write!(f, "\nstack backtrace:\n{backtrace}")?;
        }
        Ok(())
    }
}

/// Runs `f` and turns a panic into a [`PanicReport`].
///
/// While `f` runs, the default panic output on this thread is replaced by
/// capturing the location and a backtrace, so the caller can log them under
/// its own correlation id.
pub fn catch_panic<T>(f: impl FnOnce() -> T) -> Result<T, PanicReport> {
    install_hook();

    let was_capturing = CAPTURING.with(|flag| flag.replace(true));
    let result = panic::catch_unwind(AssertUnwindSafe(f));
    CAPTURING.with(|flag| flag.set(was_capturing));

    result.map_err(|payload| {
        let (location, backtrace) = CAPTURED.with(|slot| slot.borrow_mut().take()).unzip();
        PanicReport {
            message: panic_message(payload.as_ref()),
            location: location.flatten(),
            backtrace,
        }
    })
}

fn install_hook() {
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if CAPTURING.with(Cell::get) {
                let location = info.location().map(ToString::to_string);
                CAPTURED.with(|slot| {
                    *slot.borrow_mut() = Some((location, Backtrace::force_capture()));
                });
            } else {
                previous(info);
            }
        }));
    });
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
