//! The process-wide diagnostics sink.
//!
//! The codec meets plenty of recoverable weirdness - unknown tags, vendor
//! type mismatches, maker notes it can't parse - that it tolerates but
//! still wants surfaced. Those reports go through this sink.
//!
//! The sink is ambient configuration, not a per-call parameter: one level
//! and one replaceable handler for the whole process, readable and
//! writable at any time. The default handler writes to standard error.
//! Hosts that mutate the configuration from several threads are expected
//! to serialize those writes themselves.
//!
//! (Internal parse *tracing* goes through the `log` facade instead; the
//! sink carries only the messages a library user should see.)

use core::sync::atomic::{AtomicU8, Ordering};

use parking_lot::RwLock;

/// Defined sink levels.
///
/// To suppress all messages, set the level to [`Level::Mute`].
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub enum Level {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
    Mute = 4,
}

impl core::fmt::Display for Level {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Mute => "mute",
        })
    }
}

/// A sink handler receives the message's level and text.
pub type Handler = fn(Level, &str);

// only messages with level >= LEVEL reach the handler
static LEVEL: AtomicU8 = AtomicU8::new(Level::Warn as u8);
static HANDLER: RwLock<Handler> = RwLock::new(default_handler);

/// Returns the current sink level.
pub fn level() -> Level {
    match LEVEL.load(Ordering::Relaxed) {
        0 => Level::Debug,
        1 => Level::Info,
        2 => Level::Warn,
        3 => Level::Error,
        _ => Level::Mute,
    }
}

/// Sets the sink level. Only messages at or above `level` are handled.
///
/// The default level is [`Level::Warn`].
pub fn set_level(level: Level) {
    LEVEL.store(level as u8, Ordering::Relaxed);
}

/// Returns the current handler.
pub fn handler() -> Handler {
    *HANDLER.read()
}

/// Replaces the handler.
pub fn set_handler(handler: Handler) {
    *HANDLER.write() = handler;
}

/// The default handler. Sends the message to standard error.
pub fn default_handler(level: Level, message: &str) {
    eprintln!("ifdtree: {level}: {message}");
}

/// Whether a message at `level` would currently be handled.
///
/// Call before building an expensive message.
pub fn enabled(at: Level) -> bool {
    at != Level::Mute && at >= level()
}

/// Hands a message to the handler, if the level allows it.
pub fn emit(at: Level, message: &str) {
    if enabled(at) {
        handler()(at, message);
    }
}

/// Reports a tolerated anomaly without paying for formatting when the
/// sink wouldn't show it.
macro_rules! diag_warn {
    ($($arg:tt)*) => {
        if $crate::diag::enabled($crate::diag::Level::Warn) {
            $crate::diag::emit($crate::diag::Level::Warn, &format!($($arg)*));
        }
    };
}

macro_rules! diag_debug {
    ($($arg:tt)*) => {
        if $crate::diag::enabled($crate::diag::Level::Debug) {
            $crate::diag::emit($crate::diag::Level::Debug, &format!($($arg)*));
        }
    };
}

pub(crate) use {diag_debug, diag_warn};

#[cfg(test)]
mod tests {
    use super::{Level, default_handler, emit, enabled, handler, level, set_handler, set_level};

    use std::sync::Mutex;

    // the sink is process-global, so these tests share one capture buffer
    // and run under one lock
    static CAPTURED: Mutex<Vec<(Level, String)>> = Mutex::new(Vec::new());
    static SINK_TEST_LOCK: Mutex<()> = Mutex::new(());

    fn capture(level: Level, message: &str) {
        CAPTURED.lock().unwrap().push((level, message.to_owned()));
    }

    fn reset() {
        set_level(Level::Warn);
        set_handler(default_handler);
        CAPTURED.lock().unwrap().clear();
    }

    // other tests in this binary may emit through the sink concurrently,
    // so assertions check for our own messages rather than exact contents

    #[test]
    fn level_gates_messages() {
        let _guard = SINK_TEST_LOCK.lock().unwrap();
        reset();
        set_handler(capture);

        emit(Level::Info, "too quiet to show");
        emit(Level::Warn, "loud enough");

        let captured = CAPTURED.lock().unwrap().clone();
        assert!(captured.contains(&(Level::Warn, "loud enough".to_owned())));
        assert!(!captured.iter().any(|(_, m)| m == "too quiet to show"));

        reset();
    }

    #[test]
    fn mute_suppresses_everything() {
        let _guard = SINK_TEST_LOCK.lock().unwrap();
        reset();
        set_handler(capture);
        set_level(Level::Mute);

        emit(Level::Error, "even errors");
        assert!(!CAPTURED.lock().unwrap().iter().any(|(_, m)| m == "even errors"));
        assert!(!enabled(Level::Error));

        reset();
    }

    #[test]
    fn configuration_is_readable_back() {
        let _guard = SINK_TEST_LOCK.lock().unwrap();
        reset();

        set_level(Level::Debug);
        assert_eq!(level(), Level::Debug);

        set_handler(capture);
        assert_eq!(handler() as usize, capture as usize);

        reset();
    }
}
