// ~/RandomBackground/src/logging.rs

use std::{
    fs::OpenOptions,
    io::Write,
    path::Path,
    sync::{
        atomic::{AtomicBool, AtomicU8, Ordering},
        mpsc::{self, Sender},
        OnceLock,
    },
    thread,
};

/* =========================
   GLOBAL STATE
   ========================= */

static DEBUG: AtomicBool = AtomicBool::new(false);
static LEVEL: AtomicU8 = AtomicU8::new(Level::Warn as u8);
static LOG_TX: OnceLock<Sender<String>> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
}

impl Level {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "error" => Some(Self::Error),
            "warn" | "warning" => Some(Self::Warn),
            "info" => Some(Self::Info),
            "debug" | "trace" | "all" => Some(Self::Debug),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Warn => "WARN",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Error,
            1 => Self::Warn,
            2 => Self::Info,
            _ => Self::Debug,
        }
    }
}

/* =========================
   PUBLIC API
   ========================= */

/// Starts the writer thread appending to `path`. Returns false when logging
/// was already initialised or the file cannot be opened; the macros stay
/// silent in that case.
pub fn init(debug: bool, level: &str, path: &Path) -> bool {
    if LOG_TX.get().is_some() {
        return false;
    }

    set_debug(debug);
    set_level(level);

    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let mut file = match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Failed to open log file {}: {e}", path.display());
            return false;
        }
    };

    let (tx, rx) = mpsc::channel::<String>();
    if LOG_TX.set(tx).is_err() {
        return false;
    }

    thread::spawn(move || {
        while let Ok(line) = rx.recv() {
            let _ = writeln!(file, "{line}");
            let _ = file.flush();
        }
    });

    true
}

pub fn set_debug(debug: bool) {
    DEBUG.store(debug, Ordering::Relaxed);
}

/// Unknown level names leave the current level untouched.
pub fn set_level(level: &str) {
    if let Some(parsed) = Level::parse(level) {
        LEVEL.store(parsed as u8, Ordering::Relaxed);
    }
}

#[inline]
pub fn should_log(level: Level) -> bool {
    if DEBUG.load(Ordering::Relaxed) {
        return true;
    }
    level <= Level::from_u8(LEVEL.load(Ordering::Relaxed))
}

/* =========================
   INTERNAL
   ========================= */

#[inline]
pub fn enqueue(level: Level, msg: String) {
    if let Some(tx) = LOG_TX.get() {
        let ts = timestamp();
        let _ = tx.send(format!("{ts} [{}] {msg}", level.label()));
    }
}

fn timestamp() -> String {
    let now = chrono::Local::now();
    now.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

/* =========================
   MACROS
   ========================= */

#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {{
        if $crate::logging::should_log($crate::logging::Level::Debug) {
            $crate::logging::enqueue($crate::logging::Level::Debug, format!($($arg)*));
        }
    }};
}

#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {{
        if $crate::logging::should_log($crate::logging::Level::Info) {
            $crate::logging::enqueue($crate::logging::Level::Info, format!($($arg)*));
        }
    }};
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {{
        if $crate::logging::should_log($crate::logging::Level::Warn) {
            $crate::logging::enqueue($crate::logging::Level::Warn, format!($($arg)*));
        }
    }};
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {{
        $crate::logging::enqueue($crate::logging::Level::Error, format!($($arg)*));
    }};
}
