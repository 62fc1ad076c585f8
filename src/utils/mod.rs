//! Utilities: leveled logging on stderr.
//!
//! A drop-in condor_chirp replacement cannot grow verbosity flags, so
//! the level comes from the `RCHIRP_DEBUG` environment variable
//! (unset -> errors only, set -> debug, `trace` -> trace). Stdout is
//! reserved for command output and never receives log lines.

/// Logging helpers.
pub mod logging {
    use std::sync::OnceLock;

    #[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
    pub enum LogLevel {
        Error = 0,
        Debug = 1,
        Trace = 2,
    }

    impl LogLevel {
        pub fn as_str(&self) -> &'static str {
            match self {
                LogLevel::Error => "ERROR",
                LogLevel::Debug => "DEBUG",
                LogLevel::Trace => "TRACE",
            }
        }
    }

    static GLOBAL_LEVEL: OnceLock<LogLevel> = OnceLock::new();

    pub fn current_log_level() -> LogLevel {
        *GLOBAL_LEVEL.get_or_init(|| derive_level(std::env::var("RCHIRP_DEBUG").ok().as_deref()))
    }

    pub fn derive_level(env_value: Option<&str>) -> LogLevel {
        match env_value.map(str::trim) {
            None | Some("") | Some("0") => LogLevel::Error,
            Some(v) if v.eq_ignore_ascii_case("trace") => LogLevel::Trace,
            Some(_) => LogLevel::Debug,
        }
    }

    fn should_emit(level: LogLevel) -> bool {
        level <= current_log_level()
    }

    pub fn log(level: LogLevel, msg: impl AsRef<str>) {
        if should_emit(level) {
            eprintln!("[{}] {}", level.as_str(), msg.as_ref());
        }
    }

    pub fn error(msg: impl AsRef<str>) {
        log(LogLevel::Error, msg);
    }
    pub fn debug(msg: impl AsRef<str>) {
        log(LogLevel::Debug, msg);
    }
    pub fn trace(msg: impl AsRef<str>) {
        log(LogLevel::Trace, msg);
    }

}
