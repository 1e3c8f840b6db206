//! Logging from programs.
//!
//! On the SVM target a log line is a single trap into the host, which owns
//! formatting, rate limits and sinks; everywhere else lines go to stdout so
//! tests and tools see them.

/// Print a message to the log.
#[macro_export]
macro_rules! msg {
    ($msg:expr) => {
        $crate::log::sol_log($msg)
    };
    ($($arg:tt)*) => ($crate::log::sol_log(&format!($($arg)*)));
}

/// Print a string to the log.
pub fn sol_log(message: &str) {
    #[cfg(target_os = "solana")]
    unsafe {
        crate::syscalls::sol_log_(message.as_ptr(), message.len() as u64);
    }

    #[cfg(not(target_os = "solana"))]
    println!("{message}");
}
