//! Platform-specific durable sync for snapshot files
//!
//! A snapshot is only useful if it survives power loss, and each platform has
//! a different strongest primitive for getting bytes onto persistent media.
//! This module maps to the strongest one available.

use std::fs::File;
use std::io;

/// Ensure file data is durably written to persistent storage before returning.
///
/// Platform mapping:
/// - Linux: fdatasync() — data without metadata, sufficient for snapshot files
/// - macOS/iOS: fcntl(F_FULLFSYNC) — plain fsync only reaches the volatile
///   disk cache on Apple platforms
/// - Windows: FlushFileBuffers()
/// - Other: file.sync_data() stdlib fallback
///
/// May block for extended periods under heavy I/O; callers must not hold
/// locks across this call.
pub fn sync_file(file: &File) -> io::Result<()> {
    #[cfg(target_os = "linux")]
    {
        use std::os::unix::io::AsRawFd;
        // SAFETY: fdatasync operates on the valid open fd owned by `file`.
        let rc = unsafe { libc::fdatasync(file.as_raw_fd()) };
        if rc == 0 { Ok(()) } else { Err(io::Error::last_os_error()) }
    }

    #[cfg(any(target_os = "macos", target_os = "ios"))]
    {
        use std::os::unix::io::AsRawFd;
        // SAFETY: fcntl(F_FULLFSYNC) operates on the valid open fd owned by `file`.
        let rc = unsafe { libc::fcntl(file.as_raw_fd(), libc::F_FULLFSYNC) };
        if rc == 0 { Ok(()) } else { Err(io::Error::last_os_error()) }
    }

    #[cfg(target_os = "windows")]
    {
        use std::os::windows::io::AsRawHandle;
        use winapi::um::fileapi::FlushFileBuffers;
        // SAFETY: FlushFileBuffers operates on the valid handle owned by `file`.
        let rc = unsafe { FlushFileBuffers(file.as_raw_handle() as *mut _) };
        if rc != 0 { Ok(()) } else { Err(io::Error::last_os_error()) }
    }

    #[cfg(not(any(
        target_os = "linux",
        target_os = "macos",
        target_os = "ios",
        target_os = "windows"
    )))]
    {
        file.sync_data()
    }
}
