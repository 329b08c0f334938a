use std::io::ErrorKind;
use std::path::Path;
use std::thread;
use std::time::Duration;

/// Rename with bounded retries; target files may be briefly held open by
/// readers of the cache. Only `PermissionDenied` is retried, every other error
/// is returned at once.
pub fn robust_rename<P: AsRef<Path>, Q: AsRef<Path>>(from: P, to: Q) -> std::io::Result<()> {
    let mut attempt = 0u32;
    let max_attempts = 8u32;
    let mut backoff = Duration::from_millis(50);

    loop {
        match std::fs::rename(&from, &to) {
            Ok(()) => return Ok(()),
            Err(e) => {
                attempt += 1;
                if e.kind() != ErrorKind::PermissionDenied || attempt >= max_attempts {
                    return Err(e);
                }
                thread::sleep(backoff);
                backoff = std::cmp::min(backoff * 2, Duration::from_millis(2000));
            }
        }
    }
}
