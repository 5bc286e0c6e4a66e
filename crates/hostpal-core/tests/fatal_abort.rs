//! The default fatal handler terminates the whole process
//!
//! The test re-runs this test binary with `HOSTPAL_FATAL_CHILD` set; the child
//! hits a formatting error with no handler installed and must die with the
//! template in its stderr.

use std::env;
use std::process::Command;

use hostpal_core::snprint;

const CHILD_ENV: &str = "HOSTPAL_FATAL_CHILD";
const BAD_TEMPLATE: &str = "broken %y template";

#[test]
fn test_format_error_terminates_process()
{
    if env::var_os(CHILD_ENV).is_some() {
        let mut buffer = [0u8; 32];
        snprint!(&mut buffer, BAD_TEMPLATE, 1);
        // Unreachable when the process aborts; exit cleanly so the parent notices.
        return;
    }

    let output = Command::new(env::current_exe().unwrap())
        .args(["--exact", "test_format_error_terminates_process", "--nocapture", "--test-threads=1"])
        .env(CHILD_ENV, "1")
        .output()
        .unwrap();

    assert!(!output.status.success(), "child exited successfully");
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        assert_eq!(output.status.signal(), Some(libc::SIGABRT));
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains(BAD_TEMPLATE), "stderr was: {stderr}");
}
