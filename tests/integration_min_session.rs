// Drives the compiled binary through a PTY: type the prompt, submit, quit.
//
// Requires a TTY (expectrl allocates one). Unix-only and ignored by default.
// Run manually via: `cargo test --test integration_min_session -- --ignored`.

#![cfg(unix)]

use std::time::Duration;

use expectrl::{spawn, Eof};
use tempfile::tempdir;

#[test]
#[ignore]
fn minimal_session_completes_and_exits() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let db = dir.path().join("records.db");
    let bin = assert_cmd::cargo::cargo_bin("typing-contest");
    let cmd = format!("{} -p hi --records-db {}", bin.display(), db.display());

    let mut p = spawn(cmd)?;
    std::thread::sleep(Duration::from_millis(200));

    p.send("hi")?;
    p.send("\r")?;
    std::thread::sleep(Duration::from_millis(200));

    p.send("\x1b")?; // ESC
    p.expect(Eof)?;

    let out = assert_cmd::Command::new(&bin)
        .arg("--list")
        .arg("--records-db")
        .arg(&db)
        .output()?;
    assert!(String::from_utf8_lossy(&out.stdout).contains(" hi"));
    Ok(())
}
