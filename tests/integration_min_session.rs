// Drives the compiled binary through a pseudo terminal so the real event loop
// and crossterm input handling are exercised end to end.
//
// Notes:
// - Requires a TTY; expectrl allocates one.
// - Unix-only and ignored by default.
// - Run manually via: `cargo test --test integration_min_session -- --ignored`.

#![cfg(unix)]

use std::time::Duration;

use expectrl::{spawn, Eof};

#[test]
#[ignore]
fn minimal_text_completes_and_exits() -> Result<(), Box<dyn std::error::Error>> {
    let bin = assert_cmd::cargo::cargo_bin("pagetype");
    let cmd = format!("{} -t hi", bin.display());

    let mut p = spawn(cmd)?;

    // let the alternate screen come up
    std::thread::sleep(Duration::from_millis(200));

    // a one-line text is a single page, so this finishes the game
    p.send("hi")?;
    std::thread::sleep(Duration::from_millis(200));

    // ESC quits from the results view
    p.send("\x1b")?;

    p.expect(Eof)?;
    Ok(())
}
