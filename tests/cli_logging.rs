use std::process::ExitCode;

use reefpaint::cli::{CliArgs, run_logged};

#[test]
fn failed_headless_run_is_logged_without_verbose() {
    let dir = std::env::temp_dir().join(format!("reefpaint-test-log-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    let script = dir.join("bad.txt");
    std::fs::write(&script, "tool brush\npaint everything\n").unwrap();
    let log = dir.join("reefpaint.log");

    let args = CliArgs {
        script: Some(script),
        output: Some(dir.join("out.png")),
        ..CliArgs::default()
    };
    assert!(!args.verbose);
    assert_eq!(run_logged(args, &log), ExitCode::FAILURE);

    let text = std::fs::read_to_string(&log).unwrap();
    assert!(text.contains("[ERROR] CLI run failed"), "{text}");
    assert!(text.contains("Line 2"), "{text}");

    let _ = std::fs::remove_dir_all(&dir);
}
