use std::{
    io::Write as _,
    process::{Command, Output, Stdio},
};

#[test]
fn reports_fleet_summary_for_a_layout_on_stdin() {
    let output = run_cli(&[], "A1 . B1\n");
    assert!(output.status.success(), "run failed: {output:?}");

    let stdout = String::from_utf8(output.stdout).expect("utf-8 output");
    assert_eq!(
        stdout,
        "Bot1: 2 commands (forward, forward)\n\
         Average Commands: 2.00 commands.\n\
         Maximum Commands: 2 commands.\n"
    );
}

#[test]
fn traces_each_drive_command_before_the_summary() {
    let output = run_cli(&["--trace"], "A1 . B1\n");
    assert!(output.status.success(), "run failed: {output:?}");

    let stdout = String::from_utf8(output.stdout).expect("utf-8 output");
    assert_eq!(
        stdout,
        "[tick 0] Bot1 forward -> (0, 1)\n\
         [tick 1] Bot1 forward -> (0, 2)\n\
         [tick 1] Bot1 arrived\n\
         Bot1: 2 commands (forward, forward)\n\
         Average Commands: 2.00 commands.\n\
         Maximum Commands: 2 commands.\n"
    );
}

#[test]
fn reports_impossible_case_and_exits_nonzero() {
    let output = run_cli(&["--max-ticks", "3"], "A1 X B1\n");
    assert!(!output.status.success());

    let stdout = String::from_utf8(output.stdout).expect("utf-8 output");
    assert_eq!(
        stdout,
        "Impossible Case Detected: No solution found after 3 commands.\n"
    );
}

#[test]
fn exported_scenarios_replay_to_the_same_report() {
    let layout = "A1 . B1\nB2 . A2\n";
    let direct = run_cli(&[], layout);
    assert!(direct.status.success(), "run failed: {direct:?}");

    let exported = run_cli(&["--export-scenario"], layout);
    assert!(exported.status.success(), "export failed: {exported:?}");
    let scenario = String::from_utf8(exported.stdout).expect("utf-8 scenario");
    let scenario = scenario.trim();
    assert!(scenario.starts_with("fleet:v1:3x2:"), "scenario: {scenario}");

    let replayed = run_cli(&["--scenario", scenario], "");
    assert!(replayed.status.success(), "replay failed: {replayed:?}");
    assert_eq!(replayed.stdout, direct.stdout);
}

fn run_cli(args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO"))
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .args(["run", "--quiet", "--bin", "fleet-grid", "--"])
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to launch the fleet-grid binary");

    child
        .stdin
        .as_mut()
        .expect("stdin handle")
        .write_all(stdin.as_bytes())
        .expect("failed to write the layout to stdin");
    child
        .wait_with_output()
        .expect("failed to collect CLI output")
}
