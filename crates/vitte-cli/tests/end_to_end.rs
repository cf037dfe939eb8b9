//! End-to-end driver tests covering the eight literal scenarios (§8).
//!
//! Spawns the actual `vitte` binary via `CARGO_BIN_EXE_vitte` (Cargo wires
//! this up for free — no process-spawning crate needed) so stdout, stderr
//! and the exit code are all observed exactly as a user would see them.

use std::process::{Command, Output};

fn vitte(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_vitte"))
        .args(args)
        .output()
        .expect("failed to run vitte binary")
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

#[test]
fn scenario_1_integer_arithmetic_truncates() {
    let out = vitte(&["-code", "print (-1 + 2) - 4 * 3 / (-5 - 6 + 35);"]);
    assert!(out.status.success());
    assert_eq!(stdout(&out).trim(), "-2");
}

#[test]
fn scenario_1b_number_path_does_not_truncate() {
    let out = vitte(&["-code", "print (-1 + 2.0) - 4.0 * 3.0 / (-5.0 - 6.0 + 35.0);"]);
    assert!(out.status.success());
    assert_eq!(stdout(&out).trim(), "-1.5");
}

#[test]
fn scenario_2_globals() {
    let out = vitte(&["-code", "var a=1; var b=2; var c=a+b; print c;"]);
    assert!(out.status.success());
    assert_eq!(stdout(&out).trim(), "3");
}

#[test]
fn scenario_3_string_concat() {
    let out = vitte(&["-code", "print \"foo\" + \"bar\";"]);
    assert!(out.status.success());
    assert_eq!(stdout(&out).trim(), "foobar");
}

#[test]
fn scenario_4_scope_shadowing() {
    let out = vitte(&["-code", "var x=1; { var x=2; print x; } print x;"]);
    assert!(out.status.success());
    assert_eq!(stdout(&out), "2\n1\n");
}

#[test]
fn scenario_5_control_flow() {
    let out = vitte(&["-code", "var i=0; while (i<3) { print i; i = i+1; }"]);
    assert!(out.status.success());
    assert_eq!(stdout(&out), "0\n1\n2\n");
}

#[test]
fn scenario_6_round_trip_through_bytecode_file() {
    let dir = std::env::temp_dir();
    let path = dir.join("vitte_e2e_scenario6.vitbc");

    let compiled = vitte(&[
        "-code",
        "print 42;",
        "-compile",
        "-output",
        path.to_str().unwrap(),
    ]);
    assert!(compiled.status.success());

    let bytes = std::fs::read(&path).expect("bytecode file should exist");
    assert_eq!(&bytes[0..8], b"_CODE42_");

    let ran = vitte(&[path.to_str().unwrap()]);
    assert!(ran.status.success());
    assert_eq!(stdout(&ran).trim(), "42");

    let _ = std::fs::remove_file(&path);
}

#[test]
fn scenario_7_invalid_assignment_target_is_a_compile_error() {
    let out = vitte(&["-code", "var a; var b; a*b = c+d;"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("[line 1]"));
}

#[test]
fn scenario_8_undefined_global_is_a_runtime_error() {
    let out = vitte(&["-code", "print nope;"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("Undefined variable 'nope'"));
}
