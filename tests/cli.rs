use pretty_assertions::assert_eq;
use std::io::Write;
use std::process::{Command, Output};
use tempfile::NamedTempFile;

const PERF_SCRIPT: &str = "\
firefox 1234 [0] 100.500000: cycles:
not a sample line
# comment

Chrome_ChildIOThread 1991576/1991578 [3] 55.123456: sched:sched_switch
";

fn input_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn perf_to_trace(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_perf_to_trace"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

#[test]
fn converts_to_stdout() {
    let input = input_file(PERF_SCRIPT);
    let output = perf_to_trace(&[input.path().to_str().unwrap()]);

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        concat!(
            r#"{"traceEvents":["#,
            r#"{"name":"firefox","cat":"PERF","ph":"X","ts":100500000.0,"dur":10,"pid":1234,"tid":1234,"args":{"cpu":0}},"#,
            r#"{"name":"Chrome_ChildIOThread","cat":"PERF","ph":"X","ts":55123456.0,"dur":10,"pid":1991576,"tid":1991578,"args":{"cpu":3}}"#,
            "]}\n"
        )
    );
}

#[test]
fn diagnostics_go_to_stderr() {
    let input = input_file(PERF_SCRIPT);
    let output = perf_to_trace(&[input.path().to_str().unwrap()]);
    let stderr = String::from_utf8(output.stderr).unwrap();

    assert!(stderr.contains("Processing "));
    assert!(stderr.contains("Failed to match line: not a sample line"));
    assert!(!stderr.contains("Failed to match line: # comment"));
    assert!(stderr.contains("Processed 5 lines, matched 2 events."));
}

#[test]
fn unmatched_lines_after_line_four_are_not_reported() {
    let input = input_file("# a\n# b\n# c\n# d\nbroken line\n");
    let output = perf_to_trace(&[input.path().to_str().unwrap()]);
    let stderr = String::from_utf8(output.stderr).unwrap();

    assert!(output.status.success());
    assert!(!stderr.contains("Failed to match line"));
    assert!(stderr.contains("Processed 5 lines, matched 0 events."));
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        "{\"traceEvents\":[]}\n"
    );
}

#[test]
fn comments_only_produce_empty_trace() {
    let input = input_file("# comment\n\n");
    let output = perf_to_trace(&[input.path().to_str().unwrap()]);

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        "{\"traceEvents\":[]}\n"
    );
}

#[test]
fn missing_argument_is_usage_error() {
    let output = perf_to_trace(&[]);

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8(output.stderr).unwrap().contains("Usage"));
}

#[test]
fn missing_input_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.txt");
    let output = perf_to_trace(&[missing.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(
        String::from_utf8(output.stderr)
            .unwrap()
            .contains("Failed to open input file")
    );
}

#[test]
fn writes_output_file_with_custom_settings() {
    let input = input_file("app 7/8 [2] 1.250000: cycles:\n");
    let dir = tempfile::tempdir().unwrap();
    let trace_path = dir.path().join("trace.json");

    let output = perf_to_trace(&[
        input.path().to_str().unwrap(),
        "-o",
        trace_path.to_str().unwrap(),
        "--category",
        "SCHED",
        "--duration",
        "50",
    ]);

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    assert_eq!(
        std::fs::read_to_string(&trace_path).unwrap(),
        concat!(
            r#"{"traceEvents":[{"name":"app","cat":"SCHED","ph":"X","ts":1250000.0,"#,
            r#""dur":50,"pid":7,"tid":8,"args":{"cpu":2}}]}"#,
            "\n"
        )
    );
}

#[test]
fn repeated_runs_are_identical() {
    let input = input_file(PERF_SCRIPT);
    let first = perf_to_trace(&[input.path().to_str().unwrap()]);
    let second = perf_to_trace(&[input.path().to_str().unwrap()]);

    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn validator_accepts_converted_trace() {
    let input = input_file(PERF_SCRIPT);
    let dir = tempfile::tempdir().unwrap();
    let trace_path = dir.path().join("trace.json");
    let converted = perf_to_trace(&[
        input.path().to_str().unwrap(),
        "--output",
        trace_path.to_str().unwrap(),
    ]);
    assert!(converted.status.success());

    let output = Command::new(env!("CARGO_BIN_EXE_trace_validate"))
        .arg(&trace_path)
        .output()
        .unwrap();
    let stdout = String::from_utf8(output.stdout).unwrap();

    assert!(output.status.success());
    assert!(stdout.contains("Events: 2"));
    assert!(stdout.contains("Threads: 2"));
}

#[test]
fn validator_rejects_missing_fields() {
    let trace = input_file(r#"{"traceEvents":[{"name":"a","ph":"X","pid":1,"tid":1}]}"#);
    let output = Command::new(env!("CARGO_BIN_EXE_trace_validate"))
        .arg(trace.path())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(
        String::from_utf8(output.stderr)
            .unwrap()
            .contains("missing field 'ts'")
    );
}

#[test]
fn unmatched_line_four_is_reported_and_line_five_is_not() {
    let input = input_file("# a\n\n# c\nbroken four\nbroken five\n");
    let output = perf_to_trace(&[input.path().to_str().unwrap()]);
    let stderr = String::from_utf8(output.stderr).unwrap();

    assert!(output.status.success());
    assert!(stderr.contains("Failed to match line: broken four"));
    assert!(!stderr.contains("broken five"));
    assert!(stderr.contains("Processed 5 lines, matched 0 events."));
}

#[test]
fn out_of_range_identifier_has_its_own_notice() {
    let input = input_file("app 99999999999999999999 [0] 1.0: x\napp 1 [0] 2.0: x\n");
    let output = perf_to_trace(&[input.path().to_str().unwrap()]);
    let stderr = String::from_utf8(output.stderr).unwrap();

    assert!(output.status.success());
    assert!(stderr.contains("Identifier out of range on line 1: app 99999999999999999999"));
    assert!(!stderr.contains("Failed to match line"));
    assert!(stderr.contains("Processed 2 lines, matched 1 events."));
}

#[test]
fn verbose_overrides_rust_log() {
    let input = input_file("app 7/8 [2] 1.250000: cycles:\n");
    let output = Command::new(env!("CARGO_BIN_EXE_perf_to_trace"))
        .arg(input.path())
        .arg("--verbose")
        .env("RUST_LOG", "warn")
        .output()
        .unwrap();
    let stderr = String::from_utf8(output.stderr).unwrap();

    assert!(output.status.success());
    assert!(stderr.contains("line 1: app pid=7 tid=8 cpu=2"));
}

#[test]
fn rust_log_applies_without_verbose() {
    let input = input_file("app 7/8 [2] 1.250000: cycles:\n");
    let output = Command::new(env!("CARGO_BIN_EXE_perf_to_trace"))
        .arg(input.path())
        .env("RUST_LOG", "warn")
        .output()
        .unwrap();
    let stderr = String::from_utf8(output.stderr).unwrap();

    assert!(output.status.success());
    assert!(!stderr.contains("Processed 1 lines"));
    assert!(!stderr.contains("pid=7"));
}

#[test]
fn validator_without_path_prints_usage() {
    let output = Command::new(env!("CARGO_BIN_EXE_trace_validate"))
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    assert!(
        String::from_utf8(output.stderr)
            .unwrap()
            .contains("<trace.json>")
    );
}
