use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_gpacalcd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn gpacalcd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

#[test]
fn sgpa_cgpa_percentage_flow_appends_history_in_order() {
    let workspace = temp_dir("gpacalc-history-flow");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let sgpa_res = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "calc.sgpa",
        json!({
            "subjects": [
                { "name": "Maths", "credits": 4, "marks": 95 },
                { "name": "Physics", "credits": 3, "marks": 62 }
            ]
        }),
    );
    assert_eq!(sgpa_res.get("sgpa").and_then(|v| v.as_f64()), Some(8.71));
    assert_eq!(
        sgpa_res.get("totalCredits").and_then(|v| v.as_f64()),
        Some(7.0)
    );
    let subjects = sgpa_res
        .get("subjects")
        .and_then(|v| v.as_array())
        .expect("subjects array");
    assert_eq!(subjects[0].get("grade").and_then(|v| v.as_str()), Some("O"));
    assert_eq!(
        subjects[0].get("gradePoint").and_then(|v| v.as_f64()),
        Some(10.0)
    );
    assert_eq!(
        subjects[1].get("grade").and_then(|v| v.as_str()),
        Some("B+")
    );
    let entry = sgpa_res.get("historyEntry").expect("history entry");
    assert_eq!(entry.get("type").and_then(|v| v.as_str()), Some("SGPA"));
    assert_eq!(
        entry.get("details").and_then(|v| v.as_str()),
        Some("2 subjects, 7 credits")
    );

    let cgpa_res = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "calc.cgpa",
        json!({
            "semesters": [
                { "sgpa": 9, "credits": 20 },
                { "sgpa": 6, "credits": 10 }
            ]
        }),
    );
    assert_eq!(cgpa_res.get("cgpa").and_then(|v| v.as_f64()), Some(8.0));

    let pct_res = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "calc.percentage",
        json!({ "cgpa": 7.5 }),
    );
    assert_eq!(
        pct_res.get("percentage").and_then(|v| v.as_f64()),
        Some(70.0)
    );

    let list = request_ok(&mut stdin, &mut reader, "5", "history.list", json!({}));
    let entries = list
        .get("entries")
        .and_then(|v| v.as_array())
        .expect("entries array");
    assert_eq!(entries.len(), 3);
    // Append order is preserved.
    assert_eq!(
        entries[0].get("type").and_then(|v| v.as_str()),
        Some("SGPA")
    );
    assert_eq!(
        entries[1].get("type").and_then(|v| v.as_str()),
        Some("CGPA")
    );
    assert_eq!(
        entries[2].get("type").and_then(|v| v.as_str()),
        Some("Percentage")
    );
    assert_eq!(entries[2].get("result").and_then(|v| v.as_f64()), Some(70.0));
    assert_eq!(
        entries[2].get("details").and_then(|v| v.as_str()),
        Some("CGPA: 7.5")
    );

    let cleared = request_ok(&mut stdin, &mut reader, "6", "history.clear", json!({}));
    assert_eq!(cleared.get("cleared").and_then(|v| v.as_i64()), Some(3));
    let list = request_ok(&mut stdin, &mut reader, "7", "history.list", json!({}));
    assert_eq!(
        list.get("entries").and_then(|v| v.as_array()).map(Vec::len),
        Some(0)
    );

    let _ = child.kill();
}

#[test]
fn calculations_work_without_a_workspace() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let res = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "calc.sgpa",
        json!({ "subjects": [{ "credits": 3, "marks": 72 }] }),
    );
    assert_eq!(res.get("sgpa").and_then(|v| v.as_f64()), Some(8.0));
    // Nothing to persist to, so no record is claimed.
    assert!(res.get("historyEntry").is_none());

    let _ = child.kill();
}

#[test]
fn empty_subject_list_yields_zero_sgpa() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let res = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "calc.sgpa",
        json!({ "subjects": [] }),
    );
    assert_eq!(res.get("sgpa").and_then(|v| v.as_f64()), Some(0.0));
    assert_eq!(res.get("totalCredits").and_then(|v| v.as_f64()), Some(0.0));

    let _ = child.kill();
}
