//! End-to-end checks for the bwtop_agent binary.
use assert_cmd::Command as AssertCommand;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpStream;
use std::process::{Command, Stdio};
use std::time::Duration;

#[test]
fn help_prints_usage() {
    let out = AssertCommand::cargo_bin("bwtop_agent")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert!(String::from_utf8_lossy(&out).contains("Usage: bwtop_agent"));
}

fn get(port: u16, path: &str) -> String {
    let mut s = TcpStream::connect(("127.0.0.1", port)).expect("connect agent");
    s.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    write!(s, "GET {path} HTTP/1.0\r\nHost: localhost\r\n\r\n").unwrap();
    let mut resp = String::new();
    s.read_to_string(&mut resp).unwrap();
    resp
}

#[test]
fn serves_traffic_window_on_ephemeral_port() {
    let exe = env!("CARGO_BIN_EXE_bwtop_agent");
    let mut child = Command::new(exe)
        .args(["-p", "0"])
        .env("RUST_LOG", "info")
        .env("NO_COLOR", "1")
        .env("BWTOP_AGENT_SAMPLE_MS", "200")
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn agent");

    let stdout = child.stdout.take().unwrap();
    let mut port = None;
    for line in BufReader::new(stdout).lines() {
        let line = line.unwrap();
        if let Some(rest) = line.split("listening on http://").nth(1) {
            let addr = rest.split_whitespace().next().unwrap();
            port = addr.rsplit(':').next().and_then(|p| p.parse::<u16>().ok());
            break;
        }
    }
    let port = port.expect("agent announced its address");

    let resp = get(port, "/manager/?op=getTrafficData&tf=5");
    assert!(resp.starts_with("HTTP/1.0 200") || resp.starts_with("HTTP/1.1 200"), "{resp}");
    let body = resp.split("\r\n\r\n").nth(1).unwrap_or_default();
    let v: Vec<u64> = serde_json::from_str(body.trim()).expect("json array");
    assert_eq!(v.len(), 5);

    let resp = get(port, "/manager/?op=nope");
    assert!(resp.contains(" 400 "), "{resp}");

    let _ = child.kill();
    let _ = child.wait();
}
