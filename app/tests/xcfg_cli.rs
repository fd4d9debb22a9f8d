// app/tests/xcfg_cli.rs
use assert_cmd::Command;
use serde_json::Value;
use std::fs;
use tempfile::NamedTempFile;

fn write_file(contents: &str) -> NamedTempFile {
    let f = NamedTempFile::new().unwrap();
    fs::write(f.path(), contents.as_bytes()).unwrap();
    f
}

fn xcfg() -> Command {
    let mut cmd = Command::cargo_bin("xcfg").unwrap();
    cmd.env("XCFG_LOG_LEVEL", "error");
    cmd
}

const CLEAN: &str = r#"{
    "log": {"loglevel": "warning"},
    "inbounds": [{"tag": "socks-in", "protocol": "socks", "listen": "127.0.0.1", "port": 1080}],
    "outbounds": [
        {"tag": "proxy-1", "protocol": "trojan",
         "settings": {"servers": [{"address": "t.example", "port": 443, "password": "pw"}]},
         "streamSettings": {"network": "tcp", "security": "tls",
             "tlsSettings": {"serverName": "t.example"}}},
        {"tag": "direct", "protocol": "freedom"}
    ],
    "routing": {
        "rules": [{"domain": ["geosite:cn"], "outboundTag": "direct"}, {"balancerTag": "lb"}],
        "balancers": [{"tag": "lb", "selector": ["proxy-"]}]
    }
}"#;

#[test]
fn check_exit_codes() {
    let clean = write_file(CLEAN);
    xcfg()
        .args(["check", "-c", clean.path().to_str().unwrap()])
        .assert()
        .code(0);

    let errors = write_file(r#"{"outbounds": [{"tag": "", "protocol": "freedom"}]}"#);
    xcfg()
        .args(["check", "-c", errors.path().to_str().unwrap()])
        .assert()
        .code(1);
    xcfg()
        .args(["check", "-c", errors.path().to_str().unwrap(), "--strict"])
        .assert()
        .code(2);

    let fatal = write_file(r#"{"routing": {"balancers": [{"tag": "lb", "selector": []}]}}"#);
    xcfg()
        .args(["check", "-c", fatal.path().to_str().unwrap()])
        .assert()
        .code(2);
}

#[test]
fn null_selector_loads_and_blocks() {
    let fatal = write_file(r#"{"routing": {"balancers": [{"tag": "lb", "selector": null}]}}"#);
    let out = xcfg()
        .args(["check", "-c", fatal.path().to_str().unwrap(), "--format", "json"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(2));
    let v: Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["issues"][0]["ptr"], "/routing/balancers/0");
    assert_eq!(v["issues"][0]["field"], "selector");
    assert_eq!(v["issues"][0]["severity"], "fatal");

    let mistyped = write_file(r#"{"outbounds": [{"tag": "x", "protocol": 5}]}"#);
    xcfg()
        .args(["check", "-c", mistyped.path().to_str().unwrap()])
        .assert()
        .code(1);
}

#[test]
fn check_json_report() {
    let fatal = write_file(
        r#"{"inbounds": [{"tag": "Dup", "protocol": "tun"}],
            "outbounds": [{"tag": "dup", "protocol": "freedom"}]}"#,
    );
    let out = xcfg()
        .args(["check", "-c", fatal.path().to_str().unwrap(), "--format", "json"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(2));
    let v: Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["ok"], false);
    assert_eq!(v["summary"]["push_blocked"], true);
    assert_eq!(v["issues"][0]["ptr"], "/");
    assert_eq!(v["issues"][0]["code"], "DUPLICATE_TAG");
    assert_eq!(v["issues"][0]["severity"], "fatal");
}

#[test]
fn check_reads_stdin() {
    xcfg()
        .args(["check", "-c", "-"])
        .write_stdin(CLEAN)
        .assert()
        .code(0);
}

#[test]
fn fmt_preserves_unmodelled_sections() {
    let f = write_file(CLEAN);
    let out = xcfg()
        .args(["fmt", "-c", f.path().to_str().unwrap()])
        .output()
        .unwrap();
    assert!(out.status.success());
    let v: Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["log"]["loglevel"], "warning");
    assert_eq!(v["outbounds"][1]["tag"], "direct");
}

#[test]
fn links_import_and_export() {
    let input = "trojan://pw@t.example:443?security=tls#a\nnot a link\n";
    let out = xcfg()
        .args(["links", "import"])
        .write_stdin(input)
        .output()
        .unwrap();
    assert!(out.status.success());
    let records: Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(records.as_array().map(Vec::len), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("1 failed"));

    let doc = write_file(CLEAN);
    let out = xcfg()
        .args(["links", "export", "-c", doc.path().to_str().unwrap()])
        .output()
        .unwrap();
    assert!(out.status.success());
    let text = String::from_utf8(out.stdout).unwrap();
    assert_eq!(text.lines().count(), 1);
    assert!(text.starts_with("trojan://pw@t.example:443?"));
}

#[test]
fn links_import_into_document() {
    let doc = write_file(CLEAN);
    let out = xcfg()
        .args(["links", "import", "--into", doc.path().to_str().unwrap()])
        .write_stdin("trojan://pw@t.example:443#dup\ntrojan://pw2@u.example:443#proxy-2\n")
        .output()
        .unwrap();
    assert!(out.status.success());
    let v: Value = serde_json::from_slice(&out.stdout).unwrap();
    let tags: Vec<&str> = v["outbounds"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|o| o["tag"].as_str())
        .collect();
    assert_eq!(tags, ["proxy-1", "direct", "proxy-2"]);
}

#[test]
fn import_refuses_unreadable_outbounds() {
    let doc = write_file(r#"{"outbounds": {"tag": "direct"}}"#);
    xcfg()
        .args(["links", "import", "--into", doc.path().to_str().unwrap()])
        .write_stdin("trojan://pw@t.example:443#a\n")
        .assert()
        .failure();
}

#[test]
fn generate_commands() {
    let out = xcfg().args(["generate", "uuid"]).output().unwrap();
    let id = String::from_utf8(out.stdout).unwrap();
    assert_eq!(id.trim().len(), 36);

    let out = xcfg().args(["generate", "short-id", "--len", "16"]).output().unwrap();
    assert_eq!(String::from_utf8(out.stdout).unwrap().trim().len(), 16);

    xcfg()
        .args(["generate", "short-id", "--len", "3"])
        .assert()
        .failure();

    let out = xcfg().args(["generate", "reality-keypair"]).output().unwrap();
    let text = String::from_utf8(out.stdout).unwrap();
    assert!(text.starts_with("PrivateKey: "));
    assert!(text.contains("\nPublicKey: "));
}
