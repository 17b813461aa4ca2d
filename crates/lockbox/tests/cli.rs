// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-level tests for the `lockbox` binary.
//!
//! Each test runs the binary against its own temp directory, with config and
//! database paths pointed there through `LOCKBOX_*` variables.

use std::path::Path;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

struct Harness {
    dir: TempDir,
}

impl Harness {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_lockbox"));
        cmd.args(args)
            .current_dir(self.path())
            .stdin(Stdio::null())
            .env("HOME", self.path())
            .env("XDG_CONFIG_HOME", self.path().join("config"))
            .env("XDG_DATA_HOME", self.path().join("data"))
            .env(
                "LOCKBOX_STORAGE_DATABASE_PATH",
                self.path().join("lockbox.db"),
            )
            .env("LOCKBOX_VAULT_KDF_MEMORY_COST", "8192")
            .env("LOCKBOX_VAULT_KDF_ITERATIONS", "1")
            .env("LOCKBOX_VAULT_KDF_PARALLELISM", "1")
            .env_remove("LOCKBOX_MASTER_PASSWORD")
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG");
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.command(args).output().unwrap()
    }

    fn ok(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            output.status.success(),
            "`lockbox {}` failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout).unwrap()
    }

    fn fails(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert_eq!(output.status.code(), Some(1), "`lockbox {}`", args.join(" "));
        String::from_utf8(output.stderr).unwrap()
    }

    fn setup_unlocked(&self) {
        self.ok(&["set-master", "--password", "masterpw"]);
        self.ok(&["unlock", "--password", "masterpw"]);
    }
}

#[test]
fn full_workflow() {
    let h = Harness::new();
    h.setup_unlocked();

    h.ok(&[
        "add", "-s", "GitHub", "-i", "Alice", "-t", "username", "--value", "hunter2",
    ]);
    let out = h.ok(&["get", "-s", "github", "-i", "alice"]);
    assert!(out.contains("hunter2"));
    assert!(out.contains("username"));

    h.ok(&["delete", "-s", "github", "-i", "alice"]);
    let err = h.fails(&["get", "-s", "github", "-i", "alice"]);
    assert!(err.contains("no entry found"));
}

#[test]
fn status_reports_state() {
    let h = Harness::new();
    let out = h.ok(&["status"]);
    assert!(out.contains("not set"));
    assert!(out.contains("locked"));

    h.setup_unlocked();
    let out = h.ok(&["status"]);
    assert!(out.contains("unlocked"));
    assert!(out.contains("Entries:         0"));
}

#[test]
fn locked_vault_refuses_reads() {
    let h = Harness::new();
    h.setup_unlocked();
    h.ok(&["add", "-s", "svc", "-i", "id", "-t", "email", "--value", "v"]);
    h.ok(&["lock"]);

    let err = h.fails(&["list"]);
    assert!(err.contains("vault is locked"));
    assert_eq!(err.trim().lines().count(), 1);
}

#[test]
fn unlock_reads_password_from_env() {
    let h = Harness::new();
    h.ok(&["set-master", "--password", "masterpw"]);

    let output = h
        .command(&["unlock"])
        .env("LOCKBOX_MASTER_PASSWORD", "masterpw")
        .output()
        .unwrap();
    assert!(output.status.success());

    let output = h
        .command(&["unlock"])
        .env("LOCKBOX_MASTER_PASSWORD", "wrong")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid master password"));
}

#[test]
fn rotation_via_flags() {
    let h = Harness::new();
    h.setup_unlocked();
    h.ok(&["add", "-s", "svc", "-i", "id", "-t", "api_key", "--value", "kept"]);

    let err = h.fails(&["set-master", "--password", "next", "--old-password", "bad"]);
    assert!(err.contains("invalid old master password"));

    h.ok(&["set-master", "--password", "next", "--old-password", "masterpw"]);
    h.ok(&["lock"]);
    h.fails(&["unlock", "--password", "masterpw"]);
    h.ok(&["unlock", "--password", "next"]);
    assert!(h.ok(&["get", "-s", "svc", "-i", "id"]).contains("kept"));
}

#[test]
fn add_generates_value_when_empty() {
    let h = Harness::new();
    h.setup_unlocked();

    let out = h.ok(&["add", "-s", "svc", "-i", "id", "-t", "secret_key"]);
    let generated = out
        .lines()
        .find_map(|line| line.strip_prefix("Generated value: "))
        .unwrap();
    assert_eq!(generated.len(), 12);
    assert!(h.ok(&["get", "-s", "svc", "-i", "id"]).contains(generated));
}

#[test]
fn invalid_kind_is_rejected() {
    let h = Harness::new();
    h.setup_unlocked();
    let err = h.fails(&["add", "-s", "svc", "-i", "id", "-t", "password", "--value", "v"]);
    assert!(err.contains("invalid identifier type"));
}

#[test]
fn list_groups_by_service() {
    let h = Harness::new();
    h.setup_unlocked();
    h.ok(&["add", "-s", "b-svc", "-i", "x", "-t", "username", "--value", "val-one"]);
    h.ok(&["add", "-s", "a-svc", "-i", "y", "-t", "email", "--value", "val-two"]);
    h.ok(&["add", "-s", "a-svc", "-i", "z", "-t", "username", "--value", "val-three"]);

    let out = h.ok(&["list"]);
    let a = out.find("a-svc").unwrap();
    let b = out.find("b-svc").unwrap();
    assert!(a < b);
    assert_eq!(out.matches("a-svc").count(), 1);
    assert!(out.contains("  username: z"));
    assert!(!out.contains("val-"), "list must not print values: {out}");

    let out = h.ok(&["list", "-t", "email"]);
    assert!(out.contains("  email: y"));
    assert!(!out.contains("b-svc"));
}

#[test]
fn export_appends_extension_and_import_restores() {
    let h = Harness::new();
    h.setup_unlocked();
    h.ok(&["add", "-s", "svc", "-i", "id", "-t", "username", "--value", "v1"]);

    let target = h.path().join("backup");
    h.ok(&["export", "-f", target.to_str().unwrap(), "-t", "csv"]);
    let csv_path = h.path().join("backup.csv");
    let contents = std::fs::read_to_string(&csv_path).unwrap();
    assert!(contents.starts_with("Service,Identifier,Identifier Type,Value"));

    h.ok(&["delete", "-s", "svc", "-i", "id"]);
    let out = h.ok(&["import", "-f", csv_path.to_str().unwrap()]);
    assert!(out.contains("Imported 1 entries"));
    assert!(h.ok(&["get", "-s", "svc", "-i", "id"]).contains("v1"));
}

#[test]
fn export_json_by_default() {
    let h = Harness::new();
    h.setup_unlocked();
    h.ok(&["add", "-s", "svc", "-i", "id", "-t", "email", "--value", "v"]);

    let target = h.path().join("dump");
    h.ok(&["export", "-f", target.to_str().unwrap()]);
    let json = std::fs::read_to_string(h.path().join("dump.json")).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed[0]["identifier_type"], "email");
}

#[test]
fn import_rejects_unknown_extension() {
    let h = Harness::new();
    h.setup_unlocked();
    let path = h.path().join("data.xml");
    std::fs::write(&path, "<x/>").unwrap();
    let err = h.fails(&["import", "-f", path.to_str().unwrap()]);
    assert!(err.contains("unsupported file format"));
}

#[test]
fn generate_prints_requested_length() {
    let h = Harness::new();
    let out = h.ok(&["generate", "-l", "20"]);
    assert_eq!(out.trim().len(), 20);
    let err = h.fails(&["generate", "-l", "0"]);
    assert!(err.contains("password length"));
}

#[test]
fn invalid_config_file_exits_with_error() {
    let h = Harness::new();
    let config = h.path().join("bad.toml");
    std::fs::write(&config, "[storage]\nwal_mod = true\n").unwrap();

    let output = h
        .command(&["status", "--config", config.to_str().unwrap()])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn missing_password_without_tty_fails() {
    let h = Harness::new();
    let err = h.fails(&["set-master"]);
    assert!(err.contains("no master password provided"));
}

#[test]
fn update_without_flags_or_tty_keeps_entry() {
    let h = Harness::new();
    h.setup_unlocked();
    h.ok(&["add", "-s", "svc", "-i", "id", "-t", "email", "--value", "kept"]);

    h.ok(&["update", "-s", "svc", "-i", "id"]);
    assert!(h.ok(&["get", "-s", "svc", "-i", "id"]).contains("kept"));
}

#[test]
fn short_password_flags() {
    let h = Harness::new();
    h.ok(&["set-master", "-p", "first"]);
    h.ok(&["set-master", "-p", "second", "-o", "first"]);
    h.ok(&["unlock", "-p", "second"]);
    assert!(h.ok(&["status"]).contains("unlocked"));
}
