//! End-to-end tests of the `superdeploy` binary against a temporary
//! SuperDeploy home, with stand-in `terraform` and `ansible-playbook`
//! scripts on `PATH` that record their arguments.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

struct Env {
    home: TempDir,
    bin: TempDir,
}

impl Env {
    fn new() -> Self {
        let env = Self {
            home: TempDir::new().expect("home"),
            bin: TempDir::new().expect("bin"),
        };
        env.fake_tool("terraform");
        env.fake_tool("ansible-playbook");
        env
    }

    /// A tool that appends `<name> <args>` to `calls.log` and exits with
    /// `$FAKE_EXIT` (default 0).
    fn fake_tool(&self, name: &str) {
        let path = self.bin.path().join(name);
        let script = format!(
            "#!/bin/sh\necho \"{name} $*\" >> \"{}\"\nexit ${{FAKE_EXIT:-0}}\n",
            self.calls_path().display()
        );
        fs::write(&path, script).expect("write fake tool");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod");
    }

    fn calls_path(&self) -> PathBuf {
        self.home.path().join("calls.log")
    }

    fn calls(&self) -> String {
        fs::read_to_string(self.calls_path()).unwrap_or_default()
    }

    fn project_dir(&self, name: &str) -> PathBuf {
        self.home.path().join("projects").join(name)
    }

    fn write(&self, project: &str, rel: &str, content: &str) {
        let path = self.project_dir(project).join(rel);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, content).expect("write");
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("superdeploy"));
        let path = format!(
            "{}:{}",
            self.bin.path().display(),
            std::env::var("PATH").unwrap_or_default()
        );
        cmd.env("SUPERDEPLOY_HOME", self.home.path())
            .env_remove("SUPERDEPLOY_PROJECTS_DIR")
            .env_remove("SUPERDEPLOY_LOG")
            .env("PATH", path);
        cmd
    }

    fn registry(&self) -> String {
        fs::read_to_string(self.home.path().join("projects.txt")).unwrap_or_default()
    }
}

fn read_dir_names(dir: &Path) -> Vec<String> {
    fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Registry verbs
// ---------------------------------------------------------------------------

#[test]
fn add_then_list_shows_name_once() {
    let env = Env::new();
    env.cmd().args(["add", "alpha"]).assert().success();
    env.cmd()
        .args(["add", "alpha"])
        .assert()
        .code(1)
        .stderr(contains("already"));

    let assert = env.cmd().arg("list").assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    assert_eq!(stdout.matches("alpha").count(), 1, "stdout: {stdout}");
    assert_eq!(env.registry(), "alpha is a project\n");
}

#[test]
fn list_on_fresh_home_is_empty() {
    let env = Env::new();
    env.cmd()
        .arg("list")
        .assert()
        .success()
        .stdout(contains("No projects registered"));
}

#[test]
fn remove_unknown_project_fails() {
    let env = Env::new();
    env.cmd()
        .args(["remove", "ghost"])
        .assert()
        .code(1)
        .stderr(contains("ghost"));
}

#[test]
fn remove_keeps_other_entries() {
    let env = Env::new();
    fs::write(
        env.home.path().join("projects.txt"),
        "alpha is a project\n# note\nbeta is a project\n",
    )
    .expect("seed registry");

    env.cmd().args(["remove", "alpha"]).assert().success();
    assert_eq!(env.registry(), "# note\nbeta is a project\n");
}

#[test]
fn io_failure_names_its_cause_once() {
    let env = Env::new();
    fs::create_dir_all(env.home.path().join("projects.txt")).expect("dir in place of registry");

    let assert = env.cmd().arg("list").assert().code(1);
    let stderr = String::from_utf8(assert.get_output().stderr.clone()).expect("utf8");
    assert!(stderr.contains("projects.txt"), "stderr: {stderr}");
    assert_eq!(stderr.matches("os error").count(), 1, "stderr: {stderr}");
}

#[test]
fn invalid_name_is_rejected() {
    let env = Env::new();
    env.cmd().args(["add", "../escape"]).assert().code(1);
    assert_eq!(env.registry(), "");
}

// ---------------------------------------------------------------------------
// Deploy verbs
// ---------------------------------------------------------------------------

fn ansible_only_alpha(env: &Env) {
    fs::write(env.home.path().join("projects.txt"), "alpha is a project\n").expect("registry");
    env.write("alpha", "ansible/playbook.yml", "- hosts: all\n");
    env.write("alpha", "ansible/inventory.yml", "all: {}\n");
}

#[test]
fn deploy_ansible_only_project_runs_playbook_alone() {
    let env = Env::new();
    ansible_only_alpha(&env);

    env.cmd()
        .args(["deploy", "alpha"])
        .assert()
        .success()
        .stdout(contains("alpha"));

    assert_eq!(env.calls(), "ansible-playbook -i inventory.yml playbook.yml\n");
}

#[test]
fn deploy_unregistered_project_fails_without_running_tools() {
    let env = Env::new();
    env.write("alpha", "terraform/main.tf", "terraform {}\n");

    env.cmd()
        .args(["deploy", "alpha"])
        .assert()
        .code(1)
        .stderr(contains("superdeploy add alpha"));
    assert_eq!(env.calls(), "");
}

#[test]
fn deploy_registered_project_without_directory_fails() {
    let env = Env::new();
    env.cmd().args(["add", "alpha"]).assert().success();
    env.cmd()
        .args(["deploy", "alpha"])
        .assert()
        .code(1)
        .stderr(contains("does not exist"));
}

#[test]
fn deploy_empty_project_reports_no_deployable_structure() {
    let env = Env::new();
    env.cmd().args(["add", "alpha"]).assert().success();
    fs::create_dir_all(env.project_dir("alpha")).expect("mkdir");

    env.cmd()
        .args(["deploy", "alpha"])
        .assert()
        .code(1)
        .stderr(contains("no deployable structure"));
}

#[test]
fn conflicting_stage_flags_fail_with_code_one() {
    let env = Env::new();
    ansible_only_alpha(&env);

    env.cmd()
        .args([
            "deploy",
            "alpha",
            "--infrastructure-only",
            "--application-only",
        ])
        .assert()
        .code(1)
        .stderr(contains("mutually exclusive"));
    assert_eq!(env.calls(), "");
}

#[test]
fn failing_terraform_stops_before_ansible() {
    let env = Env::new();
    ansible_only_alpha(&env);
    env.write("alpha", "terraform/main.tf", "terraform {}\n");

    env.cmd()
        .args(["deploy", "alpha"])
        .env("FAKE_EXIT", "1")
        .assert()
        .code(1)
        .stderr(contains("terraform init"));
    assert_eq!(env.calls(), "terraform init -input=false\n");
}

#[test]
fn plan_uses_check_mode() {
    let env = Env::new();
    ansible_only_alpha(&env);

    env.cmd().args(["plan", "alpha"]).assert().success();
    assert_eq!(
        env.calls(),
        "ansible-playbook -i inventory.yml playbook.yml --check\n"
    );
}

#[test]
fn teardown_without_terraform_is_noop() {
    let env = Env::new();
    ansible_only_alpha(&env);

    env.cmd()
        .args(["teardown", "alpha"])
        .assert()
        .success()
        .stdout(contains("nothing to do"));
    assert_eq!(env.calls(), "");
}

#[test]
fn refresh_destroys_then_applies() {
    let env = Env::new();
    ansible_only_alpha(&env);
    env.write("alpha", "terraform/main.tf", "terraform {}\n");

    env.cmd().args(["refresh", "alpha"]).assert().success();
    assert_eq!(
        env.calls(),
        "terraform init -input=false\n\
         terraform destroy -input=false -auto-approve\n\
         terraform init -input=false\n\
         terraform apply -input=false -auto-approve\n\
         ansible-playbook -i inventory.yml playbook.yml\n"
    );
}

#[test]
fn custom_script_receives_project_name() {
    let env = Env::new();
    ansible_only_alpha(&env);
    let script = env.project_dir("alpha").join("deploy.sh");
    fs::write(
        &script,
        format!(
            "#!/bin/sh\necho \"deploy.sh $*\" >> \"{}\"\n",
            env.calls_path().display()
        ),
    )
    .expect("script");
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).expect("chmod");

    env.cmd().args(["deploy", "alpha"]).assert().success();
    assert_eq!(env.calls(), "deploy.sh --project-name alpha --auto-approve\n");
}

// ---------------------------------------------------------------------------
// Check, logging
// ---------------------------------------------------------------------------

#[test]
fn check_json_reports_descriptor_kind() {
    let env = Env::new();
    ansible_only_alpha(&env);

    let assert = env.cmd().args(["check", "alpha", "--json"]).assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    assert_eq!(json["descriptor"]["kind"], "ansible_only");
    assert_eq!(json["deploy"][0], "ansible-playbook -i inventory.yml playbook.yml");
    assert_eq!(env.calls(), "", "check must not run anything");
}

#[test]
fn check_fails_when_tool_missing() {
    let env = Env::new();
    ansible_only_alpha(&env);
    fs::remove_file(env.bin.path().join("ansible-playbook")).expect("remove fake");

    env.cmd()
        .args(["check", "alpha"])
        .env("PATH", env.bin.path())
        .assert()
        .code(1)
        .stdout(contains("MISSING"))
        .stderr(contains("ansible-playbook"));
}

#[test]
fn invocation_writes_daily_log() {
    let env = Env::new();
    ansible_only_alpha(&env);
    env.cmd().args(["deploy", "alpha"]).assert().success();

    let logs = read_dir_names(&env.home.path().join("logs"));
    assert_eq!(logs.len(), 1, "logs: {logs:?}");
    assert!(logs[0].starts_with("superdeploy-") && logs[0].ends_with(".log"));
}

#[test]
fn unknown_verb_is_usage_error() {
    let env = Env::new();
    env.cmd()
        .arg("launch")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Usage"));
}
