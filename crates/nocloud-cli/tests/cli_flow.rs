use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use tempfile::TempDir;

fn bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_nocloud"))
}

/// A command isolated from the caller's configuration and passphrase.
fn nocloud(config_home: &Path) -> Command {
    let mut cmd = Command::new(bin());
    cmd.env("XDG_CONFIG_HOME", config_home)
        .env_remove("NOCLOUD_CONFIG")
        .env_remove("NOCLOUD_PASSPHRASE")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

fn run_with_passphrase(config_home: &Path, passphrase: &str, args: &[&str]) -> Output {
    nocloud(config_home)
        .env("NOCLOUD_PASSPHRASE", passphrase)
        .args(args)
        .output()
        .expect("run nocloud")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn write(root: &Path, name: &str, contents: &str) -> PathBuf {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent");
    }
    fs::write(&path, contents).expect("write file");
    path
}

fn config_home() -> TempDir {
    tempfile::tempdir().expect("config home")
}

#[test]
fn test_encrypt_decrypt_round_trip() {
    let home = config_home();
    let vault = tempfile::tempdir().expect("vault dir");
    let notes = write(vault.path(), "notes.txt", "meet at noon");
    let nested = write(vault.path(), "docs/plan.md", "# plan");
    write(vault.path(), ".DS_Store", "finder junk");
    let dir = vault.path().to_str().expect("utf-8 path");

    let output = run_with_passphrase(home.path(), "pw1", &["encrypt", dir]);
    assert!(output.status.success(), "encrypt failed: {}", stderr(&output));
    assert!(!notes.exists());
    assert!(vault.path().join("notes.txt.crypt").exists());
    assert!(vault.path().join("docs/plan.md.crypt").exists());
    assert!(vault.path().join(".DS_Store").exists());
    assert!(!vault.path().join(".DS_Store.crypt").exists());
    assert!(stdout(&output).contains("notes.txt"));

    let output = run_with_passphrase(home.path(), "pw1", &["decrypt", dir]);
    assert!(output.status.success(), "decrypt failed: {}", stderr(&output));
    assert_eq!(fs::read_to_string(&notes).expect("read notes"), "meet at noon");
    assert_eq!(fs::read_to_string(&nested).expect("read plan"), "# plan");
    assert!(!vault.path().join("notes.txt.crypt").exists());
}

#[test]
fn test_encrypt_keep_and_dry_run() {
    let home = config_home();
    let vault = tempfile::tempdir().expect("vault dir");
    let notes = write(vault.path(), "notes.txt", "meet at noon");
    let file = notes.to_str().expect("utf-8 path");

    let output = nocloud(home.path())
        .args(["encrypt", "--dry-run", file])
        .output()
        .expect("run nocloud");
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), file);
    assert!(!vault.path().join("notes.txt.crypt").exists());

    let output = run_with_passphrase(home.path(), "pw1", &["encrypt", "--keep", file]);
    assert!(output.status.success(), "encrypt failed: {}", stderr(&output));
    assert!(notes.exists());
    let crypt = vault.path().join("notes.txt.crypt");
    assert!(crypt.exists());

    #[cfg(unix)]
    {
        let mode = fs::metadata(&crypt).expect("metadata").permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }
}

#[test]
fn test_wrong_passphrase_exits_with_auth_code() {
    let home = config_home();
    let vault = tempfile::tempdir().expect("vault dir");
    write(vault.path(), "secret.txt", "top secret");
    let dir = vault.path().to_str().expect("utf-8 path");

    let output = run_with_passphrase(home.path(), "pw1", &["encrypt", dir]);
    assert!(output.status.success());

    let output = run_with_passphrase(home.path(), "pw2", &["decrypt", dir]);
    assert_eq!(output.status.code(), Some(5));
    assert!(stderr(&output).contains("invalid decryption password"));
    assert!(vault.path().join("secret.txt.crypt").exists());
    assert!(!vault.path().join("secret.txt").exists());
}

#[test]
fn test_missing_passphrase_without_tty_fails() {
    let home = config_home();
    let vault = tempfile::tempdir().expect("vault dir");
    let file = write(vault.path(), "notes.txt", "x");

    let output = nocloud(home.path())
        .args(["encrypt", file.to_str().expect("utf-8 path")])
        .stdin(std::process::Stdio::null())
        .output()
        .expect("run nocloud");
    assert!(!output.status.success());
    assert!(stderr(&output).contains("NOCLOUD_PASSPHRASE"));
    assert!(file.exists());
}

#[test]
fn test_password_reference_output() {
    let home = config_home();
    let output = run_with_passphrase(
        home.path(),
        "correct-horse",
        &["password", "-s", "example.com", "-u", "root@example.com"],
    );
    assert!(output.status.success(), "password failed: {}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "service: example.com\n\
         username: root@example.com\n\
         password: f_Pt7OIi*&CsVVP_)(r5*+@b#69QRfCr\n\
         comment: >\n  \n"
    );
}

#[test]
fn test_password_from_file_as_json() {
    let home = config_home();
    let dir = tempfile::tempdir().expect("dir");
    let file = write(
        dir.path(),
        "example.yml",
        "service: other.org\nusername: nobody\nlength: 8\n---\n\
         service: example.com\nusername: root@example.com\ncomment: >\n  Updated on 2016-12-18\n",
    );

    let output = run_with_passphrase(
        home.path(),
        "correct-horse",
        &["password", "-f", file.to_str().expect("utf-8 path"), "-r", "1", "--json"],
    );
    assert!(output.status.success(), "password failed: {}", stderr(&output));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json output");
    assert_eq!(value["service"], "example.com");
    assert_eq!(value["password"], "f_Pt7OIi*&CsVVP_)(r5*+@b#69QRfCr");
    assert_eq!(value["comment"], "Updated on 2016-12-18");
}

#[test]
fn test_password_invalid_length_exits_with_input_code() {
    let home = config_home();
    let output = run_with_passphrase(
        home.path(),
        "correct-horse",
        &["password", "-s", "example.com", "-u", "root", "-l", "65"],
    );
    assert_eq!(output.status.code(), Some(4));
}

#[test]
fn test_password_uses_configured_defaults() {
    let home = config_home();
    let config = home.path().join("nocloud").join("config.toml");
    fs::create_dir_all(config.parent().expect("config parent")).expect("create config dir");
    fs::write(&config, "[password]\nlength = 12\ncharacters = \"d\"\niterations = 1000\n")
        .expect("write config");

    let output = run_with_passphrase(
        home.path(),
        "correct-horse",
        &["password", "-s", "example.com", "-u", "root"],
    );
    assert!(output.status.success(), "password failed: {}", stderr(&output));
    let line = stdout(&output)
        .lines()
        .find(|line| line.starts_with("password: "))
        .map(|line| line.trim_start_matches("password: ").to_string())
        .expect("password line");
    assert_eq!(line.len(), 12);
    assert!(line.chars().all(|c| c.is_ascii_digit()));
}

#[cfg(unix)]
#[test]
fn test_audit_reports_and_fixes_modes() {
    let home = config_home();
    let vault = tempfile::tempdir().expect("vault dir");
    let clear = write(vault.path(), "clear.txt", "x");
    let sealed = write(vault.path(), "sealed.txt.crypt", "x");
    fs::set_permissions(&clear, fs::Permissions::from_mode(0o644)).expect("chmod");
    fs::set_permissions(&sealed, fs::Permissions::from_mode(0o600)).expect("chmod");
    let dir = vault.path().to_str().expect("utf-8 path");

    let output = nocloud(home.path())
        .args(["audit", "--dry-run", dir])
        .output()
        .expect("run nocloud");
    assert!(output.status.success());
    let report = stdout(&output);
    assert!(report.contains(&format!("cm {}", clear.display())));
    assert!(report.contains(&format!("   {}", sealed.display())));
    let mode = fs::metadata(&clear).expect("metadata").permissions().mode() & 0o777;
    assert_eq!(mode, 0o644);

    let output = nocloud(home.path())
        .args(["audit", dir])
        .output()
        .expect("run nocloud");
    assert!(output.status.success());
    let mode = fs::metadata(&clear).expect("metadata").permissions().mode() & 0o777;
    assert_eq!(mode, 0o600);
}

#[test]
fn test_rename_dry_run_then_apply() {
    let home = config_home();
    let vault = tempfile::tempdir().expect("vault dir");
    write(vault.path(), "a.png", "a");
    write(vault.path(), "b.png", "b");
    let dir = vault.path().to_str().expect("utf-8 path");

    let output = nocloud(home.path())
        .args(["rename", "--dry-run", r"s/([a-z]+)\.png$/trip-$i-${1}.png/", dir])
        .output()
        .expect("run nocloud");
    assert!(output.status.success(), "rename failed: {}", stderr(&output));
    let lines: Vec<String> = stdout(&output).lines().map(str::to_string).collect();
    assert_eq!(
        lines,
        vec![
            vault.path().join("trip-1-a.png").display().to_string(),
            vault.path().join("trip-2-b.png").display().to_string(),
        ]
    );
    assert!(vault.path().join("a.png").exists());

    let output = nocloud(home.path())
        .args(["rename", r"s/([a-z]+)\.png$/trip-$i-${1}.png/", dir])
        .output()
        .expect("run nocloud");
    assert!(output.status.success());
    assert!(vault.path().join("trip-1-a.png").exists());
    assert!(!vault.path().join("a.png").exists());
}

#[test]
fn test_rename_rejects_bad_pattern() {
    let home = config_home();
    let vault = tempfile::tempdir().expect("vault dir");
    write(vault.path(), "a.png", "a");

    let output = nocloud(home.path())
        .args(["rename", "x/a/b/", vault.path().to_str().expect("utf-8 path")])
        .output()
        .expect("run nocloud");
    assert_eq!(output.status.code(), Some(4));
}

#[test]
fn test_remote_prints_sample() {
    let home = config_home();
    let output = nocloud(home.path())
        .arg("remote")
        .output()
        .expect("run nocloud");
    assert!(output.status.success());
    assert!(stdout(&output).contains("driver: s3"));
}

#[test]
fn test_push_pull_with_local_driver() {
    let home = config_home();
    let vault = tempfile::tempdir().expect("vault dir");
    let mirror = tempfile::tempdir().expect("mirror dir");
    let root = vault.path().canonicalize().expect("canonicalize");
    write(
        &root,
        ".no-cloud.yml",
        &format!("driver: local\npath: {}\n", mirror.path().display()),
    );
    let report = write(&root, "docs/report.pdf.crypt", "sealed");

    let output = nocloud(home.path())
        .args(["push", root.to_str().expect("utf-8 path")])
        .output()
        .expect("run nocloud");
    assert!(output.status.success(), "push failed: {}", stderr(&output));
    assert!(mirror.path().join("docs/report.pdf.crypt").exists());
    assert!(!mirror.path().join(".no-cloud.yml").exists());

    fs::remove_file(&report).expect("remove report");
    let output = nocloud(home.path())
        .args(["pull", root.join("docs").to_str().expect("utf-8 path")])
        .output()
        .expect("run nocloud");
    assert!(output.status.success(), "pull failed: {}", stderr(&output));
    assert_eq!(fs::read_to_string(&report).expect("read report"), "sealed");
}

#[test]
fn test_push_without_configuration_exits_not_found() {
    let home = config_home();
    let vault = tempfile::tempdir().expect("vault dir");
    write(vault.path(), "a.crypt", "a");

    let output = nocloud(home.path())
        .args(["push", vault.path().to_str().expect("utf-8 path")])
        .output()
        .expect("run nocloud");
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("nocloud remote"));
}

#[test]
fn test_no_command_prints_quickstart() {
    let home = config_home();
    let output = nocloud(home.path()).output().expect("run nocloud");
    assert!(output.status.success());
    assert!(stdout(&output).contains("Quickstart"));
}
