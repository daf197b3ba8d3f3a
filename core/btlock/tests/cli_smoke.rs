//! End-to-end runs of the btlock binary with file-backed stand-ins for
//! bluetoothctl, dbus-monitor and the lock utilities.

#![cfg(unix)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

const ADDRESS: &str = "80:04:5F:73:B2:90";
const DEVICE_PATH: &str = "/org/bluez/hci0/dev_80_04_5F_73_B2_90";

const SIGNAL_DUMP: &str = r#"signal time=1700000000.1 sender=:1.4 -> destination=(null destination) serial=7 path=/org/bluez/hci0/dev_80_04_5F_73_B2_90; interface=org.freedesktop.DBus.Properties; member=PropertiesChanged
   string "org.bluez.Device1"
   array [
      dict entry(
         string "Connected"
         variant             boolean false
      )
   ]
   array [
   ]
"#;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new(signal_dump: &str) -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        fs_err::write(
            dir.path().join("devices.txt"),
            format!("Device 11:22:33:44:55:66 Keyboard\nDevice {} Phone\n", ADDRESS),
        )
        .expect("write listing");
        fs_err::write(dir.path().join("signals.txt"), signal_dump).expect("write signals");
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Config whose lock cascade is one failing mechanism, then one that
    /// appends to `locks.txt`.
    fn write_config(&self, address_line: &str) -> PathBuf {
        let config = format!(
            r#"{address_line}

[lister]
program = "cat"
args = ['{devices}']

[monitor]
program = "cat"
args = ['{signals}']

[[lock_commands]]
program = "false"

[[lock_commands]]
program = "sh"
args = ["-c", 'echo locked >> "$0"', '{locks}']
"#,
            address_line = address_line,
            devices = self.path("devices.txt").display(),
            signals = self.path("signals.txt").display(),
            locks = self.path("locks.txt").display(),
        );
        let config_path = self.path("config.toml");
        fs_err::write(&config_path, config).expect("write config");
        config_path
    }

    fn lock_count(&self) -> usize {
        fs_err::read_to_string(self.path("locks.txt"))
            .map(|content| content.lines().count())
            .unwrap_or(0)
    }
}

fn run_btlock(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_btlock"))
        .arg("--config")
        .arg(config)
        .args(args)
        .env_remove("BTLOCK_ADDRESS")
        .env_remove("BTLOCK_ADAPTER")
        .env_remove("BTLOCK_CONFIG")
        .env_remove("BTLOCK_LOG_DIR")
        .stdin(Stdio::null())
        .output()
        .expect("Failed to run btlock")
}

#[test]
fn watch_locks_once_and_exits_when_stream_ends() {
    let fixture = Fixture::new(SIGNAL_DUMP);
    let config = fixture.write_config(&format!("address = \"{}\"", ADDRESS));

    let output = run_btlock(&config, &[]);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(fixture.lock_count(), 1);
}

#[test]
fn reconnect_only_stream_never_locks() {
    let fixture = Fixture::new(&SIGNAL_DUMP.replace("boolean false", "boolean true"));
    let config = fixture.write_config(&format!("address = \"{}\"", ADDRESS));

    let output = run_btlock(&config, &["watch"]);

    assert!(output.status.success());
    assert_eq!(fixture.lock_count(), 0);
}

#[test]
fn resolve_prints_object_path() {
    let fixture = Fixture::new(SIGNAL_DUMP);
    let config = fixture.write_config(&format!("address = \"{}\"", ADDRESS));

    let output = run_btlock(&config, &["resolve"]);

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), format!("{}\n", DEVICE_PATH));
}

#[test]
fn unknown_device_exits_with_failure() {
    let fixture = Fixture::new(SIGNAL_DUMP);
    let config = fixture.write_config(&format!("address = \"{}\"", ADDRESS));

    let output = run_btlock(&config, &["--address", "AA:BB:CC:DD:EE:FF"]);

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(fixture.lock_count(), 0);
}

#[test]
fn missing_address_exits_with_failure() {
    let fixture = Fixture::new(SIGNAL_DUMP);
    let config = fixture.write_config("");

    let output = run_btlock(&config, &[]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("No device address configured"));
}

#[test]
fn lock_subcommand_runs_cascade_once() {
    let fixture = Fixture::new(SIGNAL_DUMP);
    let config = fixture.write_config(&format!("address = \"{}\"", ADDRESS));

    let output = run_btlock(&config, &["lock"]);

    assert!(output.status.success());
    assert_eq!(fixture.lock_count(), 1);
}

#[test]
fn lock_subcommand_needs_no_address() {
    let fixture = Fixture::new(SIGNAL_DUMP);
    let config = fixture.write_config("");

    let output = run_btlock(&config, &["lock"]);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(fixture.lock_count(), 1);
    assert!(!String::from_utf8_lossy(&output.stderr).contains("No device address configured"));
}

#[test]
fn explicit_config_path_must_exist() {
    let fixture = Fixture::new(SIGNAL_DUMP);
    let missing = fixture.path("missing.toml");

    for args in [&[][..], &["lock"][..]] {
        let output = run_btlock(&missing, args);

        assert_eq!(output.status.code(), Some(1));
        assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to read config"));
    }
    assert_eq!(fixture.lock_count(), 0);
}
