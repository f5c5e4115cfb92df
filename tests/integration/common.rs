//! Shared test infrastructure: a temp workspace and a runner for the compiled binary.

use std::{
	path::{Path, PathBuf},
	process::{Command, ExitStatus},
};

use blockmark::{
	Engine, Settings,
	outline::{FixedClock, IdGenerator},
};
use jiff::civil::date;

pub const NOW: &str = "2026-10-14T09:30:00";

/// Engine with a seeded id generator and a clock stuck at [`NOW`].
pub fn engine(settings: Settings) -> Engine {
	let ids = IdGenerator::seeded(&settings.ids, 1234);
	Engine::with_parts(settings, ids, FixedClock(date(2026, 10, 14).at(9, 30, 0, 0)))
}

pub struct TestContext {
	pub dir: tempfile::TempDir,
}

impl TestContext {
	pub fn new() -> Self {
		Self { dir: tempfile::tempdir().unwrap() }
	}

	pub fn path(&self, name: &str) -> PathBuf {
		self.dir.path().join(name)
	}

	pub fn write(&self, name: &str, content: &str) -> PathBuf {
		let path = self.path(name);
		std::fs::write(&path, content).unwrap();
		path
	}

	pub fn read(&self, name: &str) -> String {
		std::fs::read_to_string(self.path(name)).unwrap()
	}

	/// Run the binary with an isolated config home.
	///
	/// Returns (exit_status, stdout, stderr) for easy assertions.
	pub fn run(&self, args: &[&str]) -> (ExitStatus, String, String) {
		self.run_with_env(args, &[])
	}

	pub fn run_with_env(&self, args: &[&str], env: &[(&str, &str)]) -> (ExitStatus, String, String) {
		let mut cmd = Command::new(env!("CARGO_BIN_EXE_blockmark"));
		cmd.args(args).current_dir(self.dir.path()).env("XDG_CONFIG_HOME", self.config_home()).env_remove("RUST_LOG");
		for (key, value) in env {
			cmd.env(key, value);
		}
		let output = cmd.output().unwrap();
		(
			output.status,
			String::from_utf8_lossy(&output.stdout).into_owned(),
			String::from_utf8_lossy(&output.stderr).into_owned(),
		)
	}

	fn config_home(&self) -> PathBuf {
		self.dir.path().join("config")
	}

	/// Write `$XDG_CONFIG_HOME/blockmark/config.toml`.
	pub fn write_config(&self, content: &str) -> PathBuf {
		let dir = self.config_home().join("blockmark");
		std::fs::create_dir_all(&dir).unwrap();
		let path = dir.join("config.toml");
		std::fs::write(&path, content).unwrap();
		path
	}
}

pub fn path_str(path: &Path) -> &str {
	path.to_str().unwrap()
}
