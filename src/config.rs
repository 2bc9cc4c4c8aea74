use std::fs;
use std::io::{self, Error, ErrorKind};
use std::path::Path;
use std::time::Duration;

use serde::{Serialize, Deserialize};

pub const DEFAULT_DEVICE:&str = "inst0";
pub const DEFAULT_IO_TIMEOUT_MS:u32 = 10000;
pub const DEFAULT_LOCK_TIMEOUT_MS:u32 = 10000;
pub const DEFAULT_TX_THROTTLE_MS:u64 = 0;

/// Connection settings for one instrument.
///
/// Any field missing from a config file takes its default, so the smallest
/// useful file is `{ "host": "192.168.50.77" }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
	pub host: String,
	/// VXI-11 logical device name
	pub device: String,
	pub io_timeout_ms: u32,
	pub lock_timeout_ms: u32,
	/// Pause before each command, for instruments that drop commands sent back to back
	pub tx_throttle_ms: u64,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			host: String::from("localhost"),
			device: DEFAULT_DEVICE.to_owned(),
			io_timeout_ms: DEFAULT_IO_TIMEOUT_MS,
			lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
			tx_throttle_ms: DEFAULT_TX_THROTTLE_MS,
		}
	}
}

impl Config {

	pub fn for_host(host:&str) -> Self {
		Self{ host: host.to_owned(), ..Self::default() }
	}

	pub fn from_json(text:&str) -> io::Result<Self> {
		serde_json::from_str(text).map_err(|e| Error::new(ErrorKind::InvalidData, e))
	}

	pub fn from_file<P: AsRef<Path>>(path:P) -> io::Result<Self> {
		Self::from_json(&fs::read_to_string(path)?)
	}

	pub fn io_timeout(&self) -> Duration { Duration::from_millis(self.io_timeout_ms as u64) }

	pub fn tx_throttle(&self) -> Duration { Duration::from_millis(self.tx_throttle_ms) }

}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn missing_fields_take_defaults() {
		let cfg = Config::from_json(r#"{ "host": "192.168.50.77" }"#).unwrap();
		assert_eq!(cfg.host, "192.168.50.77");
		assert_eq!(cfg.device, "inst0");
		assert_eq!(cfg.io_timeout(), Duration::from_secs(10));
		assert_eq!(cfg.tx_throttle(), Duration::from_millis(0));
	}

	#[test]
	fn all_fields_are_read() {
		let cfg = Config::from_json(r#"{
			"host": "scope.lab", "device": "inst1",
			"io_timeout_ms": 2500, "lock_timeout_ms": 100, "tx_throttle_ms": 200
		}"#).unwrap();
		assert_eq!(cfg, Config {
			host: "scope.lab".into(), device: "inst1".into(),
			io_timeout_ms: 2500, lock_timeout_ms: 100, tx_throttle_ms: 200,
		});
	}

	#[test]
	fn bad_json_is_invalid_data() {
		let e = Config::from_json("{ host: ").unwrap_err();
		assert_eq!(e.kind(), ErrorKind::InvalidData);
	}
}
