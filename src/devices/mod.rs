// Both supported instruments are Rigol; each driver owns its session and builds its parameter registry once the
// model has been identified

pub mod dg5000pro;
pub mod ds8000r;

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};
use crate::params::ParameterSet;
use crate::session::Session;

lazy_static! {
	static ref IDN_RE: Regex = Regex::new("([^,]+),([^,]+),([^,]+),([^,\\s]+)").unwrap();
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
	pub manufacturer: String,
	pub model: String,
	pub serial_num: String,
	pub fw_version: String,
}

fn capture(caps:&Captures, idx:usize) -> String {
	caps.get(idx).map(|m| m.as_str().trim().to_owned()).unwrap_or_default()
}

impl Identity {

	pub fn parse(idn:&str) -> Result<Self> {
		let caps = IDN_RE.captures(idn.trim())
			.ok_or_else(|| Error::UnexpectedResponse(format!("{:?} is not an *IDN? reply", idn)))?;

		Ok(Identity {
			manufacturer: capture(&caps, 1),
			model:        capture(&caps, 2),
			serial_num:   capture(&caps, 3),
			fw_version:   capture(&caps, 4),
		})
	}

	pub fn query<S: Session + ?Sized>(session:&mut S) -> Result<Self> {
		Self::parse(&session.ask("*IDN?")?)
	}

}

// Channels are numbered from 1 as on the front panel
pub(crate) fn channel_params(channels:&[ParameterSet], ch:usize) -> Result<&ParameterSet> {
	if ch == 0 || ch > channels.len() {
		return Err(Error::ChannelOutOfRange{ channel: ch, count: channels.len() });
	}
	Ok(&channels[ch - 1])
}

pub(crate) fn check_channel(ch:usize, count:usize) -> Result<()> {
	if ch == 0 || ch > count { Err(Error::ChannelOutOfRange{ channel: ch, count }) }
	else { Ok(()) }
}

#[cfg(test)]
mod tests {
	use super::*;
	use assert_matches::assert_matches;

	#[test]
	fn parse_rigol_idn() {
		let id = Identity::parse("RIGOL TECHNOLOGIES,DG5258 Pro,DG5P261900123,00.01.03\n").unwrap();
		assert_eq!(id.manufacturer, "RIGOL TECHNOLOGIES");
		assert_eq!(id.model, "DG5258 Pro");
		assert_eq!(id.serial_num, "DG5P261900123");
		assert_eq!(id.fw_version, "00.01.03");
	}

	#[test]
	fn garbage_idn_is_rejected() {
		assert_matches!(Identity::parse("hello"), Err(Error::UnexpectedResponse(_)));
	}

	#[test]
	fn channels_count_from_one() {
		let channels = vec![ParameterSet::new(), ParameterSet::new()];
		assert!(channel_params(&channels, 1).is_ok());
		assert!(channel_params(&channels, 2).is_ok());
		assert_matches!(channel_params(&channels, 0), Err(Error::ChannelOutOfRange{ channel: 0, count: 2 }));
		assert_matches!(channel_params(&channels, 3), Err(Error::ChannelOutOfRange{ channel: 3, count: 2 }));
	}
}
