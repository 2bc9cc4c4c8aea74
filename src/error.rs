use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
	#[error("Malformed block header: {0}")]
	MalformedBlockHeader(String),

	#[error("Block length mismatch: header declares {declared} bytes, received {actual}")]
	LengthMismatch { declared: usize, actual: usize },

	#[error("Trace read needs a halted acquisition but trigger status is {0}")]
	InvalidAcquisitionState(String),

	#[error("Unsupported waveform format: {0}")]
	UnsupportedFormat(String),

	#[error("Malformed waveform preamble: {0}")]
	MalformedPreamble(String),

	#[error("WORD payload has an odd length of {0} bytes")]
	OddWordPayload(usize),

	#[error("Model code {0} is not recognized")]
	UnknownModel(String),

	#[error("No parameter named {0}")]
	UnknownParameter(String),

	#[error("Invalid value for {name}: {reason}")]
	InvalidValue { name: String, reason: String },

	#[error("Channel {channel} out of range, instrument has {count}")]
	ChannelOutOfRange { channel: usize, count: usize },

	#[error("Unexpected response: {0}")]
	UnexpectedResponse(String),

	#[error("I/O error: {0}")]
	Io(#[from] io::Error),
}

impl From<Error> for io::Error {
	fn from(error: Error) -> Self {
		match error {
			Error::Io(io_error) => io_error,
			other => io::Error::new(io::ErrorKind::Other, other),
		}
	}
}
