//! IEEE-488.2 definite-length arbitrary block data.
//!
//! Binary queries (waveform dumps, screen captures) answer with
//! `#<n><len><payload>` where `n` is a single ASCII digit giving the number of
//! decimal digits in `len`, and `len` is the payload size in bytes. The
//! instrument terminates the message with a newline after the payload.

use std::str;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
	pub digit_count: usize,
	pub payload_length: usize,
}

impl BlockHeader {
	/// Bytes taken by `#`, the digit count and the length digits.
	pub fn len(&self) -> usize { 2 + self.digit_count }
}

fn malformed(msg:String) -> Error { Error::MalformedBlockHeader(msg) }

pub fn parse_header(response:&[u8]) -> Result<BlockHeader> {
	match response.first() {
		Some(b'#') => { },
		Some(b)    => return Err(malformed(format!("expected '#' but got {:#04x}", b))),
		None       => return Err(malformed("empty response".to_owned())),
	}

	let digit_count = match response.get(1) {
		// `#0` starts an indefinite-length block, which these instruments never send
		Some(b'0') => return Err(malformed("indefinite-length blocks are not supported".to_owned())),
		Some(b) if b.is_ascii_digit() => (b - b'0') as usize,
		Some(b) => return Err(malformed(format!("digit count {:?} is not a decimal digit", *b as char))),
		None    => return Err(malformed("response ends before the digit count".to_owned())),
	};

	let digits = response.get(2..2 + digit_count)
		.ok_or_else(|| malformed(format!("response ends inside the {} length digits", digit_count)))?;
	if !digits.iter().all(u8::is_ascii_digit) {
		return Err(malformed(format!("length digits {:?} are not all decimal", String::from_utf8_lossy(digits))));
	}

	let payload_length = str::from_utf8(digits).ok()
		.and_then(|s| s.parse::<usize>().ok())
		.ok_or_else(|| malformed("length does not fit in usize".to_owned()))?;

	Ok(BlockHeader{ digit_count, payload_length })
}

/// Strips the header and the trailing terminator and checks the payload is exactly as long as declared.
pub fn decode(response:&[u8]) -> Result<Vec<u8>> {
	let header = parse_header(response)?;

	let mut payload = &response[header.len()..];
	while let Some((last, rest)) = payload.split_last() {
		if !last.is_ascii_whitespace() && *last != 0x0b { break; }
		payload = rest;
	}

	if payload.len() != header.payload_length {
		return Err(Error::LengthMismatch{ declared: header.payload_length, actual: payload.len() });
	}

	Ok(payload.to_vec())
}

pub fn encode(payload:&[u8]) -> Vec<u8> {
	let len = payload.len().to_string();

	let mut ans:Vec<u8> = Vec::with_capacity(2 + len.len() + payload.len());
	ans.push(b'#');
	ans.extend_from_slice(len.len().to_string().as_bytes());
	ans.extend_from_slice(len.as_bytes());
	ans.extend_from_slice(payload);
	ans
}
