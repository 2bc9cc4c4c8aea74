//! Waveform preamble and ADC-code to physical-unit conversion.

use std::io::Cursor;
use std::str::FromStr;

use byteorder::{LittleEndian, ReadBytesExt};
use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaveFormat { Byte, Word, Ascii }

impl WaveFormat {
	pub fn from_code(code:i64) -> Result<Self> {
		match code {
			0 => Ok(WaveFormat::Byte),
			1 => Ok(WaveFormat::Word),
			2 => Ok(WaveFormat::Ascii),
			c => Err(Error::UnsupportedFormat(format!("format code {}", c))),
		}
	}

	pub fn bytes_per_sample(&self) -> Option<usize> {
		match self {
			WaveFormat::Byte  => Some(1),
			WaveFormat::Word  => Some(2),
			WaveFormat::Ascii => None,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcquisitionType { Normal, Maximum, Raw }

impl AcquisitionType {
	pub fn from_code(code:i64) -> Result<Self> {
		match code {
			0 => Ok(AcquisitionType::Normal),
			1 => Ok(AcquisitionType::Maximum),
			2 => Ok(AcquisitionType::Raw),
			c => Err(Error::MalformedPreamble(format!("acquisition type code {}", c))),
		}
	}
}

/// Scale and offset metadata from `:WAVeform:PREamble?`.
///
/// Vertical scale and point count can change between acquisitions, so a
/// preamble only describes the trace read right after it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveformPreamble {
	pub format: WaveFormat,
	pub acquisition_type: AcquisitionType,
	pub points: usize,
	pub count: u32,
	pub x_increment: f64,
	pub x_origin: f64,
	pub x_reference: f64,
	pub y_increment: f64,
	pub y_origin: f64,
	pub y_reference: f64,
}

pub const PREAMBLE_FIELDS:usize = 10;

fn field<T: FromStr>(fields:&[&str], idx:usize, name:&str) -> Result<T> {
	fields[idx].trim().parse::<T>()
		.map_err(|_| Error::MalformedPreamble(format!("{} field {:?} is not a number", name, fields[idx])))
}

impl WaveformPreamble {

	/// Parses the ten comma-separated preamble fields.
	pub fn parse(text:&str) -> Result<Self> {
		let fields:Vec<&str> = text.trim().split(',').collect();
		if fields.len() != PREAMBLE_FIELDS {
			return Err(Error::MalformedPreamble(format!("expected {} fields but got {}", PREAMBLE_FIELDS, fields.len())));
		}

		Ok(Self {
			format:           WaveFormat::from_code(field(&fields, 0, "format")?)?,
			acquisition_type: AcquisitionType::from_code(field(&fields, 1, "type")?)?,
			points:           field(&fields, 2, "points")?,
			count:            field(&fields, 3, "count")?,
			x_increment:      field(&fields, 4, "xincrement")?,
			x_origin:         field(&fields, 5, "xorigin")?,
			x_reference:      field(&fields, 6, "xreference")?,
			y_increment:      field(&fields, 7, "yincrement")?,
			y_origin:         field(&fields, 8, "yorigin")?,
			y_reference:      field(&fields, 9, "yreference")?,
		})
	}

}

/// ADC codes as transferred, one element per sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawSamples {
	Byte(Vec<u8>),
	Word(Vec<u16>),
}

impl RawSamples {

	pub fn from_bytes(bytes:Vec<u8>, format:WaveFormat) -> Result<Self> {
		let width = format.bytes_per_sample()
			.ok_or_else(|| Error::UnsupportedFormat("ASCII data is not a binary sample format".to_owned()))?;
		if bytes.len() % width != 0 { return Err(Error::OddWordPayload(bytes.len())); }

		if format == WaveFormat::Byte {
			return Ok(RawSamples::Byte(bytes));
		}

		let mut rdr = Cursor::new(&bytes);
		let mut ans:Vec<u16> = Vec::with_capacity(bytes.len() / width);
		for _ in 0..bytes.len() / width {
			ans.push(rdr.read_u16::<LittleEndian>()?);
		}
		Ok(RawSamples::Word(ans))
	}

	pub fn len(&self) -> usize {
		match self {
			RawSamples::Byte(v) => v.len(),
			RawSamples::Word(v) => v.len(),
		}
	}

	pub fn is_empty(&self) -> bool { self.len() == 0 }

	pub fn format(&self) -> WaveFormat {
		match self {
			RawSamples::Byte(_) => WaveFormat::Byte,
			RawSamples::Word(_) => WaveFormat::Word,
		}
	}

	/// Samples widened to `f64`.
	pub fn codes(&self) -> Vec<f64> {
		match self {
			RawSamples::Byte(v) => v.iter().map(|&x| x as f64).collect(),
			RawSamples::Word(v) => v.iter().map(|&x| x as f64).collect(),
		}
	}

}

/// Converts ADC codes to volts: `(code - y_reference - y_origin) * y_increment`.
pub fn to_physical(raw:&RawSamples, preamble:&WaveformPreamble) -> Vec<f64> {
	// Codes are widened before subtracting, a code below the reference is a negative voltage
	let zero = preamble.y_reference + preamble.y_origin;
	raw.codes().into_iter()
		.map(|code| (code - zero) * preamble.y_increment)
		.collect()
}

// Half-open: `x_origin + x_increment * i` for `i` in `0..n`
fn sample_times(preamble:&WaveformPreamble, n:usize) -> Vec<f64> {
	(0..n)
		.map(|i| preamble.x_origin + preamble.x_increment * i as f64)
		.collect()
}

/// Sample times `x_origin + x_increment * i` for `i` in `0..points`.
pub fn time_axis(preamble:&WaveformPreamble) -> Vec<f64> {
	sample_times(preamble, preamble.points)
}

/// A trace in physical units together with the preamble it was scaled with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trace {
	pub preamble: WaveformPreamble,
	pub time: Vec<f64>,
	pub voltage: Vec<f64>,
}

impl Trace {

	/// Scales `raw` and builds a time axis as long as the samples actually received.
	pub fn new(raw:&RawSamples, preamble:WaveformPreamble) -> Self {
		let voltage = to_physical(raw, &preamble);
		let time = sample_times(&preamble, voltage.len());
		Trace{ preamble, time, voltage }
	}

	pub fn sample_rate(&self) -> f64 { 1.0 / self.preamble.x_increment }

}
