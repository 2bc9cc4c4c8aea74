//! Rigol DS8000-R series oscilloscopes.

use std::fmt;

use log::{debug, info};
use serde::{Serialize, Deserialize};

use crate::block;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::params::{Parameter, ParameterSet, Parser, Validator, Value, ValueMapping};
use crate::session::Session;
use crate::vxi11::CoreClient;
use crate::waveform::{RawSamples, Trace, WaveFormat, WaveformPreamble};

use super::{channel_params, check_channel, Identity};

#[derive(Debug)]
pub struct ScopeModel {
	pub name: &'static str,
	pub channels: usize,
	pub bandwidth_limits: &'static [&'static str],
}

pub const MODELS:&[ScopeModel] = &[
	ScopeModel{ name: "DS8104-R", channels: 4, bandwidth_limits: &["20M", "250M", "500M", "OFF"] },
	ScopeModel{ name: "DS8204-R", channels: 4, bandwidth_limits: &["20M", "250M", "500M", "OFF"] },
	ScopeModel{ name: "DS8034-R", channels: 4, bandwidth_limits: &["20M", "250M", "OFF"] },
];

pub fn lookup_model(name:&str) -> Result<&'static ScopeModel> {
	MODELS.iter().find(|m| m.name == name).ok_or_else(|| Error::UnknownModel(name.to_owned()))
}

const PROBE_RATIOS:&[f64] = &[
	0.0001, 0.0002, 0.0005, 0.001, 0.002, 0.005, 0.01, 0.02, 0.05, 0.1, 0.2, 0.5,
	1.0, 2.0, 5.0, 10.0, 20.0, 50.0, 100.0, 200.0, 500.0, 1000.0, 2000.0, 5000.0, 10000.0, 20000.0, 50000.0,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerStatus { Td, Wait, Run, Auto, Stop }

impl TriggerStatus {
	pub fn parse(reply:&str) -> Result<Self> {
		match reply.trim() {
			"TD"   => Ok(TriggerStatus::Td),
			"WAIT" => Ok(TriggerStatus::Wait),
			"RUN"  => Ok(TriggerStatus::Run),
			"AUTO" => Ok(TriggerStatus::Auto),
			"STOP" => Ok(TriggerStatus::Stop),
			s      => Err(Error::UnexpectedResponse(format!("{:?} is not a trigger status", s))),
		}
	}
}

impl fmt::Display for TriggerStatus {
	fn fmt(&self, f:&mut fmt::Formatter) -> fmt::Result {
		let s = match self {
			TriggerStatus::Td   => "TD",
			TriggerStatus::Wait => "WAIT",
			TriggerStatus::Run  => "RUN",
			TriggerStatus::Auto => "AUTO",
			TriggerStatus::Stop => "STOP",
		};
		f.write_str(s)
	}
}

/// Where `get_trace` reads from: a channel number or any SCPI source name such as `MATH3`.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceSource {
	Channel(usize),
	Named(String),
}

impl From<usize> for TraceSource { fn from(ch:usize) -> Self { TraceSource::Channel(ch) } }
impl From<&str> for TraceSource { fn from(s:&str) -> Self { TraceSource::Named(s.to_owned()) } }

fn channel_parameters(ch:usize, model:&ScopeModel) -> ParameterSet {
	let mut ps = ParameterSet::new();

	ps.add(Parameter::new("bandwidth_limit")
		.set_cmd(format!(":CHANnel{}:BWLimit {{}}", ch))
		.get_cmd(format!(":CHANnel{}:BWLimit?", ch))
		.vals(Validator::strs(model.bandwidth_limits))
		.doc("Bandwidth limit of the channel"));

	ps.add(Parameter::new("coupling")
		.set_cmd(format!(":CHANnel{}:COUPling {{}}", ch))
		.get_cmd(format!(":CHANnel{}:COUPling?", ch))
		.vals(Validator::strs(&["AC", "DC", "GND"]))
		.doc("Coupling mode of the channel"));

	ps.add(Parameter::new("display")
		.set_cmd(format!(":CHANnel{}:DISPlay {{}}", ch))
		.get_cmd(format!(":CHANnel{}:DISPlay?", ch))
		.val_mapping(ValueMapping::on_off())
		.doc("Whether the channel is displayed"));

	ps.add(Parameter::new("invert")
		.set_cmd(format!(":CHANnel{}:INVert {{}}", ch))
		.get_cmd(format!(":CHANnel{}:INVert?", ch))
		.val_mapping(ValueMapping::on_off())
		.doc("Whether the channel is inverted"));

	ps.add(Parameter::new("offset")
		.set_cmd(format!(":CHANnel{}:OFFSet {{:f}}", ch))
		.get_cmd(format!(":CHANnel{}:OFFSet?", ch))
		.vals(Validator::any_number())
		.parser(Parser::Float)
		.doc("Vertical offset in V"));

	ps.add(Parameter::new("delay_calibration_time")
		.set_cmd(format!(":CHANnel{}:TCALibrate {{}}", ch))
		.get_cmd(format!(":CHANnel{}:TCALibrate?", ch))
		.vals(Validator::Numbers{ min: -100e-9, max: 100e-9 })
		.parser(Parser::Float)
		.doc("Delay calibration time (zero offset of the channel) in s"));

	ps.add(Parameter::new("scale")
		.set_cmd(format!(":CHANnel{}:SCALe {{:f}}", ch))
		.get_cmd(format!(":CHANnel{}:SCALe?", ch))
		.vals(Validator::Numbers{ min: 1e-3, max: 10.0 })
		.parser(Parser::Float)
		.doc("Vertical scale in V/div"));

	ps.add(Parameter::new("impedance")
		.set_cmd(format!(":CHANnel{}:IMPedance {{}}", ch))
		.get_cmd(format!(":CHANnel{}:IMPedance?", ch))
		.val_mapping(ValueMapping::table(&[("50 Ohm", "FIFT"), ("1 MOhm", "OMEG")]))
		.doc("Input impedance"));

	ps.add(Parameter::new("probe")
		.set_cmd(format!(":CHANnel{}:PROBe {{}}", ch))
		.get_cmd(format!(":CHANnel{}:PROBe?", ch))
		.vals(Validator::floats(PROBE_RATIOS))
		.parser(Parser::Float)
		.doc("Probe ratio"));

	ps.add(Parameter::new("probe_delay")
		.set_cmd(format!(":CHANnel{}:PROBe:DELay {{}}", ch))
		.get_cmd(format!(":CHANnel{}:PROBe:DELay?", ch))
		.vals(Validator::Numbers{ min: -100e-9, max: 100e-9 })
		.parser(Parser::Float)
		.doc("Probe delay time in s"));

	ps.add(Parameter::new("probe_bias")
		.set_cmd(format!(":CHANnel{}:PROBe:BIAS {{}}", ch))
		.get_cmd(format!(":CHANnel{}:PROBe:BIAS?", ch))
		.vals(Validator::Numbers{ min: -5.0, max: 5.0 })
		.parser(Parser::Float)
		.doc("Probe bias voltage in V"));

	ps.add(Parameter::new("units")
		.set_cmd(format!(":CHANnel{}:UNITs {{}}", ch))
		.get_cmd(format!(":CHANnel{}:UNITs?", ch))
		.val_mapping(ValueMapping::table(&[("volt", "VOLT"), ("watt", "WATT"), ("ampere", "AMP"), ("unknown", "UNKN")]))
		.doc("Amplitude display unit"));

	ps.add(Parameter::new("vernier")
		.set_cmd(format!(":CHANnel{}:VERNier {{}}", ch))
		.get_cmd(format!(":CHANnel{}:VERNier?", ch))
		.val_mapping(ValueMapping::on_off())
		.doc("Fine adjustment of the vertical scale"));

	ps.add(Parameter::new("position")
		.set_cmd(format!(":CHANnel{}:POSition {{:f}}", ch))
		.get_cmd(format!(":CHANnel{}:POSition?", ch))
		.vals(Validator::Numbers{ min: -100.0, max: 100.0 })
		.parser(Parser::Float)
		.doc("Offset calibration voltage for the zero point in V"));

	ps
}

fn instrument_parameters() -> ParameterSet {
	let mut ps = ParameterSet::new();

	ps.add(Parameter::new("acquire_mdepth")
		.set_cmd(":ACQuire:MDEPth {:s}")
		.get_cmd(":ACQuire:MDEPth?")
		.vals(Validator::strs(&["AUTO", "1k", "10k", "100k", "1M", "10M", "100M", "125M", "250M", "500M"]))
		.parser(Parser::Float)
		.doc("Memory depth, read back as a number of points"));

	ps.add(Parameter::new("timebase_delay_enable")
		.set_cmd(":TIMebase:DELay:ENABle {}")
		.get_cmd(":TIMebase:DELay:ENABle?")
		.val_mapping(ValueMapping::on_off())
		.doc("Delayed sweep on/off"));

	ps.add(Parameter::new("timebase_delay_offset")
		.set_cmd(":TIMebase:DELay:OFFSet {}")
		.get_cmd(":TIMebase:DELay:OFFSet?")
		.vals(Validator::any_number())
		.parser(Parser::Float)
		.doc("Offset of the delayed timebase in s"));

	ps.add(Parameter::new("timebase_delay_scale")
		.set_cmd(":TIMebase:DELay:SCALe {}")
		.get_cmd(":TIMebase:DELay:SCALe?")
		.vals(Validator::any_number())
		.parser(Parser::Float)
		.doc("Scale of the delayed timebase in s/div"));

	ps.add(Parameter::new("timebase_offset")
		.set_cmd(":TIMebase:OFFSet {}")
		.get_cmd(":TIMebase:OFFSet?")
		.vals(Validator::any_number())
		.parser(Parser::Float)
		.doc("Offset of the main timebase in s"));

	ps.add(Parameter::new("timebase_scale")
		.set_cmd(":TIMebase:SCALe {}")
		.get_cmd(":TIMebase:SCALe?")
		.vals(Validator::any_number())
		.parser(Parser::Float)
		.doc("Scale of the main timebase in s/div"));

	ps.add(Parameter::new("timebase_mode")
		.set_cmd(":TIMebase:MODE {}")
		.get_cmd(":TIMebase:MODE?")
		.val_mapping(ValueMapping::table(&[("yt", "MAIN"), ("xy", "XY"), ("roll", "ROLL")])));

	ps.add(Parameter::new("timebase_href_mode")
		.set_cmd(":TIMebase:HREFerence:MODE {}")
		.get_cmd(":TIMebase:HREFerence:MODE?")
		.val_mapping(ValueMapping::table(&[
			("center", "CENT"),
			("left_border", "LB"),
			("right_border", "RB"),
			("trigger", "TRIG"),
			("user", "USER"),
		]))
		.doc("Horizontal reference mode"));

	ps.add(Parameter::new("timebase_href_position")
		.set_cmd(":TIMebase:HREFerence:POSition {}")
		.get_cmd(":TIMebase:HREFerence:POSition?")
		.vals(Validator::Ints{ min: -500, max: 500 })
		.parser(Parser::Int)
		.doc("Reference position for horizontal expansion"));

	ps.add(Parameter::new("timebase_vernier")
		.set_cmd(":TIMebase:VERNier {}")
		.get_cmd(":TIMebase:VERNier?")
		.val_mapping(ValueMapping::on_off()));

	ps.add(Parameter::new("waveform_source")
		.set_cmd(":WAVeform:SOURce {}")
		.get_cmd(":WAVeform:SOURce?")
		.vals(Validator::strs(&["CHAN1", "CHAN2", "CHAN3", "CHAN4", "MATH1", "MATH2", "MATH3", "MATH4"]))
		.doc("Source of waveform data reads"));

	ps.add(Parameter::new("waveform_mode")
		.set_cmd(":WAVeform:MODE {}")
		.get_cmd(":WAVeform:MODE?")
		.val_mapping(ValueMapping::table(&[("normal", "NORM"), ("maximum", "MAX"), ("raw", "RAW")])));

	ps.add(Parameter::new("waveform_format")
		.set_cmd(":WAVeform:FORMat {}")
		.get_cmd(":WAVeform:FORMat?")
		.val_mapping(ValueMapping::table(&[("word", "WORD"), ("byte", "BYTE"), ("ascii", "ASC")])));

	ps.add(Parameter::new("waveform_points")
		.set_cmd(":WAVeform:POINts {:d}")
		.get_cmd(":WAVeform:POINts?")
		.vals(Validator::any_int())
		.parser(Parser::Int));

	ps.add(Parameter::new("waveform_start")
		.set_cmd(":WAVeform:STARt {}")
		.get_cmd(":WAVeform:STARt?")
		.vals(Validator::any_int())
		.parser(Parser::Int));

	ps.add(Parameter::new("waveform_stop")
		.set_cmd(":WAVeform:STOP {}")
		.get_cmd(":WAVeform:STOP?")
		.vals(Validator::any_int())
		.parser(Parser::Int));

	ps
}

pub struct RigolDS8000R<S: Session = CoreClient> {
	session: S,
	identity: Identity,
	model: &'static ScopeModel,
	params: ParameterSet,
	channels: Vec<ParameterSet>,
}

impl RigolDS8000R<CoreClient> {

	pub fn connect(cfg:&Config) -> Result<Self> {
		Self::new(CoreClient::open(cfg)?)
	}

}

impl<S: Session> RigolDS8000R<S> {

	/// Identifies the instrument and builds its parameters for the model found.
	pub fn new(mut session:S) -> Result<Self> {
		let identity = Identity::query(&mut session)?;
		let model = lookup_model(&identity.model)?;
		info!("Connected to {} {} (serial {})", identity.manufacturer, identity.model, identity.serial_num);

		let channels = (1..=model.channels).map(|ch| channel_parameters(ch, model)).collect();
		Ok(Self{ session, identity, model, params: instrument_parameters(), channels })
	}

	pub fn identity(&self) -> &Identity { &self.identity }
	pub fn model(&self) -> &ScopeModel { self.model }
	pub fn channel_count(&self) -> usize { self.model.channels }

	pub fn session_mut(&mut self) -> &mut S { &mut self.session }
	pub fn into_session(self) -> S { self.session }

	pub fn parameters(&self) -> &ParameterSet { &self.params }

	pub fn channel_parameters(&self, ch:usize) -> Result<&ParameterSet> { channel_params(&self.channels, ch) }

	pub fn get(&mut self, name:&str) -> Result<Value> { self.params.get(&mut self.session, name) }

	pub fn set<V: Into<Value>>(&mut self, name:&str, value:V) -> Result<()> {
		self.params.set(&mut self.session, name, value.into())
	}

	pub fn channel_get(&mut self, ch:usize, name:&str) -> Result<Value> {
		channel_params(&self.channels, ch)?.get(&mut self.session, name)
	}

	pub fn channel_set<V: Into<Value>>(&mut self, ch:usize, name:&str, value:V) -> Result<()> {
		channel_params(&self.channels, ch)?.set(&mut self.session, name, value.into())
	}

	/// Starts calibration of the active probe on a channel.
	pub fn calibrate(&mut self, ch:usize) -> Result<()> {
		check_channel(ch, self.channel_count())?;
		self.write(&format!(":CHANnel{}:CSTart", ch))
	}

	pub fn trigger_status(&mut self) -> Result<TriggerStatus> {
		TriggerStatus::parse(&self.session.ask(":TRIGger:STATus?")?)
	}

	pub fn get_waveform_preamble(&mut self) -> Result<WaveformPreamble> {
		WaveformPreamble::parse(&self.session.ask(":WAVeform:PREamble?")?)
	}

	// Checks the acquisition is halted and points the waveform subsystem at `source`; returns the source name
	fn prepare_trace(&mut self, source:TraceSource, format:WaveFormat, points:Option<usize>) -> Result<String> {
		let status = self.trigger_status()?;
		if status != TriggerStatus::Stop {
			return Err(Error::InvalidAcquisitionState(status.to_string()));
		}

		let source = match source {
			TraceSource::Channel(ch) => {
				check_channel(ch, self.channel_count())?;
				format!("CHAN{}", ch)
			},
			TraceSource::Named(name) => name,
		};

		let format_key = match format {
			WaveFormat::Byte  => "byte",
			WaveFormat::Word  => "word",
			WaveFormat::Ascii => return Err(Error::UnsupportedFormat("traces are read as byte or word".to_owned())),
		};

		self.set("waveform_source", source.as_str())?;
		self.set("waveform_format", format_key)?;
		self.set("waveform_mode", "raw")?;
		if let Some(n) = points {
			self.set("waveform_points", n)?;
		}
		Ok(source)
	}

	fn read_trace_data(&mut self, source:&str, format:WaveFormat) -> Result<RawSamples> {
		self.session.write(":WAVeform:DATA?")?;
		let payload = block::decode(&self.session.read_raw()?)?;
		debug!("Read {} bytes of {:?} samples from {}", payload.len(), format, source);

		RawSamples::from_bytes(payload, format)
	}

	/// Reads raw ADC codes from `source`. The acquisition must be stopped first.
	pub fn get_trace<T: Into<TraceSource>>(&mut self, source:T, format:WaveFormat, points:Option<usize>) -> Result<RawSamples> {
		let source = self.prepare_trace(source.into(), format, points)?;
		self.read_trace_data(&source, format)
	}

	/// Reads a trace and scales it with a preamble queried just before the data.
	pub fn get_trace_volts<T: Into<TraceSource>>(&mut self, source:T, format:WaveFormat, points:Option<usize>) -> Result<Trace> {
		let source = self.prepare_trace(source.into(), format, points)?;
		let preamble = self.get_waveform_preamble()?;
		if preamble.format != format {
			return Err(Error::UnexpectedResponse(format!("preamble reports {:?} data but {:?} was requested", preamble.format, format)));
		}

		let raw = self.read_trace_data(&source, format)?;
		Ok(Trace::new(&raw, preamble))
	}

	pub fn autoscale(&mut self) -> Result<()> { self.write(":AUToscale") }
	pub fn clear(&mut self) -> Result<()> { self.write(":CLEar") }
	pub fn run(&mut self) -> Result<()> { self.write(":RUN") }
	pub fn stop(&mut self) -> Result<()> { self.write(":STOP") }
	pub fn single(&mut self) -> Result<()> { self.write(":SINGle") }
	pub fn trigger_force(&mut self) -> Result<()> { self.write(":TFORce") }

	/// Resets the instrument to its factory defaults.
	pub fn reset(&mut self) -> Result<()> { self.write("*RST") }

	fn write(&mut self, cmd:&str) -> Result<()> {
		self.session.write(cmd)?;
		Ok(())
	}

}
