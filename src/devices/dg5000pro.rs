//! Rigol DG5000 Pro series arbitrary waveform generators.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use log::{debug, info};

use crate::block;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::params::{Parameter, ParameterSet, Parser, Validator, Value, ValueMapping};
use crate::session::Session;
use crate::vxi11::CoreClient;

use super::{channel_params, check_channel, Identity};

#[derive(Debug)]
pub struct GeneratorModel {
	pub name: &'static str,
	pub channels: usize,
}

pub const MODELS:&[GeneratorModel] = &[
	GeneratorModel{ name: "DG5258 Pro", channels: 8 },
	GeneratorModel{ name: "DG5358 Pro", channels: 8 },
	GeneratorModel{ name: "DG5508 Pro", channels: 8 },
	GeneratorModel{ name: "DG5254 Pro", channels: 4 },
	GeneratorModel{ name: "DG5354 Pro", channels: 4 },
	GeneratorModel{ name: "DG5504 Pro", channels: 4 },
	GeneratorModel{ name: "DG5252 Pro", channels: 2 },
	GeneratorModel{ name: "DG5352 Pro", channels: 2 },
	GeneratorModel{ name: "DG5502 Pro", channels: 2 },
];

pub fn lookup_model(name:&str) -> Result<&'static GeneratorModel> {
	MODELS.iter().find(|m| m.name == name).ok_or_else(|| Error::UnknownModel(name.to_owned()))
}

pub const SAVE_SLOTS:std::ops::RangeInclusive<u32> = 0..=5;

fn keywords_or(v:Validator, keywords:&[&str]) -> Validator {
	Validator::MultiType(vec![v, Validator::strs(keywords)])
}

fn positive_negative() -> ValueMapping {
	ValueMapping::table(&[("positive", "POS"), ("negative", "NEG")])
}

fn normal_inverted() -> ValueMapping {
	ValueMapping::table(&[("normal", "NORM"), ("inverted", "INV")])
}

fn channel_parameters(ch:usize) -> ParameterSet {
	let mut ps = ParameterSet::new();

	// Outputs

	ps.add(Parameter::new("output_debounce")
		.set_cmd(format!(":OUTPut{}:DEBounce {{:d}}", ch))
		.get_cmd(format!(":OUTPut{}:DEBounce:STATe?", ch))
		.val_mapping(ValueMapping::on_off()));

	ps.add(Parameter::new("output_idle")
		.set_cmd(format!(":OUTPut{}:IDLE {{}}", ch))
		.get_cmd(format!(":OUTPut{}:IDLE?", ch))
		.vals(keywords_or(Validator::Ints{ min: 0, max: 65535 }, &["FPT", "TOP", "CENT", "BOTT"]))
		.parser(Parser::IntOrStr)
		.doc("Idle level of the burst mode"));

	ps.add(Parameter::new("output_load")
		.set_cmd(format!(":OUTPut{}:LOAD {{}}", ch))
		.get_cmd(format!(":OUTPut{}:LOAD?", ch))
		.vals(keywords_or(Validator::Ints{ min: 1, max: 10000 }, &["INF", "MIN", "MAX", "DEF"]))
		.parser(Parser::Float)
		.doc("Load impedance in Ohm"));

	ps.add(Parameter::new("output_polarity")
		.set_cmd(format!(":OUTPut{}:POLarity {{}}", ch))
		.get_cmd(format!(":OUTPut{}:POLarity?", ch))
		.val_mapping(normal_inverted()));

	ps.add(Parameter::new("output_skew_time")
		.set_cmd(format!(":OUTPut{}:SKEW:TIME {{}}", ch))
		.get_cmd(format!(":OUTPut{}:SKEW:TIME?", ch))
		.vals(keywords_or(Validator::Numbers{ min: -200e-9, max: 200e-9 }, &["MIN", "MAX", "DEF"]))
		.parser(Parser::Float)
		.doc("Channel-to-channel skew in s"));

	ps.add(Parameter::new("output_state")
		.set_cmd(format!(":OUTPut{}:STATe {{:d}}", ch))
		.get_cmd(format!(":OUTPut{}:STATe?", ch))
		.val_mapping(ValueMapping::on_off()));

	ps.add(Parameter::new("output_sync")
		.set_cmd(format!(":OUTPut{}:SYNC {{:d}}", ch))
		.get_cmd(format!(":OUTPut{}:SYNC?", ch))
		.val_mapping(ValueMapping::on_off()));

	ps.add(Parameter::new("output_sync_mode")
		.set_cmd(format!(":OUTPut{}:SYNC:MODE {{}}", ch))
		.get_cmd(format!(":OUTPut{}:SYNC:MODE?", ch))
		.val_mapping(ValueMapping::table(&[("normal", "NORM"), ("marker", "MARK")])));

	ps.add(Parameter::new("output_sync_polarity")
		.set_cmd(format!(":OUTPut{}:SYNC:POLarity {{}}", ch))
		.get_cmd(format!(":OUTPut{}:SYNC:POLarity?", ch))
		.val_mapping(normal_inverted()));

	ps.add(Parameter::new("output_trigger")
		.set_cmd(format!(":OUTPut{}:TRIGger {{}}", ch))
		.get_cmd(format!(":OUTPut{}:TRIGger?", ch))
		.val_mapping(ValueMapping::on_off())
		.doc("Trigger output in sweep or burst mode"));

	ps.add(Parameter::new("output_trigger_slope")
		.set_cmd(format!(":OUTPut{}:TRIGger:SLOPe {{}}", ch))
		.get_cmd(format!(":OUTPut{}:TRIGger:SLOPe?", ch))
		.val_mapping(positive_negative()));

	// Sources

	ps.add(Parameter::new("source_am_depth")
		.set_cmd(format!(":SOURce{}:AM:DEPTh {{}}", ch))
		.get_cmd(format!(":SOURce{}:AM:DEPTh?", ch))
		.vals(keywords_or(Validator::Ints{ min: 0, max: 120 }, &["MIN", "MAX"]))
		.parser(Parser::Float)
		.doc("AM depth in percent"));

	ps.add(Parameter::new("source_am_dssc")
		.set_cmd(format!(":SOURce{}:AM:DSSC {{}}", ch))
		.get_cmd(format!(":SOURce{}:AM:DSSC?", ch))
		.val_mapping(ValueMapping::on_off()));

	ps.add(Parameter::new("source_am_frequency")
		.set_cmd(format!(":SOURce{}:AM:INTernal:FREQuency {{}}", ch))
		.get_cmd(format!(":SOURce{}:AM:INTernal:FREQuency?", ch))
		.vals(keywords_or(Validator::Numbers{ min: 2e-3, max: 1e6 }, &["MIN", "MAX", "DEF"]))
		.parser(Parser::Float)
		.doc("Internal AM frequency in Hz"));

	ps.add(Parameter::new("source_burst_state")
		.set_cmd(format!(":SOURce{}:BURSt:STATe {{}}", ch))
		.get_cmd(format!(":SOURce{}:BURSt:STATe?", ch))
		.val_mapping(ValueMapping::on_off()));

	ps.add(Parameter::new("source_burst_mode")
		.set_cmd(format!(":SOURce{}:BURSt:MODE {{}}", ch))
		.get_cmd(format!(":SOURce{}:BURSt:MODE?", ch))
		.val_mapping(ValueMapping::table(&[("triggered", "TRIG"), ("gated", "GAT")])));

	ps.add(Parameter::new("source_sweep_state")
		.set_cmd(format!(":SOURce{}:SWEep:STATe {{}}", ch))
		.get_cmd(format!(":SOURce{}:SWEep:STATe?", ch))
		.val_mapping(ValueMapping::on_off()));

	// Triggering

	ps.add(Parameter::new("trigger_count")
		.set_cmd(format!(":TRIGger{}:COUNt {{}}", ch))
		.get_cmd(format!(":TRIGger{}:COUNt?", ch))
		.vals(keywords_or(Validator::Ints{ min: 1, max: 1_000_000 }, &["MIN", "MAX", "DEF"]))
		.parser(Parser::IntOrStr));

	ps.add(Parameter::new("trigger_delay")
		.set_cmd(format!(":TRIGger{}:DELay {{}}", ch))
		.get_cmd(format!(":TRIGger{}:DELay?", ch))
		.vals(keywords_or(Validator::Numbers{ min: 0.0, max: 85.0 }, &["MIN", "MAX", "DEF"]))
		.parser(Parser::Float)
		.doc("Trigger delay in s"));

	ps.add(Parameter::new("trigger_slope")
		.set_cmd(format!(":TRIGger{}:SLOPe {{}}", ch))
		.get_cmd(format!(":TRIGger{}:SLOPe?", ch))
		.val_mapping(positive_negative())
		.doc("Edge of the external trigger signal"));

	ps.add(Parameter::new("trigger_source")
		.set_cmd(format!(":TRIGger{}:SOURce {{}}", ch))
		.get_cmd(format!(":TRIGger{}:SOURce?", ch))
		.val_mapping(ValueMapping::table(&[("immediate", "IMM"), ("external", "EXT"), ("bus", "BUS"), ("timer", "TIM")])));

	ps.add(Parameter::new("trigger_timer")
		.set_cmd(format!(":TRIGger{}:TIMer {{}}", ch))
		.get_cmd(format!(":TRIGger{}:TIMer?", ch))
		.vals(keywords_or(Validator::Numbers{ min: 1e-6, max: 8000.0 }, &["MIN", "MAX"]))
		.parser(Parser::Float));

	ps
}

const FOCUS_KEYWORDS:[&str; 8] = ["CH1", "CH2", "CH3", "CH4", "CH5", "CH6", "CH7", "CH8"];

fn instrument_parameters(model:&GeneratorModel) -> ParameterSet {
	let mut ps = ParameterSet::new();

	ps.add(Parameter::new("display_brightness")
		.set_cmd(":DISPlay:BRIGhtness {:d}")
		.get_cmd(":DISPlay:BRIGhtness?")
		.vals(Validator::Ints{ min: 0, max: 100 })
		.parser(Parser::Int));

	let focus = FOCUS_KEYWORDS.iter()
		.take(model.channels)
		.enumerate()
		.map(|(i, &kw)| (Value::from(i + 1), kw))
		.collect();
	ps.add(Parameter::new("display_focus")
		.set_cmd(":DISPlay:FOCus {}")
		.get_cmd(":DISPlay:FOCus?")
		.val_mapping(ValueMapping::Table(focus))
		.doc("Channel selected on the front panel"));

	ps.add(Parameter::new("display_state")
		.set_cmd(":DISPlay:STATe {:d}")
		.get_cmd(":DISPlay:STATe?")
		.val_mapping(ValueMapping::on_off()));

	ps.add(Parameter::new("display_text")
		.set_cmd(":DISPlay:TEXT \"{:s}\"")
		.get_cmd(":DISPlay:TEXT?")
		.vals(Validator::Strings{ max_length: 40 })
		.doc("Message shown on the front panel"));

	ps.add(Parameter::new("display_unit_pulse")
		.set_cmd(":DISPlay:UNIT:PULSe {:s}")
		.get_cmd(":DISPlay:UNIT:PULSe?")
		.val_mapping(ValueMapping::table(&[("width", "WIDT"), ("duty", "DUTY")])));

	ps.add(Parameter::new("display_unit_rate")
		.set_cmd(":DISPlay:UNIT:RATE {:s}")
		.get_cmd(":DISPlay:UNIT:RATE?")
		.val_mapping(ValueMapping::table(&[("frequency", "FREQ"), ("period", "PER")])));

	ps.add(Parameter::new("display_unit_sweep")
		.set_cmd(":DISPlay:UNIT:SWEep {:s}")
		.get_cmd(":DISPlay:UNIT:SWEep?")
		.val_mapping(ValueMapping::table(&[("start-stop", "STAR"), ("center-span", "CENT")])));

	ps.add(Parameter::new("display_unit_voltage")
		.set_cmd(":DISPlay:UNIT:VOLTage {:s}")
		.get_cmd(":DISPlay:UNIT:VOLTage?")
		.val_mapping(ValueMapping::table(&[("amplitude-offset", "AMPL"), ("high-low", "HIGH")])));

	ps.add(Parameter::new("display_view")
		.set_cmd(":DISPlay:VIEW {:s}")
		.get_cmd(":DISPlay:VIEW?")
		.val_mapping(ValueMapping::Table(vec![
			(Value::from("auto"), "AUTO"),
			(Value::Int(2), "DUAL"),
			(Value::Int(4), "FOUR"),
			(Value::Int(8), "EIGH"),
		]))
		.doc("Number of channel windows"));

	ps.add(Parameter::new("screen_capture_format")
		.set_cmd(":HCOPy:SDUMp:DATA:FORMat {}")
		.get_cmd(":HCOPy:SDUMp:DATA:FORMat?")
		.val_mapping(ValueMapping::table(&[("png", "PNG"), ("bmp", "BMP")])));

	ps
}

// Image format from the file extension, matched case-insensitively
fn capture_format(path:&Path) -> Result<&'static str> {
	let ext = path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase());
	match ext.as_deref() {
		Some("png") => Ok("png"),
		Some("bmp") => Ok("bmp"),
		_ => Err(Error::InvalidValue{
			name: "screen_capture".to_owned(),
			reason: format!("{} is not a .png or .bmp file", path.display()),
		}),
	}
}

pub struct RigolDG5000Pro<S: Session = CoreClient> {
	session: S,
	identity: Identity,
	model: &'static GeneratorModel,
	params: ParameterSet,
	channels: Vec<ParameterSet>,
}

impl RigolDG5000Pro<CoreClient> {

	pub fn connect(cfg:&Config) -> Result<Self> {
		Self::new(CoreClient::open(cfg)?)
	}

}

impl<S: Session> RigolDG5000Pro<S> {

	pub fn new(mut session:S) -> Result<Self> {
		let identity = Identity::query(&mut session)?;
		let model = lookup_model(&identity.model)?;
		info!("Connected to {} {} with {} channels", identity.manufacturer, identity.model, model.channels);

		let channels = (1..=model.channels).map(channel_parameters).collect();
		Ok(Self{ session, identity, model, params: instrument_parameters(model), channels })
	}

	pub fn identity(&self) -> &Identity { &self.identity }
	pub fn model(&self) -> &GeneratorModel { self.model }
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

	/// Generates a trigger event on one channel.
	pub fn channel_trigger(&mut self, ch:usize) -> Result<()> {
		check_channel(ch, self.channel_count())?;
		self.write(&format!(":TRIGger{}", ch))
	}

	/// Outputs a ramp with the highest symmetry available at `frequency`.
	pub fn source_apply_ramp(&mut self, ch:usize, frequency:f64, amplitude:f64, offset:f64, phase:f64) -> Result<()> {
		check_channel(ch, self.channel_count())?;
		self.write(&format!(":SOURce{}:APPLy:RAMP {},{},{},{}", ch, frequency, amplitude, offset, phase))
	}

	/// Stops any triggered operation.
	pub fn abort(&mut self) -> Result<()> { self.write(":ABORt") }

	/// Switches every channel output on or off at once.
	pub fn all(&mut self, on:bool) -> Result<()> {
		self.write(if on { ":ALL 1" } else { ":ALL 0" })
	}

	pub fn display_clear_text(&mut self) -> Result<()> { self.write(":DISPlay:TEXT:CLEar") }

	/// Reads the screen as an image in the currently selected format.
	pub fn screen_capture_bytes(&mut self) -> Result<Vec<u8>> {
		self.session.write(":HCOPy:SDUMp:DATA?")?;
		let img = block::decode(&self.session.read_raw()?)?;
		debug!("Screen capture is {} bytes", img.len());
		Ok(img)
	}

	/// Saves the screen to `path`, choosing PNG or BMP from its extension.
	pub fn screen_capture<P: AsRef<Path>>(&mut self, path:P) -> Result<()> {
		let path = path.as_ref();
		let fmt = capture_format(path)?;

		self.set("screen_capture_format", fmt)?;
		let img = self.screen_capture_bytes()?;

		let mut file = File::create(path)?;
		file.write_all(&img)?;
		info!("Wrote screen capture to {}", path.display());
		Ok(())
	}

	/// `*OPC?`, which answers 1 once every pending command has completed.
	pub fn opc(&mut self) -> Result<i64> {
		let reply = self.session.ask("*OPC?")?;
		reply.trim().parse::<i64>()
			.map_err(|_| Error::UnexpectedResponse(format!("{:?} for *OPC?", reply)))
	}

	/// Clears the event registers and the error queue.
	pub fn clear(&mut self) -> Result<()> { self.write("*CLS") }

	pub fn options(&mut self) -> Result<Vec<String>> {
		let reply = self.session.ask("*OPT?")?;
		Ok(reply.split(',').map(|s| s.trim().to_owned()).collect())
	}

	pub fn reset(&mut self) -> Result<()> { self.write("*RST") }

	/// Stores the instrument state in non-volatile slot 0 to 5.
	pub fn save(&mut self, slot:u32) -> Result<()> {
		if !SAVE_SLOTS.contains(&slot) {
			return Err(Error::InvalidValue{ name: "save".to_owned(), reason: format!("slot {} is not in 0..=5", slot) });
		}
		self.write(&format!("*SAVE {}", slot))
	}

	pub fn trigger(&mut self) -> Result<()> { self.write("*TRG") }

	pub fn wait(&mut self) -> Result<()> { self.write("*WAI") }

	fn write(&mut self, cmd:&str) -> Result<()> {
		self.session.write(cmd)?;
		Ok(())
	}

}
