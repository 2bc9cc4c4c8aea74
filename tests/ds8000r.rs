use assert_matches::assert_matches;

use rigol::block;
use rigol::devices::ds8000r::{RigolDS8000R, TriggerStatus};
use rigol::params::Value;
use rigol::waveform::{RawSamples, WaveFormat};
use rigol::{Error, ScriptedSession, Session};

const IDN:&str = "RIGOL TECHNOLOGIES,DS8204-R,DS8A2340000123,00.01.02.00.02";

fn session() -> ScriptedSession {
	ScriptedSession::new().reply("*IDN?", IDN)
}

fn block_reply(payload:&[u8]) -> Vec<u8> {
	let mut v = block::encode(payload);
	v.push(b'\n');
	v
}

fn assert_close(a:&[f64], b:&[f64]) {
	assert_eq!(a.len(), b.len());
	for (x, y) in a.iter().zip(b) {
		assert!((x - y).abs() < 1e-9, "{} != {}", x, y);
	}
}

#[test]
fn resolves_model_from_idn() {
	let scope = RigolDS8000R::new(session()).unwrap();
	assert_eq!(scope.identity().manufacturer, "RIGOL TECHNOLOGIES");
	assert_eq!(scope.model().name, "DS8204-R");
	assert_eq!(scope.channel_count(), 4);
}

#[test]
fn unknown_model_is_rejected() {
	let s = ScriptedSession::new().reply("*IDN?", "RIGOL TECHNOLOGIES,DS1054Z,DS1ZA000000001,00.04.04");
	assert_matches!(RigolDS8000R::new(s).err(), Some(Error::UnknownModel(ref m)) if m == "DS1054Z");
}

#[test]
fn trace_needs_a_stopped_acquisition() {
	let s = session()
		.reply(":TRIGger:STATus?", "RUN")
		.reply_raw(":WAVeform:DATA?", block_reply(&[1, 2, 3]));
	let mut scope = RigolDS8000R::new(s).unwrap();

	assert_matches!(scope.get_trace(1, WaveFormat::Byte, None), Err(Error::InvalidAcquisitionState(ref st)) if st == "RUN");
	assert_eq!(scope.session_mut().commands(), &["*IDN?".to_owned(), ":TRIGger:STATus?".to_owned()]);
}

#[test]
fn byte_trace_pipeline() {
	let s = session()
		.reply(":TRIGger:STATus?", "STOP")
		.reply_raw(":WAVeform:DATA?", block_reply(&[128, 138, 118]))
		.reply(":WAVeform:PREamble?", "0,2,3,1,1.000000e-09,-5.000000e-06,0,4.000000e-02,0,128");
	let mut scope = RigolDS8000R::new(s).unwrap();

	let trace = scope.get_trace_volts(1, WaveFormat::Byte, Some(3)).unwrap();
	assert_close(&trace.voltage, &[0.0, 0.4, -0.4]);
	assert_close(&trace.time, &[-5e-6, -5e-6 + 1e-9, -5e-6 + 2e-9]);

	assert_eq!(scope.session_mut().commands(), &[
		"*IDN?".to_owned(),
		":TRIGger:STATus?".to_owned(),
		":WAVeform:SOURce CHAN1".to_owned(),
		":WAVeform:FORMat BYTE".to_owned(),
		":WAVeform:MODE RAW".to_owned(),
		":WAVeform:POINts 3".to_owned(),
		":WAVeform:PREamble?".to_owned(),
		":WAVeform:DATA?".to_owned(),
	]);
}

#[test]
fn word_trace_pipeline() {
	let s = session()
		.reply(":TRIGger:STATus?", "STOP")
		.reply_raw(":WAVeform:DATA?", block_reply(&[0x00, 0x80, 0x0a, 0x80]))
		.reply(":WAVeform:PREamble?", "1,2,2,1,1.000000e-09,0,0,1.000000e-03,0,32768");
	let mut scope = RigolDS8000R::new(s).unwrap();

	let trace = scope.get_trace_volts(2, WaveFormat::Word, None).unwrap();
	assert_close(&trace.voltage, &[0.0, 0.01]);
	assert!(scope.session_mut().commands().contains(&":WAVeform:FORMat WORD".to_owned()));
	assert!(scope.session_mut().commands().contains(&":WAVeform:SOURce CHAN2".to_owned()));
}

#[test]
fn raw_codes_from_a_named_source() {
	let s = session()
		.reply(":TRIGger:STATus?", "STOP")
		.reply_raw(":WAVeform:DATA?", block_reply(&[0x34, 0x12]));
	let mut scope = RigolDS8000R::new(s).unwrap();

	assert_eq!(scope.get_trace("MATH3", WaveFormat::Word, None).unwrap(), RawSamples::Word(vec![0x1234]));
	assert!(scope.session_mut().commands().contains(&":WAVeform:SOURce MATH3".to_owned()));
}

#[test]
fn preamble_format_must_match_the_data() {
	let s = session()
		.reply(":TRIGger:STATus?", "STOP")
		.reply_raw(":WAVeform:DATA?", block_reply(&[0x00, 0x80]))
		.reply(":WAVeform:PREamble?", "0,2,2,1,1e-9,0,0,1e-3,0,128");
	let mut scope = RigolDS8000R::new(s).unwrap();

	assert_matches!(scope.get_trace_volts(1, WaveFormat::Word, None), Err(Error::UnexpectedResponse(_)));
	assert!(!scope.session_mut().commands().contains(&":WAVeform:DATA?".to_owned()));
}

#[test]
fn parameter_listing_carries_docs() {
	let scope = RigolDS8000R::new(session()).unwrap();

	let ch1:Vec<(&str, &str)> = scope.channel_parameters(1).unwrap().describe().collect();
	assert_eq!(ch1.len(), 14);
	assert!(ch1.contains(&("scale", "Vertical scale in V/div")));
	assert!(scope.parameters().describe().any(|(name, doc)| name == "acquire_mdepth" && !doc.is_empty()));
	assert_matches!(scope.channel_parameters(5), Err(Error::ChannelOutOfRange{ channel: 5, count: 4 }));
}

#[test]
fn ascii_and_bad_channels_are_rejected() {
	let s = session().always(":TRIGger:STATus?", "STOP");
	let mut scope = RigolDS8000R::new(s).unwrap();

	assert_matches!(scope.get_trace(1, WaveFormat::Ascii, None), Err(Error::UnsupportedFormat(_)));
	assert_matches!(scope.get_trace(5, WaveFormat::Byte, None), Err(Error::ChannelOutOfRange{ channel: 5, count: 4 }));
	assert_matches!(scope.get_trace("CHAN9", WaveFormat::Byte, None), Err(Error::InvalidValue{ .. }));
	assert!(!scope.session_mut().commands().contains(&":WAVeform:DATA?".to_owned()));
}

#[test]
fn truncated_block_is_a_length_mismatch() {
	let s = session()
		.reply(":TRIGger:STATus?", "STOP")
		.reply_raw(":WAVeform:DATA?", b"#15abc\n".to_vec());
	let mut scope = RigolDS8000R::new(s).unwrap();

	assert_matches!(scope.get_trace(1, WaveFormat::Byte, None), Err(Error::LengthMismatch{ declared: 5, actual: 3 }));
}

#[test]
fn trigger_status_values() {
	let s = session()
		.reply(":TRIGger:STATus?", "TD")
		.reply(":TRIGger:STATus?", "AUTO")
		.reply(":TRIGger:STATus?", "BOGUS");
	let mut scope = RigolDS8000R::new(s).unwrap();

	assert_eq!(scope.trigger_status().unwrap(), TriggerStatus::Td);
	assert_eq!(scope.trigger_status().unwrap(), TriggerStatus::Auto);
	assert_matches!(scope.trigger_status(), Err(Error::UnexpectedResponse(_)));
}

#[test]
fn channel_parameters() {
	let s = session()
		.reply(":CHANnel1:IMPedance?", "FIFT")
		.reply(":CHANnel3:DISPlay?", "1")
		.reply(":CHANnel2:PROBe?", "1.000000E+01");
	let mut scope = RigolDS8000R::new(s).unwrap();

	scope.channel_set(2, "scale", 0.5).unwrap();
	scope.channel_set(4, "coupling", "AC").unwrap();
	scope.channel_set(1, "impedance", "1 MOhm").unwrap();
	scope.calibrate(3).unwrap();
	assert_eq!(scope.channel_get(1, "impedance").unwrap(), Value::from("50 Ohm"));
	assert_eq!(scope.channel_get(3, "display").unwrap(), Value::Bool(true));
	assert_eq!(scope.channel_get(2, "probe").unwrap(), Value::Float(10.0));

	assert_matches!(scope.channel_set(1, "scale", 20.0), Err(Error::InvalidValue{ .. }));
	assert_matches!(scope.channel_set(1, "probe", 3), Err(Error::InvalidValue{ .. }));
	assert_matches!(scope.channel_set(0, "scale", 1.0), Err(Error::ChannelOutOfRange{ .. }));
	assert_matches!(scope.channel_set(1, "gain", 1.0), Err(Error::UnknownParameter(_)));

	assert_eq!(&scope.session_mut().commands()[1..5], &[
		":CHANnel2:SCALe 0.500000".to_owned(),
		":CHANnel4:COUPling AC".to_owned(),
		":CHANnel1:IMPedance OMEG".to_owned(),
		":CHANnel3:CSTart".to_owned(),
	]);
}

#[test]
fn bandwidth_limits_follow_the_model() {
	let s = ScriptedSession::new().reply("*IDN?", "RIGOL TECHNOLOGIES,DS8034-R,DS8A0000000001,00.01.02");
	let mut scope = RigolDS8000R::new(s).unwrap();

	scope.channel_set(1, "bandwidth_limit", "250M").unwrap();
	assert_matches!(scope.channel_set(1, "bandwidth_limit", "500M"), Err(Error::InvalidValue{ .. }));

	let mut wide = RigolDS8000R::new(session()).unwrap();
	wide.channel_set(1, "bandwidth_limit", "500M").unwrap();
}

#[test]
fn instrument_parameters() {
	let s = session()
		.reply(":ACQuire:MDEPth?", "1.0000E+06")
		.reply(":TIMebase:MODE?", "ROLL");
	let mut scope = RigolDS8000R::new(s).unwrap();

	scope.set("timebase_scale", 1e-3).unwrap();
	scope.set("timebase_href_mode", "left_border").unwrap();
	scope.set("acquire_mdepth", "10M").unwrap();
	assert_eq!(scope.get("acquire_mdepth").unwrap(), Value::Float(1.0e6));
	assert_eq!(scope.get("timebase_mode").unwrap(), Value::from("roll"));
	assert_matches!(scope.set("timebase_href_position", 600), Err(Error::InvalidValue{ .. }));

	scope.run().unwrap();
	scope.single().unwrap();
	scope.trigger_force().unwrap();
	scope.stop().unwrap();

	let cmds = scope.session_mut().commands().to_vec();
	assert_eq!(cmds[1], ":TIMebase:SCALe 0.001");
	assert_eq!(cmds[2], ":TIMebase:HREFerence:MODE LB");
	assert_eq!(cmds[3], ":ACQuire:MDEPth 10M");
	assert_eq!(&cmds[cmds.len() - 4..], &[":RUN".to_owned(), ":SINGle".to_owned(), ":TFORce".to_owned(), ":STOP".to_owned()]);
}

#[test]
fn driver_works_over_a_boxed_session() {
	let boxed:Box<dyn Session> = Box::new(session());
	let scope = RigolDS8000R::new(boxed).unwrap();
	assert_eq!(scope.model().name, "DS8204-R");
}
