use std::env;
use std::fs;

use assert_matches::assert_matches;

use rigol::block;
use rigol::devices::dg5000pro::RigolDG5000Pro;
use rigol::params::Value;
use rigol::{Error, ScriptedSession};

fn session(model:&str) -> ScriptedSession {
	ScriptedSession::new().reply("*IDN?", &format!("RIGOL TECHNOLOGIES,{},DG5P261900123,00.01.03", model))
}

#[test]
fn channel_count_follows_the_model() {
	for &(model, channels) in &[("DG5508 Pro", 8), ("DG5354 Pro", 4), ("DG5252 Pro", 2)] {
		let awg = RigolDG5000Pro::new(session(model)).unwrap();
		assert_eq!(awg.model().name, model);
		assert_eq!(awg.channel_count(), channels);
	}
}

#[test]
fn unknown_model_is_rejected() {
	assert_matches!(RigolDG5000Pro::new(session("DG4162")).err(), Some(Error::UnknownModel(_)));
}

#[test]
fn channels_beyond_the_model_are_out_of_range() {
	let mut awg = RigolDG5000Pro::new(session("DG5252 Pro")).unwrap();

	awg.channel_set(2, "output_state", true).unwrap();
	assert_matches!(awg.channel_set(3, "output_state", true), Err(Error::ChannelOutOfRange{ channel: 3, count: 2 }));
	assert_matches!(awg.channel_trigger(3), Err(Error::ChannelOutOfRange{ .. }));
	assert_matches!(awg.source_apply_ramp(0, 1e3, 1.0, 0.0, 0.0), Err(Error::ChannelOutOfRange{ .. }));
}

#[test]
fn display_focus_is_limited_to_existing_channels() {
	let s = session("DG5252 Pro").reply(":DISPlay:FOCus?", "CH2");
	let mut awg = RigolDG5000Pro::new(s).unwrap();

	awg.set("display_focus", 2).unwrap();
	assert_matches!(awg.set("display_focus", 3), Err(Error::InvalidValue{ .. }));
	assert_eq!(awg.get("display_focus").unwrap(), Value::Int(2));
	assert_eq!(awg.session_mut().commands()[1], ":DISPlay:FOCus CH2");
}

#[test]
fn display_view_mixes_keywords_and_counts() {
	let s = session("DG5508 Pro")
		.reply(":DISPlay:VIEW?", "AUTO")
		.reply(":DISPlay:VIEW?", "EIGH");
	let mut awg = RigolDG5000Pro::new(s).unwrap();

	awg.set("display_view", 4).unwrap();
	awg.set("display_view", "auto").unwrap();
	assert_matches!(awg.set("display_view", 3), Err(Error::InvalidValue{ .. }));
	assert_eq!(awg.get("display_view").unwrap(), Value::from("auto"));
	assert_eq!(awg.get("display_view").unwrap(), Value::Int(8));
	assert_eq!(&awg.session_mut().commands()[1..3], &[":DISPlay:VIEW FOUR".to_owned(), ":DISPlay:VIEW AUTO".to_owned()]);
}

#[test]
fn display_text_is_quoted_and_limited() {
	let s = session("DG5252 Pro").reply(":DISPlay:TEXT?", "hello");
	let mut awg = RigolDG5000Pro::new(s).unwrap();

	awg.set("display_text", "hello").unwrap();
	assert_matches!(awg.set("display_text", "x".repeat(41)), Err(Error::InvalidValue{ .. }));
	assert_eq!(awg.get("display_text").unwrap(), Value::from("hello"));
	awg.display_clear_text().unwrap();

	let cmds = awg.session_mut().commands().to_vec();
	assert_eq!(cmds[1], ":DISPlay:TEXT \"hello\"");
	assert_eq!(cmds[3], ":DISPlay:TEXT:CLEar");
}

#[test]
fn display_text_quotes_are_escaped() {
	let mut awg = RigolDG5000Pro::new(session("DG5252 Pro")).unwrap();

	awg.set("display_text", "say \"hi\"").unwrap();
	assert_eq!(awg.session_mut().commands()[1], ":DISPlay:TEXT \"say \"\"hi\"\"\"");
}

#[test]
fn parameter_listing_covers_every_channel() {
	let awg = RigolDG5000Pro::new(session("DG5254 Pro")).unwrap();

	for ch in 1..=4 {
		let listed:Vec<(&str, &str)> = awg.channel_parameters(ch).unwrap().describe().collect();
		assert_eq!(listed.len(), 22);
		assert!(listed.contains(&("trigger_delay", "Trigger delay in s")));
	}
	assert_matches!(awg.channel_parameters(5), Err(Error::ChannelOutOfRange{ .. }));
	assert!(awg.parameters().describe().any(|(name, _)| name == "screen_capture_format"));
}

#[test]
fn channel_parameters() {
	let s = session("DG5254 Pro")
		.reply(":OUTPut1:IDLE?", "TOP")
		.reply(":OUTPut1:IDLE?", "32768")
		.reply(":TRIGger3:COUNt?", "5")
		.reply(":OUTPut4:LOAD?", "5.000000E+01")
		.reply(":SOURce2:BURSt:MODE?", "GAT");
	let mut awg = RigolDG5000Pro::new(s).unwrap();

	awg.channel_set(1, "output_idle", 100).unwrap();
	awg.channel_set(1, "output_idle", "CENT").unwrap();
	awg.channel_set(2, "output_sync_polarity", "inverted").unwrap();
	awg.channel_set(2, "output_trigger_slope", "negative").unwrap();
	awg.channel_set(3, "trigger_source", "bus").unwrap();
	awg.channel_set(3, "output_debounce", false).unwrap();
	awg.channel_set(4, "output_skew_time", "MAX").unwrap();

	assert_matches!(awg.channel_set(1, "output_idle", 70000), Err(Error::InvalidValue{ .. }));
	assert_matches!(awg.channel_set(4, "output_load", 0), Err(Error::InvalidValue{ .. }));
	assert_matches!(awg.channel_set(4, "trigger_timer", 9000.0), Err(Error::InvalidValue{ .. }));

	assert_eq!(awg.channel_get(1, "output_idle").unwrap(), Value::from("TOP"));
	assert_eq!(awg.channel_get(1, "output_idle").unwrap(), Value::Int(32768));
	assert_eq!(awg.channel_get(3, "trigger_count").unwrap(), Value::Int(5));
	assert_eq!(awg.channel_get(4, "output_load").unwrap(), Value::Float(50.0));
	assert_eq!(awg.channel_get(2, "source_burst_mode").unwrap(), Value::from("gated"));

	assert_eq!(&awg.session_mut().commands()[1..8], &[
		":OUTPut1:IDLE 100".to_owned(),
		":OUTPut1:IDLE CENT".to_owned(),
		":OUTPut2:SYNC:POLarity INV".to_owned(),
		":OUTPut2:TRIGger:SLOPe NEG".to_owned(),
		":TRIGger3:SOURce BUS".to_owned(),
		":OUTPut3:DEBounce 0".to_owned(),
		":OUTPut4:SKEW:TIME MAX".to_owned(),
	]);
}

#[test]
fn apply_ramp_and_channel_trigger() {
	let mut awg = RigolDG5000Pro::new(session("DG5252 Pro")).unwrap();

	awg.source_apply_ramp(1, 1000.0, 2.0, 0.5, 90.0).unwrap();
	awg.channel_trigger(2).unwrap();
	awg.all(true).unwrap();
	awg.all(false).unwrap();

	assert_eq!(&awg.session_mut().commands()[1..], &[
		":SOURce1:APPLy:RAMP 1000,2,0.5,90".to_owned(),
		":TRIGger2".to_owned(),
		":ALL 1".to_owned(),
		":ALL 0".to_owned(),
	]);
}

#[test]
fn screen_capture_to_file() {
	let img = b"\x89PNG\r\n\x1a\n0123456789IEND".to_vec();
	let mut reply = block::encode(&img);
	reply.push(b'\n');

	let s = session("DG5252 Pro").reply_raw(":HCOPy:SDUMp:DATA?", reply);
	let mut awg = RigolDG5000Pro::new(s).unwrap();

	let path = env::temp_dir().join(format!("rigol_screen_capture_{}.png", std::process::id()));
	awg.screen_capture(&path).unwrap();

	assert_eq!(fs::read(&path).unwrap(), img);
	fs::remove_file(&path).unwrap();

	assert_eq!(&awg.session_mut().commands()[1..], &[
		":HCOPy:SDUMp:DATA:FORMat PNG".to_owned(),
		":HCOPy:SDUMp:DATA?".to_owned(),
	]);
}

#[test]
fn screen_capture_needs_an_image_extension() {
	let mut awg = RigolDG5000Pro::new(session("DG5252 Pro")).unwrap();

	assert_matches!(awg.screen_capture("capture.jpg"), Err(Error::InvalidValue{ .. }));
	assert_matches!(awg.screen_capture("capture"), Err(Error::InvalidValue{ .. }));
	assert_eq!(awg.session_mut().commands().len(), 1);
}

#[test]
fn common_commands() {
	let s = session("DG5252 Pro")
		.reply("*OPC?", "1")
		.reply("*OPT?", "DG5-ARB,DG5-IQ");
	let mut awg = RigolDG5000Pro::new(s).unwrap();

	assert_eq!(awg.opc().unwrap(), 1);
	assert_eq!(awg.options().unwrap(), vec!["DG5-ARB".to_owned(), "DG5-IQ".to_owned()]);
	awg.clear().unwrap();
	awg.save(3).unwrap();
	assert_matches!(awg.save(6), Err(Error::InvalidValue{ .. }));
	awg.trigger().unwrap();
	awg.wait().unwrap();
	awg.abort().unwrap();
	awg.reset().unwrap();

	assert_eq!(&awg.session_mut().commands()[3..], &[
		"*CLS".to_owned(),
		"*SAVE 3".to_owned(),
		"*TRG".to_owned(),
		"*WAI".to_owned(),
		":ABORt".to_owned(),
		"*RST".to_owned(),
	]);
}
