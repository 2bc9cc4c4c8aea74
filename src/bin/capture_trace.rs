extern crate env_logger;
extern crate rigol;
extern crate serde_cbor;
extern crate serde_json;

use std::env;
use std::fs::File;
use std::io::{self, Error, ErrorKind};
use std::path::Path;

use log::info;

use rigol::Config;
use rigol::devices::ds8000r::RigolDS8000R;
use rigol::waveform::WaveFormat;

// Usage: capture_trace <config.json | host> <channel> <out.json | out.cbor> [points]
pub fn main() -> io::Result<()> {
	env_logger::init();

	let args:Vec<String> = env::args().collect();
	if args.len() < 4 {
		return Err(Error::new(ErrorKind::InvalidInput, "Usage: capture_trace <config.json | host> <channel> <out.json | out.cbor> [points]"));
	}

	let cfg = if args[1].ends_with(".json") { Config::from_file(&args[1])? } else { Config::for_host(&args[1]) };
	let channel:usize = args[2].parse().map_err(|_| Error::new(ErrorKind::InvalidInput, "Channel must be a number"))?;
	let out_path = Path::new(&args[3]);
	let points:Option<usize> = match args.get(4) {
		Some(p) => Some(p.parse().map_err(|_| Error::new(ErrorKind::InvalidInput, "Points must be a number"))?),
		None => None,
	};

	let mut scope = RigolDS8000R::connect(&cfg)?;
	println!("{}", serde_json::to_string_pretty(scope.identity())?);

	// Traces are only readable from a halted acquisition
	scope.stop()?;
	let trace = scope.get_trace_volts(channel, WaveFormat::Word, points)?;
	info!("Captured {} samples at {:.3e} Sa/s", trace.voltage.len(), trace.sample_rate());

	let file = File::create(out_path)?;
	match out_path.extension().and_then(|e| e.to_str()) {
		Some("cbor") => serde_cbor::to_writer(file, &trace).map_err(|e| Error::new(ErrorKind::Other, e))?,
		_            => serde_json::to_writer(file, &trace)?,
	}

	let (min, max) = trace.voltage.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
	println!("CH{}: {} samples from {:.3} V to {:.3} V, written to {}", channel, trace.voltage.len(), min, max, out_path.display());

	Ok(())
}
