extern crate env_logger;
extern crate rigol;

use std::env;
use std::io::{self, Error, ErrorKind};

use rigol::Config;
use rigol::devices::{dg5000pro, ds8000r, Identity};
use rigol::params::ParameterSet;
use rigol::vxi11::CoreClient;

fn print_set(title:&str, ps:&ParameterSet) {
	println!("\n{}", title);
	for (name, doc) in ps.describe() {
		if doc.is_empty() { println!("  {}", name); }
		else { println!("  {:<28}{}", name, doc); }
	}
}

// Prints every named parameter of the connected instrument with its description
//
// Usage: list_parameters <config.json | host>
pub fn main() -> io::Result<()> {
	env_logger::init();

	let arg = env::args().nth(1)
		.ok_or_else(|| Error::new(ErrorKind::InvalidInput, "Usage: list_parameters <config.json | host>"))?;
	let cfg = if arg.ends_with(".json") { Config::from_file(&arg)? } else { Config::for_host(&arg) };

	let mut session = CoreClient::open(&cfg)?;
	let idn = Identity::query(&mut session)?;
	println!("{} {} ({})", idn.manufacturer, idn.model, idn.fw_version);

	if ds8000r::lookup_model(&idn.model).is_ok() {
		let scope = ds8000r::RigolDS8000R::new(session)?;
		print_set("Instrument", scope.parameters());
		for ch in 1..=scope.channel_count() {
			print_set(&format!("Channel {}", ch), scope.channel_parameters(ch)?);
		}
	} else {
		let awg = dg5000pro::RigolDG5000Pro::new(session)?;
		print_set("Instrument", awg.parameters());
		for ch in 1..=awg.channel_count() {
			print_set(&format!("Channel {}", ch), awg.channel_parameters(ch)?);
		}
	}

	Ok(())
}
