extern crate env_logger;
extern crate rigol;
extern crate rustfft;

use std::env;
use std::io::{self, Error, ErrorKind};
use std::thread;
use std::time::Duration;

use log::info;
use rustfft::FFTplanner;
use rustfft::num_complex::Complex;
use rustfft::num_traits::Zero;

use rigol::Config;
use rigol::devices::dg5000pro::RigolDG5000Pro;
use rigol::devices::ds8000r::RigolDS8000R;
use rigol::waveform::WaveFormat;

fn config(arg:&str) -> io::Result<Config> {
	if arg.ends_with(".json") { Config::from_file(arg) } else { Ok(Config::for_host(arg)) }
}

// Drives generator CH1 with a ramp, captures it on scope CH1 and checks the strongest
// frequency in the capture matches the one programmed.
//
// Usage: loopback_check <generator config | host> <scope config | host> [freq_hz]
pub fn main() -> io::Result<()> {
	env_logger::init();

	let args:Vec<String> = env::args().collect();
	if args.len() < 3 {
		return Err(Error::new(ErrorKind::InvalidInput, "Usage: loopback_check <generator config | host> <scope config | host> [freq_hz]"));
	}

	let freq_hz:f64 = match args.get(3) {
		Some(f) => f.parse().map_err(|_| Error::new(ErrorKind::InvalidInput, "Frequency must be a number"))?,
		None => 1.0e6,
	};
	let amp_v:f64 = 1.0;

	let mut awg = RigolDG5000Pro::connect(&config(&args[1])?)?;
	let mut scope = RigolDS8000R::connect(&config(&args[2])?)?;

	// Set up waveform generator
	awg.source_apply_ramp(1, freq_hz, amp_v, 0.0, 0.0)?;
	awg.channel_set(1, "output_state", true)?;

	// Set up oscilloscope to show roughly ten periods
	scope.channel_set(1, "display", true)?;
	scope.channel_set(1, "coupling", "DC")?;
	scope.channel_set(1, "scale", amp_v / 4.0)?;
	scope.set("timebase_scale", 1.0 / freq_hz)?;

	scope.single()?;
	thread::sleep(Duration::new(1, 0));
	scope.trigger_force()?;
	thread::sleep(Duration::new(1, 0));
	scope.stop()?;

	let trace = scope.get_trace_volts(1, WaveFormat::Byte, None)?;
	awg.channel_set(1, "output_state", false)?;

	let length = trace.voltage.len();
	if length < 4 {
		return Err(Error::new(ErrorKind::Other, format!("Only {} samples captured", length)));
	}

	// Perform FFT
	let mean = trace.voltage.iter().sum::<f64>() / length as f64;
	let mut time_domain:Vec<Complex<f64>> = trace.voltage.iter().map(|v| Complex{ re: v - mean, im: 0.0 }).collect();
	let mut freq_domain:Vec<Complex<f64>> = vec![Complex::zero(); length];
	let mut planner = FFTplanner::new(false);
	let fft = planner.plan_fft(length);
	fft.process(&mut time_domain, &mut freq_domain);

	// Find the strongest frequency below Nyquist
	let mut best_idx:usize = 1;
	let mut best_amp:f64 = 0.0;
	for (idx, fft_response) in freq_domain.iter().enumerate().take(length / 2).skip(1) {
		if best_amp < fft_response.norm_sqr() {
			best_amp = fft_response.norm_sqr();
			best_idx = idx;
		}
	}
	let best_freq = best_idx as f64 * trace.sample_rate() / length as f64;
	info!("Strongest bin {} of {}", best_idx, length);

	println!("{:.2} [kHz] programmed vs {:.2} [kHz] measured, ratio {:.5}", freq_hz / 1.0e3, best_freq / 1.0e3, freq_hz / best_freq);
	if (1.0 - freq_hz / best_freq).abs() > 0.06 {
		return Err(Error::new(ErrorKind::Other, "Measured frequency is more than 6% off"));
	}

	Ok(())
}
