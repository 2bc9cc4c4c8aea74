// Device core
pub const DEVICE_CORE_PROG:u32  = 0x0607af;
pub const DEVICE_CORE_VERS:u32  = 1;
pub const CREATE_LINK:u32       = 10;
pub const DEVICE_WRITE:u32      = 11;
pub const DEVICE_READ:u32       = 12;
pub const DESTROY_LINK:u32      = 23;

pub const CLIENT_ID:i32 = 3333;

pub const OPERATION_FLAGS_END:i32 = 8;

// Reason bits in a device_read reply
pub const REASON_REQCNT:i32 = 1;
pub const REASON_CHR:i32    = 2;
pub const REASON_END:i32    = 4;

pub const LINE_TERMINATOR:u8 = b'\n';

use std::io::{self, Error, ErrorKind};
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};

use crate::config::Config;
use crate::rpc::port_mapping::{TcpPortMapperClient, Mapping};
use crate::rpc::tcp_clients::TcpClient;
use crate::session::Session;

fn err(msg:&str) -> io::Error { Error::new(ErrorKind::Other, msg) }

fn device_error(code:i32) -> io::Error {
	match code {
		1  => err("Syntax error"),
		3  => err("Device not accessible"),
		4  => err("Invalid link identifier"),
		5  => err("Parameter error"),
		9  => err("Out of resources"),
		11 => err("Device locked by another link"),
		15 => Error::new(ErrorKind::TimedOut, "I/O timeout"),
		17 => err("I/O error"),
		21 => err("Invalid address"),
		23 => err("Abort"),
		_  => Error::new(ErrorKind::Other, format!("Unknown VXI-11 device error {}", code)),
	}
}

pub mod xdr_pack;

pub struct Link {
	pub link_id: i32,
	pub max_recv_size: u32,
}

/// A VXI-11 core channel to one instrument, used as its [`Session`].
pub struct CoreClient {
	client: TcpClient,
	link: Option<Link>,
	io_timeout: u32,
	lock_timeout: u32,
	tx_throttle: Duration,
}

impl CoreClient {

	/// Looks the core channel up through the portmapper, connects and creates a link.
	pub fn open(cfg:&Config) -> io::Result<Self> {
		let mut pmap_client = TcpPortMapperClient::new(&cfg.host)?;
		let port = pmap_client.get_port(&Mapping{ program: DEVICE_CORE_PROG, version: DEVICE_CORE_VERS, port: 0 })?;

		let mut client = TcpClient::connect((cfg.host.as_str(), port), DEVICE_CORE_PROG, DEVICE_CORE_VERS)?;
		// Leave the device its own timeout before the socket gives up
		client.set_timeout(Some(cfg.io_timeout() + Duration::from_secs(1)))?;

		let mut core = CoreClient {
			client,
			link: None,
			io_timeout: cfg.io_timeout_ms,
			lock_timeout: cfg.lock_timeout_ms,
			tx_throttle: cfg.tx_throttle(),
		};
		core.create_link(&cfg.device)?;
		info!("Opened VXI-11 link to {} ({}) on port {}", cfg.host, cfg.device, port);

		Ok(core)
	}

	fn link(&self) -> io::Result<&Link> {
		self.link.as_ref().ok_or_else(|| err("No link"))
	}

	fn create_link(&mut self, device:&str) -> io::Result<()> {
		if self.link.is_some() {
			return Err(err("Already connected to a link"));
		}

		self.client.start_call(CREATE_LINK)?;
		xdr_pack::pack_create_link_parms(&mut self.client.packer, CLIENT_ID, false, self.lock_timeout, device)?;
		self.client.do_call()?;

		let error:i32         = self.client.unpacker.unpack_i32()?;
		let link_id:i32       = self.client.unpacker.unpack_i32()?;
		let abort_port:u32    = self.client.unpacker.unpack_u32()?;
		let max_recv_size:u32 = self.client.unpacker.unpack_u32()?;

		if error != 0 { return Err(device_error(error)); }

		debug!("Link {} created, abort port {}, max_recv_size={}", link_id, abort_port, max_recv_size);
		self.link = Some(Link{ link_id, max_recv_size });
		Ok(())
	}

	fn device_write(&mut self, data:&[u8], flags:i32) -> io::Result<()> {
		let link_id = self.link()?.link_id;

		self.client.start_call(DEVICE_WRITE)?;
		xdr_pack::pack_device_write_parms(&mut self.client.packer, link_id, self.io_timeout, self.lock_timeout, flags, data)?;
		self.client.do_call()?;

		let error:i32 = self.client.unpacker.unpack_i32()?;
		let size:u32  = self.client.unpacker.unpack_u32()?;

		if error != 0 { return Err(device_error(error)); }
		if size as usize != data.len() {
			return Err(err("Number of bytes in confirmation doesn't match number of bytes sent"));
		}
		Ok(())
	}

	fn device_read(&mut self) -> io::Result<(i32, Vec<u8>)> {
		let link_id = self.link()?.link_id;

		self.client.start_call(DEVICE_READ)?;
		xdr_pack::pack_device_read_parms(&mut self.client.packer, link_id, u32::MAX, self.io_timeout, self.lock_timeout, 0, 0)?;
		self.client.do_call()?;

		let error:i32    = self.client.unpacker.unpack_i32()?;
		let reason:i32   = self.client.unpacker.unpack_i32()?;
		let data:Vec<u8> = self.client.unpacker.unpack_opaque()?;

		if error != 0 { return Err(device_error(error)); }
		if reason & !(REASON_REQCNT | REASON_CHR | REASON_END) != 0 {
			return Err(err("Reserved bits set in device_read reason"));
		}
		Ok((reason, data))
	}

	pub fn destroy_link(&mut self) -> io::Result<()> {
		let link_id = match self.link.take() {
			Some(link) => link.link_id,
			None => return Err(err("No link to destroy")),
		};

		self.client.start_call(DESTROY_LINK)?;
		xdr_pack::pack_device_link(&mut self.client.packer, link_id)?;
		self.client.do_call()?;

		match self.client.unpacker.unpack_i32()? {
			0 => Ok(()),
			e => Err(device_error(e)),
		}
	}

}

impl Session for CoreClient {

	fn write(&mut self, cmd:&str) -> io::Result<()> {
		if self.tx_throttle > Duration::from_secs(0) {
			thread::sleep(self.tx_throttle);
		}
		debug!("-> {}", cmd);

		let mut data:Vec<u8> = Vec::with_capacity(cmd.len() + 1);
		data.extend_from_slice(cmd.as_bytes());
		data.push(LINE_TERMINATOR);

		// Only the final chunk carries the END flag
		let chunk_len = self.link()?.max_recv_size.max(1) as usize;
		let n_chunks = (data.len() + chunk_len - 1) / chunk_len;
		for (idx, chunk) in data.chunks(chunk_len).enumerate() {
			let flags = if idx + 1 == n_chunks { OPERATION_FLAGS_END } else { 0 };
			self.device_write(chunk, flags)?;
		}
		Ok(())
	}

	fn read_raw(&mut self) -> io::Result<Vec<u8>> {
		// Keep reading until the device flags the end of the message so no bytes are left behind for the next query
		let mut ans:Vec<u8> = vec![];
		loop {
			let (reason, mut data) = self.device_read()?;
			ans.append(&mut data);
			if reason & (REASON_END | REASON_CHR) != 0 { break; }
		}
		debug!("<- {} bytes", ans.len());
		Ok(ans)
	}

}

impl Drop for CoreClient {

	fn drop(&mut self) {
		if self.link.is_some() {
			if let Err(e) = self.destroy_link() {
				warn!("Unable to destroy VXI-11 link: {}", e);
			}
		}
	}

}
