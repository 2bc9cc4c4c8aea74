
pub const PMAP_PROG:u32 = 100000;
pub const PMAP_VERS:u32 = 2;
pub const PMAP_PORT:u16 = 111;

pub const PMAPPROC_GETPORT:u32 = 3;     // (mapping) -> unsigned int

use std::io::{self, Error, ErrorKind};

use log::debug;

use super::IPPROTO_TCP;
use super::xdr_pack;
use super::tcp_clients::TcpClient;

#[derive(Debug)]
pub struct Mapping {
	pub program: u32,
	pub version: u32,
	pub port: u32,
}

pub struct TcpPortMapperClient {
	client: TcpClient,
}

impl TcpPortMapperClient {

	pub fn new(host:&str) -> io::Result<Self> {
		let client = TcpClient::connect((host, PMAP_PORT), PMAP_PROG, PMAP_VERS)?;
		Ok(Self{ client })
	}

	// Asks the portmapper which TCP port serves the given program, 0 meaning not registered
	pub fn get_port(&mut self, m:&Mapping) -> io::Result<u16> {
		self.client.start_call(PMAPPROC_GETPORT)?;
		xdr_pack::pack_mapping(&mut self.client.packer, m.program, m.version, IPPROTO_TCP, m.port)?;
		self.client.do_call()?;

		let port:u32 = self.client.unpacker.unpack_u32()?;
		if !self.client.unpacker.all_data_consumed() {
			return Err(Error::new(ErrorKind::Other, "Data unexpectedly left over in unpacker after unpacking port"));
		}
		debug!("Portmapper maps program {:#x} v{} to port {}", m.program, m.version, port);

		match port {
			0 => Err(Error::new(ErrorKind::NotFound, "Program not registered with the portmapper")),
			p if p > u16::MAX as u32 => Err(Error::new(ErrorKind::InvalidData, "Portmapper returned an out of range port")),
			p => Ok(p as u16),
		}
	}

}
