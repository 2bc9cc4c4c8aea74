
use std::io::{self, Read, Write, Error, ErrorKind};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use byteorder::{BigEndian, WriteBytesExt, ReadBytesExt};
use log::trace;

use crate::xdr;
use super::xdr_pack;
use super::xdr_unpack;

const LAST_FRAGMENT:u32 = 0x8000_0000;

// RPC record marking: each fragment carries a 31-bit length, the top bit flags the last fragment of a record
pub fn write_record<W: Write>(w:&mut W, record:&[u8]) -> io::Result<()> {
	if record.len() > (LAST_FRAGMENT - 1) as usize {
		return Err(Error::new(ErrorKind::InvalidInput, "Record too long for a single fragment"));
	}

	let mut send_bytes:Vec<u8> = Vec::with_capacity(record.len() + 4);
	send_bytes.write_u32::<BigEndian>(record.len() as u32 | LAST_FRAGMENT)?;
	send_bytes.extend_from_slice(record);
	w.write_all(&send_bytes)?;
	w.flush()
}

pub fn read_record<R: Read>(r:&mut R) -> io::Result<Vec<u8>> {
	let mut reply:Vec<u8> = vec![];

	loop {
		let x:u32 = r.read_u32::<BigEndian>()?;
		let n = (x & !LAST_FRAGMENT) as usize;

		let start = reply.len();
		reply.resize(start + n, 0);
		r.read_exact(&mut reply[start..])?;

		if x & LAST_FRAGMENT != 0 { return Ok(reply); }
	}
}

pub struct TcpClient {
	stream: TcpStream,
	pub prog: u32,
	pub vers: u32,
	pub lastxid: u32,
	pub packer: xdr::Packer,
	pub unpacker: xdr::Unpacker,
}

impl TcpClient {

	pub fn connect<A: ToSocketAddrs>(addr: A, prog: u32, vers: u32) -> io::Result<Self> {
		let stream = TcpStream::connect(addr)?;
		stream.set_nodelay(true)?;
		Ok(Self{ stream, prog, vers, lastxid: 0, packer: xdr::Packer::new(), unpacker: xdr::Unpacker::new() })
	}

	pub fn set_timeout(&mut self, timeout:Option<Duration>) -> io::Result<()> {
		self.stream.set_read_timeout(timeout)?;
		self.stream.set_write_timeout(timeout)
	}

	// Resets the packer and writes a call header for procedure `prc`; arguments get packed after this
	pub fn start_call(&mut self, prc:u32) -> io::Result<()> {
		self.lastxid = self.lastxid.wrapping_add(1);
		self.packer.reset();
		xdr_pack::pack_callheader_no_auth(&mut self.packer, self.lastxid, self.prog, self.vers, prc)
	}

	// Sends the packed call and leaves the unpacker positioned at the start of the procedure's results
	pub fn do_call(&mut self) -> io::Result<()> {
		write_record(&mut self.stream, self.packer.as_bytes())?;

		loop {
			let reply = read_record(&mut self.stream)?;
			trace!("RPC reply of {} bytes for xid {}", reply.len(), self.lastxid);
			self.unpacker.reset(reply);

			let xid = xdr_unpack::unpack_replyheader(&mut self.unpacker)?;
			if xid == self.lastxid {
				return Ok(());
			} else if xid < self.lastxid {
				// Stale reply to an earlier call
				continue;
			} else {
				return Err(Error::new(ErrorKind::Other, "Received a reply with an xid that hasn't been sent yet"));
			}
		}
	}

}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Cursor;

	#[test]
	fn single_fragment_round_trip() {
		let mut wire:Vec<u8> = vec![];
		write_record(&mut wire, b"abcd").unwrap();
		assert_eq!(&wire[..4], &[0x80, 0, 0, 4]);

		let mut rdr = Cursor::new(wire);
		assert_eq!(read_record(&mut rdr).unwrap(), b"abcd".to_vec());
	}

	#[test]
	fn fragments_are_joined() {
		let wire:Vec<u8> = vec![0, 0, 0, 2, b'a', b'b', 0x80, 0, 0, 3, b'c', b'd', b'e'];
		let mut rdr = Cursor::new(wire);
		assert_eq!(read_record(&mut rdr).unwrap(), b"abcde".to_vec());
	}

	#[test]
	fn truncated_fragment_is_an_error() {
		let wire:Vec<u8> = vec![0x80, 0, 0, 8, 1, 2];
		let mut rdr = Cursor::new(wire);
		assert!(read_record(&mut rdr).is_err());
	}
}
