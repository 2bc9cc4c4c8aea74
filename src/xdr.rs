use std::io::{self, Cursor, Error, ErrorKind, Read};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

// XDR items are always a multiple of four bytes on the wire
const ALIGN:usize = 4;

fn pad_len(n:usize) -> usize { (ALIGN - n % ALIGN) % ALIGN }

#[derive(Default)]
pub struct Packer {
	buff: Vec<u8>,
}

impl Packer {

	pub fn new() -> Self { Self::default() }

	pub fn reset(&mut self) { self.buff.clear(); }

	pub fn as_bytes(&self) -> &[u8] { &self.buff }

	pub fn pack_u32(&mut self, x:u32) -> io::Result<()> { self.buff.write_u32::<BigEndian>(x) }
	pub fn pack_i32(&mut self, x:i32) -> io::Result<()> { self.buff.write_i32::<BigEndian>(x) }

	pub fn pack_bool(&mut self, b:bool) -> io::Result<()> { self.pack_i32(if b { 1 } else { 0 }) }

	pub fn pack_enum(&mut self, x:i32) -> io::Result<()> { self.pack_i32(x) }

	pub fn pack_opaque(&mut self, data:&[u8]) -> io::Result<()> {
		if data.len() > u32::MAX as usize {
			return Err(Error::new(ErrorKind::InvalidInput, "Opaque data too long for XDR"));
		}
		self.pack_u32(data.len() as u32)?;
		self.buff.extend_from_slice(data);
		self.buff.resize(self.buff.len() + pad_len(data.len()), 0);
		Ok(())
	}

}

#[derive(Default)]
pub struct Unpacker {
	rdr: Cursor<Vec<u8>>,
}

impl Unpacker {

	pub fn new() -> Self { Self::default() }

	pub fn reset(&mut self, data:Vec<u8>) { self.rdr = Cursor::new(data); }

	pub fn remaining(&self) -> usize {
		self.rdr.get_ref().len().saturating_sub(self.rdr.position() as usize)
	}

	pub fn all_data_consumed(&self) -> bool { self.remaining() == 0 }

	pub fn unpack_u32(&mut self) -> io::Result<u32> { self.rdr.read_u32::<BigEndian>() }
	pub fn unpack_i32(&mut self) -> io::Result<i32> { self.rdr.read_i32::<BigEndian>() }

	// Range checking an enum depends on the application, so here it's just an i32
	pub fn unpack_enum(&mut self) -> io::Result<i32> { self.unpack_i32() }

	pub fn unpack_bool(&mut self) -> io::Result<bool> {
		match self.unpack_i32()? {
			0 => Ok(false),
			1 => Ok(true),
			x => Err(Error::new(ErrorKind::InvalidData, format!("Expected 0 or 1 for an XDR bool but got {}", x))),
		}
	}

	pub fn unpack_opaque(&mut self) -> io::Result<Vec<u8>> {
		let n = self.unpack_u32()? as usize;
		if n > self.remaining() {
			return Err(Error::new(ErrorKind::UnexpectedEof, "Opaque length runs past the end of the buffer"));
		}

		let mut ans = vec![0u8; n];
		self.rdr.read_exact(&mut ans)?;

		let pad = pad_len(n).min(self.remaining());
		self.rdr.set_position(self.rdr.position() + pad as u64);
		Ok(ans)
	}

}
