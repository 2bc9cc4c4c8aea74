use std::io::{self, Error, ErrorKind};

use crate::xdr::Packer;

pub fn pack_device_link(packer:&mut Packer, link:i32) -> io::Result<()> {
	packer.pack_i32(link)
}

pub fn pack_create_link_parms(packer:&mut Packer, id:i32, lock_device:bool, lock_timeout:u32, device:&str) -> io::Result<()> {
	if !device.is_ascii() {
		return Err(Error::new(ErrorKind::InvalidInput, "VXI-11 device names must be ASCII"));
	}
	packer.pack_i32(id)?;
	packer.pack_bool(lock_device)?;
	packer.pack_u32(lock_timeout)?;
	packer.pack_opaque(device.as_bytes())
}

pub fn pack_device_write_parms(packer:&mut Packer, link:i32, timeout:u32, lock_timeout:u32, flags:i32, data:&[u8]) -> io::Result<()> {
	packer.pack_i32(link)?;
	packer.pack_u32(timeout)?;
	packer.pack_u32(lock_timeout)?;
	packer.pack_i32(flags)?;
	packer.pack_opaque(data)
}

pub fn pack_device_read_parms(packer:&mut Packer, link:i32, request_size:u32, timeout:u32, lock_timeout:u32, flags:i32, term_char:i32) -> io::Result<()> {
	packer.pack_i32(link)?;
	packer.pack_u32(request_size)?;
	packer.pack_u32(timeout)?;
	packer.pack_u32(lock_timeout)?;
	packer.pack_i32(flags)?;
	packer.pack_i32(term_char)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn create_link_parms_layout() {
		let mut p = Packer::new();
		pack_create_link_parms(&mut p, 3333, false, 10000, "inst0").unwrap();
		let b = p.as_bytes();
		assert_eq!(&b[0..4], &3333i32.to_be_bytes());
		assert_eq!(&b[4..8], &[0, 0, 0, 0]);
		assert_eq!(&b[8..12], &10000u32.to_be_bytes());
		assert_eq!(&b[12..16], &[0, 0, 0, 5]);
		assert_eq!(&b[16..21], b"inst0");
		assert_eq!(b.len(), 24);
	}

	#[test]
	fn non_ascii_device_is_rejected() {
		let mut p = Packer::new();
		assert!(pack_create_link_parms(&mut p, 1, false, 0, "instø").is_err());
	}
}
