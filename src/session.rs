//! The instrument session every driver talks through.
//!
//! A session is a blocking request/response channel to one instrument. SCPI
//! instruments associate a read with the most recent query, so a session must
//! never be shared between callers without an external lock around each
//! write/read pair.

use std::collections::{HashMap, VecDeque};
use std::io::{self, Error, ErrorKind};
use std::str;

pub trait Session {

	/// Sends one command. The implementation appends the line terminator.
	fn write(&mut self, cmd:&str) -> io::Result<()>;

	/// Reads one complete response, including any trailing terminator.
	fn read_raw(&mut self) -> io::Result<Vec<u8>>;

	/// Sends a query and returns the reply as text without its terminator.
	fn ask(&mut self, cmd:&str) -> io::Result<String> {
		self.write(cmd)?;
		let raw = self.read_raw()?;
		str::from_utf8(&raw)
			.map(|s| s.trim_end_matches(|c:char| c == '\n' || c == '\r').to_owned())
			.map_err(|_| Error::new(ErrorKind::InvalidData, "Unable to parse response as UTF-8"))
	}

}

impl<S: Session + ?Sized> Session for Box<S> {
	fn write(&mut self, cmd:&str) -> io::Result<()> { (**self).write(cmd) }
	fn read_raw(&mut self) -> io::Result<Vec<u8>> { (**self).read_raw() }
}

/// An in-memory instrument that answers queries from a script.
///
/// Replies are registered per query string and handed out in order. Every
/// command written is recorded so tests can assert on the exact wire traffic.
#[derive(Default)]
pub struct ScriptedSession {
	replies: HashMap<String, VecDeque<Vec<u8>>>,
	sticky: HashMap<String, Vec<u8>>,
	last_cmd: Option<String>,
	written: Vec<String>,
}

impl ScriptedSession {

	pub fn new() -> Self { Self::default() }

	/// Queues a one-shot reply to `query`; the terminator is added here.
	pub fn reply(self, query:&str, response:&str) -> Self {
		let mut bytes = response.as_bytes().to_vec();
		bytes.push(b'\n');
		self.reply_raw(query, bytes)
	}

	/// Queues a one-shot reply sent exactly as given.
	pub fn reply_raw(mut self, query:&str, response:Vec<u8>) -> Self {
		self.replies.entry(query.to_owned()).or_insert_with(VecDeque::new).push_back(response);
		self
	}

	/// Answers `query` with `response` every time once the one-shot replies run out.
	pub fn always(mut self, query:&str, response:&str) -> Self {
		let mut bytes = response.as_bytes().to_vec();
		bytes.push(b'\n');
		self.sticky.insert(query.to_owned(), bytes);
		self
	}

	/// Commands written since the session was created, queries included.
	pub fn commands(&self) -> &[String] { &self.written }

}

impl Session for ScriptedSession {

	fn write(&mut self, cmd:&str) -> io::Result<()> {
		self.written.push(cmd.to_owned());
		self.last_cmd = Some(cmd.to_owned());
		Ok(())
	}

	fn read_raw(&mut self) -> io::Result<Vec<u8>> {
		let cmd = self.last_cmd.take()
			.ok_or_else(|| Error::new(ErrorKind::Other, "Read without a preceding query"))?;

		if let Some(r) = self.replies.get_mut(&cmd).and_then(|q| q.pop_front()) {
			return Ok(r);
		}
		self.sticky.get(&cmd).cloned()
			.ok_or_else(|| Error::new(ErrorKind::TimedOut, format!("No scripted reply for {:?}", cmd)))
	}

}
