//! Named SCPI parameters.
//!
//! Every instrument setting is a [`Parameter`]: a query template, a command
//! template, a validator for values being set, an optional two-way mapping
//! between user-facing values and the instrument's keywords, and a parser for
//! replies. A [`ParameterSet`] is a flat registry of them keyed by name.

use std::collections::BTreeMap;
use std::fmt;

use log::debug;

use crate::error::{Error, Result};
use crate::session::Session;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	Bool(bool),
	Int(i64),
	Float(f64),
	Str(String),
}

impl Value {

	pub fn as_f64(&self) -> Option<f64> {
		match self {
			Value::Int(i)   => Some(*i as f64),
			Value::Float(f) => Some(*f),
			_ => None,
		}
	}

	pub fn as_i64(&self) -> Option<i64> {
		match self {
			Value::Int(i) => Some(*i),
			Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
			_ => None,
		}
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Value::Bool(b) => Some(*b),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Value::Str(s) => Some(s),
			_ => None,
		}
	}

	// Numbers compare by value whatever their variant, so 10 matches a probe ratio of 10.0
	fn matches(&self, other:&Value) -> bool {
		match (self.as_f64(), other.as_f64()) {
			(Some(a), Some(b)) => a == b,
			_ => self == other,
		}
	}

}

impl fmt::Display for Value {
	fn fmt(&self, f:&mut fmt::Formatter) -> fmt::Result {
		match self {
			Value::Bool(b)  => write!(f, "{}", b),
			Value::Int(i)   => write!(f, "{}", i),
			Value::Float(x) => write!(f, "{}", x),
			Value::Str(s)   => write!(f, "{}", s),
		}
	}
}

impl From<bool> for Value { fn from(b:bool) -> Self { Value::Bool(b) } }
impl From<i32> for Value { fn from(i:i32) -> Self { Value::Int(i as i64) } }
impl From<i64> for Value { fn from(i:i64) -> Self { Value::Int(i) } }
impl From<u32> for Value { fn from(i:u32) -> Self { Value::Int(i as i64) } }
impl From<usize> for Value { fn from(i:usize) -> Self { Value::Int(i as i64) } }
impl From<f64> for Value { fn from(x:f64) -> Self { Value::Float(x) } }
impl From<&str> for Value { fn from(s:&str) -> Self { Value::Str(s.to_owned()) } }
impl From<String> for Value { fn from(s:String) -> Self { Value::Str(s) } }

#[derive(Debug, Clone)]
pub enum Validator {
	Anything,
	Enum(Vec<Value>),
	Ints { min: i64, max: i64 },
	Numbers { min: f64, max: f64 },
	Strings { max_length: usize },
	/// Passes when any of the alternatives passes
	MultiType(Vec<Validator>),
}

impl Validator {

	pub fn any_int() -> Self { Validator::Ints{ min: i64::MIN, max: i64::MAX } }

	pub fn any_number() -> Self { Validator::Numbers{ min: f64::NEG_INFINITY, max: f64::INFINITY } }

	pub fn strs(options:&[&str]) -> Self {
		Validator::Enum(options.iter().map(|&s| Value::from(s)).collect())
	}

	pub fn floats(options:&[f64]) -> Self {
		Validator::Enum(options.iter().map(|&x| Value::Float(x)).collect())
	}

	pub fn validate(&self, v:&Value) -> std::result::Result<(), String> {
		match self {
			Validator::Anything => Ok(()),
			Validator::Enum(options) => {
				if options.iter().any(|o| o.matches(v)) { Ok(()) }
				else {
					let listed:Vec<String> = options.iter().map(|o| o.to_string()).collect();
					Err(format!("{} is not one of {{{}}}", v, listed.join(", ")))
				}
			},
			Validator::Ints{ min, max } => match v {
				Value::Int(i) if i >= min && i <= max => Ok(()),
				Value::Int(i) => Err(format!("{} is outside [{}, {}]", i, min, max)),
				_ => Err(format!("{} is not an integer", v)),
			},
			Validator::Numbers{ min, max } => match v.as_f64() {
				Some(x) if x >= *min && x <= *max => Ok(()),
				Some(x) => Err(format!("{} is outside [{}, {}]", x, min, max)),
				None => Err(format!("{} is not a number", v)),
			},
			Validator::Strings{ max_length } => match v {
				Value::Str(s) if s.chars().count() <= *max_length => Ok(()),
				Value::Str(s) => Err(format!("{:?} is longer than {} characters", s, max_length)),
				_ => Err(format!("{} is not a string", v)),
			},
			Validator::MultiType(alternatives) => {
				let mut reasons:Vec<String> = vec![];
				for alt in alternatives {
					match alt.validate(v) {
						Ok(()) => return Ok(()),
						Err(r) => reasons.push(r),
					}
				}
				Err(reasons.join("; "))
			},
		}
	}

}

/// Two-way translation between user values and instrument keywords.
#[derive(Debug, Clone)]
pub enum ValueMapping {
	/// `true`/`false` to the given keywords; replies of ON/OFF are understood too
	OnOff { on: &'static str, off: &'static str },
	Table(Vec<(Value, &'static str)>),
}

impl ValueMapping {

	pub fn on_off() -> Self { ValueMapping::OnOff{ on: "1", off: "0" } }

	pub fn table(entries:&[(&str, &'static str)]) -> Self {
		ValueMapping::Table(entries.iter().map(|&(k, w)| (Value::from(k), w)).collect())
	}

	fn to_wire(&self, v:&Value) -> std::result::Result<&'static str, String> {
		match self {
			ValueMapping::OnOff{ on, off } => {
				let state = match v {
					Value::Bool(b) => Some(*b),
					Value::Int(1) => Some(true),
					Value::Int(0) => Some(false),
					Value::Str(s) if s.eq_ignore_ascii_case("on") => Some(true),
					Value::Str(s) if s.eq_ignore_ascii_case("off") => Some(false),
					_ => None,
				};
				match state {
					Some(true)  => Ok(*on),
					Some(false) => Ok(*off),
					None => Err(format!("{} is not an on/off value", v)),
				}
			},
			ValueMapping::Table(entries) => {
				entries.iter()
					.find(|(k, _)| k.matches(v))
					.map(|&(_, w)| w)
					.ok_or_else(|| {
						let keys:Vec<String> = entries.iter().map(|(k, _)| k.to_string()).collect();
						format!("{} is not one of {{{}}}", v, keys.join(", "))
					})
			},
		}
	}

	fn from_wire(&self, reply:&str) -> Option<Value> {
		match self {
			ValueMapping::OnOff{ on, off } => {
				if reply == *on || reply.eq_ignore_ascii_case("ON") { Some(Value::Bool(true)) }
				else if reply == *off || reply.eq_ignore_ascii_case("OFF") { Some(Value::Bool(false)) }
				else { None }
			},
			ValueMapping::Table(entries) => {
				entries.iter()
					.find(|(_, w)| w.eq_ignore_ascii_case(reply))
					.map(|(k, _)| k.clone())
			},
		}
	}

}

/// How a reply to an unmapped parameter becomes a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parser {
	Str,
	Int,
	Float,
	/// Digits become an integer, anything else (MIN, TOP, ...) stays a keyword
	IntOrStr,
}

impl Parser {

	fn parse(&self, reply:&str) -> Option<Value> {
		match self {
			Parser::Str   => Some(Value::Str(reply.to_owned())),
			Parser::Float => reply.parse::<f64>().ok().map(Value::Float),
			Parser::Int   => reply.parse::<i64>().ok()
				.or_else(|| reply.parse::<f64>().ok().filter(|x| x.fract() == 0.0).map(|x| x as i64))
				.map(Value::Int),
			Parser::IntOrStr => {
				if !reply.is_empty() && reply.chars().all(|c| c.is_ascii_digit()) {
					reply.parse::<i64>().ok().map(Value::Int)
				} else {
					Some(Value::Str(reply.to_owned()))
				}
			},
		}
	}

}

#[derive(Debug, Clone)]
pub struct Parameter {
	pub name: String,
	pub get_cmd: Option<String>,
	pub set_cmd: Option<String>,
	pub validator: Validator,
	pub mapping: Option<ValueMapping>,
	pub parser: Parser,
	pub doc: &'static str,
}

impl Parameter {

	pub fn new(name:&str) -> Self {
		Self {
			name: name.to_owned(),
			get_cmd: None,
			set_cmd: None,
			validator: Validator::Anything,
			mapping: None,
			parser: Parser::Str,
			doc: "",
		}
	}

	pub fn get_cmd<T: Into<String>>(mut self, cmd:T) -> Self { self.get_cmd = Some(cmd.into()); self }
	pub fn set_cmd<T: Into<String>>(mut self, cmd:T) -> Self { self.set_cmd = Some(cmd.into()); self }
	pub fn vals(mut self, v:Validator) -> Self { self.validator = v; self }
	pub fn val_mapping(mut self, m:ValueMapping) -> Self { self.mapping = Some(m); self }
	pub fn parser(mut self, p:Parser) -> Self { self.parser = p; self }
	pub fn doc(mut self, doc:&'static str) -> Self { self.doc = doc; self }

	fn invalid(&self, reason:String) -> Error {
		Error::InvalidValue{ name: self.name.clone(), reason }
	}

	/// The command that sets this parameter to `value`, after validation and mapping.
	pub fn command(&self, value:&Value) -> Result<String> {
		let template = self.set_cmd.as_ref()
			.ok_or_else(|| self.invalid("parameter is read-only".to_owned()))?;

		let text = match &self.mapping {
			Some(m) => m.to_wire(value).map_err(|r| self.invalid(r))?.to_owned(),
			None => {
				self.validator.validate(value).map_err(|r| self.invalid(r))?;
				render(template, value).map_err(|r| self.invalid(r))?
			},
		};

		Ok(substitute(template, &text))
	}

	pub fn query(&self) -> Result<&str> {
		self.get_cmd.as_deref()
			.ok_or_else(|| self.invalid("parameter is write-only".to_owned()))
	}

	pub fn parse_reply(&self, reply:&str) -> Result<Value> {
		let reply = reply.trim();
		let parsed = match &self.mapping {
			Some(m) => m.from_wire(reply),
			None    => self.parser.parse(reply),
		};
		parsed.ok_or_else(|| Error::UnexpectedResponse(format!("{:?} for {}", reply, self.name)))
	}

}

// Locates the single `{...}` placeholder of a command template
fn placeholder(template:&str) -> Option<(usize, usize)> {
	let start = template.find('{')?;
	let end = start + template[start..].find('}')?;
	Some((start, end + 1))
}

// Formats `value` the way the placeholder's spec asks: `{:d}` integer, `{:f}` six decimals, `{}`/`{:s}` as is
fn render(template:&str, value:&Value) -> std::result::Result<String, String> {
	let spec = placeholder(template).map(|(s, e)| &template[s + 1..e - 1]).unwrap_or("");
	match spec {
		":d" => match value {
			Value::Bool(b) => Ok(if *b { "1" } else { "0" }.to_owned()),
			v => v.as_i64().map(|i| i.to_string()).ok_or_else(|| format!("{} is not an integer", v)),
		},
		":f" => value.as_f64().map(|x| format!("{:.6}", x)).ok_or_else(|| format!("{} is not a number", value)),
		_ => Ok(value.to_string()),
	}
}

fn substitute(template:&str, text:&str) -> String {
	match placeholder(template) {
		Some((s, e)) => {
			// A quote inside a quoted string parameter is written twice
			let quoted = template[..s].ends_with('"') && template[e..].starts_with('"');
			let text = if quoted { text.replace('"', "\"\"") } else { text.to_owned() };
			format!("{}{}{}", &template[..s], text, &template[e..])
		},
		None => template.to_owned(),
	}
}

/// A flat name → [`Parameter`] registry.
#[derive(Debug, Clone, Default)]
pub struct ParameterSet {
	params: BTreeMap<String, Parameter>,
}

impl ParameterSet {

	pub fn new() -> Self { Self::default() }

	pub fn add(&mut self, p:Parameter) { self.params.insert(p.name.clone(), p); }

	pub fn lookup(&self, name:&str) -> Result<&Parameter> {
		self.params.get(name).ok_or_else(|| Error::UnknownParameter(name.to_owned()))
	}

	pub fn names(&self) -> impl Iterator<Item = &str> { self.params.keys().map(|k| k.as_str()) }

	/// Name and description of every parameter, sorted by name. Undocumented parameters give `""`.
	pub fn describe(&self) -> impl Iterator<Item = (&str, &str)> {
		self.params.values().map(|p| (p.name.as_str(), p.doc))
	}

	pub fn len(&self) -> usize { self.params.len() }

	pub fn is_empty(&self) -> bool { self.params.is_empty() }

	pub fn set<S: Session + ?Sized>(&self, session:&mut S, name:&str, value:Value) -> Result<()> {
		let cmd = self.lookup(name)?.command(&value)?;
		debug!("set {} = {}", name, value);
		session.write(&cmd)?;
		Ok(())
	}

	pub fn get<S: Session + ?Sized>(&self, session:&mut S, name:&str) -> Result<Value> {
		let p = self.lookup(name)?;
		let reply = session.ask(p.query()?)?;
		p.parse_reply(&reply)
	}

}
