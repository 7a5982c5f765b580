//! INI-style configuration store.
//!
//! ```text
//! # comments run to the end of the line
//! name = ela              # keys before any section live in section "_"
//!
//! [static]
//! alias = "assets"
//! directory = public
//! ```
//!
//! Values are typed on load. The first rule that matches wins:
//!
//! | Raw text | Value |
//! |---|---|
//! | `"quoted"` | `String` without the quotes |
//! | `true`, `false`, `1`, `0`, `t`, `F`, … | `Bool` |
//! | `42`, `-7`, `0x2a`, `0o52`, `052`, `0b101010` | `Int` |
//! | `4.2`, `1e3` | `Float` |
//! | anything else | `String` as written |
//!
//! Note that a bare `1` or `0` is a `Bool`. Quote it, or use `01`, if you
//! need the number.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::Error;

/// Name of the implicit section holding keys that precede any `[section]`.
pub const ROOT_SECTION: &str = "_";

/// A typed config value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl Value {
    fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Bool(_)   => "bool",
            Self::Int(_)    => "int",
            Self::Float(_)  => "float",
        }
    }

    /// Text that parses back to this same value.
    fn to_ini(&self) -> String {
        match self {
            Self::String(s) if parse_value(s) == *self && s.trim() == s => s.clone(),
            Self::String(s) => format!("\"{s}\""),
            Self::Float(f)  => format!("{f:?}"),
            other           => other.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Bool(b)   => write!(f, "{b}"),
            Self::Int(i)    => write!(f, "{i}"),
            Self::Float(x)  => write!(f, "{x}"),
        }
    }
}

impl From<String> for Value { fn from(v: String) -> Self { Self::String(v) } }
impl From<&str> for Value { fn from(v: &str) -> Self { Self::String(v.to_owned()) } }
impl From<bool> for Value { fn from(v: bool) -> Self { Self::Bool(v) } }
impl From<i64> for Value { fn from(v: i64) -> Self { Self::Int(v) } }
impl From<f64> for Value { fn from(v: f64) -> Self { Self::Float(v) } }

/// Parsed configuration: section → key → value.
#[derive(Debug, Clone)]
pub struct Config {
    sections: BTreeMap<String, BTreeMap<String, Value>>,
    warnings: Vec<String>,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        Ok(Self::parse(&fs::read_to_string(path)?))
    }

    /// Parses INI text. Malformed lines are recorded in
    /// [`warnings`](Config::warnings) and otherwise ignored.
    pub fn parse(source: &str) -> Self {
        let mut config = Self::default();
        let mut current = ROOT_SECTION.to_owned();

        for (index, raw) in source.lines().enumerate() {
            let line = strip_comment(raw).trim();
            if line.is_empty() {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                let (key, value) = (key.trim(), value.trim());
                // `key =` and `= value` carry nothing to store
                if !key.is_empty() && !value.is_empty() {
                    config.set(&current, key, parse_value(value));
                }
            } else if let Some(name) = section_name(line) {
                current = name.to_owned();
                config.sections.entry(current.clone()).or_default();
            } else {
                config.warnings.push(format!("INI file SyntaxError in Line {}", index + 1));
            }
        }
        config
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }

    pub fn get(&self, section: &str, key: &str) -> Result<&Value, Error> {
        self.sections
            .get(section)
            .ok_or_else(|| Error::MissingSection { section: section.to_owned() })?
            .get(key)
            .ok_or_else(|| Error::MissingKey { section: section.to_owned(), key: key.to_owned() })
    }

    /// A `Bool`, or a string compared case-insensitively against `"true"`.
    pub fn get_bool(&self, section: &str, key: &str) -> Result<bool, Error> {
        match self.get(section, key)? {
            Value::Bool(b) => Ok(*b),
            Value::String(s) => Ok(s.eq_ignore_ascii_case("true")),
            other => Err(mismatch(section, key, "bool", other)),
        }
    }

    pub fn get_int(&self, section: &str, key: &str) -> Result<i64, Error> {
        match self.get(section, key)? {
            Value::Int(i) => Ok(*i),
            other => Err(mismatch(section, key, "int", other)),
        }
    }

    pub fn get_float(&self, section: &str, key: &str) -> Result<f64, Error> {
        match self.get(section, key)? {
            Value::Float(f) => Ok(*f),
            other => Err(mismatch(section, key, "float", other)),
        }
    }

    pub fn get_string(&self, section: &str, key: &str) -> Result<String, Error> {
        match self.get(section, key)? {
            Value::String(s) => Ok(s.clone()),
            other => Err(mismatch(section, key, "string", other)),
        }
    }

    pub fn get_bool_or(&self, section: &str, key: &str, default: bool) -> bool {
        self.get_bool(section, key).unwrap_or(default)
    }

    pub fn get_int_or(&self, section: &str, key: &str, default: i64) -> i64 {
        self.get_int(section, key).unwrap_or(default)
    }

    pub fn get_float_or(&self, section: &str, key: &str, default: f64) -> f64 {
        self.get_float(section, key).unwrap_or(default)
    }

    pub fn get_string_or(&self, section: &str, key: &str, default: &str) -> String {
        self.get_string(section, key).unwrap_or_else(|_| default.to_owned())
    }

    /// Sets a value, creating the section if needed.
    pub fn set(&mut self, section: &str, key: &str, value: impl Into<Value>) {
        self.sections
            .entry(section.to_owned())
            .or_default()
            .insert(key.to_owned(), value.into());
    }

    /// Root-section keys first, then one `[section]` block per section.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        if let Some(root) = self.sections.get(ROOT_SECTION) {
            write_entries(&mut out, root);
        }
        for (name, entries) in self.sections.iter().filter(|(name, _)| *name != ROOT_SECTION) {
            out.push_str(&format!("\n[{name}]\n"));
            write_entries(&mut out, entries);
        }
        out
    }

    /// Writes [`serialize`](Config::serialize) to `path`, creating parent
    /// directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.serialize())?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut sections = BTreeMap::new();
        sections.insert(ROOT_SECTION.to_owned(), BTreeMap::new());
        Self { sections, warnings: Vec::new() }
    }
}

fn mismatch(section: &str, key: &str, expected: &'static str, found: &Value) -> Error {
    tracing::debug!(section, key, expected, found = found.type_name(), "config type mismatch");
    Error::TypeMismatch { section: section.to_owned(), key: key.to_owned(), expected }
}

fn write_entries(out: &mut String, entries: &BTreeMap<String, Value>) {
    for (key, value) in entries {
        out.push_str(&format!("{key} = {}\n", value.to_ini()));
    }
}

fn strip_comment(line: &str) -> &str {
    line.split_once('#').map_or(line, |(before, _)| before)
}

fn section_name(line: &str) -> Option<&str> {
    let name = line.strip_prefix('[')?.strip_suffix(']')?;
    (!name.is_empty() && !name.contains(['[', ']'])).then_some(name)
}

fn parse_value(raw: &str) -> Value {
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        return Value::String(raw[1..raw.len() - 1].to_owned());
    }
    if let Some(b) = parse_bool(raw) {
        return Value::Bool(b);
    }
    if let Some(i) = parse_int(raw) {
        return Value::Int(i);
    }
    if let Ok(f) = raw.parse::<f64>() {
        return Value::Float(f);
    }
    Value::String(raw.to_owned())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// Integers with an optional sign and a `0x`, `0o`, `0b` or leading-`0`
/// (octal) base prefix. Underscores between digits are allowed.
fn parse_int(raw: &str) -> Option<i64> {
    let (negative, unsigned) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    let digits = unsigned.replace('_', "");
    let (radix, body) = if let Some(rest) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        (16, rest)
    } else if let Some(rest) = digits.strip_prefix("0o").or_else(|| digits.strip_prefix("0O")) {
        (8, rest)
    } else if let Some(rest) = digits.strip_prefix("0b").or_else(|| digits.strip_prefix("0B")) {
        (2, rest)
    } else if digits.len() > 1 && digits.starts_with('0') {
        (8, &digits[1..])
    } else {
        (10, digits.as_str())
    };
    if body.is_empty() || body.starts_with(['+', '-']) {
        return None;
    }
    let magnitude = i128::from_str_radix(body, radix).ok()?;
    i64::try_from(if negative { -magnitude } else { magnitude }).ok()
}
