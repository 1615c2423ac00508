// Key-value text parser - ethtool and resolvectl style `key: value` blocks
//
// Output of these tools changes shape between versions (values wrapped onto
// following lines, device headers with or without indices). The parser
// classifies each line instead of detecting the version.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

/// Pseudo-device for fields outside any device block
pub const GLOBAL_DEVICE: &str = "Global";

static BRACKETED_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([\w.\-]+)\)").expect("valid device name pattern"));

/// One named block of fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KvDevice {
    pub name: String,
    pub fields: BTreeMap<String, String>,
}

impl KvDevice {
    fn new(name: &str) -> Self {
        KvDevice {
            name: name.to_string(),
            fields: BTreeMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}

/// Parsed document: devices in the order they first appeared
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KvDocument {
    pub devices: Vec<KvDevice>,
}

impl KvDocument {
    pub fn is_empty(&self) -> bool {
        self.devices.iter().all(|d| d.fields.is_empty())
    }

    /// All fields of all devices; later devices win on key clashes
    pub fn merged(&self) -> BTreeMap<String, String> {
        self.devices
            .iter()
            .flat_map(|d| d.fields.iter())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn open_device(&mut self, name: &str) -> usize {
        match self.devices.iter().position(|d| d.name == name) {
            Some(idx) => {
                self.devices[idx].fields.clear();
                idx
            }
            None => {
                self.devices.push(KvDevice::new(name));
                self.devices.len() - 1
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum State {
    /// No field to continue: a bare line opens a device
    ExpectDevice,
    /// A field was just read; `key` is `None` when that field was rejected
    ExpectFieldOrContinuation { key: Option<String> },
}

enum Line<'a> {
    Blank,
    Field { key: String, value: &'a str },
    Header(String),
    Bare(&'a str),
}

/// Line-classifying parser for `key: value` text
#[derive(Debug, Clone, Default)]
pub struct KvParser {
    rejected: Vec<String>,
}

impl KvParser {
    pub fn new() -> Self {
        KvParser::default()
    }

    /// Keys whose values span several lines in ways this parser does not rebuild
    pub fn reject(mut self, keys: &[&str]) -> Self {
        self.rejected.extend(keys.iter().map(|k| k.to_string()));
        self
    }

    pub fn parse(&self, text: &str) -> KvDocument {
        let mut doc = KvDocument::default();
        let mut current: Option<usize> = None;
        let mut state = State::ExpectDevice;

        for raw in text.lines() {
            state = match (classify(raw), state) {
                (Line::Blank, state) => state,

                (Line::Field { key, value }, _) => {
                    if self.rejected.contains(&key) {
                        State::ExpectFieldOrContinuation { key: None }
                    } else {
                        let idx = *current.get_or_insert_with(|| doc.open_device(GLOBAL_DEVICE));
                        doc.devices[idx].fields.insert(key.clone(), clean_value(value));
                        State::ExpectFieldOrContinuation { key: Some(key) }
                    }
                }

                (Line::Header(name), _) => {
                    current = Some(doc.open_device(&name));
                    State::ExpectDevice
                }

                (Line::Bare(text), State::ExpectDevice) => {
                    current = Some(doc.open_device(text));
                    State::ExpectDevice
                }

                (Line::Bare(text), State::ExpectFieldOrContinuation { key }) => {
                    if let (Some(key), Some(idx)) = (&key, current) {
                        if let Some(value) = doc.devices[idx].fields.get_mut(key) {
                            let extra = clean_value(text);
                            if value.is_empty() {
                                *value = extra;
                            } else {
                                value.push(' ');
                                value.push_str(&extra);
                            }
                        }
                    }
                    State::ExpectFieldOrContinuation { key }
                }
            };
        }

        doc
    }
}

fn classify(raw: &str) -> Line<'_> {
    let line = raw.trim();
    if line.is_empty() {
        return Line::Blank;
    }

    // `bus-info: ` with nothing after the delimiter is still a field
    if let Some((key, value)) = raw.trim_start().split_once(": ") {
        return Line::Field {
            key: normalize_key(key),
            value,
        };
    }

    if let Some(caps) = BRACKETED_NAME.captures(line) {
        return Line::Header(caps[1].to_string());
    }

    if line == GLOBAL_DEVICE {
        return Line::Header(GLOBAL_DEVICE.to_string());
    }

    Line::Bare(line)
}

/// `Current DNS Server` -> `current-dns-server`
pub fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace(' ', "-")
}

fn clean_value(value: &str) -> String {
    value.trim().replace('\t', ",")
}
