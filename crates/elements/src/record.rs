//! Bibliographic records as the formatting elements see them: a control
//! number plus MARC data fields.

use exn::{OptionExt, ResultExt};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::consts::{FILE_INDICATORS, FILE_TAG};
use crate::error::{ErrorKind, Result};
use crate::models::RawFileReference;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subfield {
    pub code: char,
    pub value: String,
}

/// A MARC data field. Blank indicators are stored as a space; `_` is
/// accepted as an alias when building fields or querying them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataField {
    pub tag: String,
    pub ind1: char,
    pub ind2: char,
    pub subfields: Vec<Subfield>,
}

fn blank(indicator: char) -> char {
    if indicator == '_' { ' ' } else { indicator }
}

impl DataField {
    pub fn new(tag: impl Into<String>, ind1: char, ind2: char) -> Self {
        Self { tag: tag.into(), ind1: blank(ind1), ind2: blank(ind2), subfields: Vec::new() }
    }

    pub fn with_subfield(mut self, code: char, value: impl Into<String>) -> Self {
        self.subfields.push(Subfield { code, value: value.into() });
        self
    }

    /// First value of subfield `code`.
    pub fn subfield(&self, code: char) -> Option<&str> {
        self.subfields(code).next()
    }

    pub fn subfields(&self, code: char) -> impl Iterator<Item = &str> {
        self.subfields.iter().filter(move |s| s.code == code).map(|s| s.value.as_str())
    }

    /// `None` indicators match anything.
    pub fn matches(&self, tag: &str, ind1: Option<char>, ind2: Option<char>) -> bool {
        self.tag == tag
            && ind1.is_none_or(|ind| blank(ind) == self.ind1)
            && ind2.is_none_or(|ind| blank(ind) == self.ind2)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: u64,
    pub fields: Vec<DataField>,
}

impl Record {
    pub fn new(id: u64) -> Self {
        Self { id, fields: Vec::new() }
    }

    pub fn with_field(mut self, field: DataField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(&self, tag: &str, ind1: Option<char>, ind2: Option<char>) -> impl Iterator<Item = &DataField> {
        self.fields.iter().filter(move |field| field.matches(tag, ind1, ind2))
    }

    /// The attached files and links, one per `856 4_` field.
    pub fn file_references(&self) -> Vec<RawFileReference> {
        let (ind1, ind2) = FILE_INDICATORS;
        self.fields(FILE_TAG, Some(ind1), Some(ind2))
            .map(|field| RawFileReference {
                url: field.subfield('u').map(str::to_string),
                description: field.subfield('y').map(str::to_string),
                format_hint: field.subfield('q').map(str::to_string),
            })
            .collect()
    }

    /// Reads the first record of a MARCXML document. Namespace prefixes are
    /// ignored; the identifier comes from control field `001`.
    pub fn from_marcxml(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut id = None;
        let mut fields = Vec::new();
        let mut field: Option<DataField> = None;
        let mut control: Option<String> = None;
        let mut code: Option<char> = None;
        let mut text: Option<String> = None;
        loop {
            let event = match reader.read_event() {
                Ok(event) => event,
                Err(err) => {
                    let position = reader.buffer_position();
                    exn::bail!(ErrorKind::MalformedRecord(format!("{err} (at byte {position})")));
                },
            };
            match event {
                Event::Start(start) => match start.local_name().as_ref() {
                    b"controlfield" => {
                        control = Some(attribute(&start, "tag")?.unwrap_or_default());
                        text = Some(String::new());
                    },
                    b"datafield" => field = Some(data_field(&start)?),
                    b"subfield" => {
                        code = attribute(&start, "code")?.and_then(|code| code.chars().next());
                        text = Some(String::new());
                    },
                    _ => {},
                },
                Event::Empty(start) if start.local_name().as_ref() == b"datafield" => {
                    fields.push(data_field(&start)?);
                },
                Event::Text(chunk) => {
                    if let Some(buffer) = text.as_mut() {
                        let chunk = chunk
                            .unescape()
                            .or_raise(|| ErrorKind::MalformedRecord("invalid character data".to_string()))?;
                        buffer.push_str(&chunk);
                    }
                },
                Event::CData(chunk) => {
                    if let Some(buffer) = text.as_mut() {
                        buffer.push_str(&String::from_utf8_lossy(&chunk));
                    }
                },
                Event::End(end) => match end.local_name().as_ref() {
                    b"controlfield" => {
                        let value = text.take().unwrap_or_default();
                        if control.take().as_deref() == Some("001") {
                            let parsed = value.trim().parse::<u64>().or_raise(|| {
                                ErrorKind::MalformedRecord(format!("control number is not numeric: {value:?}"))
                            })?;
                            id = Some(parsed);
                        }
                    },
                    b"subfield" => {
                        if let (Some(field), Some(code), Some(value)) = (field.as_mut(), code.take(), text.take()) {
                            field.subfields.push(Subfield { code, value });
                        }
                    },
                    b"datafield" => fields.extend(field.take()),
                    b"record" => break,
                    _ => {},
                },
                Event::Eof => break,
                _ => {},
            }
        }
        let id = id.ok_or_raise(|| ErrorKind::MissingIdentifier)?;
        tracing::trace!(record = id, fields = fields.len(), "read MARCXML record");
        Ok(Self { id, fields })
    }
}

fn attribute(start: &BytesStart<'_>, name: &str) -> Result<Option<String>> {
    let found = start
        .try_get_attribute(name)
        .or_raise(|| ErrorKind::MalformedRecord(format!("invalid attribute {name}")))?;
    match found {
        Some(attribute) => {
            let value = attribute
                .unescape_value()
                .or_raise(|| ErrorKind::MalformedRecord(format!("invalid value for attribute {name}")))?;
            Ok(Some(value.into_owned()))
        },
        None => Ok(None),
    }
}

fn indicator(start: &BytesStart<'_>, name: &str) -> Result<char> {
    Ok(attribute(start, name)?.and_then(|value| value.chars().next()).unwrap_or(' '))
}

fn data_field(start: &BytesStart<'_>) -> Result<DataField> {
    let tag = attribute(start, "tag")?.ok_or_raise(|| ErrorKind::MalformedRecord("datafield without tag".to_string()))?;
    Ok(DataField::new(tag, indicator(start, "ind1")?, indicator(start, "ind2")?))
}
