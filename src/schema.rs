//! The structured résumé record returned by the extraction model.
//!
//! Parsing is forgiving at every level. Fields and items that miss data keep
//! whatever they have. Values of the wrong JSON shape are coerced when the
//! intent is obvious and dropped with a warning otherwise. Unknown section
//! types are kept verbatim so they can still be rendered as plain text.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::Error;

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ResumeRecord {
    #[serde(deserialize_with = "string_or_default")]
    pub name: String,
    #[serde(deserialize_with = "optional_text", skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(deserialize_with = "optional_text", skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
    #[serde(deserialize_with = "sections_or_default")]
    pub sections: Vec<Section>,
}

impl ResumeRecord {
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The summary text, if there is anything to show.
    pub fn about_text(&self) -> Option<&str> {
        self.about.as_deref().filter(|a| !a.trim().is_empty())
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(from = "RawSection", into = "RawSection")]
pub struct Section {
    pub title: String,
    pub body: SectionBody,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SectionBody {
    Bullets(Vec<BulletItem>),
    Experience(Vec<Position>),
    List(Vec<String>),
    Text(Vec<TextItem>),
    /// A section type outside the known set. Items are kept as raw JSON.
    Other { kind: String, items: Vec<Value> },
}

impl SectionBody {
    pub fn kind(&self) -> &str {
        match self {
            SectionBody::Bullets(_) => "bullets",
            SectionBody::Experience(_) => "experience",
            SectionBody::List(_) => "list",
            SectionBody::Text(_) => "text",
            SectionBody::Other { kind, .. } => kind.as_str(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SectionBody::Bullets(items) => items.len(),
            SectionBody::Experience(positions) => positions.len(),
            SectionBody::List(items) => items.len(),
            SectionBody::Text(items) => items.len(),
            SectionBody::Other { items, .. } => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BulletItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Position {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dates: Option<String>,
    pub details: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technologies: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TextItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
}

/// Wire shape of a section, before the payload is interpreted by kind.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
struct RawSection {
    #[serde(deserialize_with = "string_or_default")]
    title: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    kind: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    items: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    positions: Option<Value>,
}

fn string_or_default<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    Ok(Option::<Value>::deserialize(de)?
        .as_ref()
        .and_then(scalar_text)
        .unwrap_or_default())
}

fn optional_text<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(de)? {
        None | Some(Value::Null) => None,
        Some(value) => {
            let text = scalar_text(&value);
            if text.is_none() {
                log::warn!("ignoring non-text field value {value}");
            }
            text
        }
    })
}

/// Sections are read one by one so a single bad entry only loses itself.
fn sections_or_default<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<Section>, D::Error> {
    let entries = match Option::<Value>::deserialize(de)? {
        Some(Value::Array(entries)) => entries,
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(other) => {
            log::warn!("`sections` is not an array, ignoring {other}");
            return Ok(Vec::new());
        }
    };
    Ok(entries
        .into_iter()
        .filter_map(|entry| {
            if !entry.is_object() {
                log::warn!("skipping section that is not an object: {entry}");
                return None;
            }
            serde_json::from_value::<Section>(entry)
                .inspect_err(|e| log::warn!("skipping unreadable section: {e}"))
                .ok()
        })
        .collect())
}

/// Text of a JSON scalar. Objects, arrays and null have none.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn field(obj: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(scalar_text)
}

fn array_items(title: &str, key: &str, value: Option<Value>) -> Vec<Value> {
    match value {
        Some(Value::Array(items)) => items,
        None | Some(Value::Null) => Vec::new(),
        Some(other) => {
            log::warn!("section {title:?}: `{key}` is not an array, ignoring {other}");
            Vec::new()
        }
    }
}

impl BulletItem {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Object(obj) => {
                let item = BulletItem { label: field(obj, "label"), value: field(obj, "value") };
                (item.label.is_some() || item.value.is_some()).then_some(item)
            }
            other => scalar_text(other).map(|v| BulletItem { label: None, value: Some(v) }),
        }
    }
}

impl Position {
    fn from_value(value: &Value) -> Option<Self> {
        let Value::Object(obj) = value else {
            return None;
        };
        let details = match obj.get("details") {
            Some(Value::Array(lines)) => lines.iter().filter_map(scalar_text).collect(),
            Some(other) => scalar_text(other).into_iter().collect(),
            None => Vec::new(),
        };
        let technologies = match obj.get("technologies") {
            Some(Value::Array(names)) => {
                let names: Vec<String> = names.iter().filter_map(scalar_text).collect();
                (!names.is_empty()).then(|| names.join(", "))
            }
            Some(other) => scalar_text(other),
            None => None,
        };
        Some(Position {
            role: field(obj, "role"),
            dates: field(obj, "dates"),
            details,
            technologies,
        })
    }
}

impl TextItem {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Object(obj) => {
                let item = TextItem { value: field(obj, "value"), sub: field(obj, "sub") };
                (item.value.is_some() || item.sub.is_some()).then_some(item)
            }
            other => scalar_text(other).map(|v| TextItem { value: Some(v), sub: None }),
        }
    }
}

fn collect_items<T>(title: &str, items: &[Value], parse: impl Fn(&Value) -> Option<T>) -> Vec<T> {
    items
        .iter()
        .filter_map(|item| {
            let parsed = parse(item);
            if parsed.is_none() {
                log::warn!("section {title:?}: skipping unusable item {item}");
            }
            parsed
        })
        .collect()
}

impl From<RawSection> for Section {
    fn from(raw: RawSection) -> Self {
        let title = raw.title;
        let kind = raw.kind.as_ref().and_then(scalar_text).unwrap_or_default();
        let body = match kind.as_str() {
            "bullets" => {
                let items = array_items(&title, "items", raw.items);
                SectionBody::Bullets(collect_items(&title, &items, BulletItem::from_value))
            }
            "experience" => {
                // Some responses put positions under `items`.
                let payload = raw.positions.filter(|v| !v.is_null()).or(raw.items);
                let positions = array_items(&title, "positions", payload);
                SectionBody::Experience(collect_items(&title, &positions, Position::from_value))
            }
            "list" => {
                let items = array_items(&title, "items", raw.items);
                SectionBody::List(collect_items(&title, &items, scalar_text))
            }
            "text" => {
                let items = array_items(&title, "items", raw.items);
                SectionBody::Text(collect_items(&title, &items, TextItem::from_value))
            }
            _ => {
                log::warn!("section {title:?}: unknown type {kind:?}, rendering as plain text");
                let items = array_items(&title, "items", raw.items);
                SectionBody::Other { kind: kind.clone(), items }
            }
        };
        Section { title, body }
    }
}

impl From<Section> for RawSection {
    fn from(section: Section) -> Self {
        let kind = Some(Value::String(section.body.kind().to_string()));
        let (items, positions) = match section.body {
            SectionBody::Bullets(items) => (serde_json::to_value(items).ok(), None),
            SectionBody::Experience(positions) => (None, serde_json::to_value(positions).ok()),
            SectionBody::List(items) => (serde_json::to_value(items).ok(), None),
            SectionBody::Text(items) => (serde_json::to_value(items).ok(), None),
            SectionBody::Other { items, .. } => (Some(Value::Array(items)), None),
        };
        RawSection { title: section.title, kind, items, positions }
    }
}
