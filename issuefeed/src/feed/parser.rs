use super::{RawEntry, Update};
use crate::error::{IssueFeedError, Result};
use chrono::{DateTime, Utc};
use quick_xml::DeError;
use serde::de::{self, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

// Wire shapes. Elements are matched by local name, so `issues:label` and
// `label` decode the same way. Unknown elements are ignored.

#[derive(Debug, Default, Deserialize)]
struct FeedDoc {
    #[serde(rename = "entry", default)]
    entries: Vec<EntryDoc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EntryDoc {
    id: String,
    title: TextDoc,
    published: Option<String>,
    content: TextDoc,
    author: Vec<AuthorDoc>,
    owner: UsernamesDoc,
    status: String,
    label: Vec<String>,
    #[serde(rename = "mergedInto")]
    merged_into: String,
    cc: Vec<UsernamesDoc>,
    updates: Vec<UpdateDoc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UpdateDoc {
    summary: String,
    #[serde(rename = "ownerUpdate")]
    owner_update: String,
    label: Vec<String>,
    status: String,
    #[serde(rename = "mergedInto")]
    merged_into: String,
    cc: Vec<UsernamesDoc>,
}

/// All character data inside an element, nested markup included
///
/// Attributes (`type="html"`) are dropped. Text from child elements is
/// concatenated in document order, so `<content type="xhtml">` bodies keep
/// their text.
#[derive(Debug, Default)]
struct TextDoc {
    value: String,
}

impl<'de> Deserialize<'de> for TextDoc {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer
            .deserialize_any(TextVisitor)
            .map(|value| TextDoc { value })
    }
}

struct TextVisitor;

impl<'de> Visitor<'de> for TextVisitor {
    type Value = String;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("element text or nested markup")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<String, E> {
        Ok(v)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<String, E> {
        Ok(String::new())
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<String, E> {
        Ok(String::new())
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<String, A::Error> {
        let mut text = String::new();
        while let Some(part) = seq.next_element::<TextDoc>()? {
            text.push_str(&part.value);
        }
        Ok(text)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<String, A::Error> {
        let mut text = String::new();
        while let Some(key) = map.next_key::<String>()? {
            if key.starts_with('@') {
                map.next_value::<IgnoredAny>()?;
            } else {
                text.push_str(&map.next_value::<TextDoc>()?.value);
            }
        }
        Ok(text)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AuthorDoc {
    name: String,
}

/// `<cc><username>..</username></cc>`, possibly repeated
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UsernamesDoc {
    username: Vec<String>,
}

fn flatten_usernames(docs: Vec<UsernamesDoc>) -> Vec<String> {
    docs.into_iter().flat_map(|doc| doc.username).collect()
}

impl From<UpdateDoc> for Update {
    fn from(doc: UpdateDoc) -> Self {
        Self {
            summary: doc.summary,
            owner: doc.owner_update,
            labels: doc.label,
            status: doc.status,
            merged_into: doc.merged_into,
            cc: flatten_usernames(doc.cc),
        }
    }
}

impl EntryDoc {
    fn into_entry(mut self) -> std::result::Result<RawEntry, DeError> {
        let published = match self.published.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                DateTime::parse_from_rfc3339(raw)
                    .map(|t| t.with_timezone(&Utc))
                    .map_err(|e| {
                        <DeError as serde::de::Error>::custom(format!(
                            "entry '{}': invalid published timestamp '{}': {}",
                            self.id, raw, e
                        ))
                    })?,
            ),
        };

        Ok(RawEntry {
            id: self.id.trim().to_string(),
            title: self.title.value,
            published,
            content: self.content.value,
            // Last one wins when an entry names several authors
            author: self.author.pop().map(|a| a.name).unwrap_or_default(),
            owner: self.owner.username.into_iter().next().unwrap_or_default(),
            status: self.status,
            labels: self.label,
            merged_into: self.merged_into,
            cc: flatten_usernames(self.cc),
            updates: self.updates.into_iter().map(Update::from).collect(),
        })
    }
}

/// Decode a feed document into its entries, in document order
///
/// `origin` names the input in error messages. No partial result is
/// returned: any schema violation fails the whole document.
pub fn parse_reader<R: BufRead>(reader: R, origin: &Path) -> Result<Vec<RawEntry>> {
    let malformed = |source: DeError| IssueFeedError::MalformedInput {
        path: origin.to_path_buf(),
        source,
    };

    let feed: FeedDoc = quick_xml::de::from_reader(reader).map_err(malformed)?;

    feed.entries
        .into_iter()
        .map(|doc| doc.into_entry().map_err(malformed))
        .collect()
}

/// Parse one export file
///
/// The file handle is closed before this returns, whether or not the
/// document decoded.
pub fn parse_file(path: &Path) -> Result<Vec<RawEntry>> {
    let file = File::open(path).map_err(|source| IssueFeedError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_reader(BufReader::new(file), path)
}
