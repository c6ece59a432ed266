//! Native content-record fields.
//!
//! A [`NativeRecord`] carries every field the content-record store keeps for
//! a record. These fields are always present and are copied verbatim from the
//! store snapshot; they are never lazily loaded. Fields are addressable by
//! their underscored name so the model core can read and write them through
//! the same attribute surface as side-store attributes.

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::id::RecordId;
use crate::value::AttrValue;

/// Underscored names of every native field, in store order.
pub const NATIVE_FIELDS: &[&str] = &[
    "id",
    "post_author",
    "post_date",
    "post_date_gmt",
    "post_content",
    "post_title",
    "post_excerpt",
    "post_status",
    "comment_status",
    "ping_status",
    "post_password",
    "post_name",
    "to_ping",
    "pinged",
    "post_modified",
    "post_modified_gmt",
    "post_content_filtered",
    "post_parent",
    "guid",
    "menu_order",
    "post_type",
    "post_mime_type",
    "comment_count",
    "filter",
];

/// The full native field set of a content record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NativeRecord {
    pub id: Option<RecordId>,
    pub post_author: u64,
    pub post_date: String,
    pub post_date_gmt: String,
    pub post_content: String,
    pub post_title: String,
    pub post_excerpt: String,
    pub post_status: String,
    pub comment_status: String,
    pub ping_status: String,
    pub post_password: String,
    pub post_name: String,
    pub to_ping: String,
    pub pinged: String,
    pub post_modified: String,
    pub post_modified_gmt: String,
    pub post_content_filtered: String,
    pub post_parent: u64,
    pub guid: String,
    pub menu_order: i64,
    pub post_type: String,
    pub post_mime_type: String,
    pub comment_count: i64,
    pub filter: String,
}

impl NativeRecord {
    /// Returns `true` if `name` is a native field.
    pub fn is_native_field(name: &str) -> bool {
        NATIVE_FIELDS.contains(&name)
    }

    /// Read a native field by underscored name.
    ///
    /// Returns `None` for names that are not native fields.
    pub fn field(&self, name: &str) -> Option<AttrValue> {
        let value = match name {
            "id" => AttrValue::from(self.id.map(|id| id.get())),
            "post_author" => AttrValue::from(self.post_author),
            "post_parent" => AttrValue::from(self.post_parent),
            "menu_order" => AttrValue::Int(self.menu_order),
            "comment_count" => AttrValue::Int(self.comment_count),
            other => AttrValue::Str(self.text_field(other)?.clone()),
        };
        Some(value)
    }

    /// Write a native field by underscored name, coercing the value to the
    /// field's type.
    pub fn set_field(&mut self, name: &str, value: AttrValue) -> Result<(), TypeError> {
        match name {
            "id" => {
                let raw = coerce_int(name, &value)?;
                self.id = u64::try_from(raw).ok().and_then(RecordId::new);
            }
            "post_author" => self.post_author = coerce_unsigned(name, &value)?,
            "post_parent" => self.post_parent = coerce_unsigned(name, &value)?,
            "menu_order" => self.menu_order = coerce_int(name, &value)?,
            "comment_count" => self.comment_count = coerce_int(name, &value)?,
            other => {
                let text = coerce_text(other, &value)?;
                let slot = self
                    .text_field_mut(other)
                    .ok_or_else(|| TypeError::UnknownField(other.to_string()))?;
                *slot = text;
            }
        }
        Ok(())
    }

    fn text_field(&self, name: &str) -> Option<&String> {
        let field = match name {
            "post_date" => &self.post_date,
            "post_date_gmt" => &self.post_date_gmt,
            "post_content" => &self.post_content,
            "post_title" => &self.post_title,
            "post_excerpt" => &self.post_excerpt,
            "post_status" => &self.post_status,
            "comment_status" => &self.comment_status,
            "ping_status" => &self.ping_status,
            "post_password" => &self.post_password,
            "post_name" => &self.post_name,
            "to_ping" => &self.to_ping,
            "pinged" => &self.pinged,
            "post_modified" => &self.post_modified,
            "post_modified_gmt" => &self.post_modified_gmt,
            "post_content_filtered" => &self.post_content_filtered,
            "guid" => &self.guid,
            "post_type" => &self.post_type,
            "post_mime_type" => &self.post_mime_type,
            "filter" => &self.filter,
            _ => return None,
        };
        Some(field)
    }

    fn text_field_mut(&mut self, name: &str) -> Option<&mut String> {
        let field = match name {
            "post_date" => &mut self.post_date,
            "post_date_gmt" => &mut self.post_date_gmt,
            "post_content" => &mut self.post_content,
            "post_title" => &mut self.post_title,
            "post_excerpt" => &mut self.post_excerpt,
            "post_status" => &mut self.post_status,
            "comment_status" => &mut self.comment_status,
            "ping_status" => &mut self.ping_status,
            "post_password" => &mut self.post_password,
            "post_name" => &mut self.post_name,
            "to_ping" => &mut self.to_ping,
            "pinged" => &mut self.pinged,
            "post_modified" => &mut self.post_modified,
            "post_modified_gmt" => &mut self.post_modified_gmt,
            "post_content_filtered" => &mut self.post_content_filtered,
            "guid" => &mut self.guid,
            "post_type" => &mut self.post_type,
            "post_mime_type" => &mut self.post_mime_type,
            "filter" => &mut self.filter,
            _ => return None,
        };
        Some(field)
    }
}

fn coerce_text(field: &str, value: &AttrValue) -> Result<String, TypeError> {
    match value {
        AttrValue::Null => Ok(String::new()),
        AttrValue::Str(s) => Ok(s.clone()),
        AttrValue::Int(i) => Ok(i.to_string()),
        AttrValue::Float(f) => Ok(f.to_string()),
        AttrValue::Bool(b) => Ok(if *b { "1".into() } else { String::new() }),
        other => Err(TypeError::FieldType {
            field: field.to_string(),
            expected: "string",
            actual: other.type_name(),
        }),
    }
}

fn coerce_int(field: &str, value: &AttrValue) -> Result<i64, TypeError> {
    let mismatch = || TypeError::FieldType {
        field: field.to_string(),
        expected: "int",
        actual: value.type_name(),
    };
    match value {
        AttrValue::Null => Ok(0),
        AttrValue::Int(i) => Ok(*i),
        AttrValue::Str(s) => s.trim().parse().map_err(|_| mismatch()),
        _ => Err(mismatch()),
    }
}

fn coerce_unsigned(field: &str, value: &AttrValue) -> Result<u64, TypeError> {
    let raw = coerce_int(field, value)?;
    u64::try_from(raw).map_err(|_| TypeError::FieldType {
        field: field.to_string(),
        expected: "unsigned int",
        actual: "negative int",
    })
}

/// The minimal payload used to create a new content record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
    pub post_status: String,
    pub post_type: String,
    pub post_author: u64,
    pub post_title: String,
    pub post_date: String,
    pub post_content: String,
}

impl NewRecord {
    /// Expand the create payload into a full native record with the given id.
    pub fn into_native(self, id: RecordId) -> NativeRecord {
        NativeRecord {
            id: Some(id),
            post_author: self.post_author,
            post_date: self.post_date,
            post_content: self.post_content,
            post_title: self.post_title,
            post_status: self.post_status,
            post_type: self.post_type,
            ..NativeRecord::default()
        }
    }
}
