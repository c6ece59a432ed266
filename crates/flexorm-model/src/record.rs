//! The record read/write surface.
//!
//! A [`Record`] holds the native fields of one content record plus the
//! declared attributes that have been loaded or set on it. Reads go through
//! the lazy loader; writes only touch memory and mark the attribute dirty
//! until [`Record::persist`] runs.

use std::collections::BTreeMap;
use std::io::Write;

use flexorm_store::ImageAttrs;
use flexorm_types::{AttrValue, NativeRecord, RecordId};
use tracing::{debug, info, warn};

use crate::config::LoadFailurePolicy;
use crate::descriptor::{AttributeDescriptor, StorageKind};
use crate::dirty::DirtySet;
use crate::error::ModelResult;
use crate::format::format_timestamp;
use crate::model::Model;
use crate::schema::{AttributeSlot, ModelSchema};

/// Read-path options applied after the value is loaded. They shape what the
/// caller receives and are never stored back.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Return every assigned term of a taxonomy attribute instead of only
    /// the first.
    pub all_terms: bool,
    /// Render the value as a timestamp with this `date()`-style format.
    pub format: Option<String>,
}

impl ReadOptions {
    pub fn all_terms() -> Self {
        Self {
            all_terms: true,
            format: None,
        }
    }

    pub fn formatted(fmt: &str) -> Self {
        Self {
            all_terms: false,
            format: Some(fmt.to_string()),
        }
    }
}

/// One content record with its declared attributes.
#[derive(Debug)]
pub struct Record {
    pub(crate) model: Model,
    pub(crate) native: NativeRecord,
    pub(crate) values: BTreeMap<String, AttrValue>,
    pub(crate) dirty: DirtySet,
    original: Option<NativeRecord>,
    permalink: Option<String>,
}

impl Record {
    pub(crate) fn new(
        model: Model,
        native: NativeRecord,
        original: Option<NativeRecord>,
        permalink: Option<String>,
    ) -> Self {
        Self {
            model,
            native,
            values: BTreeMap::new(),
            dirty: DirtySet::new(),
            original,
            permalink,
        }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub(crate) fn schema(&self) -> &ModelSchema {
        self.model.schema()
    }

    /// The record identity, once persisted.
    pub fn id(&self) -> Option<RecordId> {
        self.native.id
    }

    pub fn native(&self) -> &NativeRecord {
        &self.native
    }

    pub fn dirty(&self) -> &DirtySet {
        &self.dirty
    }

    /// The permalink computed when the record was constructed.
    pub fn permalink(&self) -> Option<&str> {
        self.permalink.as_deref()
    }

    /// The snapshot the record was constructed from, or `None` for a record
    /// created empty.
    pub fn original_snapshot(&self) -> Option<&NativeRecord> {
        self.original.as_ref()
    }

    /// Declared attributes currently held in memory, loaded or set.
    pub fn values(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Returns `true` if the declared attribute holds a value, loaded or set.
    pub fn is_set(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Read an attribute with default options.
    pub fn get(&mut self, name: &str) -> ModelResult<AttrValue> {
        self.get_with(name, &ReadOptions::default())
    }

    /// Read an attribute and render it as a timestamp with `fmt`.
    pub fn get_formatted(&mut self, name: &str, fmt: &str) -> ModelResult<AttrValue> {
        self.get_with(name, &ReadOptions::formatted(fmt))
    }

    /// Read an attribute.
    ///
    /// Native fields are read from the record; `post_author` reads as the
    /// author's display name. Declared attributes are loaded from their
    /// store on first read. An attribute that is still unset reads as
    /// [`AttrValue::Null`]. Taxonomy lists collapse to their first term
    /// unless `options.all_terms` is set.
    pub fn get_with(&mut self, name: &str, options: &ReadOptions) -> ModelResult<AttrValue> {
        let value = match self.schema().resolve(name)? {
            AttributeSlot::Native("post_author") => self.author_display_name()?,
            AttributeSlot::Native(field) => self.native.field(field).unwrap_or_default(),
            AttributeSlot::Declared(descriptor) => {
                self.ensure_loaded(name, &descriptor)?;
                let value = self.values.get(name).cloned().unwrap_or_default();
                match value {
                    AttrValue::List(mut terms)
                        if descriptor.kind == Some(StorageKind::Taxonomy) && !options.all_terms =>
                    {
                        if terms.is_empty() {
                            AttrValue::Null
                        } else {
                            terms.swap_remove(0)
                        }
                    }
                    other => other,
                }
            }
        };

        Ok(match &options.format {
            Some(fmt) => match format_timestamp(&value, fmt) {
                Some(rendered) => AttrValue::Str(rendered),
                None => {
                    warn!(attribute = name, value = value.type_name(), "value is not a timestamp");
                    value
                }
            },
            None => value,
        })
    }

    /// Read an attribute and write it to `out`.
    ///
    /// Strings are written verbatim. Terms of a taxonomy attribute are
    /// written as their name. Any other value produces no output.
    pub fn show(&mut self, name: &str, out: &mut dyn Write) -> ModelResult<()> {
        self.show_with(name, &ReadOptions::default(), out)
    }

    pub fn show_formatted(&mut self, name: &str, fmt: &str, out: &mut dyn Write) -> ModelResult<()> {
        self.show_with(name, &ReadOptions::formatted(fmt), out)
    }

    pub fn show_with(
        &mut self,
        name: &str,
        options: &ReadOptions,
        out: &mut dyn Write,
    ) -> ModelResult<()> {
        let taxonomy = matches!(
            self.schema().resolve(name)?,
            AttributeSlot::Declared(AttributeDescriptor {
                kind: Some(StorageKind::Taxonomy),
                ..
            })
        );
        match self.get_with(name, options)? {
            AttrValue::Str(s) => out.write_all(s.as_bytes())?,
            AttrValue::Term(term) if taxonomy => out.write_all(term.name.as_bytes())?,
            _ => {}
        }
        Ok(())
    }

    /// Assign an attribute and mark it dirty. Nothing is written to a store
    /// until [`persist`](Self::persist).
    ///
    /// Declared attributes take the value verbatim. Native fields coerce it
    /// to the field's type and fail if it cannot be coerced.
    pub fn set(&mut self, name: &str, value: impl Into<AttrValue>) -> ModelResult<()> {
        let value = value.into();
        match self.schema().resolve(name)? {
            AttributeSlot::Native(field) => self.native.set_field(field, value)?,
            AttributeSlot::Declared(_) => {
                self.values.insert(name.to_string(), value);
            }
        }
        self.dirty.mark(name);
        Ok(())
    }

    /// Drop a declared attribute's in-memory value so the next read loads it
    /// again. A pending write of the attribute is discarded with it.
    pub fn unset(&mut self, name: &str) -> Option<AttrValue> {
        let previous = self.values.remove(name);
        if previous.is_some() {
            self.dirty.remove(name);
        }
        previous
    }

    /// Featured image markup for this record. `class` defaults to empty and
    /// is overridden by the caller's attributes.
    pub fn featured_image(&self, size: &str, attrs: &ImageAttrs) -> ModelResult<String> {
        let Some(id) = self.id() else {
            return Ok(String::new());
        };
        let mut merged = ImageAttrs::from([("class".to_string(), String::new())]);
        merged.extend(attrs.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(self.model.backends().images.featured_image(id, size, &merged)?)
    }

    pub fn show_featured_image(
        &self,
        size: &str,
        attrs: &ImageAttrs,
        out: &mut dyn Write,
    ) -> ModelResult<()> {
        let html = self.featured_image(size, attrs)?;
        out.write_all(html.as_bytes())?;
        Ok(())
    }

    /// Delete the record from the record store. A record without an
    /// identity is left alone and `Ok(false)` is returned.
    pub fn delete(&self, force: bool) -> ModelResult<bool> {
        let Some(id) = self.id() else {
            debug!(model = self.schema().name(), "delete skipped for unsaved record");
            return Ok(false);
        };
        let deleted = self.model.backends().records.delete(id, force)?;
        info!(model = self.schema().name(), %id, force, deleted, "record deleted");
        Ok(deleted)
    }

    fn author_display_name(&self) -> ModelResult<AttrValue> {
        let author = self.native.post_author;
        match self.model.backends().authors.display_name(author) {
            Ok(name) => Ok(AttrValue::Str(name.unwrap_or_default())),
            Err(e) => match self.schema().config().load_failure {
                LoadFailurePolicy::Propagate => Err(e.into()),
                LoadFailurePolicy::LeaveUnset => {
                    warn!(author, error = %e, "author lookup failed; returning raw identity");
                    Ok(AttrValue::from(author))
                }
            },
        }
    }
}
