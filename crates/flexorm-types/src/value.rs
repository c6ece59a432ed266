//! Dynamic attribute values.
//!
//! Model attributes live in heterogeneous side stores, so their values are not
//! statically typed. [`AttrValue`] is the common currency between the model
//! core and every store port. It serializes untagged, so fixtures and store
//! dumps are plain JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A taxonomy term object as returned by the taxonomy store.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Term {
    /// Store-assigned term identity.
    pub term_id: i64,
    /// Human-readable term name.
    pub name: String,
    /// URL-safe unique slug within the taxonomy.
    pub slug: String,
    /// The taxonomy this term belongs to.
    pub taxonomy: String,
    /// Parent term id, `0` for top-level terms.
    #[serde(default)]
    pub parent: i64,
    /// Number of records assigned to the term.
    #[serde(default)]
    pub count: u64,
}

impl Term {
    /// Create a top-level term with no assignments.
    pub fn new(
        term_id: i64,
        name: impl Into<String>,
        slug: impl Into<String>,
        taxonomy: impl Into<String>,
    ) -> Self {
        Self {
            term_id,
            name: name.into(),
            slug: slug.into(),
            taxonomy: taxonomy.into(),
            parent: 0,
            count: 0,
        }
    }
}

/// A sanitized reference to a term, used when replacing term assignments.
///
/// Only integer identifiers and string slugs are meaningful to the taxonomy
/// store; everything else is discarded before a write.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TermRef {
    Id(i64),
    Slug(String),
}

impl TermRef {
    /// Convert a single value into a term reference, if it is an id or slug.
    pub fn from_value(value: &AttrValue) -> Option<Self> {
        match value {
            AttrValue::Int(id) => Some(TermRef::Id(*id)),
            AttrValue::Str(slug) => Some(TermRef::Slug(slug.clone())),
            _ => None,
        }
    }

    /// Sanitize an attribute value into the list of term references it names.
    ///
    /// Lists keep only their integer and string elements, in order. A bare
    /// integer or string is a single reference. Any other value names no
    /// terms, which clears the assignment.
    pub fn sanitize(value: &AttrValue) -> Vec<Self> {
        match value {
            AttrValue::List(items) => items.iter().filter_map(Self::from_value).collect(),
            other => Self::from_value(other).into_iter().collect(),
        }
    }
}

/// The value held by a model attribute.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<AttrValue>),
    Term(Term),
    Map(BTreeMap<String, AttrValue>),
}

impl AttrValue {
    /// A short name for the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            AttrValue::Null => "null",
            AttrValue::Bool(_) => "bool",
            AttrValue::Int(_) => "int",
            AttrValue::Float(_) => "float",
            AttrValue::Str(_) => "string",
            AttrValue::List(_) => "list",
            AttrValue::Term(_) => "term",
            AttrValue::Map(_) => "map",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttrValue::Null)
    }

    /// Loose truthiness: null, `false`, zero, empty strings, `"0"` and empty
    /// collections are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            AttrValue::Null => false,
            AttrValue::Bool(b) => *b,
            AttrValue::Int(i) => *i != 0,
            AttrValue::Float(f) => *f != 0.0,
            AttrValue::Str(s) => !(s.is_empty() || s == "0"),
            AttrValue::List(items) => !items.is_empty(),
            AttrValue::Term(_) => true,
            AttrValue::Map(map) => !map.is_empty(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[AttrValue]> {
        match self {
            AttrValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_term(&self) -> Option<&Term> {
        match self {
            AttrValue::Term(term) => Some(term),
            _ => None,
        }
    }

    /// Build a list value from term objects.
    pub fn from_terms(terms: Vec<Term>) -> Self {
        AttrValue::List(terms.into_iter().map(AttrValue::Term).collect())
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Str(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Str(s)
    }
}

impl From<i64> for AttrValue {
    fn from(i: i64) -> Self {
        AttrValue::Int(i)
    }
}

impl From<u64> for AttrValue {
    fn from(i: u64) -> Self {
        i64::try_from(i)
            .map(AttrValue::Int)
            .unwrap_or(AttrValue::Float(i as f64))
    }
}

impl From<f64> for AttrValue {
    fn from(f: f64) -> Self {
        AttrValue::Float(f)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Bool(b)
    }
}

impl From<Term> for AttrValue {
    fn from(term: Term) -> Self {
        AttrValue::Term(term)
    }
}

impl<T: Into<AttrValue>> From<Vec<T>> for AttrValue {
    fn from(items: Vec<T>) -> Self {
        AttrValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<AttrValue>> From<Option<T>> for AttrValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(AttrValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(id: i64, slug: &str) -> Term {
        Term::new(id, slug.to_uppercase(), slug, "category")
    }

    #[test]
    fn sanitize_keeps_ids_and_slugs_only() {
        let mut object = BTreeMap::new();
        object.insert("x".to_string(), AttrValue::Int(1));
        let value = AttrValue::List(vec![
            AttrValue::Int(3),
            AttrValue::from("urgent"),
            AttrValue::Float(4.5),
            AttrValue::Map(object),
        ]);
        assert_eq!(
            TermRef::sanitize(&value),
            vec![TermRef::Id(3), TermRef::Slug("urgent".into())]
        );
    }

    #[test]
    fn sanitize_discards_term_objects() {
        let value = AttrValue::List(vec![AttrValue::Term(term(1, "news")), AttrValue::Int(9)]);
        assert_eq!(TermRef::sanitize(&value), vec![TermRef::Id(9)]);
    }

    #[test]
    fn sanitize_scalar_values() {
        assert_eq!(TermRef::sanitize(&AttrValue::Int(5)), vec![TermRef::Id(5)]);
        assert_eq!(
            TermRef::sanitize(&AttrValue::from("news")),
            vec![TermRef::Slug("news".into())]
        );
        assert!(TermRef::sanitize(&AttrValue::Null).is_empty());
        assert!(TermRef::sanitize(&AttrValue::Bool(true)).is_empty());
    }

    #[test]
    fn truthiness() {
        assert!(!AttrValue::Null.is_truthy());
        assert!(!AttrValue::Bool(false).is_truthy());
        assert!(!AttrValue::from("0").is_truthy());
        assert!(!AttrValue::from("").is_truthy());
        assert!(!AttrValue::List(vec![]).is_truthy());
        assert!(AttrValue::Bool(true).is_truthy());
        assert!(AttrValue::from("Y-m-d").is_truthy());
        assert!(AttrValue::Int(-1).is_truthy());
    }

    #[test]
    fn untagged_json_shapes() {
        let json = r#"[1, 2.5, "a", true, null,
            {"term_id": 4, "name": "News", "slug": "news", "taxonomy": "category"},
            {"width": 300}]"#;
        let value: AttrValue = serde_json::from_str(json).unwrap();
        let items = value.as_list().unwrap();
        assert_eq!(items[0], AttrValue::Int(1));
        assert_eq!(items[1], AttrValue::Float(2.5));
        assert_eq!(items[2], AttrValue::from("a"));
        assert_eq!(items[3], AttrValue::Bool(true));
        assert!(items[4].is_null());
        assert_eq!(items[5].as_term().map(|t| t.slug.as_str()), Some("news"));
        assert!(matches!(items[6], AttrValue::Map(_)));
    }

    #[test]
    fn from_terms_builds_list() {
        let value = AttrValue::from_terms(vec![term(1, "a"), term(2, "b")]);
        assert_eq!(value.as_list().map(|l| l.len()), Some(2));
        assert_eq!(value.type_name(), "list");
    }

    #[test]
    fn option_conversion() {
        assert!(AttrValue::from(None::<String>).is_null());
        assert_eq!(AttrValue::from(Some("x")), AttrValue::from("x"));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        fn scalar() -> impl Strategy<Value = AttrValue> {
            prop_oneof![
                Just(AttrValue::Null),
                any::<bool>().prop_map(AttrValue::Bool),
                any::<i64>().prop_map(AttrValue::Int),
                (-1.0e6f64..1.0e6).prop_map(AttrValue::Float),
                "[a-z-]{0,12}".prop_map(AttrValue::Str),
            ]
        }

        proptest! {
            #[test]
            fn sanitize_preserves_ids_and_slugs_in_order(items in prop::collection::vec(scalar(), 0..16)) {
                let expected: Vec<TermRef> = items.iter().filter_map(TermRef::from_value).collect();
                let sanitized = TermRef::sanitize(&AttrValue::List(items.clone()));
                prop_assert_eq!(sanitized, expected);
            }
        }
    }
}
