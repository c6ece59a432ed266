//! In-memory taxonomy store.
//!
//! Terms belong to registered taxonomies. Assignments are kept per
//! `(record, taxonomy)` as an ordered list of term ids, and term counts are
//! maintained as assignments change.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;

use flexorm_types::{RecordId, Term, TermRef};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::memory::OpStats;
use crate::traits::TaxonomyStore;

/// An in-memory implementation of [`TaxonomyStore`].
#[derive(Debug)]
pub struct InMemoryTaxonomyStore {
    taxonomies: RwLock<BTreeSet<String>>,
    terms: RwLock<BTreeMap<i64, Term>>,
    assignments: RwLock<BTreeMap<(RecordId, String), Vec<i64>>>,
    next_term_id: AtomicI64,
    stats: OpStats,
}

impl InMemoryTaxonomyStore {
    pub fn new() -> Self {
        Self {
            taxonomies: RwLock::new(BTreeSet::new()),
            terms: RwLock::new(BTreeMap::new()),
            assignments: RwLock::new(BTreeMap::new()),
            next_term_id: AtomicI64::new(1),
            stats: OpStats::default(),
        }
    }

    /// Register a taxonomy so terms can be created and assigned in it.
    pub fn register_taxonomy(&self, taxonomy: &str) -> StoreResult<()> {
        self.taxonomies.write()?.insert(taxonomy.to_string());
        Ok(())
    }

    /// Create a term in a registered taxonomy, or return the existing term
    /// with the same slug.
    pub fn insert_term(&self, taxonomy: &str, name: &str, slug: &str) -> StoreResult<Term> {
        self.ensure_taxonomy(taxonomy)?;
        let mut terms = self.terms.write()?;
        if let Some(existing) = find_by_slug(&terms, taxonomy, slug) {
            return Ok(existing.clone());
        }
        let term_id = self.next_term_id.fetch_add(1, Ordering::SeqCst);
        let term = Term::new(term_id, name, slug, taxonomy);
        terms.insert(term_id, term.clone());
        Ok(term)
    }

    /// Store a term with a fixed id, replacing any term with that id.
    pub fn put_term(&self, term: Term) -> StoreResult<()> {
        self.taxonomies.write()?.insert(term.taxonomy.clone());
        self.next_term_id
            .fetch_max(term.term_id + 1, Ordering::SeqCst);
        self.terms.write()?.insert(term.term_id, term);
        Ok(())
    }

    /// All terms across every taxonomy, in id order.
    pub fn terms(&self) -> StoreResult<Vec<Term>> {
        Ok(self.terms.read()?.values().cloned().collect())
    }

    /// All assignments in `(record, taxonomy)` order.
    pub fn assignments(&self) -> StoreResult<Vec<(RecordId, String, Vec<i64>)>> {
        Ok(self
            .assignments
            .read()?
            .iter()
            .map(|((id, taxonomy), ids)| (*id, taxonomy.clone(), ids.clone()))
            .collect())
    }

    pub fn taxonomies(&self) -> StoreResult<Vec<String>> {
        Ok(self.taxonomies.read()?.iter().cloned().collect())
    }

    pub fn stats(&self) -> &OpStats {
        &self.stats
    }

    fn ensure_taxonomy(&self, taxonomy: &str) -> StoreResult<()> {
        if self.taxonomies.read()?.contains(taxonomy) {
            Ok(())
        } else {
            Err(StoreError::NotFound(format!("taxonomy {taxonomy}")))
        }
    }

    fn resolve(&self, taxonomy: &str, term: &TermRef) -> StoreResult<Option<i64>> {
        match term {
            TermRef::Id(term_id) => {
                let terms = self.terms.read()?;
                Ok(terms
                    .get(term_id)
                    .filter(|t| t.taxonomy == taxonomy)
                    .map(|t| t.term_id))
            }
            TermRef::Slug(slug) => {
                let slug = slugify(slug);
                if slug.is_empty() {
                    return Ok(None);
                }
                let name = term_ref_name(term);
                self.insert_term(taxonomy, &name, &slug)
                    .map(|t| Some(t.term_id))
            }
        }
    }
}

impl Default for InMemoryTaxonomyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaxonomyStore for InMemoryTaxonomyStore {
    fn object_terms(&self, id: RecordId, taxonomy: &str) -> StoreResult<Vec<Term>> {
        self.stats.record_read("object terms")?;
        self.ensure_taxonomy(taxonomy)?;
        let assignments = self.assignments.read()?;
        let Some(ids) = assignments.get(&(id, taxonomy.to_string())) else {
            return Ok(Vec::new());
        };
        let terms = self.terms.read()?;
        Ok(ids.iter().filter_map(|tid| terms.get(tid).cloned()).collect())
    }

    fn set_object_terms(
        &self,
        id: RecordId,
        taxonomy: &str,
        terms: &[TermRef],
    ) -> StoreResult<Vec<i64>> {
        self.stats.record_write("set object terms")?;
        self.ensure_taxonomy(taxonomy)?;

        let mut resolved: Vec<i64> = Vec::with_capacity(terms.len());
        for term in terms {
            match self.resolve(taxonomy, term)? {
                Some(term_id) if !resolved.contains(&term_id) => resolved.push(term_id),
                Some(_) => {}
                None => debug!(?term, taxonomy, "skipping unknown term"),
            }
        }

        let previous = self
            .assignments
            .write()?
            .insert((id, taxonomy.to_string()), resolved.clone())
            .unwrap_or_default();

        let mut all_terms = self.terms.write()?;
        for term_id in previous.iter().filter(|t| !resolved.contains(t)) {
            if let Some(term) = all_terms.get_mut(term_id) {
                term.count = term.count.saturating_sub(1);
            }
        }
        for term_id in resolved.iter().filter(|t| !previous.contains(t)) {
            if let Some(term) = all_terms.get_mut(term_id) {
                term.count += 1;
            }
        }

        debug!(%id, taxonomy, count = resolved.len(), "object terms replaced");
        Ok(resolved)
    }
}

fn find_by_slug<'a>(terms: &'a BTreeMap<i64, Term>, taxonomy: &str, slug: &str) -> Option<&'a Term> {
    terms
        .values()
        .find(|t| t.taxonomy == taxonomy && t.slug == slug)
}

fn term_ref_name(term: &TermRef) -> String {
    match term {
        TermRef::Id(id) => id.to_string(),
        TermRef::Slug(slug) => slug.trim().to_string(),
    }
}

/// Lower-case a term name into a slug: alphanumerics kept, runs of anything
/// else collapsed to a single `-`.
fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    for ch in input.trim().chars() {
        if ch.is_alphanumeric() {
            slug.extend(ch.to_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u64) -> RecordId {
        RecordId::new(raw).unwrap()
    }

    fn store() -> InMemoryTaxonomyStore {
        let store = InMemoryTaxonomyStore::new();
        store.register_taxonomy("category").unwrap();
        store.register_taxonomy("fp_event_type").unwrap();
        store
    }

    #[test]
    fn unknown_taxonomy_is_an_error() {
        let store = store();
        assert!(matches!(
            store.object_terms(id(1), "genre"),
            Err(StoreError::NotFound(_))
        ));
        assert!(store
            .set_object_terms(id(1), "genre", &[TermRef::Id(1)])
            .is_err());
    }

    #[test]
    fn no_assignments_is_empty() {
        let store = store();
        assert!(store.object_terms(id(1), "category").unwrap().is_empty());
    }

    #[test]
    fn assign_by_id_and_slug() {
        let store = store();
        let news = store.insert_term("category", "News", "news").unwrap();

        let assigned = store
            .set_object_terms(
                id(1),
                "category",
                &[TermRef::Id(news.term_id), TermRef::Slug("Urgent".into())],
            )
            .unwrap();
        assert_eq!(assigned.len(), 2);

        let terms = store.object_terms(id(1), "category").unwrap();
        let slugs: Vec<&str> = terms.iter().map(|t| t.slug.as_str()).collect();
        assert_eq!(slugs, vec!["news", "urgent"]);
        assert_eq!(terms[1].name, "Urgent");
    }

    #[test]
    fn unknown_ids_and_foreign_terms_are_skipped() {
        let store = store();
        let other = store.insert_term("fp_event_type", "Talk", "talk").unwrap();
        let assigned = store
            .set_object_terms(
                id(1),
                "category",
                &[TermRef::Id(404), TermRef::Id(other.term_id)],
            )
            .unwrap();
        assert!(assigned.is_empty());
    }

    #[test]
    fn replacing_assignments_updates_counts() {
        let store = store();
        let a = store.insert_term("category", "A", "a").unwrap();
        let b = store.insert_term("category", "B", "b").unwrap();

        store
            .set_object_terms(id(1), "category", &[TermRef::Id(a.term_id)])
            .unwrap();
        store
            .set_object_terms(id(1), "category", &[TermRef::Id(b.term_id)])
            .unwrap();

        let terms = store.terms().unwrap();
        let count = |tid: i64| terms.iter().find(|t| t.term_id == tid).unwrap().count;
        assert_eq!(count(a.term_id), 0);
        assert_eq!(count(b.term_id), 1);
    }

    #[test]
    fn duplicate_references_collapse() {
        let store = store();
        let assigned = store
            .set_object_terms(
                id(2),
                "category",
                &[TermRef::Slug("news".into()), TermRef::Slug("News".into())],
            )
            .unwrap();
        assert_eq!(assigned.len(), 1);
    }

    #[test]
    fn put_term_keeps_id() {
        let store = store();
        store
            .put_term(Term::new(40, "Music", "music", "genre"))
            .unwrap();
        let next = store.insert_term("genre", "Film", "film").unwrap();
        assert_eq!(next.term_id, 41);
        assert!(store.taxonomies().unwrap().contains(&"genre".to_string()));
    }

    #[test]
    fn slugify_normalizes() {
        assert_eq!(slugify("  Hello, World! "), "hello-world");
        assert_eq!(slugify("urgent"), "urgent");
        assert_eq!(slugify("--"), "");
    }
}
