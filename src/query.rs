// Query occurrences — how often a word (or combination) shows up per category.
//
// Queries are single words combined with and/or. Documents are reduced to
// the set of their lowercased [a-z0-9-]+ tokens, so query terms must be
// single lowercase words as well.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};
use regex::Regex;

use crate::corpus::{category_documents, validate_alignment, Category, DocCategories, TextDict};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Term(String),
    And(Vec<Query>),
    Or(Vec<Query>),
}

impl Query {
    pub fn matches(&self, tokens: &HashSet<String>) -> bool {
        match self {
            Query::Term(term) => tokens.contains(term),
            Query::And(parts) => parts.iter().all(|q| q.matches(tokens)),
            Query::Or(parts) => parts.iter().any(|q| q.matches(tokens)),
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (op, parts) = match self {
            Query::Term(term) => return write!(f, "{term}"),
            Query::And(parts) => ("and", parts),
            Query::Or(parts) => ("or", parts),
        };
        let inner: Vec<String> = parts.iter().map(|q| q.to_string()).collect();
        write!(f, "{op}:({})", inner.join(", "))
    }
}

/// Parses `word`, `and:w1,w2,...` and `or:w1,w2,...`.
impl FromStr for Query {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let combinator = if let Some(rest) = s.strip_prefix("and:") {
            Some((rest, true))
        } else {
            s.strip_prefix("or:").map(|rest| (rest, false))
        };
        match combinator {
            Some((rest, is_and)) => {
                let parts: Vec<Query> = rest
                    .split(',')
                    .map(str::trim)
                    .filter(|w| !w.is_empty())
                    .map(|w| Query::Term(w.to_lowercase()))
                    .collect();
                if parts.is_empty() {
                    anyhow::bail!("Query {s:?} has no terms");
                }
                Ok(if is_and { Query::And(parts) } else { Query::Or(parts) })
            }
            None => {
                if s.is_empty() {
                    anyhow::bail!("Empty query");
                }
                Ok(Query::Term(s.to_lowercase()))
            }
        }
    }
}

/// {query label: {category: fraction of the category's documents matching}}
pub type Occurrences = BTreeMap<String, BTreeMap<Category, f64>>;

/// For every query, the fraction of each category's documents it matches.
pub fn check_occurrences(
    texts: &TextDict,
    doccats: &DocCategories,
    queries: &[Query],
) -> Result<Occurrences> {
    validate_alignment(texts, doccats)?;
    let token_re = Regex::new(r"[a-z0-9-]+").context("Invalid token pattern")?;
    let token_sets: BTreeMap<&String, HashSet<String>> = texts
        .iter()
        .map(|(id, text)| {
            let lower = text.to_lowercase();
            let tokens = token_re
                .find_iter(&lower)
                .map(|m| m.as_str().to_string())
                .collect();
            (id, tokens)
        })
        .collect();
    let catdocs = category_documents(doccats);

    let mut results = Occurrences::new();
    for query in queries {
        let per_category = catdocs
            .iter()
            .map(|(cat, doc_ids)| {
                let hits = doc_ids
                    .iter()
                    .filter(|id| token_sets.get(id).is_some_and(|t| query.matches(t)))
                    .count();
                (cat.clone(), hits as f64 / doc_ids.len() as f64)
            })
            .collect();
        results.insert(query.to_string(), per_category);
    }
    Ok(results)
}
