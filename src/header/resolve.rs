use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, trace};

use super::{HeaderCatalog, HeaderVariantSet, SemanticField};

/// Which pass of [`resolve_field`] produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRule {
    /// Header equals a variant, case-sensitive.
    Exact,
    /// Upper-cased header contains an upper-cased variant.
    Substring,
    /// Upper-cased header contains one of the field's keyword fragments.
    Keyword,
}

/// A resolved column plus how it was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub column: usize,
    pub header: String,
    pub rule: MatchRule,
    /// The variant or keyword that matched.
    pub matched: String,
}

/// Find the column for one field. First match wins:
///
/// 1. exact header == variant, variants in priority order, then headers left to right
/// 2. case-insensitive "header contains variant", same ordering
/// 3. case-insensitive "header contains keyword", same ordering
///
/// `None` means the field is absent from this sheet.
pub fn resolve_field<S: AsRef<str>>(headers: &[S], set: &HeaderVariantSet) -> Option<Resolution> {
    let found = |column: usize, rule: MatchRule, matched: &str| Resolution {
        column,
        header: headers[column].as_ref().trim().to_string(),
        rule,
        matched: matched.to_string(),
    };

    for variant in &set.variants {
        if let Some(column) = headers
            .iter()
            .position(|h| h.as_ref().trim() == variant.as_str())
        {
            return Some(found(column, MatchRule::Exact, variant));
        }
    }

    let upper: Vec<String> = headers
        .iter()
        .map(|h| h.as_ref().trim().to_uppercase())
        .collect();
    let contains = |needle: &str| {
        let needle = needle.trim().to_uppercase();
        if needle.is_empty() {
            return None;
        }
        upper
            .iter()
            .position(|h| !h.is_empty() && h.contains(&needle))
    };

    for variant in &set.variants {
        if let Some(column) = contains(variant) {
            return Some(found(column, MatchRule::Substring, variant));
        }
    }
    for keyword in &set.keywords {
        if let Some(column) = contains(keyword) {
            return Some(found(column, MatchRule::Keyword, keyword));
        }
    }

    trace!(field = %set.field, "no header matched");
    None
}

/// `SemanticField → column`, resolved once per header row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldIndex {
    resolved: BTreeMap<SemanticField, Resolution>,
}

impl FieldIndex {
    pub fn resolve<S: AsRef<str>>(headers: &[S], catalog: &HeaderCatalog) -> Self {
        let mut resolved = BTreeMap::new();
        for set in catalog.iter() {
            if let Some(res) = resolve_field(headers, set) {
                debug!(
                    field = %set.field,
                    column = res.column,
                    header = %res.header,
                    rule = ?res.rule,
                    "resolved header"
                );
                resolved.insert(set.field, res);
            }
        }
        Self { resolved }
    }

    /// Build an index from explicit column positions.
    pub fn from_columns<I>(columns: I) -> Self
    where
        I: IntoIterator<Item = (SemanticField, usize)>,
    {
        let resolved = columns
            .into_iter()
            .map(|(field, column)| {
                (
                    field,
                    Resolution {
                        column,
                        header: String::new(),
                        rule: MatchRule::Exact,
                        matched: String::new(),
                    },
                )
            })
            .collect();
        Self { resolved }
    }

    pub fn column(&self, field: SemanticField) -> Option<usize> {
        self.resolved.get(&field).map(|r| r.column)
    }

    pub fn resolution(&self, field: SemanticField) -> Option<&Resolution> {
        self.resolved.get(&field)
    }

    pub fn is_resolved(&self, field: SemanticField) -> bool {
        self.resolved.contains_key(&field)
    }

    /// Fields with no matching header, in [`SemanticField::ALL`] order.
    pub fn unresolved(&self) -> Vec<SemanticField> {
        SemanticField::ALL
            .iter()
            .copied()
            .filter(|f| !self.resolved.contains_key(f))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SemanticField, &Resolution)> {
        self.resolved.iter()
    }
}
