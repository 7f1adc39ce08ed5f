use crate::tree::{NodeId, TreeIndex};
use std::cmp::Ordering;
use std::collections::HashSet;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Primary-strength collation key: compatibility-decomposed, accents
/// stripped, lowercased. "Émile", "EMILE" and "emile" share a key.
pub fn collation_key(title: &str) -> String {
    title
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

pub fn compare_titles(a: &str, b: &str) -> Ordering {
    collation_key(a).cmp(&collation_key(b))
}

/// Order one level of siblings: active before inactive, then by title.
///
/// The sort is stable, so equal keys keep their input order.
pub fn sort_siblings(ids: &[NodeId], index: &TreeIndex, inactive: &HashSet<NodeId>) -> Vec<NodeId> {
    let mut keyed: Vec<(bool, String, &NodeId)> = ids
        .iter()
        .map(|id| {
            let title = index.title(id.as_str()).unwrap_or(id.as_str());
            (inactive.contains(id), collation_key(title), id)
        })
        .collect();

    keyed.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    keyed.into_iter().map(|(_, _, id)| id.clone()).collect()
}
