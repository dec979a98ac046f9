//! Occurrence counting shared by the classifiers.

use std::cmp::Reverse;
use std::collections::BTreeMap;

/// Positions at which a class name occurred among the candidates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub name: String,
    pub indices: Vec<usize>,
}

impl Occurrence {
    pub fn count(&self) -> usize {
        self.indices.len()
    }

    pub fn first_index(&self) -> usize {
        self.indices.first().copied().unwrap_or(usize::MAX)
    }
}

/// Most frequent first, earliest first among equals
pub fn default_rank(occurrence: &Occurrence) -> (Reverse<usize>, usize) {
    (Reverse(occurrence.count()), occurrence.first_index())
}

/// Rank class names by `rank_fn` and keep the best `top_n`
///
/// `None` candidates keep their position but are not counted.
pub fn rank_by_occurrence<K, F>(names: &[Option<String>], top_n: usize, rank_fn: F) -> Vec<String>
where
    K: Ord,
    F: Fn(&Occurrence) -> K,
{
    let mut occurrences: BTreeMap<&str, Occurrence> = BTreeMap::new();
    for (index, name) in names.iter().enumerate() {
        let Some(name) = name.as_deref() else {
            continue;
        };
        occurrences
            .entry(name)
            .or_insert_with(|| Occurrence {
                name: name.to_string(),
                indices: Vec::new(),
            })
            .indices
            .push(index);
    }

    let mut ranked: Vec<Occurrence> = occurrences.into_values().collect();
    ranked.sort_by_key(|occurrence| rank_fn(occurrence));
    ranked
        .into_iter()
        .take(top_n)
        .map(|occurrence| occurrence.name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(values: &[Option<&str>]) -> Vec<Option<String>> {
        values.iter().map(|v| v.map(str::to_string)).collect()
    }

    #[test]
    fn test_most_frequent_first() {
        let ranked = rank_by_occurrence(
            &names(&[Some("a"), Some("b"), Some("b"), None, Some("c")]),
            2,
            default_rank,
        );
        assert_eq!(ranked, vec!["b", "a"]);
    }

    #[test]
    fn test_ties_broken_by_first_index() {
        let ranked = rank_by_occurrence(&names(&[Some("z"), Some("a")]), 5, default_rank);
        assert_eq!(ranked, vec!["z", "a"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(rank_by_occurrence(&names(&[None, None]), 3, default_rank).is_empty());
    }
}
