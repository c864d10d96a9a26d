use domain::{Category, EmoteMapping};
use std::collections::{BTreeMap, HashMap};

/// Match count per category
pub type CategoryCounts = BTreeMap<Category, u64>;

/// Counts trigger keywords per category.
///
/// Built once from an [`EmoteMapping`] and reused for every message.
#[derive(Debug, Clone)]
pub struct KeywordTally {
    mapping: EmoteMapping,
    /// keyword -> categories it triggers
    index: HashMap<String, Vec<Category>>,
}

impl KeywordTally {
    pub fn new(mapping: EmoteMapping) -> Self {
        let mut index: HashMap<String, Vec<Category>> = HashMap::new();
        for (category, keywords) in mapping.iter() {
            for keyword in keywords {
                index
                    .entry(keyword.clone())
                    .or_default()
                    .push(category.to_string());
            }
        }
        Self { mapping, index }
    }

    /// Every configured category at zero
    pub fn empty_counts(&self) -> CategoryCounts {
        self.mapping
            .categories()
            .map(|category| (category.to_string(), 0))
            .collect()
    }

    /// Tally one message. Tokens are whitespace separated and matched exactly.
    pub fn tally(&self, message: &str) -> CategoryCounts {
        let mut counts = self.empty_counts();
        self.tally_into(message, &mut counts);
        counts
    }

    /// Add the matches in `message` to `counts`, returning how many were added
    pub fn tally_into(&self, message: &str, counts: &mut CategoryCounts) -> u64 {
        let mut matched = 0;
        for token in message.split_whitespace() {
            let Some(categories) = self.index.get(token) else {
                continue;
            };
            for category in categories {
                *counts.entry(category.clone()).or_insert(0) += 1;
                matched += 1;
            }
        }
        matched
    }
}

/// One-off tally of `message` against `mapping`
pub fn tally_keywords(message: &str, mapping: &EmoteMapping) -> CategoryCounts {
    let mut counts: CategoryCounts = mapping
        .categories()
        .map(|category| (category.to_string(), 0))
        .collect();
    for token in message.split_whitespace() {
        for (category, keywords) in mapping.iter() {
            if keywords.contains(token) {
                *counts.entry(category.to_string()).or_insert(0) += 1;
            }
        }
    }
    counts
}
