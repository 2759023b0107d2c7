//! Channel identity registry
//!
//! Accumulates channel records from every source in arrival order. The first
//! record seen for an identifier wins; later ones are dropped silently since
//! several sources legitimately describe the same channel.

use std::collections::{BTreeSet, HashSet};

use crate::models::ChannelRecord;

#[derive(Debug, Default)]
pub struct ChannelRegistry {
    ids: HashSet<String>,
    records: Vec<ChannelRecord>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record unconditionally
    ///
    /// Used for the primary document, whose channels are copied as-is even if
    /// it repeats an identifier. The identifier is still claimed, so later
    /// sources cannot redefine it.
    pub fn seed(&mut self, record: ChannelRecord) {
        self.ids.insert(record.id.clone());
        self.records.push(record);
    }

    /// Insert `record` unless its identifier is already known
    ///
    /// Returns whether the record was newly inserted.
    pub fn register(&mut self, record: ChannelRecord) -> bool {
        if self.ids.contains(&record.id) {
            return false;
        }
        self.ids.insert(record.id.clone());
        self.records.push(record);
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// The subset of `ids` not present in the registry, in sorted order
    pub fn missing<'a, I>(&self, ids: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        ids.into_iter()
            .filter(|id| !self.contains(id))
            .map(str::to_string)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ChannelRecord] {
        &self.records
    }

    /// Consume the registry, yielding records in insertion order
    pub fn into_records(self) -> Vec<ChannelRecord> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{XmlElement, XmlNode};

    fn named(id: &str, name: &str) -> ChannelRecord {
        ChannelRecord {
            id: id.to_string(),
            attributes: vec![],
            children: vec![XmlNode::Element(
                XmlElement::new("display-name").with_text(name),
            )],
        }
    }

    #[test]
    fn test_first_writer_wins() {
        let mut registry = ChannelRegistry::new();
        assert!(registry.register(named("radio1", "Radio Uno")));
        assert!(!registry.register(named("radio1", "Radio One")));

        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.records()[0].display_name().as_deref(),
            Some("Radio Uno")
        );
    }

    #[test]
    fn test_missing_before_and_after_insert() {
        let mut registry = ChannelRegistry::new();
        assert_eq!(
            registry.missing(["x"]),
            BTreeSet::from(["x".to_string()])
        );

        registry.register(ChannelRecord::placeholder("x"));
        assert!(registry.missing(["x"]).is_empty());
        assert!(registry.contains("x"));
    }

    #[test]
    fn test_missing_returns_only_unknown_ids() {
        let mut registry = ChannelRegistry::new();
        registry.register(ChannelRecord::placeholder("a"));
        registry.register(ChannelRecord::placeholder("c"));

        let missing = registry.missing(["d", "a", "b", "c", "b"]);
        assert_eq!(
            missing.into_iter().collect::<Vec<_>>(),
            vec!["b".to_string(), "d".to_string()]
        );
    }

    #[test]
    fn test_seed_keeps_duplicates_and_blocks_later_sources() {
        let mut registry = ChannelRegistry::new();
        registry.seed(named("A", "first"));
        registry.seed(named("A", "second"));
        assert!(!registry.register(named("A", "third")));

        let names: Vec<Option<String>> = registry
            .into_records()
            .iter()
            .map(ChannelRecord::display_name)
            .collect();
        assert_eq!(
            names,
            vec![Some("first".to_string()), Some("second".to_string())]
        );
    }

    #[test]
    fn test_insertion_order_is_preserved() {
        let mut registry = ChannelRegistry::new();
        for id in ["z", "a", "m"] {
            registry.register(ChannelRecord::placeholder(id));
        }
        let ids: Vec<String> = registry.into_records().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["z", "a", "m"]);
    }
}
