use crate::dates::DateResolver;
use crate::error::{Result, TimelineError};
use crate::events::{EventRecord, read_events_csv};

use itertools::{Itertools, MinMaxResult};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A titled set of events drawn as one band of the chart
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Topic {
    pub id: u32,
    pub title: String,
    pub events: Vec<EventRecord>,
}

impl Topic {
    /// Earliest and latest ordinal over every date of every event
    pub fn date_range(&self, resolver: &DateResolver) -> Result<Option<(i64, i64)>> {
        let mut bounds = Vec::new();
        for event in &self.events {
            for (_, text) in event.date_fields() {
                if let Some(span) = text.map(|t| resolver.resolve(t, false)).transpose()?.flatten() {
                    bounds.push(span.earliest);
                    bounds.push(span.latest);
                }
            }
        }
        Ok(min_max(bounds))
    }
}

/// Ordered list of topics plus a title
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Timeline {
    pub title: String,
    pub topics: Vec<Topic>,
    #[serde(skip)]
    max_id: u32,
}

impl Timeline {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Default::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let mut timeline: Timeline = serde_json::from_str(json)?;
        timeline.max_id = timeline.topics.iter().map(|t| t.id).max().unwrap_or(0);
        Ok(timeline)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Appends a topic and returns its id
    pub fn add_topic(&mut self, title: &str, events: Vec<EventRecord>) -> u32 {
        self.max_id += 1;
        self.topics.push(Topic {
            id: self.max_id,
            title: title.to_string(),
            events,
        });
        self.max_id
    }

    pub fn add_topic_csv<P: AsRef<Path>>(&mut self, title: &str, path: P) -> Result<u32> {
        let path = path.as_ref();
        let events = read_events_csv(path)?;
        info!(
            "Loaded {} events for '{}' from {}",
            events.len(),
            title,
            path.display()
        );
        Ok(self.add_topic(title, events))
    }

    pub fn topic_index(&self, id: u32) -> Option<usize> {
        self.topics.iter().position(|t| t.id == id)
    }

    /// Returns true if a topic was removed
    pub fn remove_topic(&mut self, id: u32) -> bool {
        match self.topic_index(id) {
            Some(index) => {
                self.topics.remove(index);
                true
            }
            None => false,
        }
    }

    /// Moves a topic by `shift` places (positive moves down), clamped to the list
    pub fn move_topic(&mut self, id: u32, shift: isize) -> bool {
        let Some(index) = self.topic_index(id) else {
            return false;
        };
        let topic = self.topics.remove(index);
        let target = (index as isize + shift).clamp(0, self.topics.len() as isize) as usize;
        self.topics.insert(target, topic);
        true
    }

    /// Reorders topics to follow `order`, a list of topic ids.
    ///
    /// Topics not named in `order` are dropped.
    pub fn reorder_topics(&mut self, order: &[u32]) -> Result<()> {
        let indices = order
            .iter()
            .map(|&id| self.topic_index(id).ok_or(TimelineError::UnknownTopic(id)))
            .collect::<Result<Vec<_>>>()?;
        self.topics = indices.into_iter().map(|i| self.topics[i].clone()).collect();
        Ok(())
    }

    pub fn date_range(&self, resolver: &DateResolver) -> Result<Option<(i64, i64)>> {
        let mut bounds = Vec::new();
        for topic in &self.topics {
            if let Some((lo, hi)) = topic.date_range(resolver)? {
                bounds.push(lo);
                bounds.push(hi);
            }
        }
        Ok(min_max(bounds))
    }
}

fn min_max(values: Vec<i64>) -> Option<(i64, i64)> {
    match values.into_iter().minmax() {
        MinMaxResult::NoElements => None,
        MinMaxResult::OneElement(v) => Some((v, v)),
        MinMaxResult::MinMax(lo, hi) => Some((lo, hi)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::{DateOrder, date_to_ordinal};
    use chrono::NaiveDate;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn ord(y: i32, m: u32, d: u32) -> i64 {
        date_to_ordinal(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    fn sample() -> Timeline {
        let mut tl = Timeline::new("Test timeline");
        tl.add_topic("A", vec![EventRecord::new("a", "1700")]);
        tl.add_topic("B", vec![EventRecord::new("b", "1800-05-01")]);
        tl.add_topic("C", vec![EventRecord::new("c", "1900-02")]);
        tl
    }

    fn titles(tl: &Timeline) -> Vec<&str> {
        tl.topics.iter().map(|t| t.title.as_str()).collect()
    }

    #[test]
    fn test_add_topic_csv() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "label,hdate,hdate_end,hdate_birth,hdate_death\n\
             William I,1066-12-25,1087-09-09,c. 1028,1087-09-09\n\
             Elizabeth II,1952-02-06,2022-09-08,1926-04-21,2022-09-08\n"
        )
        .unwrap();

        let mut tl = Timeline::new("Test timeline");
        let id = tl.add_topic_csv("Monarchs extract", file.path()).unwrap();
        assert_eq!(id, 1);
        assert_eq!(tl.topics.len(), 1);
        assert_eq!(tl.topics[0].title, "Monarchs extract");
        assert_eq!(tl.topics[0].events[0].label, "William I");

        let resolver = DateResolver::new(DateOrder::Default);
        let range = tl.date_range(&resolver).unwrap();
        assert_eq!(range, Some((ord(1023, 1, 1), ord(2022, 9, 8))));
    }

    #[test]
    fn test_ids_increase() {
        let mut tl = sample();
        assert!(tl.remove_topic(3));
        assert_eq!(tl.add_topic("D", Vec::new()), 4);
    }

    #[test]
    fn test_remove_topic() {
        let mut tl = sample();
        assert!(tl.remove_topic(2));
        assert!(!tl.remove_topic(2));
        assert_eq!(titles(&tl), ["A", "C"]);
    }

    #[test]
    fn test_move_topic_clamps() {
        let mut tl = sample();
        assert!(tl.move_topic(1, 1));
        assert_eq!(titles(&tl), ["B", "A", "C"]);
        assert!(tl.move_topic(1, 10));
        assert_eq!(titles(&tl), ["B", "C", "A"]);
        assert!(tl.move_topic(1, -10));
        assert_eq!(titles(&tl), ["A", "B", "C"]);
        assert!(!tl.move_topic(99, 1));
    }

    #[test]
    fn test_reorder_topics() {
        let mut tl = sample();
        tl.reorder_topics(&[3, 1, 2]).unwrap();
        assert_eq!(titles(&tl), ["C", "A", "B"]);

        let err = tl.reorder_topics(&[3, 7]).unwrap_err();
        assert!(matches!(err, TimelineError::UnknownTopic(7)));
        assert_eq!(titles(&tl), ["C", "A", "B"]);
    }

    #[test]
    fn test_json_round_trip_restores_ids() {
        let tl = sample();
        let json = tl.to_json().unwrap();
        let mut restored = Timeline::from_json(&json).unwrap();
        assert_eq!(restored.title, "Test timeline");
        assert_eq!(restored.topics, tl.topics);
        assert_eq!(restored.add_topic("D", Vec::new()), 4);
    }

    #[test]
    fn test_empty_date_range() {
        let tl = Timeline::new("empty");
        assert_eq!(tl.date_range(&DateResolver::default()).unwrap(), None);
    }
}
