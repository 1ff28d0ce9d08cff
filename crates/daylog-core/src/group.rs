//! Partitioning entries into labelled, ordered groups for display.
//!
//! Every strategy orders entries inside a group newest first by
//! `occurred_at`. Groups borrow from the collection; nothing here mutates it.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::models::{Collection, LogEntry};

/// Label of the catch-all group for entries without the grouped tag.
pub const OTHERS_LABEL: &str = "Others";
/// Label of the favourite group.
pub const FAVOURITES_LABEL: &str = "Favourites";

/// A labelled run of entries.
#[derive(Debug, Clone, PartialEq)]
pub struct Group<'a> {
    pub key: String,
    pub entries: Vec<&'a LogEntry>,
}

/// How to group a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupStrategy {
    /// `"<Month> <Year>"`, newest month first
    #[default]
    Month,
    /// Month groups in reverse order; entries inside stay newest first
    MonthOldestFirst,
    Mood,
    Weather,
    Favorite,
}

impl GroupStrategy {
    pub const ALL: [Self; 5] = [
        Self::Month,
        Self::MonthOldestFirst,
        Self::Mood,
        Self::Weather,
        Self::Favorite,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Month => "month",
            Self::MonthOldestFirst => "oldest",
            Self::Mood => "mood",
            Self::Weather => "weather",
            Self::Favorite => "favourite",
        }
    }
}

impl fmt::Display for GroupStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GroupStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "month" | "newest" => Ok(Self::Month),
            "oldest" | "month-oldest" => Ok(Self::MonthOldestFirst),
            "mood" => Ok(Self::Mood),
            "weather" => Ok(Self::Weather),
            "favourite" | "favorite" | "favourites" | "favorites" => Ok(Self::Favorite),
            other => Err(format!("unknown grouping '{other}'")),
        }
    }
}

/// Group a collection with the given strategy.
#[must_use]
pub fn group_entries(collection: &Collection, strategy: GroupStrategy) -> Vec<Group<'_>> {
    match strategy {
        GroupStrategy::Month => group_by_month(collection),
        GroupStrategy::MonthOldestFirst => group_by_month_oldest_first(collection),
        GroupStrategy::Mood => group_by_mood(collection),
        GroupStrategy::Weather => group_by_weather(collection),
        GroupStrategy::Favorite => group_by_favorite(collection),
    }
}

/// Month groups (UTC calendar), ordered by each group's newest entry.
#[must_use]
pub fn group_by_month(collection: &Collection) -> Vec<Group<'_>> {
    let mut groups = group_by(collection.values(), |entry| {
        entry.occurred_at.format("%B %Y").to_string()
    });
    groups.sort_by(|a, b| newest_in(b).cmp(&newest_in(a)));
    groups
}

/// [`group_by_month`] with the group sequence reversed.
#[must_use]
pub fn group_by_month_oldest_first(collection: &Collection) -> Vec<Group<'_>> {
    let mut groups = group_by_month(collection);
    groups.reverse();
    groups
}

#[must_use]
pub fn group_by_mood(collection: &Collection) -> Vec<Group<'_>> {
    let groups = group_by(collection.values(), |entry| {
        entry
            .content
            .mood
            .map_or(OTHERS_LABEL, |mood| mood.label())
            .to_string()
    });
    move_group_to_end(groups, OTHERS_LABEL)
}

#[must_use]
pub fn group_by_weather(collection: &Collection) -> Vec<Group<'_>> {
    let groups = group_by(collection.values(), |entry| {
        entry
            .content
            .weather
            .map_or(OTHERS_LABEL, |weather| weather.label())
            .to_string()
    });
    move_group_to_end(groups, OTHERS_LABEL)
}

#[must_use]
pub fn group_by_favorite(collection: &Collection) -> Vec<Group<'_>> {
    let groups = group_by(collection.values(), |entry| {
        if entry.is_favorite {
            FAVOURITES_LABEL
        } else {
            OTHERS_LABEL
        }
        .to_string()
    });
    move_group_to_end(groups, OTHERS_LABEL)
}

/// Bucket entries by key in first-encounter order, newest first inside.
fn group_by<'a>(
    entries: impl Iterator<Item = &'a LogEntry>,
    key_of: impl Fn(&LogEntry) -> String,
) -> Vec<Group<'a>> {
    let mut groups: Vec<Group<'a>> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for entry in entries {
        let key = key_of(entry);
        if let Some(&position) = positions.get(&key) {
            groups[position].entries.push(entry);
        } else {
            positions.insert(key.clone(), groups.len());
            groups.push(Group {
                key,
                entries: vec![entry],
            });
        }
    }

    for group in &mut groups {
        // stable: equal dates keep collection order
        group
            .entries
            .sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
    }
    groups
}

fn newest_in(group: &Group<'_>) -> Option<chrono::DateTime<chrono::Utc>> {
    group.entries.first().map(|entry| entry.occurred_at)
}

fn move_group_to_end<'a>(mut groups: Vec<Group<'a>>, key: &str) -> Vec<Group<'a>> {
    if let Some(index) = groups.iter().position(|group| group.key == key) {
        let group = groups.remove(index);
        groups.push(group);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntryDraft, EntryId, Mood, Weather};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn entry_on(title: &str, year: i32, month: u32, day: u32) -> LogEntry {
        LogEntry::from_draft(
            EntryDraft::new(title)
                .occurred_at(Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()),
        )
    }

    fn collect(entries: Vec<LogEntry>) -> Collection {
        entries.into_iter().map(|entry| (entry.id, entry)).collect()
    }

    fn titles<'a>(group: &Group<'a>) -> Vec<&'a str> {
        group.entries.iter().map(|entry| entry.title()).collect()
    }

    fn keys(groups: &[Group<'_>]) -> Vec<String> {
        groups.iter().map(|group| group.key.clone()).collect()
    }

    fn sample() -> Collection {
        let mut a = entry_on("A", 2024, 3, 1);
        a.content.mood = Some(Mood::Happy);
        a.content.weather = Some(Weather::Fog);
        let b = entry_on("B", 2024, 3, 15);
        let mut c = entry_on("C", 2024, 1, 20);
        c.content.mood = Some(Mood::Sad);
        c.content.weather = Some(Weather::Mist);
        c.is_favorite = true;
        let mut d = entry_on("D", 2023, 12, 31);
        d.content.mood = Some(Mood::Happy);
        let mut e = entry_on("E", 2024, 5, 2);
        e.content.weather = Some(Weather::Clear);
        e.is_favorite = true;
        collect(vec![a, b, c, d, e])
    }

    #[test]
    fn month_and_mood_grouping_of_two_entries() {
        let mut a = entry_on("A", 2024, 3, 1);
        a.content.mood = Some(Mood::Happy);
        let b = entry_on("B", 2024, 3, 15);
        let collection = collect(vec![a, b]);

        let by_month = group_by_month(&collection);
        assert_eq!(keys(&by_month), vec!["March 2024"]);
        assert_eq!(titles(&by_month[0]), vec!["B", "A"]);

        let by_mood = group_by_mood(&collection);
        assert_eq!(keys(&by_mood), vec!["😊", "Others"]);
        assert_eq!(titles(&by_mood[0]), vec!["A"]);
        assert_eq!(titles(&by_mood[1]), vec!["B"]);
    }

    #[test]
    fn months_are_ordered_newest_first() {
        let collection = sample();
        let groups = group_by_month(&collection);
        assert_eq!(
            keys(&groups),
            vec!["May 2024", "March 2024", "January 2024", "December 2023"]
        );
        assert_eq!(titles(&groups[1]), vec!["B", "A"]);
    }

    #[test]
    fn month_keys_follow_the_utc_calendar() {
        let late = LogEntry::from_draft(
            EntryDraft::new("Late")
                .occurred_at(Utc.with_ymd_and_hms(2024, 3, 31, 23, 30, 0).unwrap()),
        );
        let early = LogEntry::from_draft(
            EntryDraft::new("Early")
                .occurred_at(Utc.with_ymd_and_hms(2024, 4, 1, 0, 30, 0).unwrap()),
        );
        let collection = collect(vec![late, early]);
        let groups = group_by_month(&collection);
        assert_eq!(keys(&groups), vec!["April 2024", "March 2024"]);
        assert_eq!(titles(&groups[1]), vec!["Late"]);
    }

    #[test]
    fn oldest_first_only_reverses_group_order() {
        let collection = sample();
        let mut expected = group_by_month(&collection);
        expected.reverse();

        let oldest = group_by_month_oldest_first(&collection);
        assert_eq!(oldest, expected);
        let march = oldest.iter().find(|g| g.key == "March 2024").unwrap();
        assert_eq!(titles(march), vec!["B", "A"]);
    }

    #[test]
    fn others_group_is_always_last() {
        let mut first = entry_on("untagged-first", 2024, 6, 1);
        first.content.mood = None;
        let mut tagged = entry_on("tagged", 2024, 6, 2);
        tagged.content.mood = Some(Mood::Angry);
        // insertion order by id puts the untagged entry first
        let collection: Collection = [(EntryId::new(), first), (EntryId::new(), tagged)]
            .into_iter()
            .map(|(id, mut entry)| {
                entry.id = id;
                (id, entry)
            })
            .collect();

        let groups = group_by_mood(&collection);
        assert_eq!(keys(&groups), vec!["😡", "Others"]);
    }

    #[test]
    fn weather_groups_merge_shared_labels() {
        let collection = sample();
        let groups = group_by_weather(&collection);
        let fog = groups.iter().find(|g| g.key == "🌫️").unwrap();
        assert_eq!(titles(fog), vec!["A", "C"]);
        assert_eq!(groups.last().unwrap().key, OTHERS_LABEL);
    }

    #[test]
    fn favourite_grouping_puts_others_last() {
        let collection = sample();
        let groups = group_by_favorite(&collection);
        assert_eq!(keys(&groups), vec!["Favourites", "Others"]);
        assert_eq!(titles(&groups[0]), vec!["E", "C"]);
        assert_eq!(titles(&groups[1]), vec!["B", "A", "D"]);
    }

    #[test]
    fn every_strategy_covers_each_entry_exactly_once() {
        let collection = sample();
        for strategy in GroupStrategy::ALL {
            let groups = group_entries(&collection, strategy);
            let mut seen: Vec<_> = groups
                .iter()
                .flat_map(|group| group.entries.iter().map(|entry| entry.id))
                .collect();
            seen.sort();
            let expected: Vec<_> = collection.keys().copied().collect();
            assert_eq!(seen, expected, "strategy {strategy}");
        }
    }

    #[test]
    fn grouping_an_empty_collection_yields_no_groups() {
        let collection = Collection::new();
        for strategy in GroupStrategy::ALL {
            assert!(group_entries(&collection, strategy).is_empty());
        }
    }

    #[test]
    fn parses_strategy_names() {
        assert_eq!("favorite".parse::<GroupStrategy>().unwrap(), GroupStrategy::Favorite);
        assert_eq!("Oldest".parse::<GroupStrategy>().unwrap(), GroupStrategy::MonthOldestFirst);
        assert!("size".parse::<GroupStrategy>().is_err());
    }
}
