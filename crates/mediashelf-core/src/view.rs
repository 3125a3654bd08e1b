use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::media::MediaRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterCategory {
    #[default]
    All,
    Favorites,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    Title,
    Favorites,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(SortOrder::Newest),
            "oldest" => Ok(SortOrder::Oldest),
            "title" => Ok(SortOrder::Title),
            "favorites" => Ok(SortOrder::Favorites),
            other => Err(format!(
                "unknown sort order '{}' (expected newest, oldest, title or favorites)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryState {
    pub search_text: String,
    pub filter: FilterCategory,
    pub sort: SortOrder,
}

/// Collation key approximating locale order: accents stripped, case folded.
fn title_key(title: &str) -> String {
    title
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

fn compare_titles(a: &str, b: &str) -> Ordering {
    title_key(a).cmp(&title_key(b)).then_with(|| a.cmp(b))
}

fn compare(sort: SortOrder, a: &MediaRecord, b: &MediaRecord) -> Ordering {
    let newest_first = || b.upload_date.cmp(&a.upload_date);
    match sort {
        SortOrder::Newest => newest_first(),
        SortOrder::Oldest => a.upload_date.cmp(&b.upload_date),
        SortOrder::Title => compare_titles(&a.title, &b.title),
        SortOrder::Favorites => b.favorite.cmp(&a.favorite).then_with(newest_first),
    }
}

/// Filter and order `records` for display. The input is left untouched and
/// ties keep their collection order.
pub fn project<'a>(records: &'a [MediaRecord], state: &QueryState) -> Vec<&'a MediaRecord> {
    let needle = state.search_text.to_lowercase();
    let mut out: Vec<&MediaRecord> = records
        .iter()
        .filter(|r| r.matches(&needle))
        .filter(|r| state.filter == FilterCategory::All || r.favorite)
        .collect();
    out.sort_by(|a, b| compare(state.sort, a, b));
    out
}

/// Query state owned by the presentation layer.
#[derive(Debug, Clone, Default)]
pub struct MediaView {
    state: QueryState,
}

impl MediaView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: QueryState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    pub fn set_search(&mut self, text: impl Into<String>) {
        self.state.search_text = text.into();
    }

    pub fn set_filter(&mut self, filter: FilterCategory) {
        self.state.filter = filter;
    }

    pub fn set_sort(&mut self, sort: SortOrder) {
        self.state.sort = sort;
    }

    pub fn project<'a>(&self, records: &'a [MediaRecord]) -> Vec<&'a MediaRecord> {
        project(records, &self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{Encoding, MediaType};
    use chrono::{TimeZone, Utc};

    fn record(id: u64, title: &str, favorite: bool, day: u32) -> MediaRecord {
        MediaRecord {
            id,
            title: title.to_string(),
            description: String::new(),
            media_type: MediaType::Video,
            upload_date: Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap(),
            file_name: format!("{}.mp4", id),
            file_size: 10,
            file_type: "video/mp4".to_string(),
            duration: 0.0,
            favorite,
            views: 0,
            likes: 0,
            shares: 0,
            comments: Vec::new(),
            encoding: Encoding::Inline,
            payload: None,
            avatar_url: String::new(),
            username: "Unknown User".to_string(),
            uploaded_by: "unknown".to_string(),
        }
    }

    fn ids(records: &[&MediaRecord]) -> Vec<u64> {
        records.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_favorites_sort_groups_then_newest() {
        let records = vec![
            record(1, "A", false, 3),
            record(2, "B", true, 1),
            record(3, "C", true, 2),
        ];
        let state = QueryState {
            sort: SortOrder::Favorites,
            ..Default::default()
        };
        assert_eq!(ids(&project(&records, &state)), vec![3, 2, 1]);
    }

    #[test]
    fn test_date_orders() {
        let records = vec![record(1, "x", false, 2), record(2, "y", false, 9), record(3, "z", false, 5)];
        let mut view = MediaView::new();
        assert_eq!(ids(&view.project(&records)), vec![2, 3, 1]);
        view.set_sort(SortOrder::Oldest);
        assert_eq!(ids(&view.project(&records)), vec![1, 3, 2]);
    }

    #[test]
    fn test_title_sort_ignores_case_and_accents() {
        let records = vec![
            record(1, "zebra", false, 1),
            record(2, "Éclair", false, 1),
            record(3, "apple", false, 1),
            record(4, "Banana", false, 1),
        ];
        let mut view = MediaView::new();
        view.set_sort(SortOrder::Title);
        assert_eq!(ids(&view.project(&records)), vec![3, 4, 2, 1]);
    }

    #[test]
    fn test_search_and_filter() {
        let mut a = record(1, "Beach Day", true, 1);
        a.description = "sunset".to_string();
        let b = record(2, "City", false, 2);
        let mut c = record(3, "Mountains", false, 3);
        c.description = "Sunrise at the BEACH".to_string();
        let records = vec![a, b, c];

        let mut view = MediaView::new();
        view.set_search("beach");
        assert_eq!(ids(&view.project(&records)), vec![3, 1]);

        view.set_filter(FilterCategory::Favorites);
        assert_eq!(ids(&view.project(&records)), vec![1]);

        view.set_search("");
        assert_eq!(ids(&view.project(&records)), vec![1]);
    }

    #[test]
    fn test_projection_is_idempotent_and_stable() {
        let records = vec![
            record(1, "same", false, 4),
            record(2, "same", false, 4),
            record(3, "other", true, 4),
        ];
        for sort in [SortOrder::Newest, SortOrder::Oldest, SortOrder::Title, SortOrder::Favorites] {
            let state = QueryState {
                sort,
                ..Default::default()
            };
            let first = ids(&project(&records, &state));
            let second = ids(&project(&records, &state));
            assert_eq!(first, second);
        }
        let newest = ids(&project(&records, &QueryState::default()));
        assert_eq!(newest, vec![1, 2, 3]);
    }

    #[test]
    fn test_parse_sort_order() {
        assert_eq!("title".parse::<SortOrder>().unwrap(), SortOrder::Title);
        assert!("random".parse::<SortOrder>().is_err());
    }
}
