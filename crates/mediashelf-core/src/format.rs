use std::fmt::Display;

use chrono::{DateTime, TimeZone};

use crate::media::MediaRecord;

const SIZE_UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

/// `125.0` -> `"2:05"`. Zero, negative and NaN render as `"0:00"`.
pub fn format_duration(seconds: f64) -> String {
    if seconds.is_nan() || seconds <= 0.0 {
        return "0:00".to_string();
    }
    let whole = seconds.floor() as u64;
    format!("{}:{:02}", whole / 60, whole % 60)
}

/// `1536` -> `"1.5 KB"`. Values past the GB range stay in GB.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, SIZE_UNITS[unit])
}

/// Long-form date, e.g. `"May 1, 2024 at 09:05 AM"`.
pub fn format_date<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    date.format("%B %-d, %Y at %I:%M %p").to_string()
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", n, unit)
    }
}

/// Human distance from `timestamp` to `now`; a week or more falls back to [`format_date`].
pub fn relative_time<Tz: TimeZone>(timestamp: &DateTime<Tz>, now: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    let elapsed = now.clone().signed_duration_since(timestamp.clone());
    let secs = elapsed.num_seconds();
    let mins = secs / 60;
    let hours = mins / 60;
    let days = hours / 24;

    if secs < 60 {
        "Just now".to_string()
    } else if mins < 60 {
        plural(mins, "minute")
    } else if hours < 24 {
        plural(hours, "hour")
    } else if days < 7 {
        plural(days, "day")
    } else {
        format_date(timestamp)
    }
}

/// `"1 video"`, `"3 videos"`.
pub fn count_label(count: usize) -> String {
    if count == 1 {
        "1 video".to_string()
    } else {
        format!("{} videos", count)
    }
}

/// Text placed on the clipboard when an item is shared.
pub fn share_text(record: &MediaRecord) -> String {
    format!("Check out this {}: \"{}\"", record.media_type.as_str(), record.title)
}

/// Permalink to a single item's page under `origin`.
pub fn share_link(origin: &str, id: u64) -> String {
    format!("{}/video.html#{}", origin.trim_end_matches('/'), id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.0), "0:00");
        assert_eq!(format_duration(125.0), "2:05");
        assert_eq!(format_duration(59.9), "0:59");
        assert_eq!(format_duration(3600.0), "60:00");
        assert_eq!(format_duration(f64::NAN), "0:00");
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(512), "512.0 B");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(10 * 1024 * 1024), "10.0 MB");
        assert_eq!(format_file_size(3 * 1024 * 1024 * 1024), "3.0 GB");
        assert_eq!(format_file_size(2048 * 1024 * 1024 * 1024), "2048.0 GB");
    }

    #[test]
    fn test_relative_time() {
        let now = Utc.with_ymd_and_hms(2024, 5, 20, 12, 0, 0).unwrap();
        assert_eq!(relative_time(&(now - Duration::seconds(30)), &now), "Just now");
        assert_eq!(relative_time(&(now - Duration::minutes(1)), &now), "1 minute ago");
        assert_eq!(relative_time(&(now - Duration::minutes(45)), &now), "45 minutes ago");
        assert_eq!(relative_time(&(now - Duration::hours(1)), &now), "1 hour ago");
        assert_eq!(relative_time(&(now - Duration::hours(23)), &now), "23 hours ago");
        assert_eq!(relative_time(&(now - Duration::days(6)), &now), "6 days ago");
        assert_eq!(
            relative_time(&(now - Duration::days(19)), &now),
            "May 1, 2024 at 12:00 PM"
        );
    }

    #[test]
    fn test_format_date() {
        let date = Utc.with_ymd_and_hms(2024, 1, 5, 9, 7, 0).unwrap();
        assert_eq!(format_date(&date), "January 5, 2024 at 09:07 AM");
    }

    #[test]
    fn test_count_label() {
        assert_eq!(count_label(0), "0 videos");
        assert_eq!(count_label(1), "1 video");
        assert_eq!(count_label(12), "12 videos");
    }

    #[test]
    fn test_share_text_and_link() {
        let record: MediaRecord = serde_json::from_value(serde_json::json!({
            "id": 42,
            "title": "Sunset",
            "mediaType": "image",
            "uploadDate": "2024-01-01T00:00:00Z",
            "fileName": "sunset.png",
            "fileSize": 4,
            "fileType": "image/png",
            "encoding": "inline",
            "avatarUrl": "",
            "username": "mira",
            "uploadedBy": "u1"
        }))
        .unwrap();
        assert_eq!(share_text(&record), "Check out this image: \"Sunset\"");
        assert_eq!(
            share_link("http://localhost:8080/", record.id),
            "http://localhost:8080/video.html#42"
        );
        assert_eq!(share_link("", 7), "/video.html#7");
    }
}
