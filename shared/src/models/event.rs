//! Event Model (upcoming events and announcements)

use super::default_true;
use super::text::{Language, LocalizedText};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use validator::{Validate, ValidationError};

/// Sort position for events without an explicit `sortOrder`
pub const DEFAULT_EVENT_SORT_ORDER: i64 = 999;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Concert,
    Party,
    Special,
    Announcement,
    #[default]
    Other,
}

/// Event entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub title: LocalizedText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedText>,
    /// ISO date (`2025-06-01` or a full timestamp)
    pub date: String,
    /// Free-form time, e.g. `20:00` or `20:00-23:00`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
    #[serde(default, rename = "type")]
    pub event_type: EventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Fields not modeled here (backgroundColor, textColor, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Event {
    pub fn display_title(&self, lang: Language) -> &str {
        self.title.get(lang)
    }

    /// Calendar day of the event, if `date` parses
    pub fn day(&self) -> Option<NaiveDate> {
        let head = self.date.get(..10).unwrap_or(&self.date);
        NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
    }

    /// Active and not yet past
    pub fn is_upcoming(&self, today: NaiveDate) -> bool {
        self.active && self.day().is_some_and(|d| d >= today)
    }

    pub fn effective_sort_order(&self) -> i64 {
        self.sort_order.unwrap_or(DEFAULT_EVENT_SORT_ORDER)
    }

    pub fn apply(&mut self, update: EventUpdate, now: DateTime<Utc>) {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(description) = update.description {
            self.description = Some(description);
        }
        if let Some(date) = update.date.filter(|d| !d.trim().is_empty()) {
            self.date = date;
        }
        if let Some(time) = update.time {
            self.time = Some(time);
        }
        if let Some(image) = update.image {
            self.image = Some(image);
        }
        if let Some(link) = update.link {
            self.link = Some(link);
        }
        if let Some(active) = update.active {
            self.active = active;
        }
        if let Some(sort_order) = update.sort_order {
            self.sort_order = Some(sort_order);
        }
        if let Some(event_type) = update.event_type {
            self.event_type = event_type;
        }
        for (key, value) in update.extra {
            self.extra.insert(key, value);
        }
        self.updated_at = Some(now);
    }
}

/// Order events by day, then `sortOrder`. Unparseable dates sort last.
pub fn compare_events(a: &Event, b: &Event) -> Ordering {
    match (a.day(), b.day()) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.date.cmp(&b.date),
    }
    .then_with(|| a.effective_sort_order().cmp(&b.effective_sort_order()))
}

/// Create event payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_event_create"))]
pub struct EventCreate {
    pub title: LocalizedText,
    #[serde(default)]
    pub description: Option<LocalizedText>,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub sort_order: Option<i64>,
    #[serde(default, rename = "type")]
    pub event_type: Option<EventType>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EventCreate {
    pub fn into_event(self, id: impl Into<String>, now: DateTime<Utc>) -> Event {
        Event {
            id: id.into(),
            title: self.title,
            description: self.description,
            date: self.date,
            time: self.time,
            image: self.image,
            link: self.link,
            active: self.active.unwrap_or(true),
            sort_order: Some(self.sort_order.unwrap_or(0)),
            event_type: self.event_type.unwrap_or_default(),
            created_at: Some(now),
            updated_at: Some(now),
            extra: self.extra,
        }
    }
}

fn validate_event_create(e: &EventCreate) -> Result<(), ValidationError> {
    let german = match &e.title {
        LocalizedText::Plain(s) => s.as_str(),
        LocalizedText::Translations(t) => t.get(Language::De).unwrap_or(""),
    };
    if german.trim().is_empty() {
        return Err(ValidationError::new("title_required"));
    }
    if e.date.trim().is_empty() {
        return Err(ValidationError::new("date_required"));
    }
    Ok(())
}

/// Update event payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EventUpdate {
    pub title: Option<LocalizedText>,
    pub description: Option<LocalizedText>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub image: Option<String>,
    pub link: Option<String>,
    pub active: Option<bool>,
    pub sort_order: Option<i64>,
    #[serde(rename = "type")]
    pub event_type: Option<EventType>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: &str, date: &str, sort_order: Option<i64>) -> Event {
        let create = EventCreate {
            title: LocalizedText::from(id),
            description: None,
            date: date.to_string(),
            time: None,
            image: None,
            link: None,
            active: None,
            sort_order: None,
            event_type: None,
            extra: Map::new(),
        };
        let mut e = create.into_event(id, Utc::now());
        e.sort_order = sort_order;
        e
    }

    #[test]
    fn test_create_defaults() {
        let e = event("jazz", "2025-06-01", Some(0));
        assert!(e.active);
        assert_eq!(e.event_type, EventType::Other);
        assert!(e.created_at.is_some());
    }

    #[test]
    fn test_create_requires_german_title_and_date() {
        let ok: EventCreate =
            serde_json::from_str(r#"{"title":{"de":"Jazzabend"},"date":"2025-06-01"}"#).unwrap();
        assert!(ok.validate().is_ok());

        let english_only: EventCreate =
            serde_json::from_str(r#"{"title":{"en":"Jazz"},"date":"2025-06-01"}"#).unwrap();
        assert!(english_only.validate().is_err());

        let no_date: EventCreate = serde_json::from_str(r#"{"title":"Jazz"}"#).unwrap();
        assert!(no_date.validate().is_err());
    }

    #[test]
    fn test_compare_by_day_then_sort_order() {
        let mut events = vec![
            event("b", "2025-06-02", Some(1)),
            event("a2", "2025-06-01T20:00:00Z", Some(5)),
            event("a1", "2025-06-01", Some(1)),
            event("x", "someday", None),
        ];
        events.sort_by(compare_events);
        let ids: Vec<&str> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["a1", "a2", "b", "x"]);
    }

    #[test]
    fn test_is_upcoming() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert!(event("t", "2025-06-01", None).is_upcoming(today));
        assert!(!event("p", "2025-05-31", None).is_upcoming(today));

        let mut inactive = event("i", "2025-07-01", None);
        inactive.active = false;
        assert!(!inactive.is_upcoming(today));
    }

    #[test]
    fn test_apply_keeps_unset_fields() {
        let mut e = event("e", "2025-06-01", Some(2));
        e.time = Some("20:00".into());
        let update: EventUpdate =
            serde_json::from_str(r##"{"active":false,"date":"","textColor":"#000"}"##).unwrap();
        e.apply(update, Utc::now());

        assert!(!e.active);
        assert_eq!(e.date, "2025-06-01");
        assert_eq!(e.time.as_deref(), Some("20:00"));
        assert_eq!(e.extra["textColor"], "#000");
    }

    #[test]
    fn test_type_field_name() {
        let json = r#"{"id":"1","title":"Party","date":"2025-01-01","type":"party"}"#;
        let e: Event = serde_json::from_str(json).unwrap();
        assert_eq!(e.event_type, EventType::Party);
        assert_eq!(serde_json::to_value(&e).unwrap()["type"], "party");
    }
}
