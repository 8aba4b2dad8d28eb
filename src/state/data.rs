/// Shared data structures for the application state
///
/// These structs represent the data model that flows between
/// the catalog layer and the issue cards.

use chrono::{DateTime, Utc};
use iced::Color;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// A single reported civic issue
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Issue {
    /// Unique record ID
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub status: Status,
    pub priority: Priority,
    /// Free-form address or landmark
    pub location: String,
    /// Display name of the reporter
    pub user_name: String,
    pub created_at: DateTime<Utc>,
    /// Photo URLs in display order (index 0 is shown first)
    #[serde(default)]
    pub photo_urls: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Infrastructure,
    Sanitation,
    Safety,
    Environment,
    Utilities,
    Transportation,
    Other,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Open,
    InProgress,
    Resolved,
    Closed,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

/// Colors for a status or priority pill
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BadgeStyle {
    pub background: Color,
    pub text: Color,
}

impl BadgeStyle {
    fn rgb(background: u32, text: u32) -> Self {
        Self {
            background: hex(background),
            text: hex(text),
        }
    }
}

fn hex(rgb: u32) -> Color {
    Color::from_rgb8((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
}

/// A stored enum value that is not one of the known variants
#[derive(Debug, Error, PartialEq)]
#[error("unknown {kind} value {value:?}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Infrastructure => "infrastructure",
            Category::Sanitation => "sanitation",
            Category::Safety => "safety",
            Category::Environment => "environment",
            Category::Utilities => "utilities",
            Category::Transportation => "transportation",
            Category::Other => "other",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Category::Infrastructure => "🏗️",
            Category::Sanitation => "🧹",
            Category::Safety => "🚨",
            Category::Environment => "🌳",
            Category::Utilities => "⚡",
            Category::Transportation => "🚌",
            Category::Other => "📋",
        }
    }

    /// Capitalized name shown under the card title
    pub fn label(&self) -> String {
        let name = self.as_str();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Open => "open",
            Status::InProgress => "in_progress",
            Status::Resolved => "resolved",
            Status::Closed => "closed",
        }
    }

    /// Badge text: the raw value with underscores shown as spaces
    pub fn label(&self) -> String {
        self.as_str().replace('_', " ")
    }

    pub fn badge(&self) -> BadgeStyle {
        match self {
            Status::Open => BadgeStyle::rgb(0xdbeafe, 0x1e40af),
            Status::InProgress => BadgeStyle::rgb(0xfef9c3, 0x854d0e),
            Status::Resolved => BadgeStyle::rgb(0xdcfce7, 0x166534),
            Status::Closed => BadgeStyle::rgb(0xf3f4f6, 0x1f2937),
        }
    }
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

    pub fn label(&self) -> &'static str {
        self.as_str()
    }

    pub fn badge(&self) -> BadgeStyle {
        match self {
            Priority::Low => BadgeStyle::rgb(0xf5f5f5, 0x404040),
            Priority::Medium => BadgeStyle::rgb(0xdbeafe, 0x1d4ed8),
            Priority::High => BadgeStyle::rgb(0xffedd5, 0xc2410c),
            Priority::Urgent => BadgeStyle::rgb(0xfee2e2, 0xb91c1c),
        }
    }
}

impl FromStr for Category {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "infrastructure" => Ok(Category::Infrastructure),
            "sanitation" => Ok(Category::Sanitation),
            "safety" => Ok(Category::Safety),
            "environment" => Ok(Category::Environment),
            "utilities" => Ok(Category::Utilities),
            "transportation" => Ok(Category::Transportation),
            "other" => Ok(Category::Other),
            _ => Err(UnknownVariant { kind: "category", value: s.to_string() }),
        }
    }
}

impl FromStr for Status {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Status::Open),
            "in_progress" => Ok(Status::InProgress),
            "resolved" => Ok(Status::Resolved),
            "closed" => Ok(Status::Closed),
            _ => Err(UnknownVariant { kind: "status", value: s.to_string() }),
        }
    }
}

impl FromStr for Priority {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "urgent" => Ok(Priority::Urgent),
            _ => Err(UnknownVariant { kind: "priority", value: s.to_string() }),
        }
    }
}

// Enums are stored in the catalog as their snake_case text
macro_rules! sql_text_enum {
    ($($ty:ty),*) => {$(
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e| FromSqlError::Other(Box::new(e)))
            }
        }
    )*};
}

sql_text_enum!(Category, Status, Priority);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_label_replaces_underscore() {
        assert_eq!(Status::InProgress.label(), "in progress");
        assert_eq!(Status::Open.label(), "open");
    }

    #[test]
    fn test_category_label_is_capitalized() {
        assert_eq!(Category::Transportation.label(), "Transportation");
        assert_eq!(Category::Other.icon(), "📋");
    }

    #[test]
    fn test_badge_colors() {
        let urgent = Priority::Urgent.badge();
        assert_eq!(urgent.background, Color::from_rgb8(0xfe, 0xe2, 0xe2));
        assert_eq!(urgent.text, Color::from_rgb8(0xb9, 0x1c, 0x1c));
        assert_ne!(Status::Open.badge(), Status::Closed.badge());
    }

    #[test]
    fn test_parse_round_trips_every_variant() {
        for status in [Status::Open, Status::InProgress, Status::Resolved, Status::Closed] {
            assert_eq!(status.as_str().parse::<Status>(), Ok(status));
        }
        assert_eq!(
            "blocked".parse::<Status>(),
            Err(UnknownVariant { kind: "status", value: "blocked".to_string() })
        );
    }

    #[test]
    fn test_deserialize_issue() {
        let json = r#"{
            "id": "a1",
            "title": "Pothole on Main St",
            "description": "Deep pothole near the crossing",
            "category": "infrastructure",
            "status": "in_progress",
            "priority": "high",
            "location": "Main St & 3rd Ave",
            "user_name": "Sam",
            "created_at": "2024-03-01T12:00:00Z"
        }"#;

        let issue: Issue = serde_json::from_str(json).unwrap();
        assert_eq!(issue.status, Status::InProgress);
        assert_eq!(issue.category, Category::Infrastructure);
        assert!(issue.photo_urls.is_empty());
    }

    #[test]
    fn test_deserialize_rejects_unknown_priority() {
        let json = r#"{
            "id": "a2", "title": "t", "description": "d",
            "category": "safety", "status": "open", "priority": "critical",
            "location": "l", "user_name": "u",
            "created_at": "2024-03-01T12:00:00Z", "photo_urls": []
        }"#;

        assert!(serde_json::from_str::<Issue>(json).is_err());
    }
}
