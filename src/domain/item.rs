use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

use crate::error::BacklogError;

/// Unique identifier for a backlog item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(Uuid);

impl ItemId {
    /// Generates a fresh random identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for ItemId {
    type Err = BacklogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| BacklogError::InvalidItemId(s.to_string()))
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of the user that owns a backlog item.
///
/// Every store read and write takes one of these; there is no unscoped access.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Result<Self, BacklogError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(BacklogError::Validation(
                "owner identity must not be empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Backlog category; manual ordering is scoped to one of these
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Certifications,
    Udemy,
    Books,
    Interview,
    Concepts,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Certifications,
        Category::Udemy,
        Category::Books,
        Category::Interview,
        Category::Concepts,
    ];

    /// Wire and storage name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Certifications => "certifications",
            Self::Udemy => "udemy",
            Self::Books => "books",
            Self::Interview => "interview",
            Self::Concepts => "concepts",
        }
    }

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Certifications => "Certifications",
            Self::Udemy => "Udemy Course",
            Self::Books => "Books",
            Self::Interview => "Interview",
            Self::Concepts => "Concepts/Others",
        }
    }
}

impl FromStr for Category {
    type Err = BacklogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| BacklogError::InvalidCategory(s.to_string()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Numeric rank, higher is more urgent
    pub fn rank(&self) -> u8 {
        match self {
            Self::High => 2,
            Self::Medium => 1,
            Self::Low => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl FromStr for Priority {
    type Err = BacklogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(BacklogError::InvalidPriority(s.to_string())),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A learning item in a user's backlog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacklogItem {
    pub id: ItemId,
    pub user_id: OwnerId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category: Category,
    pub priority: Priority,
    pub tentative_start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl BacklogItem {
    /// Builds a new item for `owner` at the given position in its category
    pub fn new(owner: OwnerId, data: NewBacklogItem, sort_order: i64) -> Self {
        Self {
            id: ItemId::new(),
            user_id: owner,
            title: data.title.trim().to_string(),
            description: data.description,
            category: data.category,
            priority: data.priority,
            tentative_start_date: data.tentative_start_date,
            estimated_hours: data.estimated_hours,
            sort_order: Some(sort_order),
            completed_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Marks the item completed; `sort_order` is left as is
    pub fn complete(&mut self) {
        self.completed_at = Some(Utc::now());
    }

    /// Clears completion; the old `sort_order` becomes meaningful again
    pub fn uncomplete(&mut self) {
        self.completed_at = None;
    }

    /// Whether the item belongs to the ordered partition of `owner` and `category`
    pub fn in_partition(&self, owner: &OwnerId, category: Category) -> bool {
        &self.user_id == owner && self.category == category && !self.is_completed()
    }
}

/// Strict `YYYY-MM-DD` parsing for start dates.
///
/// Chrono alone accepts unpadded and signed years; the wire format does not.
pub fn parse_start_date(s: &str) -> Result<NaiveDate, BacklogError> {
    let bytes = s.as_bytes();
    let shaped = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shaped {
        return Err(BacklogError::Validation(format!(
            "tentativeStartDate must be YYYY-MM-DD, got '{}'",
            s
        )));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| BacklogError::Validation(format!("'{}' is not a calendar date", s)))
}

mod start_date {
    use chrono::NaiveDate;
    use serde::{de::Error, Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_start_date(&raw).map_err(D::Error::custom)
    }

    pub mod option {
        use chrono::NaiveDate;
        use serde::{de::Error, Deserialize, Deserializer};

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveDate>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|raw| super::super::parse_start_date(&raw).map_err(D::Error::custom))
                .transpose()
        }
    }
}

fn validate_title(title: &str) -> Result<(), BacklogError> {
    if title.trim().is_empty() {
        return Err(BacklogError::Validation("title must not be empty".to_string()));
    }
    Ok(())
}

fn validate_hours(hours: Option<u32>) -> Result<(), BacklogError> {
    if hours == Some(0) {
        return Err(BacklogError::Validation(
            "estimatedHours must be a positive integer".to_string(),
        ));
    }
    Ok(())
}

/// Payload for creating a backlog item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBacklogItem {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category: Category,
    pub priority: Priority,
    #[serde(deserialize_with = "start_date::deserialize")]
    pub tentative_start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<u32>,
}

impl NewBacklogItem {
    pub fn new(
        title: impl Into<String>,
        category: Category,
        priority: Priority,
        tentative_start_date: NaiveDate,
    ) -> Self {
        Self {
            title: title.into(),
            description: None,
            category,
            priority,
            tentative_start_date,
            estimated_hours: None,
        }
    }

    pub fn validate(&self) -> Result<(), BacklogError> {
        validate_title(&self.title)?;
        validate_hours(self.estimated_hours)
    }
}

/// Partial update; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacklogItemUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(
        default,
        deserialize_with = "start_date::option::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub tentative_start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<u32>,
}

impl BacklogItemUpdate {
    pub fn validate(&self) -> Result<(), BacklogError> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        validate_hours(self.estimated_hours)
    }

    /// Copies the present fields onto `item`.
    ///
    /// Identity, ownership, creation time, completion and manual order are
    /// never touched by an update.
    pub fn apply_to(&self, item: &mut BacklogItem) {
        if let Some(title) = &self.title {
            item.title = title.trim().to_string();
        }
        if let Some(description) = &self.description {
            item.description = Some(description.clone());
        }
        if let Some(category) = self.category {
            item.category = category;
        }
        if let Some(priority) = self.priority {
            item.priority = priority;
        }
        if let Some(date) = self.tentative_start_date {
            item.tentative_start_date = date;
        }
        if let Some(hours) = self.estimated_hours {
            item.estimated_hours = Some(hours);
        }
    }
}

/// Listing filter, all criteria optional
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl ItemFilter {
    pub fn matches(&self, item: &BacklogItem) -> bool {
        self.category.map_or(true, |c| item.category == c)
            && self.priority.map_or(true, |p| item.priority == p)
            && self.completed.map_or(true, |done| item.is_completed() == done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn owner(id: &str) -> OwnerId {
        OwnerId::new(id).unwrap()
    }

    #[test]
    fn test_item_id_parsing() {
        let id = ItemId::new();
        let parsed = ItemId::from_str(&id.to_string()).unwrap();
        assert_eq!(parsed, id);

        assert!(ItemId::from_str("not-a-uuid").is_err());
        assert!(ItemId::from_str("").is_err());
    }

    #[test]
    fn test_owner_id_rejects_blank() {
        assert!(OwnerId::new("").is_err());
        assert!(OwnerId::new("   ").is_err());
        assert_eq!(owner(" alice ").as_str(), "alice");
    }

    #[test]
    fn test_category_parsing() {
        for category in Category::ALL {
            assert_eq!(Category::from_str(category.as_str()).unwrap(), category);
        }
        assert!(matches!(
            Category::from_str("movies"),
            Err(BacklogError::InvalidCategory(_))
        ));
        assert!(Category::from_str("Books").is_err());
        assert_eq!(Category::Udemy.label(), "Udemy Course");
    }

    #[test]
    fn test_priority_rank() {
        assert!(Priority::High.rank() > Priority::Medium.rank());
        assert!(Priority::Medium.rank() > Priority::Low.rank());
        assert!(Priority::from_str("urgent").is_err());
    }

    #[test]
    fn test_new_item_validation() {
        let mut data =
            NewBacklogItem::new("Rust book", Category::Books, Priority::High, date("2025-03-15"));
        assert!(data.validate().is_ok());

        data.title = "   ".to_string();
        assert!(data.validate().is_err());

        data.title = "Rust book".to_string();
        data.estimated_hours = Some(0);
        assert!(data.validate().is_err());

        data.estimated_hours = Some(12);
        assert!(data.validate().is_ok());
    }

    #[test]
    fn test_complete_and_uncomplete_keep_sort_order() {
        let data = NewBacklogItem::new(
            "AWS SAA",
            Category::Certifications,
            Priority::Medium,
            date("2025-01-01"),
        );
        let mut item = BacklogItem::new(owner("alice"), data, 4);

        item.complete();
        assert!(item.is_completed());
        assert_eq!(item.sort_order, Some(4));
        assert!(!item.in_partition(&owner("alice"), Category::Certifications));

        item.uncomplete();
        assert!(!item.is_completed());
        assert_eq!(item.sort_order, Some(4));
        assert!(item.in_partition(&owner("alice"), Category::Certifications));
        assert!(!item.in_partition(&owner("bob"), Category::Certifications));
    }

    #[test]
    fn test_update_leaves_order_and_identity() {
        let data = NewBacklogItem::new("Old", Category::Books, Priority::Low, date("2025-01-01"));
        let mut item = BacklogItem::new(owner("alice"), data, 2);
        let original = item.clone();

        let update = BacklogItemUpdate {
            title: Some("New".to_string()),
            priority: Some(Priority::High),
            ..Default::default()
        };
        update.validate().unwrap();
        update.apply_to(&mut item);

        assert_eq!(item.title, "New");
        assert_eq!(item.priority, Priority::High);
        assert_eq!(item.id, original.id);
        assert_eq!(item.sort_order, original.sort_order);
        assert_eq!(item.created_at, original.created_at);
        assert_eq!(item.category, original.category);
    }

    #[test]
    fn test_item_serialization_uses_camel_case() {
        let data =
            NewBacklogItem::new("Test", Category::Concepts, Priority::Low, date("2025-03-15"));
        let item = BacklogItem::new(owner("alice"), data, 1);
        let json = serde_json::to_value(&item).unwrap();

        assert_eq!(json["userId"], "alice");
        assert_eq!(json["tentativeStartDate"], "2025-03-15");
        assert_eq!(json["sortOrder"], 1);
        assert_eq!(json["category"], "concepts");
        assert!(json.get("completedAt").is_none());
        assert!(json.get("estimatedHours").is_none());
    }

    fn json_item(start: &str) -> String {
        serde_json::json!({
            "title": "Test",
            "category": "books",
            "priority": "high",
            "tentativeStartDate": start
        })
        .to_string()
    }

    #[test]
    fn test_new_item_rejects_malformed_date() {
        let json = r#"{
            "title": "Test",
            "category": "books",
            "priority": "high",
            "tentativeStartDate": "15/03/2025"
        }"#;
        assert!(serde_json::from_str::<NewBacklogItem>(json).is_err());

        for bad in ["2025-3-5", "+2025-03-15", "2025-02-30", "2025-03-15T00:00:00"] {
            let json = json_item(bad);
            assert!(
                serde_json::from_str::<NewBacklogItem>(&json).is_err(),
                "accepted {}",
                bad
            );
        }

        let ok = json_item("2025-03-05");
        let item: NewBacklogItem = serde_json::from_str(&ok).unwrap();
        assert_eq!(item.tentative_start_date, date("2025-03-05"));
    }

    #[test]
    fn test_update_rejects_malformed_date() {
        let unpadded = r#"{"tentativeStartDate":"2025-3-5"}"#;
        assert!(serde_json::from_str::<BacklogItemUpdate>(unpadded).is_err());

        let update: BacklogItemUpdate =
            serde_json::from_str(r#"{"tentativeStartDate":"2025-04-01"}"#).unwrap();
        assert_eq!(update.tentative_start_date, Some(date("2025-04-01")));

        let empty: BacklogItemUpdate = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.tentative_start_date, None);
    }

    #[test]
    fn test_filter_matches() {
        let data = NewBacklogItem::new("Test", Category::Books, Priority::High, date("2025-03-15"));
        let mut item = BacklogItem::new(owner("alice"), data, 1);

        assert!(ItemFilter::default().matches(&item));
        let books = ItemFilter {
            category: Some(Category::Books),
            ..Default::default()
        };
        let udemy = ItemFilter {
            category: Some(Category::Udemy),
            ..Default::default()
        };
        assert!(books.matches(&item));
        assert!(!udemy.matches(&item));
        assert!(!ItemFilter { completed: Some(true), ..Default::default() }.matches(&item));

        item.complete();
        let done_high = ItemFilter {
            completed: Some(true),
            priority: Some(Priority::High),
            ..Default::default()
        };
        assert!(done_high.matches(&item));
    }
}
