//! Client-side search, category filtering and email deduplication.
//!
//! All of this runs over the in-memory snapshot on every input change. It is a
//! linear scan; the lists are a few thousand rows at most.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::records::{Record, Status};

/// Second filter stage: a status, a region, or nothing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Category {
    #[default]
    All,
    /// Exact match against the record's effective status.
    Status(Status),
    /// Case-insensitive substring match against the region.
    Region(String),
}

impl Category {
    pub fn region(needle: impl Into<String>) -> Self {
        Category::Region(needle.into().to_lowercase())
    }

    fn accepts<R: Record>(&self, record: &R) -> bool {
        match self {
            Category::All => true,
            Category::Status(status) => record.effective_status() == *status,
            Category::Region(needle) => record
                .attendee()
                .region
                .as_deref()
                .is_some_and(|region| region.to_lowercase().contains(needle.as_str())),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::All => f.write_str("all"),
            Category::Status(status) => write!(f, "{status}"),
            Category::Region(needle) => f.write_str(needle),
        }
    }
}

/// Error returned when a filter name is not recognised.
#[derive(Debug, thiserror::Error)]
#[error("unknown filter {0:?}")]
pub struct UnknownFilter(pub String);

/// Status filter as offered on the registration list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Approved,
    Declined,
}

impl FromStr for StatusFilter {
    type Err = UnknownFilter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "pending" => Ok(StatusFilter::Pending),
            "approved" => Ok(StatusFilter::Approved),
            "declined" => Ok(StatusFilter::Declined),
            other => Err(UnknownFilter(other.to_string())),
        }
    }
}

impl From<StatusFilter> for Category {
    fn from(filter: StatusFilter) -> Self {
        match filter {
            StatusFilter::All => Category::All,
            StatusFilter::Pending => Category::Status(Status::Pending),
            StatusFilter::Approved => Category::Status(Status::Approved),
            StatusFilter::Declined => Category::Status(Status::Declined),
        }
    }
}

/// Region filter as offered on the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegionFilter {
    #[default]
    All,
    East,
    West,
}

impl RegionFilter {
    pub fn needle(self) -> Option<&'static str> {
        match self {
            RegionFilter::All => None,
            RegionFilter::East => Some("east"),
            RegionFilter::West => Some("west"),
        }
    }
}

impl FromStr for RegionFilter {
    type Err = UnknownFilter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(RegionFilter::All),
            "east" => Ok(RegionFilter::East),
            "west" => Ok(RegionFilter::West),
            other => Err(UnknownFilter(other.to_string())),
        }
    }
}

impl From<RegionFilter> for Category {
    fn from(filter: RegionFilter) -> Self {
        match filter.needle() {
            Some(needle) => Category::region(needle),
            None => Category::All,
        }
    }
}

/// Free-text search stage.
///
/// Name, email and region are matched case-insensitively. Mobile numbers are
/// matched against the raw query. An empty query matches everything.
pub fn matches_search<R: Record>(record: &R, search: &str) -> bool {
    if search.is_empty() {
        return true;
    }

    let needle = search.to_lowercase();
    let attendee = record.attendee();
    let folded = |field: &Option<String>| {
        field
            .as_deref()
            .is_some_and(|value| value.to_lowercase().contains(&needle))
    };

    folded(&attendee.name)
        || folded(&attendee.email)
        || attendee
            .mobile
            .as_deref()
            .is_some_and(|mobile| mobile.contains(search))
        || folded(&attendee.region)
}

/// Apply search AND category, preserving list order.
pub fn filter<'a, R: Record>(records: &'a [R], search: &str, category: &Category) -> Vec<&'a R> {
    records
        .iter()
        .filter(|record| matches_search(*record, search) && category.accepts(*record))
        .collect()
}

/// Keep the first record for each email, in list order.
///
/// Records without an email share a single key, so only the first of them
/// survives.
pub fn dedup_by_email<R: Record>(records: Vec<R>) -> Vec<R> {
    let mut seen: HashSet<Option<String>> = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|record| seen.insert(record.attendee().email.clone()))
        .collect()
}
