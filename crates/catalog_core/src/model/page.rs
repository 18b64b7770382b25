//! Paging and sorting contracts for list reads.
//!
//! # Invariants
//! - Page numbers are zero-based.
//! - A requested page past the last one yields an empty page, not an error.
//! - `size == 0` falls back to [`DEFAULT_PAGE_SIZE`]; sizes are capped at
//!   [`MAX_PAGE_SIZE`].

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub const DEFAULT_PAGE_SIZE: u32 = 12;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Sort direction for one property.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Single-property sort order. Properties use representation field names
/// (`name`, `price`, `firstName`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub property: String,
    pub direction: SortDirection,
}

impl Sort {
    /// Ascending sort on `property`.
    pub fn by(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: SortDirection::Desc,
        }
    }
}

impl Display for Sort {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let direction = match self.direction {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        };
        write!(f, "{},{direction}", self.property)
    }
}

/// Parses `property` or `property,asc|desc`.
impl FromStr for Sort {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (property, direction) = match value.split_once(',') {
            Some((property, direction)) => (property.trim(), Some(direction.trim())),
            None => (value.trim(), None),
        };
        if property.is_empty() {
            return Err(format!("sort property is empty in `{value}`"));
        }

        let direction = match direction.map(str::to_ascii_lowercase).as_deref() {
            None | Some("asc") => SortDirection::Asc,
            Some("desc") => SortDirection::Desc,
            Some(other) => {
                return Err(format!(
                    "unsupported sort direction `{other}`; expected asc|desc"
                ))
            }
        };

        Ok(Self {
            property: property.to_string(),
            direction,
        })
    }
}

/// Page selection for list reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
    pub sort: Option<Sort>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::of(0, DEFAULT_PAGE_SIZE)
    }
}

impl PageRequest {
    pub fn of(page: u32, size: u32) -> Self {
        Self {
            page,
            size,
            sort: None,
        }
    }

    pub fn sorted(page: u32, size: u32, sort: Sort) -> Self {
        Self {
            page,
            size,
            sort: Some(sort),
        }
    }

    /// Page size after default/cap normalization.
    pub fn effective_size(&self) -> u32 {
        match self.size {
            0 => DEFAULT_PAGE_SIZE,
            size => size.min(MAX_PAGE_SIZE),
        }
    }

    /// Number of rows to skip.
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.effective_size())
    }
}

/// One page of results plus totals over the whole table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub number: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: u64) -> Self {
        let size = request.effective_size();
        Self {
            content,
            number: request.page,
            size,
            total_elements,
            total_pages: total_elements.div_ceil(u64::from(size)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn number_of_elements(&self) -> usize {
        self.content.len()
    }

    /// Converts each element, keeping paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            number: self.number,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }

    /// Fallible variant of [`Page::map`]; stops at the first error.
    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        Ok(Page {
            content: self.content.into_iter().map(f).collect::<Result<_, _>>()?,
            number: self.number,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        })
    }
}
