//! Typed parameters for browse and publish calls, with their validation.
//!
//! Every check here runs before a request is built, so a rejected call never
//! reaches the transport and never opens the upload file.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ApiError;

/// Largest page size the browse endpoint accepts is one below this.
pub const BROWSE_COUNT_LIMIT: u32 = 500;

/// Mod property `/api/browse` sorts by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderBy {
    Name,
    Updated,
    Created,
}

impl OrderBy {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderBy::Name => "name",
            OrderBy::Updated => "updated",
            OrderBy::Created => "created",
        }
    }
}

impl FromStr for OrderBy {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "name" => Ok(OrderBy::Name),
            "updated" => Ok(OrderBy::Updated),
            "created" => Ok(OrderBy::Created),
            _ => Err(ApiError::invalid(format!(
                "invalid value for orderby: {s:?} (valid values: name, updated, created)"
            ))),
        }
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort direction for `/api/browse`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl FromStr for SortOrder {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(ApiError::invalid(format!(
                "invalid value for order: {s:?} (valid values: asc, desc)"
            ))),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters for `/api/browse`.
///
/// `order_by`, `order` and `count` are required even though they are
/// `Option`s; leaving one out is reported as `InvalidArgument`. `page` is
/// optional and omitted from the URL when `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrowseParams {
    pub order_by: Option<OrderBy>,
    pub order: Option<SortOrder>,
    /// Mods per page, `1..500`.
    pub count: Option<u32>,
    /// 1-based page number.
    pub page: Option<u32>,
}

impl BrowseParams {
    pub fn new(order_by: OrderBy, order: SortOrder, count: u32) -> Self {
        Self {
            order_by: Some(order_by),
            order: Some(order),
            count: Some(count),
            page: None,
        }
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Parse the string form used by the HTTP API, e.g. `("updated", "desc", 30)`.
    pub fn parse(order_by: &str, order: &str, count: u32) -> Result<Self, ApiError> {
        Ok(Self::new(order_by.parse()?, order.parse()?, count))
    }

    pub(crate) fn validate(&self) -> Result<(OrderBy, SortOrder, u32), ApiError> {
        let (order_by, order, count) = match (self.order_by, self.order, self.count) {
            (Some(order_by), Some(order), Some(count)) => (order_by, order, count),
            (order_by, order, count) => {
                let missing: Vec<&str> = [
                    ("orderby", order_by.is_none()),
                    ("order", order.is_none()),
                    ("count", count.is_none()),
                ]
                .into_iter()
                .filter_map(|(name, absent)| absent.then_some(name))
                .collect();
                return Err(ApiError::invalid(format!(
                    "missing browse parameter(s): {}",
                    missing.join(", ")
                )));
            }
        };
        validate_page(self.page)?;
        if count == 0 || count >= BROWSE_COUNT_LIMIT {
            return Err(ApiError::invalid(format!(
                "invalid value for count: {count} (valid values: 1-{})",
                BROWSE_COUNT_LIMIT - 1
            )));
        }
        Ok((order_by, order, count))
    }
}

pub(crate) fn validate_page(page: Option<u32>) -> Result<(), ApiError> {
    match page {
        Some(0) => Err(ApiError::invalid("invalid value for page: 0 (pages start at 1)")),
        _ => Ok(()),
    }
}

pub(crate) fn validate_id(id: u64) -> Result<(), ApiError> {
    if id == 0 {
        return Err(ApiError::invalid("id must be a positive integer"));
    }
    Ok(())
}

/// Fields for `/api/mod/create`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateModParams {
    pub name: String,
    pub short_description: String,
    /// Friendly version of the first release.
    pub version: String,
    /// KSP version the release is compatible with.
    pub ksp_version: String,
    pub license: String,
    /// Path of the zip archive to upload.
    pub zip_path: PathBuf,
}

impl CreateModParams {
    pub(crate) fn validate(&self) -> Result<(), ApiError> {
        let mut missing = Vec::new();
        for (name, value) in [
            ("name", &self.name),
            ("short_description", &self.short_description),
            ("version", &self.version),
            ("ksp_version", &self.ksp_version),
            ("license", &self.license),
        ] {
            if value.trim().is_empty() {
                missing.push(name);
            }
        }
        if self.zip_path.as_os_str().is_empty() {
            missing.push("zip_path");
        }
        missing_fields(&missing)
    }
}

/// Fields for `/api/mod/<id>/update`. Every field is mandatory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateModParams {
    pub mod_id: u64,
    pub version: String,
    /// Markdown changelog.
    pub changelog: String,
    pub ksp_version: String,
    /// Whether followers are emailed about the update. `None` is rejected.
    pub notify_followers: Option<bool>,
    pub zip_path: PathBuf,
}

impl UpdateModParams {
    pub(crate) fn validate(&self) -> Result<bool, ApiError> {
        let mut missing = Vec::new();
        if self.mod_id == 0 {
            missing.push("mod_id");
        }
        for (name, value) in [
            ("version", &self.version),
            ("changelog", &self.changelog),
            ("ksp_version", &self.ksp_version),
        ] {
            if value.trim().is_empty() {
                missing.push(name);
            }
        }
        if self.notify_followers.is_none() {
            missing.push("notify_followers");
        }
        if self.zip_path.as_os_str().is_empty() {
            missing.push("zip_path");
        }
        missing_fields(&missing)?;
        Ok(self.notify_followers.unwrap_or_default())
    }
}

fn missing_fields(missing: &[&str]) -> Result<(), ApiError> {
    if missing.is_empty() {
        return Ok(());
    }
    Err(ApiError::invalid(format!(
        "missing or empty parameter(s): {}",
        missing.join(", ")
    )))
}
