use crate::errors::DomainError;

pub const DEFAULT_LIMIT: u32 = 10;
pub const DEFAULT_MAX_LIMIT: u32 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self { limit: DEFAULT_LIMIT, offset: 0 }
    }
}

/// Bounds applied to caller-supplied pagination.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageSettings {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self { default_limit: DEFAULT_LIMIT, max_limit: DEFAULT_MAX_LIMIT }
    }
}

impl PageSettings {
    pub fn resolve(&self, limit: Option<i64>, offset: Option<i64>) -> Result<Page, DomainError> {
        let limit = match limit {
            None => self.default_limit,
            Some(value) if (1..=i64::from(self.max_limit)).contains(&value) => value as u32,
            Some(value) => {
                return Err(DomainError::InvalidArgument(format!(
                    "limit must be in range 1..={}, got {value}",
                    self.max_limit
                )))
            }
        };
        let offset = match offset {
            None => 0,
            Some(value) => u32::try_from(value).map_err(|_| {
                DomainError::InvalidArgument(format!("offset must be non-negative, got {value}"))
            })?,
        };

        Ok(Page { limit, offset })
    }
}
