//! Column conversions shared by the SQL repositories.

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use tenderflow_core::domain::page::Page;

use super::RepositoryError;

/// Fixed-width UTC so lexical order in SQLite matches chronological order.
pub(crate) fn timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn text(row: &SqliteRow, column: &str) -> Result<String, RepositoryError> {
    row.try_get(column).map_err(|e| RepositoryError::Decode(e.to_string()))
}

pub(crate) fn optional_text(
    row: &SqliteRow,
    column: &str,
) -> Result<Option<String>, RepositoryError> {
    row.try_get(column).map_err(|e| RepositoryError::Decode(e.to_string()))
}

pub(crate) fn uuid(row: &SqliteRow, column: &str) -> Result<Uuid, RepositoryError> {
    let raw = text(row, column)?;
    Uuid::parse_str(&raw)
        .map_err(|e| RepositoryError::Decode(format!("{column} `{raw}` is not a uuid: {e}")))
}

pub(crate) fn datetime(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>, RepositoryError> {
    let raw = text(row, column)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("{column} `{raw}` is not rfc3339: {e}")))
}

pub(crate) fn version(row: &SqliteRow, column: &str) -> Result<u32, RepositoryError> {
    let raw: i64 = row.try_get(column).map_err(|e| RepositoryError::Decode(e.to_string()))?;
    u32::try_from(raw).map_err(|_| RepositoryError::Decode(format!("{column} out of range: {raw}")))
}

pub(crate) fn limit_offset(page: Page) -> (i64, i64) {
    (i64::from(page.limit), i64::from(page.offset))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::timestamp;

    #[test]
    fn timestamps_sort_lexically() {
        let earlier = Utc.with_ymd_and_hms(2024, 9, 1, 8, 0, 0).unwrap();
        let later = earlier + chrono::Duration::microseconds(1);

        assert_eq!(timestamp(earlier), "2024-09-01T08:00:00.000000Z");
        assert!(timestamp(earlier) < timestamp(later));
    }
}
