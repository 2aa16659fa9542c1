//! Row → domain mapping for store query results.
//!
//! The binding hands back loosely typed columns; every conversion here
//! is checked and fails with `RowDecode` naming the column.

use chrono::{DateTime, NaiveDateTime, Utc};
use prodmon_api::{MonitorError, PersistedRecord};

pub fn integer(row: &[serde_json::Value], idx: usize, name: &str) -> Result<i64, MonitorError> {
    let value = column(row, idx, name)?;
    let n = match value {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    n.ok_or_else(|| MonitorError::RowDecode(format!("column {name}: expected integer, got {value}")))
}

pub fn timestamp(row: &[serde_json::Value], idx: usize, name: &str) -> Result<DateTime<Utc>, MonitorError> {
    let value = column(row, idx, name)?;
    let s = value
        .as_str()
        .ok_or_else(|| MonitorError::RowDecode(format!("column {name}: expected timestamp string, got {value}")))?;
    parse_timestamp(s).ok_or_else(|| MonitorError::RowDecode(format!("column {name}: unparseable timestamp {s:?}")))
}

/// RFC3339, or a naive `YYYY-MM-DD[T ]HH:MM:SS[.f]` taken as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn column<'a>(row: &'a [serde_json::Value], idx: usize, name: &str) -> Result<&'a serde_json::Value, MonitorError> {
    row.get(idx)
        .ok_or_else(|| MonitorError::RowDecode(format!("row has {} columns, {name} expected at {idx}", row.len())))
}

/// `SELECT *` row of `products`: (id, product_id, created_at).
pub fn persisted_record(row: &[serde_json::Value]) -> Result<PersistedRecord, MonitorError> {
    Ok(PersistedRecord {
        id: integer(row, 0, "id")?,
        product_id: integer(row, 1, "product_id")?,
        created_at: timestamp(row, 2, "created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    #[test]
    fn maps_float_ids_and_string_timestamps() {
        let rec = persisted_record(&[json!(7.0), json!(2.0), json!("2026-10-17T14:05:09Z")]).unwrap();
        assert_eq!(rec, PersistedRecord {
            id: 7,
            product_id: 2,
            created_at: Utc.with_ymd_and_hms(2026, 10, 17, 14, 5, 9).unwrap(),
        });
    }

    #[test]
    fn accepts_naive_timestamps_as_utc() {
        let expected = Utc.with_ymd_and_hms(2026, 10, 17, 14, 5, 9).unwrap();
        assert_eq!(parse_timestamp("2026-10-17T14:05:09"), Some(expected));
        assert_eq!(parse_timestamp("2026-10-17 14:05:09.000"), Some(expected));
        assert_eq!(parse_timestamp("2026-10-17T16:05:09+02:00"), Some(expected));
        assert_eq!(parse_timestamp("17/10/2026"), None);
    }

    #[test]
    fn fractional_id_is_a_decode_error() {
        let err = persisted_record(&[json!(1.5), json!(2), json!("2026-10-17T14:05:09Z")]).unwrap_err();
        assert!(matches!(err, MonitorError::RowDecode(ref m) if m.contains("column id")));
    }

    #[test]
    fn short_or_mistyped_rows_are_decode_errors() {
        assert!(matches!(persisted_record(&[json!(1), json!(2)]), Err(MonitorError::RowDecode(_))));
        assert!(matches!(
            persisted_record(&[json!(1), json!(2), json!(1760709909)]),
            Err(MonitorError::RowDecode(_))
        ));
    }
}
