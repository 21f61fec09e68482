use chrono::{DateTime, NaiveDate, Utc};
use scholaris_core::serde::{deserialize_optional_f64, deserialize_optional_uuid};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

pub const ATTENDANCE_COLUMNS: &str =
    "id, school_id, student_id, class_id, date, status, remarks, marked_by, created_at, updated_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "attendance_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Excused,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub school_id: Uuid,
    pub student_id: Uuid,
    pub class_id: Uuid,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub remarks: Option<String>,
    pub marked_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct AttendanceEntry {
    pub student_id: Uuid,
    pub status: AttendanceStatus,
    #[validate(length(max = 500, message = "Remarks are at most 500 characters"))]
    pub remarks: Option<String>,
}

/// Marks a whole class for one day. Re-marking the same day overwrites.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct MarkAttendanceDto {
    pub class_id: Uuid,
    pub date: NaiveDate,
    #[validate(length(min = 1, message = "At least one entry is required"), nested)]
    pub entries: Vec<AttendanceEntry>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AttendanceFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub class_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub school_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SummaryParams {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AttendanceSummary {
    pub student_id: Uuid,
    pub total_days: i64,
    pub present: i64,
    pub absent: i64,
    pub late: i64,
    pub excused: i64,
    /// Present and late days over all marked days, 0 when nothing is marked.
    pub attendance_percentage: f64,
}

#[derive(Debug, FromRow)]
pub(crate) struct SummaryCounts {
    pub total_days: i64,
    pub present: i64,
    pub absent: i64,
    pub late: i64,
    pub excused: i64,
}

impl AttendanceSummary {
    pub(crate) fn from_counts(student_id: Uuid, c: SummaryCounts) -> Self {
        let attendance_percentage = if c.total_days == 0 {
            0.0
        } else {
            let attended = (c.present + c.late) as f64;
            (attended / c.total_days as f64 * 10_000.0).round() / 100.0
        };
        Self {
            student_id,
            total_days: c.total_days,
            present: c.present,
            absent: c.absent,
            late: c.late,
            excused: c.excused,
            attendance_percentage,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CheckInDto {
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be within ±90"))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be within ±180"))]
    pub longitude: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct StaffCheckIn {
    pub id: Uuid,
    pub school_id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub checked_in_at: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub distance_m: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GeofenceQuery {
    #[serde(default, deserialize_with = "deserialize_optional_f64")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_optional_f64")]
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeofenceStatus {
    pub school_has_location: bool,
    /// Metres from the school, absent when the school has no location.
    pub distance_m: Option<f64>,
    pub radius_m: f64,
    pub allowed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(total: i64, present: i64, late: i64) -> SummaryCounts {
        SummaryCounts {
            total_days: total,
            present,
            absent: total - present - late,
            late,
            excused: 0,
        }
    }

    #[test]
    fn test_percentage_counts_late_as_attended() {
        let s = AttendanceSummary::from_counts(Uuid::nil(), counts(4, 2, 1));
        assert_eq!(s.attendance_percentage, 75.0);
    }

    #[test]
    fn test_percentage_rounds_to_two_places() {
        let s = AttendanceSummary::from_counts(Uuid::nil(), counts(3, 2, 0));
        assert_eq!(s.attendance_percentage, 66.67);
    }

    #[test]
    fn test_no_records_is_zero() {
        let s = AttendanceSummary::from_counts(Uuid::nil(), counts(0, 0, 0));
        assert_eq!(s.attendance_percentage, 0.0);
    }

    #[test]
    fn test_mark_dto_requires_entries() {
        let dto = MarkAttendanceDto {
            class_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(),
            entries: vec![],
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_check_in_rejects_bad_latitude() {
        let dto = CheckInDto {
            latitude: 95.0,
            longitude: 0.0,
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_status_serialises_snake_case() {
        let json = serde_json::to_string(&AttendanceStatus::Excused).unwrap();
        assert_eq!(json, "\"excused\"");
    }
}
