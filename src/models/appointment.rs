use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::AppointmentStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub patient_id: String,
    /// Copied from the patient at booking time; not kept in sync.
    pub patient_name: String,
    pub date: DateTime<Utc>,
    pub duration_minutes: u32,
    pub status: AppointmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub fee: f64,
}

impl Appointment {
    /// Only completed visits are billable.
    pub fn counts_toward_revenue(&self) -> bool {
        self.status == AppointmentStatus::Completed
    }

    pub fn is_after(&self, now: DateTime<Utc>) -> bool {
        self.date > now
    }
}
