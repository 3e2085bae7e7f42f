//! Derived views over the in-memory collections.
//!
//! Everything here is a pure function of its inputs and is recomputed on
//! every read. `now` is always passed in so results are reproducible.

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::models::{Appointment, Patient};

/// Headline numbers for the dashboard cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_patients: usize,
    pub total_revenue: f64,
    pub upcoming: usize,
}

/// One bar of the revenue history chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRevenue {
    /// First day of the month.
    pub month: NaiveDate,
    /// Short month label, e.g. "Oct".
    pub label: String,
    pub revenue: f64,
}

/// One bar of the weekly activity chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekdayCount {
    pub label: String,
    pub count: usize,
}

pub fn patient_count(patients: &[Patient]) -> usize {
    patients.len()
}

/// Sum of fees over completed appointments.
pub fn total_revenue(appointments: &[Appointment]) -> f64 {
    appointments
        .iter()
        .filter(|a| a.counts_toward_revenue())
        .map(|a| a.fee)
        .sum()
}

/// Appointments dated strictly after `now`, whatever their status.
pub fn upcoming_count(appointments: &[Appointment], now: DateTime<Utc>) -> usize {
    appointments.iter().filter(|a| a.is_after(now)).count()
}

pub fn summarize(
    patients: &[Patient],
    appointments: &[Appointment],
    now: DateTime<Utc>,
) -> DashboardSummary {
    DashboardSummary {
        total_patients: patient_count(patients),
        total_revenue: total_revenue(appointments),
        upcoming: upcoming_count(appointments, now),
    }
}

/// Schedule order: ascending by date, input order kept on ties.
pub fn chronological(appointments: &[Appointment]) -> Vec<Appointment> {
    let mut sorted = appointments.to_vec();
    // sort_by_key is stable
    sorted.sort_by_key(|a| a.date);
    sorted
}

/// Case-insensitive substring match on name or email. Empty query keeps all.
pub fn search_patients(patients: &[Patient], query: &str) -> Vec<Patient> {
    let needle = query.to_lowercase();
    patients
        .iter()
        .filter(|p| {
            needle.is_empty()
                || p.name.to_lowercase().contains(&needle)
                || p.email.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

/// Earliest appointment for `patient_id` after `now`.
pub fn next_appointment_for<'a>(
    appointments: &'a [Appointment],
    patient_id: &str,
    now: DateTime<Utc>,
) -> Option<&'a Appointment> {
    appointments
        .iter()
        .filter(|a| a.patient_id == patient_id && a.is_after(now))
        .min_by_key(|a| a.date)
}

/// Completed revenue per calendar month, oldest first, ending with the
/// month containing `now`. Months without revenue are present with 0.
pub fn revenue_by_month(
    appointments: &[Appointment],
    now: DateTime<Utc>,
    months: u32,
) -> Vec<MonthlyRevenue> {
    let Some(current) = now.date_naive().with_day(1) else {
        return Vec::new();
    };

    (0..months)
        .rev()
        .filter_map(|back| current.checked_sub_months(Months::new(back)))
        .map(|month| {
            let revenue = appointments
                .iter()
                .filter(|a| a.counts_toward_revenue())
                .filter(|a| {
                    let d = a.date.date_naive();
                    d.year() == month.year() && d.month() == month.month()
                })
                .map(|a| a.fee)
                .sum();
            MonthlyRevenue {
                month,
                label: month.format("%b").to_string(),
                revenue,
            }
        })
        .collect()
}

const WORKDAYS: [Weekday; 5] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
];

/// Appointment counts Monday through Friday, any status.
pub fn weekday_activity(appointments: &[Appointment]) -> Vec<WeekdayCount> {
    WORKDAYS
        .iter()
        .map(|day| WeekdayCount {
            label: weekday_label(*day).to_string(),
            count: appointments
                .iter()
                .filter(|a| a.date.weekday() == *day)
                .count(),
        })
        .collect()
}

fn weekday_label(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

pub fn last_visit_label(patient: &Patient) -> String {
    patient
        .last_visit
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}
