//! Built-in demo records, used whenever nothing has been stored yet.
//!
//! Appointment times are relative to the instant the seed is built, so a
//! freshly reset practice always has two past visits and three upcoming ones.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::models::{
    Appointment, AppointmentStatus, Note, NoteType, Patient, PatientStatus, UserSettings,
};

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    // Literal dates below are all valid calendar days.
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

fn avatar(n: u32) -> String {
    format!("https://picsum.photos/200/200?random={n}")
}

pub fn seed_patients() -> Vec<Patient> {
    vec![
        Patient {
            id: "p1".into(),
            name: "Sarah Johnson".into(),
            email: "sarah.j@example.com".into(),
            phone: "(555) 123-4567".into(),
            dob: ymd(1985, 4, 12),
            avatar: avatar(1),
            status: PatientStatus::Active,
            last_visit: Some(ymd(2023, 10, 15)),
            notes: vec![Note {
                id: "n1".into(),
                date: ymd(2023, 10, 15),
                note_type: NoteType::Soap,
                content: "S: Patient reports persistent headaches tailored to stress.\n\
                          O: BP 120/80. Tension noted in neck muscles.\n\
                          A: Tension headache.\n\
                          P: Recommend hydration, stress management, follow up in 2 weeks."
                    .into(),
            }],
        },
        Patient {
            id: "p2".into(),
            name: "Michael Chen".into(),
            email: "m.chen@example.com".into(),
            phone: "(555) 987-6543".into(),
            dob: ymd(1990, 8, 23),
            avatar: avatar(2),
            status: PatientStatus::Active,
            last_visit: Some(ymd(2023, 10, 20)),
            notes: Vec::new(),
        },
        Patient {
            id: "p3".into(),
            name: "Emily Davis".into(),
            email: "emily.d@example.com".into(),
            phone: "(555) 456-7890".into(),
            dob: ymd(1978, 11, 30),
            avatar: avatar(3),
            status: PatientStatus::Active,
            last_visit: None,
            notes: Vec::new(),
        },
        Patient {
            id: "p4".into(),
            name: "James Wilson".into(),
            email: "j.wilson@example.com".into(),
            phone: "(555) 222-3333".into(),
            dob: ymd(1982, 2, 14),
            avatar: avatar(4),
            status: PatientStatus::Archived,
            last_visit: None,
            notes: Vec::new(),
        },
    ]
}

pub fn seed_appointments(now: DateTime<Utc>) -> Vec<Appointment> {
    let appt = |id: &str,
                patient_id: &str,
                patient_name: &str,
                offset: Duration,
                duration_minutes: u32,
                status: AppointmentStatus,
                fee: f64| Appointment {
        id: id.into(),
        patient_id: patient_id.into(),
        patient_name: patient_name.into(),
        date: now + offset,
        duration_minutes,
        status,
        notes: None,
        fee,
    };

    vec![
        appt("a1", "p1", "Sarah Johnson", -Duration::days(2), 60, AppointmentStatus::Completed, 150.0),
        appt("a2", "p2", "Michael Chen", Duration::hours(2), 45, AppointmentStatus::Scheduled, 120.0),
        appt("a3", "p3", "Emily Davis", Duration::days(1), 60, AppointmentStatus::Scheduled, 150.0),
        appt("a4", "p1", "Sarah Johnson", Duration::days(7), 30, AppointmentStatus::Scheduled, 80.0),
        appt("a5", "p4", "James Wilson", -Duration::days(10), 60, AppointmentStatus::Completed, 150.0),
    ]
}

pub fn seed_settings() -> UserSettings {
    UserSettings::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn four_patients_with_unique_ids() {
        let patients = seed_patients();
        assert_eq!(patients.len(), 4);
        let ids: HashSet<_> = patients.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids.len(), 4);
        assert_eq!(patients[3].status, PatientStatus::Archived);
        assert_eq!(patients[0].notes.len(), 1);
    }

    #[test]
    fn seed_note_text_is_verbatim() {
        let note = &seed_patients()[0].notes[0];
        assert_eq!(note.id, "n1");
        assert_eq!(
            note.content,
            "S: Patient reports persistent headaches tailored to stress.\n\
             O: BP 120/80. Tension noted in neck muscles.\n\
             A: Tension headache.\n\
             P: Recommend hydration, stress management, follow up in 2 weeks."
        );
    }

    #[test]
    fn appointments_reference_seed_patients() {
        let ids: HashSet<String> = seed_patients().into_iter().map(|p| p.id).collect();
        for appt in seed_appointments(Utc::now()) {
            assert!(ids.contains(&appt.patient_id), "{} dangles", appt.id);
        }
    }

    #[test]
    fn appointments_are_relative_to_now() {
        let now = Utc::now();
        let appts = seed_appointments(now);
        assert_eq!(appts.len(), 5);
        assert_eq!(appts[0].date, now - Duration::days(2));
        assert_eq!(appts[1].date, now + Duration::hours(2));
        assert_eq!(appts.iter().filter(|a| a.date > now).count(), 3);
    }
}
