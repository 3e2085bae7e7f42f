//! Application state as an explicit, cloneable snapshot.
//!
//! Every transition borrows the current snapshot and returns a new one;
//! nothing here touches storage. `Controller` decides which transitions
//! need persisting.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::generation::{GenerationKind, GenerationRequest};
use crate::models::{Appointment, AppointmentStatus, Note, Patient, UserSettings};

/// How long the "Saved!" confirmation stays visible.
pub const SAVED_CONFIRMATION_SECS: i64 = 2;

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Top-level navigation targets. Exactly one is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum View {
    #[default]
    Dashboard,
    Patients,
    Calendar,
    Settings,
}

impl View {
    /// Sidebar order.
    pub const ALL: [View; 4] = [Self::Dashboard, Self::Calendar, Self::Patients, Self::Settings];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Patients => "Patients",
            Self::Calendar => "Schedule",
            Self::Settings => "Settings",
        }
    }
}

/// Tabs of the patient detail screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatientTab {
    #[default]
    Notes,
    Communication,
    Overview,
}

/// Lifecycle of one drafting call-site.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GenerationState {
    #[default]
    Idle,
    Pending {
        request_id: u64,
    },
    Settled(Result<String, String>),
}

impl GenerationState {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }
}

/// Transient input of the patient detail screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientDetail {
    pub patient_id: String,
    pub tab: PatientTab,
    pub note_draft: String,
    pub email_topic: String,
    pub email_details: String,
    pub generated_email: Option<String>,
    pub soap: GenerationState,
    pub email: GenerationState,
}

impl PatientDetail {
    fn new(patient_id: &str) -> Self {
        Self {
            patient_id: patient_id.to_string(),
            tab: PatientTab::default(),
            note_draft: String::new(),
            email_topic: String::new(),
            email_details: String::new(),
            generated_email: None,
            soap: GenerationState::Idle,
            email: GenerationState::Idle,
        }
    }

    /// One request at a time per screen; both triggers are disabled meanwhile.
    pub fn is_generating(&self) -> bool {
        self.soap.is_pending() || self.email.is_pending()
    }

    fn slot(&self, kind: GenerationKind) -> &GenerationState {
        match kind {
            GenerationKind::SoapNote => &self.soap,
            GenerationKind::PatientEmail => &self.email,
        }
    }

    fn slot_mut(&mut self, kind: GenerationKind) -> &mut GenerationState {
        match kind {
            GenerationKind::SoapNote => &mut self.soap,
            GenerationKind::PatientEmail => &mut self.email,
        }
    }
}

/// Patients list plus the optional open detail screen.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PatientsScreen {
    pub search_query: String,
    pub detail: Option<PatientDetail>,
}

/// Handle for an in-flight generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationTicket {
    pub request_id: u64,
    pub patient_id: String,
    pub request: GenerationRequest,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum StateError {
    #[error("Patient not found: {0}")]
    PatientNotFound(String),

    #[error("Appointment not found: {0}")]
    AppointmentNotFound(String),

    #[error("Cannot move appointment from {from} to {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("No patient is open")]
    NoPatientSelected,
}

// ═══════════════════════════════════════════════════════════
// AppState
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub view: View,
    pub patients: Vec<Patient>,
    pub appointments: Vec<Appointment>,
    pub settings: UserSettings,
    pub patients_screen: PatientsScreen,
    pub settings_saved_at: Option<DateTime<Utc>>,
    next_request_id: u64,
}

impl AppState {
    pub fn new(patients: Vec<Patient>, appointments: Vec<Appointment>, settings: UserSettings) -> Self {
        Self {
            view: View::default(),
            patients,
            appointments,
            settings,
            patients_screen: PatientsScreen::default(),
            settings_saved_at: None,
            next_request_id: 1,
        }
    }

    /// Rebuilt state that keeps numbering requests after `previous`, so a
    /// ticket issued before the rebuild never matches one issued after it.
    pub fn continue_request_ids_from(self, previous: &AppState) -> Self {
        Self {
            next_request_id: self.next_request_id.max(previous.next_request_id),
            ..self
        }
    }

    pub fn patient(&self, id: &str) -> Option<&Patient> {
        self.patients.iter().find(|p| p.id == id)
    }

    pub fn detail(&self) -> Option<&PatientDetail> {
        self.patients_screen.detail.as_ref()
    }

    /// The patient whose detail screen is open, if any.
    pub fn selected_patient(&self) -> Option<&Patient> {
        self.detail().and_then(|d| self.patient(&d.patient_id))
    }

    // ── Navigation ──────────────────────────────────────────

    /// Switch views. Leaving a view drops its transient input; selecting
    /// the current view changes nothing.
    pub fn navigate(&self, view: View) -> Self {
        if view == self.view {
            return self.clone();
        }
        Self {
            view,
            patients_screen: PatientsScreen::default(),
            settings_saved_at: None,
            ..self.clone()
        }
    }

    pub fn with_search_query(&self, query: &str) -> Self {
        let mut next = self.clone();
        next.patients_screen.search_query = query.to_string();
        next
    }

    pub fn select_patient(&self, patient_id: &str) -> Result<Self, StateError> {
        if self.patient(patient_id).is_none() {
            return Err(StateError::PatientNotFound(patient_id.to_string()));
        }
        let mut next = self.clone();
        next.patients_screen.detail = Some(PatientDetail::new(patient_id));
        Ok(next)
    }

    pub fn close_patient(&self) -> Self {
        let mut next = self.clone();
        next.patients_screen.detail = None;
        next
    }

    fn with_detail<F>(&self, edit: F) -> Result<Self, StateError>
    where
        F: FnOnce(&mut PatientDetail),
    {
        let mut next = self.clone();
        let detail = next
            .patients_screen
            .detail
            .as_mut()
            .ok_or(StateError::NoPatientSelected)?;
        edit(detail);
        Ok(next)
    }

    pub fn with_tab(&self, tab: PatientTab) -> Result<Self, StateError> {
        self.with_detail(|d| d.tab = tab)
    }

    pub fn with_note_draft(&self, draft: &str) -> Result<Self, StateError> {
        self.with_detail(|d| d.note_draft = draft.to_string())
    }

    pub fn with_email_topic(&self, topic: &str) -> Result<Self, StateError> {
        self.with_detail(|d| d.email_topic = topic.to_string())
    }

    pub fn with_email_details(&self, details: &str) -> Result<Self, StateError> {
        self.with_detail(|d| d.email_details = details.to_string())
    }

    // ── Domain mutations ────────────────────────────────────

    /// Prepend `note` to one patient; all other patients are untouched.
    pub fn with_note(&self, patient_id: &str, note: Note) -> Result<Self, StateError> {
        let index = self
            .patients
            .iter()
            .position(|p| p.id == patient_id)
            .ok_or_else(|| StateError::PatientNotFound(patient_id.to_string()))?;
        let mut next = self.clone();
        next.patients[index] = self.patients[index].with_note(note);
        Ok(next)
    }

    /// Drop the note draft after it has been saved.
    pub fn clear_note_draft(&self) -> Result<Self, StateError> {
        self.with_detail(|d| d.note_draft.clear())
    }

    pub fn with_settings(&self, settings: UserSettings) -> Self {
        Self {
            settings,
            ..self.clone()
        }
    }

    pub fn mark_settings_saved(&self, now: DateTime<Utc>) -> Self {
        Self {
            settings_saved_at: Some(now),
            ..self.clone()
        }
    }

    /// Whether the save confirmation is still showing at `now`.
    pub fn is_settings_saved_visible(&self, now: DateTime<Utc>) -> bool {
        self.settings_saved_at
            .map(|at| now >= at && now - at < Duration::seconds(SAVED_CONFIRMATION_SECS))
            .unwrap_or(false)
    }

    pub fn with_appointment_status(
        &self,
        appointment_id: &str,
        status: AppointmentStatus,
    ) -> Result<Self, StateError> {
        let index = self
            .appointments
            .iter()
            .position(|a| a.id == appointment_id)
            .ok_or_else(|| StateError::AppointmentNotFound(appointment_id.to_string()))?;
        let current = self.appointments[index].status;
        if !current.can_transition_to(status) {
            return Err(StateError::InvalidTransition {
                from: current,
                to: status,
            });
        }
        let mut next = self.clone();
        next.appointments[index].status = status;
        Ok(next)
    }

    // ── Generation ──────────────────────────────────────────

    /// Mark the SOAP call-site pending. `None` when no patient is open,
    /// the draft is blank, or a request is already running.
    pub fn start_note_refinement(&self) -> Option<(Self, GenerationTicket)> {
        let detail = self.detail()?;
        if detail.note_draft.trim().is_empty() || detail.is_generating() {
            return None;
        }
        let request = GenerationRequest::soap_note(&detail.note_draft);
        Some(self.start_generation(request))
    }

    /// Mark the email call-site pending. `None` when no patient is open,
    /// topic or details are empty, or a request is already running.
    pub fn start_email_draft(&self) -> Option<(Self, GenerationTicket)> {
        let detail = self.detail()?;
        if detail.email_topic.is_empty() || detail.email_details.is_empty() || detail.is_generating() {
            return None;
        }
        let patient = self.patient(&detail.patient_id)?;
        let request =
            GenerationRequest::patient_email(&patient.name, &detail.email_topic, &detail.email_details);
        Some(self.start_generation(request))
    }

    fn start_generation(&self, request: GenerationRequest) -> (Self, GenerationTicket) {
        let mut next = self.clone();
        let request_id = next.next_request_id;
        next.next_request_id += 1;

        let mut patient_id = String::new();
        if let Some(detail) = next.patients_screen.detail.as_mut() {
            *detail.slot_mut(request.kind) = GenerationState::Pending { request_id };
            patient_id = detail.patient_id.clone();
        }

        let ticket = GenerationTicket {
            request_id,
            patient_id,
            request,
        };
        (next, ticket)
    }

    /// Apply a finished request. `None` when the screen that issued it is
    /// gone (navigated away, other patient, or a newer request).
    pub fn settle_generation(
        &self,
        ticket: &GenerationTicket,
        outcome: Result<String, String>,
    ) -> Option<Self> {
        let detail = self.detail()?;
        if detail.patient_id != ticket.patient_id
            || *detail.slot(ticket.request.kind)
                != (GenerationState::Pending {
                    request_id: ticket.request_id,
                })
        {
            return None;
        }

        let mut next = self.clone();
        let detail = next.patients_screen.detail.as_mut()?;
        if let Ok(text) = &outcome {
            match ticket.request.kind {
                GenerationKind::SoapNote => detail.note_draft = text.clone(),
                GenerationKind::PatientEmail => detail.generated_email = Some(text.clone()),
            }
        }
        *detail.slot_mut(ticket.request.kind) = GenerationState::Settled(outcome);
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::{seed_appointments, seed_patients, seed_settings};
    use chrono::NaiveDate;

    fn seeded() -> AppState {
        AppState::new(seed_patients(), seed_appointments(Utc::now()), seed_settings())
    }

    fn open(state: &AppState, id: &str) -> AppState {
        state.navigate(View::Patients).select_patient(id).unwrap()
    }

    #[test]
    fn starts_on_dashboard() {
        let state = seeded();
        assert_eq!(state.view, View::Dashboard);
        assert!(state.detail().is_none());
    }

    #[test]
    fn navigation_is_exclusive_and_leaves_data_alone() {
        let state = seeded();
        let next = state.navigate(View::Calendar);
        assert_eq!(next.view, View::Calendar);
        assert_eq!(next.patients, state.patients);
        assert_eq!(next.appointments, state.appointments);
        assert_eq!(state.view, View::Dashboard);
    }

    #[test]
    fn leaving_patients_drops_screen_input() {
        let state = open(&seeded(), "p1").with_note_draft("draft").unwrap();
        let away = state.navigate(View::Settings).navigate(View::Patients);
        assert!(away.detail().is_none());
        assert_eq!(away.patients_screen.search_query, "");
    }

    #[test]
    fn reselecting_current_view_keeps_input() {
        let state = open(&seeded(), "p1").with_note_draft("draft").unwrap();
        let same = state.navigate(View::Patients);
        assert_eq!(same.detail().unwrap().note_draft, "draft");
    }

    #[test]
    fn select_unknown_patient_fails() {
        let err = seeded().select_patient("nope").unwrap_err();
        assert_eq!(err, StateError::PatientNotFound("nope".into()));
    }

    #[test]
    fn detail_edits_require_open_patient() {
        assert_eq!(
            seeded().with_note_draft("x").unwrap_err(),
            StateError::NoPatientSelected
        );
    }

    #[test]
    fn detail_defaults_to_notes_tab() {
        let state = open(&seeded(), "p2");
        assert_eq!(state.detail().unwrap().tab, PatientTab::Notes);
        let state = state.with_tab(PatientTab::Communication).unwrap();
        assert_eq!(state.detail().unwrap().tab, PatientTab::Communication);
        assert_eq!(state.selected_patient().unwrap().name, "Michael Chen");
    }

    #[test]
    fn with_note_touches_only_target() {
        let state = seeded();
        let note = Note::soap("follow-up", NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        let next = state.with_note("p2", note.clone()).unwrap();
        assert_eq!(next.patients[1].notes.len(), 1);
        assert_eq!(next.patients[1].notes[0], note);
        for i in [0, 2, 3] {
            assert_eq!(next.patients[i], state.patients[i]);
        }
    }

    #[test]
    fn status_transition_rules() {
        let state = seeded();
        let next = state.with_appointment_status("a2", AppointmentStatus::Completed).unwrap();
        assert_eq!(next.appointments[1].status, AppointmentStatus::Completed);

        let err = next
            .with_appointment_status("a2", AppointmentStatus::Cancelled)
            .unwrap_err();
        assert_eq!(
            err,
            StateError::InvalidTransition {
                from: AppointmentStatus::Completed,
                to: AppointmentStatus::Cancelled,
            }
        );
        assert!(matches!(
            state.with_appointment_status("zz", AppointmentStatus::NoShow),
            Err(StateError::AppointmentNotFound(_))
        ));
    }

    #[test]
    fn saved_confirmation_expires_after_two_seconds() {
        let t0 = Utc::now();
        let state = seeded().mark_settings_saved(t0);
        assert!(state.is_settings_saved_visible(t0));
        assert!(state.is_settings_saved_visible(t0 + Duration::milliseconds(1999)));
        assert!(!state.is_settings_saved_visible(t0 + Duration::seconds(2)));
        assert!(!seeded().is_settings_saved_visible(t0));
    }

    #[test]
    fn blank_draft_does_not_start_refinement() {
        let state = open(&seeded(), "p1").with_note_draft("   \n").unwrap();
        assert!(state.start_note_refinement().is_none());
    }

    #[test]
    fn refinement_goes_idle_pending_settled() {
        let state = open(&seeded(), "p1").with_note_draft("slept well").unwrap();
        assert_eq!(state.detail().unwrap().soap, GenerationState::Idle);

        let (pending, ticket) = state.start_note_refinement().unwrap();
        assert!(pending.detail().unwrap().soap.is_pending());
        assert!(pending.start_note_refinement().is_none());
        assert!(pending.start_email_draft().is_none());
        assert!(ticket.request.prompt.contains("slept well"));

        let settled = pending
            .settle_generation(&ticket, Ok("S: slept well".into()))
            .unwrap();
        let detail = settled.detail().unwrap();
        assert_eq!(detail.note_draft, "S: slept well");
        assert_eq!(detail.soap, GenerationState::Settled(Ok("S: slept well".into())));
        assert!(!detail.is_generating());
    }

    #[test]
    fn failed_refinement_keeps_draft() {
        let state = open(&seeded(), "p1").with_note_draft("raw").unwrap();
        let (pending, ticket) = state.start_note_refinement().unwrap();
        let settled = pending
            .settle_generation(&ticket, Err("Error".into()))
            .unwrap();
        assert_eq!(settled.detail().unwrap().note_draft, "raw");
        assert_eq!(
            settled.detail().unwrap().soap,
            GenerationState::Settled(Err("Error".into()))
        );
    }

    #[test]
    fn email_needs_topic_and_details() {
        let state = open(&seeded(), "p3").with_email_topic("Lab Results").unwrap();
        assert!(state.start_email_draft().is_none());

        let state = state.with_email_details("all normal").unwrap();
        let (pending, ticket) = state.start_email_draft().unwrap();
        assert!(ticket.request.prompt.contains("Emily Davis"));
        let settled = pending.settle_generation(&ticket, Ok("Dear Emily".into())).unwrap();
        assert_eq!(settled.detail().unwrap().generated_email.as_deref(), Some("Dear Emily"));
    }

    #[test]
    fn result_after_navigation_is_discarded() {
        let state = open(&seeded(), "p1").with_note_draft("raw").unwrap();
        let (pending, ticket) = state.start_note_refinement().unwrap();
        let moved = pending.navigate(View::Dashboard);
        assert!(moved.settle_generation(&ticket, Ok("late".into())).is_none());

        let other = pending.close_patient().select_patient("p2").unwrap();
        assert!(other.settle_generation(&ticket, Ok("late".into())).is_none());
    }

    #[test]
    fn request_ids_increase() {
        let state = open(&seeded(), "p1").with_note_draft("a").unwrap();
        let (pending, first) = state.start_note_refinement().unwrap();
        let settled = pending.settle_generation(&first, Ok("b".into())).unwrap();
        let (_, second) = settled.start_note_refinement().unwrap();
        assert!(second.request_id > first.request_id);
        // a stale ticket never applies to the newer request
        let (pending2, _) = settled.start_note_refinement().unwrap();
        assert!(pending2.settle_generation(&first, Ok("x".into())).is_none());
    }

    #[test]
    fn rebuilt_state_keeps_request_numbering() {
        let state = open(&seeded(), "p1").with_note_draft("old").unwrap();
        let (pending, old_ticket) = state.start_note_refinement().unwrap();

        let rebuilt = seeded().continue_request_ids_from(&pending);
        let reopened = open(&rebuilt, "p1").with_note_draft("new").unwrap();
        let (pending, new_ticket) = reopened.start_note_refinement().unwrap();

        assert!(new_ticket.request_id > old_ticket.request_id);
        assert!(pending.settle_generation(&old_ticket, Ok("old result".into())).is_none());
    }

    #[test]
    fn sidebar_order_and_labels() {
        let labels: Vec<_> = View::ALL.iter().map(View::label).collect();
        assert_eq!(labels, vec!["Dashboard", "Schedule", "Patients", "Settings"]);
    }
}
