//! Owns the store and the current `AppState`, and turns user intents into
//! state transitions plus persistence.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::config::MalformedDataPolicy;
use crate::dashboard::{self, DashboardSummary};
use crate::generation::{Gateway, TextGenerator};
use crate::models::{Appointment, AppointmentStatus, Note, Patient, UserSettings};
use crate::seed;
use crate::state::{AppState, GenerationTicket, PatientTab, StateError, View};
use crate::store::{PersistentStore, StoreError, StoreKey};

#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

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

impl From<StateError> for ControllerError {
    fn from(err: StateError) -> Self {
        match err {
            StateError::PatientNotFound(id) => Self::PatientNotFound(id),
            StateError::AppointmentNotFound(id) => Self::AppointmentNotFound(id),
            StateError::InvalidTransition { from, to } => Self::InvalidTransition { from, to },
            StateError::NoPatientSelected => Self::NoPatientSelected,
        }
    }
}

pub struct Controller<S: PersistentStore> {
    store: S,
    state: AppState,
    policy: MalformedDataPolicy,
}

/// Stored value at `key`, or `seed` when absent. A freshly seeded key is
/// written back so relative appointment times stay fixed across restarts.
fn load_or_seed<S, T, F>(
    store: &mut S,
    key: StoreKey,
    policy: MalformedDataPolicy,
    seed: F,
) -> Result<T, StoreError>
where
    S: PersistentStore,
    T: DeserializeOwned + Serialize,
    F: FnOnce() -> T,
{
    match store.load::<T>(key) {
        Ok(Some(value)) => Ok(value),
        Ok(None) => {
            let value = seed();
            store.save(key, &value)?;
            tracing::info!(key = key.as_str(), "No stored value, seeded defaults");
            Ok(value)
        }
        Err(StoreError::Malformed { key, reason }) if policy == MalformedDataPolicy::ResetToSeed => {
            tracing::error!(key = key.as_str(), %reason, "Stored value is malformed, resetting to seed data");
            let value = seed();
            store.save(key, &value)?;
            Ok(value)
        }
        Err(e) => Err(e),
    }
}

impl<S: PersistentStore> Controller<S> {
    /// Load all three collections, seeding whatever is missing.
    pub fn load(
        mut store: S,
        policy: MalformedDataPolicy,
        now: DateTime<Utc>,
    ) -> Result<Self, ControllerError> {
        let state = Self::initial_state(&mut store, policy, now)?;
        tracing::info!(
            patients = state.patients.len(),
            appointments = state.appointments.len(),
            "Practice data loaded"
        );
        Ok(Self {
            store,
            state,
            policy,
        })
    }

    fn initial_state(
        store: &mut S,
        policy: MalformedDataPolicy,
        now: DateTime<Utc>,
    ) -> Result<AppState, ControllerError> {
        let patients: Vec<Patient> =
            load_or_seed(store, StoreKey::Patients, policy, seed::seed_patients)?;
        let appointments: Vec<Appointment> =
            load_or_seed(store, StoreKey::Appointments, policy, || seed::seed_appointments(now))?;
        let settings: UserSettings =
            load_or_seed(store, StoreKey::Settings, policy, seed::seed_settings)?;
        Ok(AppState::new(patients, appointments, settings))
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // ═══════════════════════════════════════════════════════════
    // Derived views
    // ═══════════════════════════════════════════════════════════

    pub fn dashboard(&self, now: DateTime<Utc>) -> DashboardSummary {
        dashboard::summarize(&self.state.patients, &self.state.appointments, now)
    }

    /// Every appointment, earliest first.
    pub fn schedule(&self) -> Vec<Appointment> {
        dashboard::chronological(&self.state.appointments)
    }

    /// Patients matching the current search query.
    pub fn visible_patients(&self) -> Vec<Patient> {
        dashboard::search_patients(
            &self.state.patients,
            &self.state.patients_screen.search_query,
        )
    }

    // ═══════════════════════════════════════════════════════════
    // Navigation and screen input
    // ═══════════════════════════════════════════════════════════

    pub fn navigate(&mut self, view: View) -> &AppState {
        tracing::debug!(from = ?self.state.view, to = ?view, "Navigate");
        self.state = self.state.navigate(view);
        &self.state
    }

    pub fn set_search_query(&mut self, query: &str) -> &AppState {
        self.state = self.state.with_search_query(query);
        &self.state
    }

    pub fn select_patient(&mut self, patient_id: &str) -> Result<&AppState, ControllerError> {
        self.state = self.state.select_patient(patient_id)?;
        Ok(&self.state)
    }

    pub fn close_patient(&mut self) -> &AppState {
        self.state = self.state.close_patient();
        &self.state
    }

    pub fn select_tab(&mut self, tab: PatientTab) -> Result<&AppState, ControllerError> {
        self.state = self.state.with_tab(tab)?;
        Ok(&self.state)
    }

    pub fn set_note_draft(&mut self, draft: &str) -> Result<&AppState, ControllerError> {
        self.state = self.state.with_note_draft(draft)?;
        Ok(&self.state)
    }

    pub fn set_email_topic(&mut self, topic: &str) -> Result<&AppState, ControllerError> {
        self.state = self.state.with_email_topic(topic)?;
        Ok(&self.state)
    }

    pub fn set_email_details(&mut self, details: &str) -> Result<&AppState, ControllerError> {
        self.state = self.state.with_email_details(details)?;
        Ok(&self.state)
    }

    // ═══════════════════════════════════════════════════════════
    // Notes
    // ═══════════════════════════════════════════════════════════

    /// Prepend `note` to a patient and persist the patient collection.
    pub fn add_note(&mut self, patient_id: &str, note: Note) -> Result<&AppState, ControllerError> {
        let next = self.state.with_note(patient_id, note)?;
        self.store.save(StoreKey::Patients, &next.patients)?;
        self.state = next;
        tracing::info!(patient_id, "Note added");
        Ok(&self.state)
    }

    /// Save the open patient's draft as a SOAP note dated `today`.
    /// Returns `None` without touching anything when the draft is blank.
    pub fn save_note(&mut self, today: NaiveDate) -> Result<Option<Note>, ControllerError> {
        let detail = self.state.detail().ok_or(ControllerError::NoPatientSelected)?;
        if detail.note_draft.trim().is_empty() {
            return Ok(None);
        }
        let patient_id = detail.patient_id.clone();
        let note = Note::soap(detail.note_draft.clone(), today);

        self.add_note(&patient_id, note.clone())?;
        self.state = self.state.clear_note_draft()?;
        Ok(Some(note))
    }

    // ═══════════════════════════════════════════════════════════
    // Settings
    // ═══════════════════════════════════════════════════════════

    /// Apply `edit` to a copy of the settings and persist the result.
    pub fn update_settings<F>(&mut self, edit: F) -> Result<&AppState, ControllerError>
    where
        F: FnOnce(&mut UserSettings),
    {
        let mut settings = self.state.settings.clone();
        edit(&mut settings);
        self.store.save(StoreKey::Settings, &settings)?;
        self.state = self.state.with_settings(settings);
        Ok(&self.state)
    }

    pub fn set_practice_name(&mut self, name: &str) -> Result<&AppState, ControllerError> {
        self.update_settings(|s| s.practice_name = name.to_string())
    }

    pub fn set_provider_name(&mut self, name: &str) -> Result<&AppState, ControllerError> {
        self.update_settings(|s| s.provider_name = name.to_string())
    }

    /// Persist the current settings and show the confirmation.
    pub fn save_settings(&mut self, now: DateTime<Utc>) -> Result<&AppState, ControllerError> {
        self.store.save(StoreKey::Settings, &self.state.settings)?;
        self.state = self.state.mark_settings_saved(now);
        tracing::info!("Settings saved");
        Ok(&self.state)
    }

    pub fn is_settings_saved_visible(&self, now: DateTime<Utc>) -> bool {
        self.state.is_settings_saved_visible(now)
    }

    // ═══════════════════════════════════════════════════════════
    // Appointments
    // ═══════════════════════════════════════════════════════════

    fn set_appointment_status(
        &mut self,
        appointment_id: &str,
        status: AppointmentStatus,
    ) -> Result<&AppState, ControllerError> {
        let next = self.state.with_appointment_status(appointment_id, status)?;
        self.store.save(StoreKey::Appointments, &next.appointments)?;
        self.state = next;
        tracing::info!(appointment_id, %status, "Appointment status changed");
        Ok(&self.state)
    }

    pub fn complete_appointment(&mut self, appointment_id: &str) -> Result<&AppState, ControllerError> {
        self.set_appointment_status(appointment_id, AppointmentStatus::Completed)
    }

    pub fn cancel_appointment(&mut self, appointment_id: &str) -> Result<&AppState, ControllerError> {
        self.set_appointment_status(appointment_id, AppointmentStatus::Cancelled)
    }

    pub fn mark_no_show(&mut self, appointment_id: &str) -> Result<&AppState, ControllerError> {
        self.set_appointment_status(appointment_id, AppointmentStatus::NoShow)
    }

    // ═══════════════════════════════════════════════════════════
    // Reset
    // ═══════════════════════════════════════════════════════════

    /// Drop every stored collection and start over from seed data, as on
    /// a first launch.
    pub fn reset_data(&mut self, now: DateTime<Utc>) -> Result<&AppState, ControllerError> {
        self.store.clear(&StoreKey::ALL)?;
        self.state = Self::initial_state(&mut self.store, self.policy, now)?
            .continue_request_ids_from(&self.state);
        tracing::warn!("Practice data reset to defaults");
        Ok(&self.state)
    }

    // ═══════════════════════════════════════════════════════════
    // Generation
    // ═══════════════════════════════════════════════════════════

    pub fn begin_note_refinement(&mut self) -> Option<GenerationTicket> {
        let (next, ticket) = self.state.start_note_refinement()?;
        self.state = next;
        Some(ticket)
    }

    pub fn begin_email_draft(&mut self) -> Option<GenerationTicket> {
        let (next, ticket) = self.state.start_email_draft()?;
        self.state = next;
        Some(ticket)
    }

    /// Apply a finished request. Returns `false` when the issuing screen
    /// is gone and the outcome was dropped.
    pub fn finish_generation(
        &mut self,
        ticket: &GenerationTicket,
        outcome: Result<String, String>,
    ) -> bool {
        match self.state.settle_generation(ticket, outcome) {
            Some(next) => {
                self.state = next;
                true
            }
            None => {
                tracing::debug!(
                    request_id = ticket.request_id,
                    kind = %ticket.request.kind,
                    "Discarding generation result for a screen that is no longer showing"
                );
                false
            }
        }
    }

    /// Refine the open note draft. `false` when nothing was sent or the
    /// result arrived for a screen that is gone.
    pub async fn refine_note_draft<G>(&mut self, gateway: &Arc<Gateway<G>>) -> bool
    where
        G: TextGenerator + Send + Sync + 'static,
    {
        let Some(ticket) = self.begin_note_refinement() else {
            return false;
        };
        let outcome = Arc::clone(gateway).execute_async(ticket.request.clone()).await;
        self.finish_generation(&ticket, outcome)
    }

    pub async fn draft_patient_email<G>(&mut self, gateway: &Arc<Gateway<G>>) -> bool
    where
        G: TextGenerator + Send + Sync + 'static,
    {
        let Some(ticket) = self.begin_email_draft() else {
            return false;
        };
        let outcome = Arc::clone(gateway).execute_async(ticket.request.clone()).await;
        self.finish_generation(&ticket, outcome)
    }
}
