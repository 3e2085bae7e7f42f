use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{NoteType, PatientStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub dob: NaiveDate,
    pub avatar: String,
    /// Newest first.
    pub notes: Vec<Note>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_visit: Option<NaiveDate>,
    pub status: PatientStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub date: NaiveDate,
    pub content: String,
    #[serde(rename = "type")]
    pub note_type: NoteType,
}

impl Note {
    /// A fresh SOAP note dated `date` with a random id.
    pub fn soap(content: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            date,
            content: content.into(),
            note_type: NoteType::Soap,
        }
    }
}

impl Patient {
    /// Copy of this patient with `note` placed first.
    pub fn with_note(&self, note: Note) -> Self {
        let mut notes = Vec::with_capacity(self.notes.len() + 1);
        notes.push(note);
        notes.extend(self.notes.iter().cloned());
        Self {
            notes,
            ..self.clone()
        }
    }
}
