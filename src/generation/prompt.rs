//! Instruction text sent to the generator.

/// Signature line every patient email ends with.
pub const EMAIL_SIGN_OFF: &str = "The Practice Team";

/// Placeholder the model must use for SOAP sections with no source text.
pub const NOT_RECORDED: &str = "Not recorded";

/// Restructure raw clinician notes into the four SOAP sections.
pub fn build_soap_prompt(raw_notes: &str) -> String {
    format!(
        "You are a professional medical scribe assistant.\n\
         Convert the following raw clinical notes into a structured SOAP format \
         (Subjective, Objective, Assessment, Plan).\n\
         Do not invent information. If information for a section is missing, state \"{NOT_RECORDED}\".\n\
         Keep it professional, concise, and clinical.\n\
         \n\
         Raw Notes: \"{raw_notes}\""
    )
}

/// Professional, empathetic email to a patient.
pub fn build_email_prompt(patient_name: &str, topic: &str, key_details: &str) -> String {
    format!(
        "Write a professional, empathetic, and concise email to a patient named {patient_name}.\n\
         The topic is: {topic}.\n\
         Key details to include: {key_details}.\n\
         Sign off as \"{EMAIL_SIGN_OFF}\"."
    )
}
