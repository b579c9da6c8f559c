//! Email templates.

use crate::domain::types::{LeadContact, MailMessage};

pub const STAFF_SUBJECT: &str = "New Lead Submission";
pub const APPLICANT_SUBJECT: &str = "Thank you for your application";

/// Notice to staff that a lead arrived.
pub fn staff_notification(contact: &LeadContact, recipients: &[String]) -> MailMessage {
    MailMessage {
        recipients: recipients.to_vec(),
        subject: STAFF_SUBJECT.to_owned(),
        body: format!(
            "A new lead has been submitted:\n\n\
             Name: {}\n\
             Email: {}\n\n\
             Please review the submission in the leads management system.\n",
            contact.full_name(),
            contact.email,
        ),
    }
}

/// Acknowledgement to the applicant.
pub fn applicant_confirmation(contact: &LeadContact) -> MailMessage {
    MailMessage {
        recipients: vec![contact.email.clone()],
        subject: APPLICANT_SUBJECT.to_owned(),
        body: format!(
            "Dear {},\n\n\
             Thank you for submitting your application. Our team will review your \
             information and get back to you shortly.\n\n\
             Best regards,\n\
             The Team\n",
            contact.full_name(),
        ),
    }
}
