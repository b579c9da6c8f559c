//! sea-orm entities owned by the leads service.

pub mod failed_notifications;
pub mod leads;
