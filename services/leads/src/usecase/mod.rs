pub mod failed_notification;
pub mod lead;
