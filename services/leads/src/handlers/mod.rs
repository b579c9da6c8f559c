pub mod client;
pub mod failed_notification;
pub mod health;
pub mod lead;
