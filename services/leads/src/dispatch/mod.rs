pub mod backoff;
pub mod dispatcher;
pub mod message;
