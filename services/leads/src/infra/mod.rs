pub mod blob;
pub mod db;
pub mod mail;
pub mod rate_limit;
