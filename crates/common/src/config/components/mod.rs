pub mod connections;
pub mod job;
pub mod source;
