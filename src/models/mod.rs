pub mod job;
pub mod technology;
