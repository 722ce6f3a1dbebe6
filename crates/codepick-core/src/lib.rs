pub mod catalog;
pub mod config;
pub mod doctor;
pub mod engine;
pub mod entry;
pub mod selection;
pub mod submission;
