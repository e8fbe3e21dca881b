#![forbid(unsafe_code)]

pub mod browser;
pub mod cli;
pub mod config;
pub mod course;
pub mod course_list;
pub mod courses;
pub mod download;
pub mod file_history;
pub mod file_metadata;
pub mod logging;
pub mod lookup;
pub mod markup;
pub mod schedule;
pub mod store;
pub mod sync;
