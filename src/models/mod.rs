pub mod args;
pub mod config;
pub mod film_request;
pub mod report;
pub mod request_outcome;
pub mod result;
pub mod stats;
