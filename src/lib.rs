pub mod auth;
pub mod calendar;
pub mod config;
pub mod domain;
pub mod google;
pub mod mail;
pub mod report;
pub mod summarize;
