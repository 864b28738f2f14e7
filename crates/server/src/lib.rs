//! HTTP front end for the student predictor

pub mod api;
pub mod config;
