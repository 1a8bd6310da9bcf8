// src/lib.rs

//! Koku Travel location scraper library

pub mod error;
pub mod models;
pub mod pipeline;
pub mod scrapers;
pub mod services;
pub mod storage;
pub mod utils;
