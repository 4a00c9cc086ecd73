pub mod api;
pub mod config;
pub mod contracts;
pub mod service;
pub mod storage;
