//! BigQuery Adapter Modules
//!
//! BigQuery統合のためのアダプターモジュール

pub mod client;
pub mod errors;
pub mod models;

pub use client::BigQueryWarehouseRepository;
