//! # Data Transfer Objects
//!
//! 層をまたいで受け渡す設定値

pub mod warehouse_options;
