//! Shared models and the host program model

pub mod ir;
pub mod models;
