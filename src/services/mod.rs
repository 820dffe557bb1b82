//! Use cases behind the HTTP handlers. Each function takes the store port
//! explicitly and returns typed [`AppError`](crate::errors::AppError)
//! rejections.

pub mod auth;
pub mod catalog;
pub mod checkout;
pub mod enrollment;
pub mod instructor;
pub mod progress;
pub mod reconcile;
pub mod review;
