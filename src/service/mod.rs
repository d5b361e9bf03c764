pub mod bid_service;
pub mod error;
pub mod filters;
pub mod ratings;
pub mod registration_service;
pub mod requirement_service;
pub mod visibility;
