pub mod auth;
pub mod bids;
pub mod directory;
pub mod requirements;
pub mod users;
