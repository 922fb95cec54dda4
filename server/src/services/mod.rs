pub mod admin;
pub mod booking;
pub mod events;
pub mod payments;
pub mod profiles;
pub mod reports;
pub mod roles;
pub mod tickets;
