pub mod admin;
pub mod booking;
pub mod checkout;
pub mod event;
pub mod payment;
pub mod profile;
pub mod role;
