pub mod access;
pub mod administration;
pub mod health;
