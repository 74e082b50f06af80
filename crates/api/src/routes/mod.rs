pub mod health;
pub mod reports;
