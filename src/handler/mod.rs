pub mod reports;
pub mod tickets;
pub mod users;
