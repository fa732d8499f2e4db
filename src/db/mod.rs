pub mod db;
pub mod historydb;
pub mod ticketdb;
pub mod userdb;
