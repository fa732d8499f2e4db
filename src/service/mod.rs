pub mod error;
pub mod report_service;
pub mod ticket_service;
