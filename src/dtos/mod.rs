pub mod reportdtos;
pub mod ticketdtos;
pub mod userdtos;
