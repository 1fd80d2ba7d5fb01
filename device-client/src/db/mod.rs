pub mod consumption_queries;
pub mod device_queries;
pub mod session_queries;
