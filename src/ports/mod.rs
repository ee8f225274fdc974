pub mod config_port;
pub mod quote_port;
pub mod store_port;
