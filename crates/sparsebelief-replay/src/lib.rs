pub mod config;
pub mod likelihood;
pub mod logging;
pub mod replay;
