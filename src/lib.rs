pub mod arguments;
pub mod config;
pub mod errors;
pub mod logger;
pub mod notifications;
pub mod run;
pub mod webserver;
