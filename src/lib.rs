pub mod chart;
pub mod config;
pub mod dataset;
pub mod export;
pub mod family;
pub mod logging;
pub mod rounds;
pub mod state;
