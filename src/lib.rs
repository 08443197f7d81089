pub mod api_sports;
pub mod collect;
pub mod config;
pub mod error;
pub mod floor;
pub mod gate;
pub mod http_cache;
pub mod http_client;
pub mod logging;
pub mod matchup;
pub mod model;
pub mod provider;
pub mod ranking;
pub mod report;
pub mod slip;
pub mod source;
pub mod state;
