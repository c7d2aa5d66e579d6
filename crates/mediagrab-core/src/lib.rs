pub mod config;
pub mod logging;

pub mod advisory;
pub mod coordinator;
pub mod dedup;
pub mod extract;
pub mod fetch;
pub mod http;
pub mod page;
pub mod pipeline;
pub mod storage;
pub mod url_model;
pub mod video;
