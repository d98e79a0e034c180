mod config;

pub use config::{EndpointSettings, FetchSettings, SchedulerSettings, Settings};
