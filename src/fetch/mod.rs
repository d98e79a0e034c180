mod client;

pub use client::{EndpointKey, FetchClient};
