pub mod auth;
pub mod client;
pub mod models;

pub use auth::BrowserHeaders;
pub use client::YtMusicClient;
