pub mod client;

pub use client::{SpotifyClient, parse_playlist_id};
