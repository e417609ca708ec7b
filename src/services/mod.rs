//! Upstream service clients

pub mod beatport;
pub mod spotify;

pub use beatport::{BeatportClient, CatalogApi, ItemKind};
pub use spotify::{SpotifyApi, SpotifyClient};
