pub mod tmdb;
pub mod traits;

pub use tmdb::{TmdbClient, TmdbError};
pub use traits::{Candidate, MediaKind, MetadataSearch};
