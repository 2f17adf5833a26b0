pub mod album;
pub mod artist;
pub mod review;
pub mod user;

pub use album::{Album, ArtistSnapshot};
pub use artist::Artist;
pub use review::Review;
pub use user::User;
