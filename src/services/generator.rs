//! Fake entity generators.
//!
//! Pure functions over a caller-supplied RNG; nothing here touches storage.
//! Artist and album ids are drawn independently and may collide.

use chrono::{Datelike, Utc};
use fake::faker::internet::en::Username;
use fake::faker::lorem::en::{Paragraph, Sentence, Words};
use fake::faker::name::en::Name;
use fake::Fake;
use rand::seq::SliceRandom;
use rand::Rng;
use std::ops::RangeInclusive;

use crate::db::{Album, Artist, ArtistSnapshot, Review, User};

pub const ARTIST_IDS: RangeInclusive<u32> = 1000..=9999;
pub const ALBUM_IDS: RangeInclusive<u32> = 10000..=99999;
pub const REVIEW_SCORES: RangeInclusive<u8> = 0..=100;
const REVIEW_LIKES: RangeInclusive<u32> = 0..=500;
const FIRST_RELEASE_YEAR: i32 = 1960;

const GENRES: &[&str] = &[
    "Rock",
    "Pop",
    "Hip Hop",
    "Jazz",
    "Electronic",
    "Classical",
    "Country",
    "Folk",
    "Metal",
    "R&B",
    "Soul",
    "Reggae",
    "Blues",
    "Punk",
    "Indie",
];

pub fn fake_user<R: Rng + ?Sized>(rng: &mut R) -> User {
    let id = uuid::Builder::from_random_bytes(rng.gen()).into_uuid().to_string();
    let username: String = Username().fake_with_rng(rng);
    let name: String = Name().fake_with_rng(rng);
    let bio: String = Sentence(4..12).fake_with_rng(rng);
    let avatar = format!("https://i.pravatar.cc/300?u={}", id);

    User::new(id, username, name, bio, avatar)
}

pub fn fake_artist<R: Rng + ?Sized>(rng: &mut R) -> Artist {
    let id = rng.gen_range(ARTIST_IDS);

    Artist {
        id,
        name: Name().fake_with_rng(rng),
        image: format!("https://picsum.photos/seed/artist-{}/640/640", id),
        genre: pick_genre(rng).to_string(),
    }
}

pub fn fake_album<R: Rng + ?Sized>(rng: &mut R, artist: &Artist) -> Album {
    let id = rng.gen_range(ALBUM_IDS);
    let words: Vec<String> = Words(1..4).fake_with_rng(rng);
    let last_year = Utc::now().year() - 1;

    Album {
        id,
        title: title_case(&words),
        year: rng.gen_range(FIRST_RELEASE_YEAR..=last_year).to_string(),
        cover: format!("https://picsum.photos/seed/album-{}/640/640", id),
        artist: ArtistSnapshot::from(artist),
    }
}

pub fn fake_review<R: Rng + ?Sized>(rng: &mut R, user_id: &str, album_id: u32) -> Review {
    Review {
        content: Paragraph(1..3).fake_with_rng(rng),
        score: rng.gen_range(REVIEW_SCORES),
        is_low_score: false,
        user_id: user_id.to_string(),
        album_id,
        likes: rng.gen_range(REVIEW_LIKES),
    }
}

fn pick_genre<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    GENRES.choose(rng).copied().unwrap_or("Rock")
}

fn title_case(words: &[String]) -> String {
    words
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use uuid::Uuid;

    #[test]
    fn test_user_lowercase_fields() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let user = fake_user(&mut rng);
            assert_eq!(user.username_lowercase, user.username.to_lowercase());
            assert_eq!(user.name_lowercase, user.name.to_lowercase());
            assert_eq!(user.avatar_url, user.photo_url);
            assert_eq!(user.followers_count, 0);
            assert_eq!(user.following_count, 0);
            assert!(Uuid::parse_str(&user.id).is_ok());
        }
    }

    #[test]
    fn test_ids_in_range() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let artist = fake_artist(&mut rng);
            assert!(ARTIST_IDS.contains(&artist.id));
            assert!(GENRES.contains(&artist.genre.as_str()));

            let album = fake_album(&mut rng, &artist);
            assert!(ALBUM_IDS.contains(&album.id));
            let year: i32 = album.year.parse().unwrap();
            assert!(year >= FIRST_RELEASE_YEAR && year < Utc::now().year());
        }
    }

    #[test]
    fn test_album_embeds_artist_snapshot() {
        let mut rng = StdRng::seed_from_u64(3);
        let artist = fake_artist(&mut rng);
        let album = fake_album(&mut rng, &artist);

        assert_eq!(album.artist.id, artist.id);
        assert_eq!(album.artist.name, artist.name);
        assert_eq!(album.artist.image, artist.image);
        assert_eq!(album.artist.genre, artist.genre);
    }

    #[test]
    fn test_review_never_flags_low_score() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..200 {
            let review = fake_review(&mut rng, "user-1", 12345);
            assert!(!review.is_low_score);
            assert!(review.score <= 100);
            assert_eq!(review.user_id, "user-1");
            assert_eq!(review.album_id, 12345);
            assert!(!review.content.is_empty());
        }
    }

    #[test]
    fn test_title_case() {
        let words = vec!["dolor".to_string(), "sit".to_string()];
        assert_eq!(title_case(&words), "Dolor Sit");
        assert_eq!(title_case(&[]), "");
    }
}
