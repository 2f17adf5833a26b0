use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

use crate::db::{Album, Artist, BatchWriter, DocumentStore, Review, User, WriteOp};
use crate::error::Result;
use crate::services::generator::{fake_album, fake_artist, fake_review, fake_user};

/// Request parameter name, default and upper bound for one seed count.
#[derive(Debug, Clone, Copy)]
pub struct CountLimit {
    pub param: &'static str,
    pub default: usize,
    pub cap: usize,
}

pub const USERS_LIMIT: CountLimit = CountLimit { param: "users", default: 20, cap: 500 };
pub const ARTISTS_LIMIT: CountLimit = CountLimit { param: "artists", default: 8, cap: 200 };
pub const ALBUMS_PER_ARTIST_LIMIT: CountLimit =
    CountLimit { param: "albumsPerArtist", default: 3, cap: 20 };
pub const REVIEWS_PER_USER_LIMIT: CountLimit =
    CountLimit { param: "reviewsPerUser", default: 2, cap: 20 };

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedCounts {
    pub users: usize,
    pub artists: usize,
    pub albums_per_artist: usize,
    pub reviews_per_user: usize,
}

impl Default for SeedCounts {
    fn default() -> Self {
        Self {
            users: USERS_LIMIT.default,
            artists: ARTISTS_LIMIT.default,
            albums_per_artist: ALBUMS_PER_ARTIST_LIMIT.default,
            reviews_per_user: REVIEWS_PER_USER_LIMIT.default,
        }
    }
}

impl SeedCounts {
    /// Reads each count through `lookup` by parameter name.
    pub fn resolve<'a>(lookup: impl Fn(&str) -> Option<&'a Value>) -> Self {
        Self {
            users: parse_count(lookup(USERS_LIMIT.param), USERS_LIMIT),
            artists: parse_count(lookup(ARTISTS_LIMIT.param), ARTISTS_LIMIT),
            albums_per_artist: parse_count(
                lookup(ALBUMS_PER_ARTIST_LIMIT.param),
                ALBUMS_PER_ARTIST_LIMIT,
            ),
            reviews_per_user: parse_count(
                lookup(REVIEWS_PER_USER_LIMIT.param),
                REVIEWS_PER_USER_LIMIT,
            ),
        }
    }
}

/// Missing, non-numeric and zero values fall back to the default. Anything
/// else is truncated and clamped to `1..=cap`.
pub fn parse_count(value: Option<&Value>, limit: CountLimit) -> usize {
    let requested = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match requested.filter(|n| n.is_finite()).map(f64::trunc) {
        Some(n) if n != 0.0 => n.clamp(1.0, limit.cap as f64) as usize,
        _ => limit.default,
    }
}

/// Every entity generated for one seed run, in write order.
#[derive(Debug, Clone, Default)]
pub struct SeedPlan {
    pub users: Vec<User>,
    pub artists: Vec<Artist>,
    pub albums: Vec<Album>,
    pub reviews: Vec<Review>,
}

impl SeedPlan {
    pub fn generate<R: Rng + ?Sized>(counts: SeedCounts, rng: &mut R) -> Self {
        let users: Vec<User> = (0..counts.users).map(|_| fake_user(rng)).collect();
        let artists: Vec<Artist> = (0..counts.artists).map(|_| fake_artist(rng)).collect();

        let mut albums = Vec::with_capacity(counts.artists * counts.albums_per_artist);
        for artist in &artists {
            for _ in 0..counts.albums_per_artist {
                albums.push(fake_album(rng, artist));
            }
        }

        let mut reviews = Vec::with_capacity(counts.users * counts.reviews_per_user);
        for user in &users {
            for _ in 0..counts.reviews_per_user {
                if let Some(album) = albums.choose(rng) {
                    reviews.push(fake_review(rng, &user.id, album.id));
                }
            }
        }

        Self {
            users,
            artists,
            albums,
            reviews,
        }
    }

    pub fn counts(&self) -> GeneratedCounts {
        GeneratedCounts {
            users: self.users.len(),
            artists: self.artists.len(),
            albums: self.albums.len(),
            reviews: self.reviews.len(),
        }
    }

    /// Generated artists and albums that share an id with an earlier one in
    /// the same run. Their documents overwrite the earlier ones.
    pub fn id_collisions(&self) -> (usize, usize) {
        (
            duplicates(self.artists.iter().map(|a| a.id)),
            duplicates(self.albums.iter().map(|a| a.id)),
        )
    }

    pub fn writes(&self) -> Result<Vec<WriteOp>> {
        let mut writes = Vec::with_capacity(self.counts().total());
        for user in &self.users {
            writes.push(WriteOp::merge_set(user)?);
        }
        for artist in &self.artists {
            writes.push(WriteOp::merge_set(artist)?);
        }
        for album in &self.albums {
            writes.push(WriteOp::merge_set(album)?);
        }
        for review in &self.reviews {
            writes.push(WriteOp::merge_set(review)?);
        }
        Ok(writes)
    }
}

fn duplicates(ids: impl Iterator<Item = u32>) -> usize {
    let mut seen = HashSet::new();
    ids.filter(|id| !seen.insert(*id)).count()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GeneratedCounts {
    pub users: usize,
    pub artists: usize,
    pub albums: usize,
    pub reviews: usize,
}

impl GeneratedCounts {
    pub fn total(&self) -> usize {
        self.users + self.artists + self.albums + self.reviews
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub counts: GeneratedCounts,
    pub batches: usize,
}

impl SeedReport {
    pub fn message(&self) -> String {
        format!(
            "Seeded {} users, {} artists, {} albums and {} reviews",
            self.counts.users, self.counts.artists, self.counts.albums, self.counts.reviews
        )
    }
}

/// Writes a generated [`SeedPlan`] through the batch writer.
#[derive(Clone)]
pub struct Seeder {
    store: Arc<dyn DocumentStore>,
}

impl Seeder {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn run(&self, plan: SeedPlan) -> Result<SeedReport> {
        let counts = plan.counts();

        let (artist_collisions, album_collisions) = plan.id_collisions();
        if artist_collisions + album_collisions > 0 {
            tracing::warn!(
                artist_collisions,
                album_collisions,
                "Generated ids collide; later documents overwrite earlier ones"
            );
        }

        let writes = plan.writes()?;
        tracing::info!(
            "Seeding {} users, {} artists, {} albums, {} reviews ({} writes)",
            counts.users,
            counts.artists,
            counts.albums,
            counts.reviews,
            writes.len()
        );

        let summary = BatchWriter::new(self.store.as_ref())
            .commit_all(writes)
            .await?;

        tracing::info!(
            "Seed run committed {} writes in {} batches",
            summary.writes,
            summary.batches
        );

        Ok(SeedReport {
            counts,
            batches: summary.batches,
        })
    }
}
