pub mod generator;
pub mod patcher;
pub mod seeder;

pub use patcher::{UserPatch, UserPatcher};
pub use seeder::{GeneratedCounts, SeedCounts, SeedPlan, SeedReport, Seeder};
