//! Meme submissions, moderation status and votes

mod store;
mod types;

pub use store::{InMemoryMemeStore, MemeStore, VoteOutcome};
pub use types::{MAX_TITLE_LEN, Meme, MemeStatus, NewMeme, VoteDirection};
