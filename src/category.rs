use crate::models::{Meme, MemeCategory};
use rand::{seq::SliceRandom, Rng};
use serde::Serialize;
use std::collections::HashMap;

/// Page size for trending/new/random views.
pub const CATEGORY_LIMIT: usize = 20;
pub const LEADERBOARD_MEMES: usize = 10;
pub const LEADERBOARD_CREATORS: usize = 5;

/// Narrows a freshly transformed set to one category view.
pub fn narrow_by_category<R: Rng + ?Sized>(
    mut memes: Vec<Meme>,
    category: MemeCategory,
    rng: &mut R,
) -> Vec<Meme> {
    match category {
        MemeCategory::Trending => {
            sort_by_likes(&mut memes);
            memes.truncate(CATEGORY_LIMIT);
        }
        MemeCategory::New => {
            memes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            memes.truncate(CATEGORY_LIMIT);
        }
        // Filters on the randomly assigned category, so membership changes between fetches.
        MemeCategory::Classic => memes.retain(|meme| meme.category == MemeCategory::Classic),
        MemeCategory::Random => {
            memes.shuffle(rng);
            memes.truncate(CATEGORY_LIMIT);
        }
        MemeCategory::All => {}
    }
    memes
}

/// Empty query keeps everything.
pub fn filter_by_query(memes: Vec<Meme>, query: &str) -> Vec<Meme> {
    if query.is_empty() {
        return memes;
    }
    let needle = query.to_lowercase();
    memes
        .into_iter()
        .filter(|meme| meme.matches_lowercase(&needle))
        .collect()
}

/// Descending by likes; stable, so ties keep their input order.
pub fn sort_by_likes(memes: &mut [Meme]) {
    memes.sort_by(|a, b| b.likes.cmp(&a.likes));
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreatorStats {
    pub username: String,
    pub total_likes: u64,
    pub total_memes: usize,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Leaderboard {
    pub top_memes: Vec<Meme>,
    pub top_creators: Vec<CreatorStats>,
}

/// Top memes by likes plus creators ranked by the likes their memes collected.
/// Memes without a creator count for nobody.
pub fn leaderboard(memes: &[Meme]) -> Leaderboard {
    let mut top_memes = memes.to_vec();
    sort_by_likes(&mut top_memes);
    top_memes.truncate(LEADERBOARD_MEMES);

    let mut stats: HashMap<&str, CreatorStats> = HashMap::new();
    for meme in memes {
        let Some(creator) = meme.creator.as_deref() else {
            continue;
        };
        let entry = stats.entry(creator).or_insert_with(|| CreatorStats {
            username: creator.to_string(),
            total_likes: 0,
            total_memes: 0,
        });
        entry.total_likes += meme.likes;
        entry.total_memes += 1;
    }

    let mut top_creators: Vec<CreatorStats> = stats.into_values().collect();
    top_creators.sort_by(|a, b| {
        b.total_likes
            .cmp(&a.total_likes)
            .then_with(|| a.username.cmp(&b.username))
    });
    top_creators.truncate(LEADERBOARD_CREATORS);

    Leaderboard { top_memes, top_creators }
}
