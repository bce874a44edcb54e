//! Turns remote templates into memes with synthetic engagement.
//!
//! Likes, comments, category and creation time are random on every call; only
//! the shape (one meme per template) is stable.

use crate::models::{Comment, Meme, MemeCategory, MemeTemplate};
use chrono::{DateTime, Duration, Utc};
use rand::{seq::SliceRandom, Rng};

const MAX_SYNTHETIC_LIKES: u64 = 1000;
const MAX_SYNTHETIC_COMMENTS: usize = 5;
const MEME_AGE_DAYS: i64 = 30;
const COMMENT_AGE_DAYS: i64 = 7;

const COMMENT_USERNAMES: [&str; 5] =
    ["meme_lord", "laugh_master", "joke_fan", "funny_guy", "meme_queen"];

const COMMENT_TEXTS: [&str; 10] = [
    "This is hilarious! 😂",
    "I can't stop laughing! 🤣",
    "Sharing this with my friends!",
    "Best meme I've seen today!",
    "This is so relatable!",
    "I feel personally attacked 😅",
    "Story of my life right here",
    "This deserves more likes",
    "Literally me every day",
    "Can't. Stop. Laughing.",
];

pub fn transform_templates<R: Rng + ?Sized>(
    templates: Vec<MemeTemplate>,
    rng: &mut R,
    now: DateTime<Utc>,
) -> Vec<Meme> {
    templates
        .into_iter()
        .enumerate()
        .map(|(index, template)| transform_template(index, template, rng, now))
        .collect()
}

fn transform_template<R: Rng + ?Sized>(
    index: usize,
    template: MemeTemplate,
    rng: &mut R,
    now: DateTime<Utc>,
) -> Meme {
    let id = if template.id.is_empty() {
        index.to_string()
    } else {
        template.id
    };
    let likes = rng.gen_range(0..MAX_SYNTHETIC_LIKES);
    let comment_count = rng.gen_range(0..MAX_SYNTHETIC_COMMENTS);
    let comments = random_comments(comment_count, rng, now);
    let category = *MemeCategory::ASSIGNABLE
        .choose(rng)
        .unwrap_or(&MemeCategory::Trending);

    Meme {
        id,
        name: template.name,
        url: template.url,
        width: template.width,
        height: template.height,
        box_count: Some(template.box_count),
        caption: None,
        likes,
        comments,
        category,
        created_at: random_past(rng, now, MEME_AGE_DAYS),
        creator: None,
    }
}

fn random_comments<R: Rng + ?Sized>(count: usize, rng: &mut R, now: DateTime<Utc>) -> Vec<Comment> {
    let stamp = now.timestamp_millis();
    (0..count)
        .map(|i| Comment {
            id: format!("comment-{}-{}", i, stamp),
            username: pick(&COMMENT_USERNAMES, rng).to_string(),
            text: pick(&COMMENT_TEXTS, rng).to_string(),
            created_at: random_past(rng, now, COMMENT_AGE_DAYS),
        })
        .collect()
}

fn pick<'a, R: Rng + ?Sized>(pool: &[&'a str], rng: &mut R) -> &'a str {
    pool.choose(rng).copied().unwrap_or_default()
}

/// Uniform instant in `(now - days, now]`, millisecond resolution.
fn random_past<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    let window_ms = days * 24 * 60 * 60 * 1000;
    now - Duration::milliseconds(rng.gen_range(0..window_ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn template(id: &str, name: &str) -> MemeTemplate {
        MemeTemplate {
            id: id.to_string(),
            name: name.to_string(),
            url: format!("https://i.imgflip.com/{}.jpg", id),
            width: 500,
            height: 400,
            box_count: 2,
            captions: None,
        }
    }

    #[test]
    fn one_meme_per_template_with_copied_fields() {
        let mut rng = StdRng::seed_from_u64(7);
        let now = Utc::now();
        let templates = vec![template("61579", "One Does Not Simply"), template("", "Untitled")];

        let memes = transform_templates(templates, &mut rng, now);

        assert_eq!(memes.len(), 2);
        assert_eq!(memes[0].id, "61579");
        assert_eq!(memes[0].name, "One Does Not Simply");
        assert_eq!(memes[0].url, "https://i.imgflip.com/61579.jpg");
        assert_eq!((memes[0].width, memes[0].height), (500, 400));
        assert_eq!(memes[0].box_count, Some(2));
        // Empty template id falls back to position.
        assert_eq!(memes[1].id, "1");
    }

    #[test]
    fn synthetic_values_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(42);
        let now = Utc::now();
        let templates: Vec<_> = (0..200).map(|i| template(&i.to_string(), "t")).collect();

        for meme in transform_templates(templates, &mut rng, now) {
            assert!(meme.likes < MAX_SYNTHETIC_LIKES);
            assert!(meme.comments.len() < MAX_SYNTHETIC_COMMENTS);
            assert_ne!(meme.category, MemeCategory::All);
            assert!(meme.created_at <= now);
            assert!(meme.created_at > now - Duration::days(MEME_AGE_DAYS));
            assert!(meme.creator.is_none());
            for comment in &meme.comments {
                assert!(COMMENT_USERNAMES.contains(&comment.username.as_str()));
                assert!(COMMENT_TEXTS.contains(&comment.text.as_str()));
                assert!(comment.created_at > now - Duration::days(COMMENT_AGE_DAYS));
            }
        }
    }
}
