//! Sample blog domain and its three projections
//!
//! Payloads are JSON objects with exact field sets, so a payload decodes
//! as at most one of `User`, `Comment` or `Post`.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::decoder::EventDecoder;
use super::driver::Projection;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct User {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Comment {
    pub id: u64,
    pub post_id: u64,
    pub user_id: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Post {
    pub id: u64,
    pub title: String,
    pub tags: Vec<String>,
}

/// Decoded sample event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleEvent {
    User(User),
    Comment(Comment),
    Post(Post),
}

impl SampleEvent {
    /// Encodes the event as a log payload.
    pub fn to_payload(&self) -> serde_json::Result<Vec<u8>> {
        match self {
            SampleEvent::User(user) => serde_json::to_vec(user),
            SampleEvent::Comment(comment) => serde_json::to_vec(comment),
            SampleEvent::Post(post) => serde_json::to_vec(post),
        }
    }
}

fn json<T: DeserializeOwned>(payload: &[u8]) -> Option<T> {
    serde_json::from_slice(payload).ok()
}

pub fn decode_user(payload: &[u8]) -> Option<SampleEvent> {
    json(payload).map(SampleEvent::User)
}

pub fn decode_comment(payload: &[u8]) -> Option<SampleEvent> {
    json(payload).map(SampleEvent::Comment)
}

pub fn decode_post(payload: &[u8]) -> Option<SampleEvent> {
    json(payload).map(SampleEvent::Post)
}

/// Every sample shape: `User`, then `Comment`, then `Post`.
pub fn sample_decoder() -> EventDecoder<SampleEvent> {
    EventDecoder::new()
        .with("user", decode_user)
        .with("comment", decode_comment)
        .with("post", decode_post)
}

// ==================
// Tags distribution
// ==================

/// Number of posts carrying each tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagsDistributionView {
    pub distribution: BTreeMap<String, u64>,
}

/// Counts tags across posts.
#[derive(Debug, Clone, Copy, Default)]
pub struct TagsDistribution;

impl TagsDistribution {
    pub const NAME: &'static str = "TagsDistribution";
}

impl Projection for TagsDistribution {
    type Event = SampleEvent;
    type View = TagsDistributionView;

    fn name(&self) -> &str {
        Self::NAME
    }

    fn decoder(&self) -> EventDecoder<SampleEvent> {
        EventDecoder::new().with("post", decode_post)
    }

    fn apply(&self, view: &mut TagsDistributionView, event: SampleEvent) {
        if let SampleEvent::Post(post) = event {
            for tag in post.tags {
                *view.distribution.entry(tag).or_insert(0) += 1;
            }
        }
    }
}

// ==================
// Comments per user
// ==================

/// Comment count per user id, plus the users seen so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentDistributionView {
    pub distribution: BTreeMap<u64, u64>,
    pub users: BTreeMap<u64, User>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CommentDistribution;

impl CommentDistribution {
    pub const NAME: &'static str = "CommentDistribution";
}

impl Projection for CommentDistribution {
    type Event = SampleEvent;
    type View = CommentDistributionView;

    fn name(&self) -> &str {
        Self::NAME
    }

    fn decoder(&self) -> EventDecoder<SampleEvent> {
        EventDecoder::new()
            .with("user", decode_user)
            .with("comment", decode_comment)
    }

    fn apply(&self, view: &mut CommentDistributionView, event: SampleEvent) {
        match event {
            SampleEvent::User(user) => {
                view.users.insert(user.id, user);
            }
            SampleEvent::Comment(comment) => {
                *view.distribution.entry(comment.user_id).or_insert(0) += 1;
            }
            SampleEvent::Post(_) => {}
        }
    }
}

// ==========================
// Comments per user per day
// ==========================

/// Per user id, comments by weekday of creation (Sunday = 0).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserCommentsPerDayView {
    pub distribution: BTreeMap<u64, [u64; 7]>,
    pub users: BTreeMap<u64, User>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UserCommentsPerDay;

impl UserCommentsPerDay {
    pub const NAME: &'static str = "UserCommentsPerDay";
}

impl Projection for UserCommentsPerDay {
    type Event = SampleEvent;
    type View = UserCommentsPerDayView;

    fn name(&self) -> &str {
        Self::NAME
    }

    fn decoder(&self) -> EventDecoder<SampleEvent> {
        EventDecoder::new()
            .with("user", decode_user)
            .with("comment", decode_comment)
    }

    fn apply(&self, view: &mut UserCommentsPerDayView, event: SampleEvent) {
        match event {
            SampleEvent::User(user) => {
                view.users.insert(user.id, user);
            }
            SampleEvent::Comment(comment) => {
                let day = comment.created_at.weekday().num_days_from_sunday() as usize;
                view.distribution.entry(comment.user_id).or_insert([0; 7])[day] += 1;
            }
            SampleEvent::Post(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn user(id: u64, name: &str) -> SampleEvent {
        SampleEvent::User(User {
            id,
            name: name.to_string(),
        })
    }

    fn comment(id: u64, user_id: u64, created_at: DateTime<Utc>) -> SampleEvent {
        SampleEvent::Comment(Comment {
            id,
            post_id: 1,
            user_id,
            created_at,
        })
    }

    fn post(id: u64, tags: &[&str]) -> SampleEvent {
        SampleEvent::Post(Post {
            id,
            title: format!("post {}", id),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        })
    }

    #[test]
    fn test_shapes_are_mutually_exclusive() {
        let decoder = sample_decoder();
        let sunday = Utc.with_ymd_and_hms(2024, 3, 3, 12, 0, 0).unwrap();

        for event in [user(1, "ann"), comment(2, 1, sunday), post(3, &["rust"])] {
            let payload = event.to_payload().unwrap();
            assert_eq!(decoder.decode(&payload), Some(event));
        }
    }

    #[test]
    fn test_unknown_payloads_decode_to_none() {
        let decoder = sample_decoder();
        assert_eq!(decoder.decode(b"not json"), None);
        assert_eq!(decoder.decode(br#"{"id": 1}"#), None);
        assert_eq!(decoder.decode(br#"{"id": 1, "name": "x", "extra": true}"#), None);
    }

    #[test]
    fn test_tags_distribution_counts_post_tags() {
        let mut view = TagsDistributionView::default();
        let projection = TagsDistribution;
        projection.apply(&mut view, post(1, &["rust", "db"]));
        projection.apply(&mut view, post(2, &["rust"]));

        assert_eq!(view.distribution.get("rust"), Some(&2));
        assert_eq!(view.distribution.get("db"), Some(&1));
    }

    #[test]
    fn test_tags_distribution_ignores_users() {
        let payload = user(1, "ann").to_payload().unwrap();
        assert_eq!(TagsDistribution.decoder().decode(&payload), None);
    }

    #[test]
    fn test_comment_distribution() {
        let mut view = CommentDistributionView::default();
        let projection = CommentDistribution;
        let now = Utc::now();
        projection.apply(&mut view, user(7, "bob"));
        projection.apply(&mut view, comment(1, 7, now));
        projection.apply(&mut view, comment(2, 7, now));
        projection.apply(&mut view, comment(3, 8, now));

        assert_eq!(view.distribution.get(&7), Some(&2));
        assert_eq!(view.distribution.get(&8), Some(&1));
        assert_eq!(view.users.get(&7).map(|u| u.name.as_str()), Some("bob"));
    }

    #[test]
    fn test_user_comments_per_day_uses_sunday_zero() {
        let mut view = UserCommentsPerDayView::default();
        let projection = UserCommentsPerDay;
        let sunday = Utc.with_ymd_and_hms(2024, 3, 3, 23, 59, 0).unwrap();
        let monday = Utc.with_ymd_and_hms(2024, 3, 4, 0, 1, 0).unwrap();
        let saturday = Utc.with_ymd_and_hms(2024, 3, 9, 8, 0, 0).unwrap();

        projection.apply(&mut view, comment(1, 5, sunday));
        projection.apply(&mut view, comment(2, 5, monday));
        projection.apply(&mut view, comment(3, 5, saturday));
        projection.apply(&mut view, comment(4, 5, saturday));

        assert_eq!(view.distribution.get(&5), Some(&[1, 1, 0, 0, 0, 0, 2]));
    }

    #[test]
    fn test_views_survive_json() {
        let mut view = UserCommentsPerDayView::default();
        UserCommentsPerDay.apply(&mut view, user(1, "ann"));
        UserCommentsPerDay.apply(&mut view, comment(1, 1, Utc::now()));

        let json = serde_json::to_string(&view).unwrap();
        let back: UserCommentsPerDayView = serde_json::from_str(&json).unwrap();
        assert_eq!(back, view);
    }
}
