//! Endpoint-level facade over the fetcher and the expansion cache
//!
//! Mirrors the upstream surface: events, submissions, talks, speakers,
//! reviews, rooms, questions, answers, tags, submission types, tracks and
//! the authenticated-user endpoint. Every resource offers a listing
//! (count + lazy sequence) and a detail fetch; query parameters pass
//! through verbatim so callers can use server-side filters such as
//! `state=submitted` or `questions=all`.
//!
//! The `talks` endpoint is historically an alias for `submissions`
//! filtered to accepted/confirmed; some instances 404 on it, in which case
//! the client falls back and records the alias.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use progcom_common::config::{Config, UpstreamConfig};
use progcom_common::types::{
    Answer, Event, Me, Proposal, Question, Review, Room, Speaker, SubmissionType, Tag, Track,
};
use progcom_common::{Error, Result};

use crate::cache::{CacheKind, ExpansionCache};
use crate::expand::{ExpandKind, Expander};
use crate::fetcher::Fetcher;
use crate::pages::{PageCursor, Paged};

/// Listings bounded below this many records skip bulk pre-population.
const PREPOPULATE_MIN_ITEMS: u64 = 20;

/// Client for the CfP service.
#[derive(Clone)]
pub struct CfpClient {
    fetcher: Arc<Fetcher>,
    cache: Arc<ExpansionCache>,
    lenient: bool,
    talks_alias_used: Arc<AtomicBool>,
}

impl CfpClient {
    pub fn new(config: &Config) -> Result<CfpClient> {
        CfpClient::from_upstream(&config.upstream)
    }

    pub fn from_upstream(upstream: &UpstreamConfig) -> Result<CfpClient> {
        Ok(CfpClient::from_fetcher(Fetcher::new(upstream)?))
    }

    pub fn from_fetcher(fetcher: Fetcher) -> CfpClient {
        CfpClient {
            fetcher: Arc::new(fetcher),
            cache: Arc::new(ExpansionCache::default()),
            lenient: false,
            talks_alias_used: Arc::new(AtomicBool::new(false)),
        }
    }

    /// In lenient mode, wire-invalid records are dropped from lazy
    /// sequences instead of terminating them.
    pub fn with_lenient(mut self, lenient: bool) -> CfpClient {
        self.lenient = lenient;
        self
    }

    pub fn cache(&self) -> &ExpansionCache {
        &self.cache
    }

    /// Enable or disable the bulk pre-population heuristic.
    pub fn set_prepopulation(&self, enabled: bool) {
        self.cache.set_prepopulation(enabled);
    }

    pub async fn clear_caches(&self) {
        self.cache.clear_all().await;
    }

    /// Whether a `talks` request fell back to `submissions` at least once.
    pub fn talks_alias_used(&self) -> bool {
        self.talks_alias_used.load(Ordering::Relaxed)
    }

    // --- listings -------------------------------------------------------

    pub async fn events(&self, params: &[(&str, &str)]) -> Result<(u64, Paged<Event>)> {
        self.list_path("/api/events/", "", params, None).await
    }

    pub async fn submissions(
        &self,
        event: &str,
        params: &[(&str, &str)],
    ) -> Result<(u64, Paged<Proposal>)> {
        self.list_resource(event, "submissions", params, Some(ExpandKind::Proposal))
            .await
    }

    /// Accepted/confirmed proposals. Falls back to a filtered
    /// `submissions` listing when the instance lacks the alias endpoint.
    pub async fn talks(
        &self,
        event: &str,
        params: &[(&str, &str)],
    ) -> Result<(u64, Paged<Proposal>)> {
        match self
            .list_resource(event, "talks", params, Some(ExpandKind::Proposal))
            .await
        {
            Err(e) if e.is_not_found() => {
                tracing::info!(event, "talks endpoint not available, using submissions");
                self.talks_alias_used.store(true, Ordering::Relaxed);
                let mut fallback: Vec<(&str, &str)> = params.to_vec();
                fallback.push(("state", "accepted"));
                fallback.push(("state", "confirmed"));
                self.list_resource(event, "submissions", &fallback, Some(ExpandKind::Proposal))
                    .await
            }
            other => other,
        }
    }

    pub async fn speakers(
        &self,
        event: &str,
        params: &[(&str, &str)],
    ) -> Result<(u64, Paged<Speaker>)> {
        self.list_resource(event, "speakers", params, Some(ExpandKind::Speaker))
            .await
    }

    /// Requires privileged credentials.
    pub async fn reviews(
        &self,
        event: &str,
        params: &[(&str, &str)],
    ) -> Result<(u64, Paged<Review>)> {
        self.list_resource(event, "reviews", params, None).await
    }

    pub async fn rooms(&self, event: &str, params: &[(&str, &str)]) -> Result<(u64, Paged<Room>)> {
        self.list_resource(event, "rooms", params, None).await
    }

    pub async fn questions(
        &self,
        event: &str,
        params: &[(&str, &str)],
    ) -> Result<(u64, Paged<Question>)> {
        self.list_resource(event, "questions", params, None).await
    }

    /// Requires privileged credentials.
    pub async fn answers(
        &self,
        event: &str,
        params: &[(&str, &str)],
    ) -> Result<(u64, Paged<Answer>)> {
        self.list_resource(event, "answers", params, None).await
    }

    pub async fn tags(&self, event: &str, params: &[(&str, &str)]) -> Result<(u64, Paged<Tag>)> {
        self.list_resource(event, "tags", params, None).await
    }

    pub async fn submission_types(
        &self,
        event: &str,
        params: &[(&str, &str)],
    ) -> Result<(u64, Paged<SubmissionType>)> {
        self.list_resource(event, "submission-types", params, None)
            .await
    }

    pub async fn tracks(
        &self,
        event: &str,
        params: &[(&str, &str)],
    ) -> Result<(u64, Paged<Track>)> {
        self.list_resource(event, "tracks", params, None).await
    }

    // --- details --------------------------------------------------------

    pub async fn event(&self, slug: &str) -> Result<Event> {
        let value = self
            .fetcher
            .get_value(&format!("/api/events/{slug}/"), &[])
            .await?;
        parse_typed(value, &format!("events/{slug}"))
    }

    pub async fn submission(
        &self,
        event: &str,
        code: &str,
        params: &[(&str, &str)],
    ) -> Result<Proposal> {
        self.detail_resource(event, "submissions", code, params, Some(ExpandKind::Proposal))
            .await
    }

    pub async fn talk(&self, event: &str, code: &str, params: &[(&str, &str)]) -> Result<Proposal> {
        match self
            .detail_resource(event, "talks", code, params, Some(ExpandKind::Proposal))
            .await
        {
            Err(e) if e.is_not_found() => {
                tracing::info!(event, code, "talk endpoint not available, using submission");
                self.talks_alias_used.store(true, Ordering::Relaxed);
                self.detail_resource(event, "submissions", code, params, Some(ExpandKind::Proposal))
                    .await
            }
            other => other,
        }
    }

    pub async fn speaker(
        &self,
        event: &str,
        code: &str,
        params: &[(&str, &str)],
    ) -> Result<Speaker> {
        self.detail_resource(event, "speakers", code, params, Some(ExpandKind::Speaker))
            .await
    }

    pub async fn review(&self, event: &str, id: i64, params: &[(&str, &str)]) -> Result<Review> {
        self.detail_resource(event, "reviews", &id.to_string(), params, None)
            .await
    }

    pub async fn room(&self, event: &str, id: i64, params: &[(&str, &str)]) -> Result<Room> {
        self.detail_resource(event, "rooms", &id.to_string(), params, None)
            .await
    }

    pub async fn question(&self, event: &str, id: i64, params: &[(&str, &str)]) -> Result<Question> {
        self.detail_resource(event, "questions", &id.to_string(), params, None)
            .await
    }

    pub async fn answer(&self, event: &str, id: i64, params: &[(&str, &str)]) -> Result<Answer> {
        self.detail_resource(event, "answers", &id.to_string(), params, None)
            .await
    }

    pub async fn tag(&self, event: &str, tag: &str, params: &[(&str, &str)]) -> Result<Tag> {
        self.detail_resource(event, "tags", tag, params, None).await
    }

    pub async fn submission_type(
        &self,
        event: &str,
        id: i64,
        params: &[(&str, &str)],
    ) -> Result<SubmissionType> {
        self.detail_resource(event, "submission-types", &id.to_string(), params, None)
            .await
    }

    pub async fn track(&self, event: &str, id: i64, params: &[(&str, &str)]) -> Result<Track> {
        self.detail_resource(event, "tracks", &id.to_string(), params, None)
            .await
    }

    /// Profile of the authenticated user.
    pub async fn me(&self) -> Result<Me> {
        let value = self.fetcher.get_value("/api/me", &[]).await?;
        parse_typed(value, "me")
    }

    // --- bulk pre-population -------------------------------------------

    /// Fill one cache kind for an event with a single list request.
    pub async fn bulk_prepopulate(&self, event: &str, kind: CacheKind) -> Result<()> {
        let path = |resource: &str| format!("/api/events/{event}/{resource}/");
        match kind {
            CacheKind::Tracks => {
                let (_, values) = self.fetcher.fetch_all(&path("tracks"), &[]).await?;
                for value in values {
                    let record: Track = parse_typed(value, "tracks")?;
                    self.cache.put_track(record).await;
                }
            }
            CacheKind::SubmissionTypes => {
                let (_, values) = self
                    .fetcher
                    .fetch_all(&path("submission-types"), &[])
                    .await?;
                for value in values {
                    let record: SubmissionType = parse_typed(value, "submission-types")?;
                    self.cache.put_submission_type(record).await;
                }
            }
            CacheKind::Speakers => {
                let (_, values) = self.fetcher.fetch_all(&path("speakers"), &[]).await?;
                for value in values {
                    let record: Speaker = parse_typed(value, "speakers")?;
                    self.cache.put_speaker(record).await;
                }
            }
            CacheKind::Answers => {
                let (_, values) = self.fetcher.fetch_all(&path("answers"), &[]).await?;
                for value in values {
                    let record: Answer = parse_typed(value, "answers")?;
                    self.cache.put_answer(record.id, Some(record)).await;
                }
            }
            CacheKind::Questions => {
                let (_, values) = self.fetcher.fetch_all(&path("questions"), &[]).await?;
                for value in values {
                    let record: Question = parse_typed(value, "questions")?;
                    self.cache.put_question(record).await;
                }
            }
            CacheKind::Rooms => {
                let (_, values) = self.fetcher.fetch_all(&path("rooms"), &[]).await?;
                for value in values {
                    let record: Room = parse_typed(value, "rooms")?;
                    self.cache.put_room(record).await;
                }
            }
        }
        tracing::info!(event, ?kind, "bulk pre-population complete");
        Ok(())
    }

    // --- internals ------------------------------------------------------

    async fn list_resource<T: DeserializeOwned>(
        &self,
        event: &str,
        resource: &str,
        params: &[(&str, &str)],
        expand: Option<ExpandKind>,
    ) -> Result<(u64, Paged<T>)> {
        let path = format!("/api/events/{event}/{resource}/");
        self.list_path(&path, event, params, expand).await
    }

    async fn list_path<T: DeserializeOwned>(
        &self,
        path: &str,
        event: &str,
        params: &[(&str, &str)],
        expand: Option<ExpandKind>,
    ) -> Result<(u64, Paged<T>)> {
        let owned = own_params(params);
        let envelope = self.fetcher.first_page(path, &owned).await?;
        let count = envelope.count;
        let cursor = PageCursor::new(
            self.fetcher.clone(),
            path,
            envelope,
            self.fetcher.cancel_token(),
        );
        let expander = expand.map(|kind| {
            Expander::new(
                self.fetcher.clone(),
                self.cache.clone(),
                kind,
                allow_prepopulate(params),
            )
        });
        Ok((count, Paged::new(cursor, expander, event, self.lenient)))
    }

    async fn detail_resource<T: DeserializeOwned>(
        &self,
        event: &str,
        resource: &str,
        id: &str,
        params: &[(&str, &str)],
        expand: Option<ExpandKind>,
    ) -> Result<T> {
        let path = format!("/api/events/{event}/{resource}/{id}/");
        let value = self.fetcher.get_value(&path, &own_params(params)).await?;
        let value = match expand {
            Some(kind) => {
                // A single detail fetch never triggers bulk pre-population.
                let expander =
                    Expander::new(self.fetcher.clone(), self.cache.clone(), kind, false);
                expander.expand(event, value).await?
            }
            None => value,
        };
        parse_typed(value, &format!("{resource}/{id}"))
    }
}

fn own_params(params: &[(&str, &str)]) -> Vec<(String, String)> {
    params
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Bounded listings (explicit small `limit`) skip pre-population.
fn allow_prepopulate(params: &[(&str, &str)]) -> bool {
    !params.iter().any(|(key, value)| {
        *key == "limit"
            && value
                .parse::<u64>()
                .map(|n| n < PREPOPULATE_MIN_ITEMS)
                .unwrap_or(false)
    })
}

fn parse_typed<T: DeserializeOwned>(value: Value, path: &str) -> Result<T> {
    serde_json::from_value(value).map_err(|e| Error::WireError {
        path: path.to_string(),
        cause: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_prepopulate_without_limit() {
        assert!(allow_prepopulate(&[("questions", "all")]));
    }

    #[test]
    fn test_allow_prepopulate_with_small_limit() {
        assert!(!allow_prepopulate(&[("limit", "5")]));
    }

    #[test]
    fn test_allow_prepopulate_with_large_limit() {
        assert!(allow_prepopulate(&[("limit", "100")]));
    }

    #[test]
    fn test_allow_prepopulate_with_unparsable_limit() {
        assert!(allow_prepopulate(&[("limit", "all")]));
    }
}
