//! Reference-to-record expansion
//!
//! Newer wire versions replace nested objects with identifier references:
//! a proposal carries a track id, speaker codes and answer ids instead of
//! the records themselves. The expander reconstructs the nested view by
//! consulting the [`ExpansionCache`]; a miss triggers a single detail
//! fetch, a put and a retry. Callers always observe the nested form.
//!
//! For unbounded listings the first expansion bulk pre-populates the
//! speaker, submission-type and track kinds (answers too when the page
//! carries answer references), collapsing a few hundred detail requests
//! into roughly four list requests.

use std::sync::Arc;

use serde_json::{json, Value};

use progcom_common::types::{Answer, ProposalSpeaker, Question, Speaker, SubmissionType, Track};
use progcom_common::{Error, Expandable, LocalizedString, Result};

use crate::cache::ExpansionCache;
use crate::fetcher::DetailSource;

/// Which listing shape is being expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExpandKind {
    Proposal,
    Speaker,
}

/// Rewrites identifier references inside raw records into full objects.
pub(crate) struct Expander {
    detail: Arc<dyn DetailSource>,
    cache: Arc<ExpansionCache>,
    kind: ExpandKind,
    allow_prepopulate: bool,
}

impl Expander {
    pub(crate) fn new(
        detail: Arc<dyn DetailSource>,
        cache: Arc<ExpansionCache>,
        kind: ExpandKind,
        allow_prepopulate: bool,
    ) -> Expander {
        Expander {
            detail,
            cache,
            kind,
            allow_prepopulate,
        }
    }

    pub(crate) async fn expand(&self, event: &str, value: Value) -> Result<Value> {
        match self.kind {
            ExpandKind::Proposal => self.expand_proposal(event, value).await,
            ExpandKind::Speaker => self.expand_speaker(event, value).await,
        }
    }

    async fn expand_proposal(&self, event: &str, value: Value) -> Result<Value> {
        // Non-objects pass through; typed deserialization reports the
        // mismatch with the endpoint context.
        let mut obj = match value {
            Value::Object(obj) => obj,
            other => return Ok(other),
        };

        let has_answer_refs = matches!(
            obj.get("answers").and_then(Value::as_array).and_then(|a| a.first()),
            Some(Value::Number(_))
        );
        self.maybe_prepopulate(event, has_answer_refs).await;

        // Speakers: bare codes become {code, name} records.
        if let Some(Value::Array(speakers)) = obj.get("speakers") {
            if matches!(speakers.first(), Some(Value::String(_))) {
                let codes: Vec<String> = speakers
                    .iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect();
                let mut expanded = Vec::with_capacity(codes.len());
                for code in codes {
                    let speaker = self.speaker(event, &code).await?;
                    expanded.push(serde_json::to_value(ProposalSpeaker {
                        code: speaker.code,
                        name: speaker.name,
                        avatar: speaker.avatar,
                        email: None,
                    })?);
                }
                obj.insert("speakers".to_string(), Value::Array(expanded));
            }
        }

        // Submission type: id reference becomes the full record; the raw id
        // is kept for callers that write references back.
        if let Some(id) = obj.get("submission_type").and_then(Value::as_i64) {
            let record = self.submission_type(event, id).await?;
            obj.insert("submission_type".to_string(), serde_json::to_value(record)?);
            obj.insert("submission_type_id".to_string(), json!(id));
        }

        // Track: id reference becomes the full record.
        if let Some(id) = obj.get("track").and_then(Value::as_i64) {
            let record = self.track(event, id).await?;
            obj.insert("track".to_string(), serde_json::to_value(record)?);
        }

        if has_answer_refs {
            self.expand_answer_refs(event, &mut obj).await?;
        }

        Ok(Value::Object(obj))
    }

    async fn expand_speaker(&self, event: &str, value: Value) -> Result<Value> {
        let mut obj = match value {
            Value::Object(obj) => obj,
            other => return Ok(other),
        };
        let has_answer_refs = matches!(
            obj.get("answers").and_then(Value::as_array).and_then(|a| a.first()),
            Some(Value::Number(_))
        );
        if has_answer_refs {
            self.expand_answer_refs(event, &mut obj).await?;
        }
        Ok(Value::Object(obj))
    }

    /// Replace an `answers` array of ids with full records, dropping the
    /// ones the credentials cannot access.
    async fn expand_answer_refs(
        &self,
        event: &str,
        obj: &mut serde_json::Map<String, Value>,
    ) -> Result<()> {
        let ids: Vec<i64> = obj
            .get("answers")
            .and_then(Value::as_array)
            .map(|a| a.iter().filter_map(Value::as_i64).collect())
            .unwrap_or_default();

        let mut expanded = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(answer) = self.answer(event, id).await? {
                expanded.push(serde_json::to_value(answer)?);
            }
        }
        let replacement = if expanded.is_empty() {
            Value::Null
        } else {
            Value::Array(expanded)
        };
        obj.insert("answers".to_string(), replacement);
        Ok(())
    }

    async fn speaker(&self, event: &str, code: &str) -> Result<Speaker> {
        if let Some(speaker) = self.cache.get_speaker(code).await {
            return Ok(speaker);
        }
        let value = self.detail.detail(event, "speakers", code).await?;
        let speaker: Speaker = parse_record(value, &format!("speakers/{code}"))?;
        self.cache.put_speaker(speaker.clone()).await;
        Ok(speaker)
    }

    async fn submission_type(&self, event: &str, id: i64) -> Result<SubmissionType> {
        if let Some(record) = self.cache.get_submission_type(id).await {
            return Ok(record);
        }
        let record = match self.detail.detail(event, "submission-types", &id.to_string()).await {
            Ok(value) => parse_record(value, &format!("submission-types/{id}"))?,
            Err(e) if !e.is_transient() && !matches!(e, Error::Cancelled) => {
                tracing::warn!(id, error = %e, "cannot fetch submission type, using placeholder");
                SubmissionType {
                    id,
                    name: LocalizedString::english(format!("Type {id}")),
                }
            }
            Err(e) => return Err(e),
        };
        self.cache.put_submission_type(record.clone()).await;
        Ok(record)
    }

    async fn track(&self, event: &str, id: i64) -> Result<Track> {
        if let Some(record) = self.cache.get_track(id).await {
            return Ok(record);
        }
        let record = match self.detail.detail(event, "tracks", &id.to_string()).await {
            Ok(value) => parse_record(value, &format!("tracks/{id}"))?,
            Err(e) if !e.is_transient() && !matches!(e, Error::Cancelled) => {
                tracing::warn!(id, error = %e, "cannot fetch track, using placeholder");
                Track {
                    id,
                    name: LocalizedString::english(format!("Track {id}")),
                }
            }
            Err(e) => return Err(e),
        };
        self.cache.put_track(record.clone()).await;
        Ok(record)
    }

    async fn answer(&self, event: &str, id: i64) -> Result<Option<Answer>> {
        if let Some(cached) = self.cache.get_answer(id).await {
            return Ok(cached);
        }
        let answer = match self.detail.detail(event, "answers", &id.to_string()).await {
            Ok(value) => {
                let mut answer: Answer = parse_record(value, &format!("answers/{id}"))?;
                if let Expandable::Ref(question_id) = answer.question {
                    let question = self.question(event, question_id).await?;
                    answer.question = Expandable::Full(question);
                }
                Some(answer)
            }
            Err(Error::UpstreamClientError { status, .. }) if status == 401 || status == 403 => {
                tracing::debug!(id, "answer not accessible with current credentials");
                None
            }
            Err(e) => return Err(e),
        };
        self.cache.put_answer(id, answer.clone()).await;
        Ok(answer)
    }

    async fn question(&self, event: &str, id: i64) -> Result<Question> {
        if let Some(question) = self.cache.get_question(id).await {
            return Ok(question);
        }
        let value = self.detail.detail(event, "questions", &id.to_string()).await?;
        let question: Question = parse_record(value, &format!("questions/{id}"))?;
        self.cache.put_question(question.clone()).await;
        Ok(question)
    }

    /// Bulk-fill the auxiliary kinds for an event on first use. Failures
    /// degrade to per-record detail fetches, so they only warn.
    async fn maybe_prepopulate(&self, event: &str, include_answers: bool) {
        if !self.allow_prepopulate
            || !self.cache.prepopulation_enabled()
            || self.cache.is_populated(event).await
        {
            return;
        }
        tracing::info!(event, "pre-populating expansion caches");

        match self.detail.list_all(event, "speakers", &[]).await {
            Ok(values) => {
                for value in values {
                    match serde_json::from_value::<Speaker>(value) {
                        Ok(speaker) => self.cache.put_speaker(speaker).await,
                        Err(e) => tracing::warn!(error = %e, "skipping unparsable speaker"),
                    }
                }
            }
            Err(e) => tracing::warn!(event, error = %e, "speaker pre-population failed"),
        }

        match self.detail.list_all(event, "submission-types", &[]).await {
            Ok(values) => {
                for value in values {
                    match serde_json::from_value::<SubmissionType>(value) {
                        Ok(record) => self.cache.put_submission_type(record).await,
                        Err(e) => tracing::warn!(error = %e, "skipping unparsable submission type"),
                    }
                }
            }
            Err(e) => tracing::warn!(event, error = %e, "submission-type pre-population failed"),
        }

        match self.detail.list_all(event, "tracks", &[]).await {
            Ok(values) => {
                for value in values {
                    match serde_json::from_value::<Track>(value) {
                        Ok(record) => self.cache.put_track(record).await,
                        Err(e) => tracing::warn!(error = %e, "skipping unparsable track"),
                    }
                }
            }
            Err(e) => tracing::warn!(event, error = %e, "track pre-population failed"),
        }

        if include_answers {
            match self.detail.list_all(event, "answers", &[]).await {
                Ok(values) => {
                    for value in values {
                        match serde_json::from_value::<Answer>(value) {
                            Ok(answer) => self.cache.put_answer(answer.id, Some(answer)).await,
                            Err(e) => tracing::warn!(error = %e, "skipping unparsable answer"),
                        }
                    }
                }
                Err(Error::UpstreamClientError { status, .. }) if status == 401 || status == 403 => {
                    tracing::debug!(event, "cannot pre-populate answers without credentials");
                }
                Err(e) => tracing::warn!(event, error = %e, "answer pre-population failed"),
            }
        }

        self.cache.mark_populated(event).await;
    }
}

fn parse_record<T: serde::de::DeserializeOwned>(value: Value, path: &str) -> Result<T> {
    serde_json::from_value(value).map_err(|e| Error::WireError {
        path: path.to_string(),
        cause: e.to_string(),
    })
}
