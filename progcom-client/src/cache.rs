//! Session-local expansion cache
//!
//! Write-through maps for the auxiliary record kinds referenced by
//! proposals and speakers: tracks, submission types, speakers (by code),
//! answers, questions, rooms. Wire data is immutable within a session, so
//! puts are idempotent and the last writer wins; reads are shared, writes
//! exclusive.
//!
//! There is no eviction by default; entries live until the process ends or
//! a `clear`. A soft capacity may be configured, in which case the
//! least-recently-inserted entries are dropped on overflow. Unauthorized
//! answers are cached as `None` so a 401/403 is not refetched.

use std::collections::{HashMap, HashSet, VecDeque};
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::RwLock;

use progcom_common::types::{Answer, Question, Room, Speaker, SubmissionType, Track};

/// The record kinds the cache distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKind {
    Tracks,
    SubmissionTypes,
    Speakers,
    Answers,
    Questions,
    Rooms,
}

/// One kind's map with insertion-order bookkeeping for the soft cap.
struct KindMap<K, V> {
    map: HashMap<K, V>,
    order: VecDeque<K>,
    soft_capacity: Option<usize>,
}

impl<K: Eq + Hash + Clone, V: Clone> KindMap<K, V> {
    fn new(soft_capacity: Option<usize>) -> Self {
        KindMap {
            map: HashMap::new(),
            order: VecDeque::new(),
            soft_capacity,
        }
    }

    fn get(&self, key: &K) -> Option<V> {
        self.map.get(key).cloned()
    }

    fn insert(&mut self, key: K, value: V) {
        if self.map.insert(key.clone(), value).is_none() {
            self.order.push_back(key);
            if let Some(cap) = self.soft_capacity {
                while self.map.len() > cap {
                    if let Some(oldest) = self.order.pop_front() {
                        self.map.remove(&oldest);
                    } else {
                        break;
                    }
                }
            }
        }
    }

    fn clear(&mut self) {
        self.map.clear();
        self.order.clear();
    }

    fn len(&self) -> usize {
        self.map.len()
    }
}

/// Process-local cache feeding transparent reference expansion.
pub struct ExpansionCache {
    tracks: RwLock<KindMap<i64, Track>>,
    submission_types: RwLock<KindMap<i64, SubmissionType>>,
    speakers: RwLock<KindMap<String, Speaker>>,
    /// `None` marks an answer the credentials cannot access.
    answers: RwLock<KindMap<i64, Option<Answer>>>,
    questions: RwLock<KindMap<i64, Question>>,
    rooms: RwLock<KindMap<i64, Room>>,
    /// Events whose auxiliary kinds were bulk pre-populated.
    populated_events: RwLock<HashSet<String>>,
    prepopulation: AtomicBool,
}

impl Default for ExpansionCache {
    fn default() -> Self {
        ExpansionCache::new(None)
    }
}

impl ExpansionCache {
    pub fn new(soft_capacity: Option<usize>) -> Self {
        ExpansionCache {
            tracks: RwLock::new(KindMap::new(soft_capacity)),
            submission_types: RwLock::new(KindMap::new(soft_capacity)),
            speakers: RwLock::new(KindMap::new(soft_capacity)),
            answers: RwLock::new(KindMap::new(soft_capacity)),
            questions: RwLock::new(KindMap::new(soft_capacity)),
            rooms: RwLock::new(KindMap::new(soft_capacity)),
            populated_events: RwLock::new(HashSet::new()),
            prepopulation: AtomicBool::new(true),
        }
    }

    pub async fn get_track(&self, id: i64) -> Option<Track> {
        self.tracks.read().await.get(&id)
    }

    pub async fn put_track(&self, track: Track) {
        self.tracks.write().await.insert(track.id, track);
    }

    pub async fn get_submission_type(&self, id: i64) -> Option<SubmissionType> {
        self.submission_types.read().await.get(&id)
    }

    pub async fn put_submission_type(&self, submission_type: SubmissionType) {
        self.submission_types
            .write()
            .await
            .insert(submission_type.id, submission_type);
    }

    pub async fn get_speaker(&self, code: &str) -> Option<Speaker> {
        self.speakers.read().await.get(&code.to_string())
    }

    pub async fn put_speaker(&self, speaker: Speaker) {
        self.speakers
            .write()
            .await
            .insert(speaker.code.clone(), speaker);
    }

    /// `Some(None)` means the answer is known to be unauthorized.
    pub async fn get_answer(&self, id: i64) -> Option<Option<Answer>> {
        self.answers.read().await.get(&id)
    }

    pub async fn put_answer(&self, id: i64, answer: Option<Answer>) {
        self.answers.write().await.insert(id, answer);
    }

    pub async fn get_question(&self, id: i64) -> Option<Question> {
        self.questions.read().await.get(&id)
    }

    pub async fn put_question(&self, question: Question) {
        self.questions.write().await.insert(question.id, question);
    }

    pub async fn get_room(&self, id: i64) -> Option<Room> {
        self.rooms.read().await.get(&id)
    }

    pub async fn put_room(&self, room: Room) {
        self.rooms.write().await.insert(room.id, room);
    }

    pub async fn len(&self, kind: CacheKind) -> usize {
        match kind {
            CacheKind::Tracks => self.tracks.read().await.len(),
            CacheKind::SubmissionTypes => self.submission_types.read().await.len(),
            CacheKind::Speakers => self.speakers.read().await.len(),
            CacheKind::Answers => self.answers.read().await.len(),
            CacheKind::Questions => self.questions.read().await.len(),
            CacheKind::Rooms => self.rooms.read().await.len(),
        }
    }

    pub async fn clear(&self, kind: CacheKind) {
        match kind {
            CacheKind::Tracks => self.tracks.write().await.clear(),
            CacheKind::SubmissionTypes => self.submission_types.write().await.clear(),
            CacheKind::Speakers => self.speakers.write().await.clear(),
            CacheKind::Answers => self.answers.write().await.clear(),
            CacheKind::Questions => self.questions.write().await.clear(),
            CacheKind::Rooms => self.rooms.write().await.clear(),
        }
    }

    /// Clear every kind and forget which events were pre-populated.
    pub async fn clear_all(&self) {
        self.tracks.write().await.clear();
        self.submission_types.write().await.clear();
        self.speakers.write().await.clear();
        self.answers.write().await.clear();
        self.questions.write().await.clear();
        self.rooms.write().await.clear();
        self.populated_events.write().await.clear();
        tracing::info!("all expansion caches cleared");
    }

    /// Enable or disable the bulk pre-population heuristic.
    pub fn set_prepopulation(&self, enabled: bool) {
        self.prepopulation.store(enabled, Ordering::Relaxed);
        tracing::info!(enabled, "cache pre-population toggled");
    }

    pub fn prepopulation_enabled(&self) -> bool {
        self.prepopulation.load(Ordering::Relaxed)
    }

    pub async fn is_populated(&self, event: &str) -> bool {
        self.populated_events.read().await.contains(event)
    }

    pub async fn mark_populated(&self, event: &str) {
        self.populated_events.write().await.insert(event.to_string());
    }
}
