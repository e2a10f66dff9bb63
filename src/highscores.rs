//! High score leaderboard
//!
//! `HighScores` is the ranked top-10 table. A `LeaderboardStore` persists it
//! somewhere (a local JSON file here); `LeaderboardClient` runs the store on
//! a worker thread so the game loop never waits on it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, unbounded};
use serde::{Deserialize, Serialize};

use crate::error::LeaderboardError;

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;
/// Pilot names are stored upper-case, at most this many characters
pub const MAX_NAME_LEN: usize = 5;

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: u32,
    /// Unix timestamp (ms) when achieved
    pub timestamp: f64,
}

/// Upper-case and truncate a pilot name
pub fn normalize_name(name: &str) -> Result<String, LeaderboardError> {
    let name: String = name
        .trim()
        .chars()
        .flat_map(char::to_uppercase)
        .take(MAX_NAME_LEN)
        .collect();
    if name.is_empty() {
        return Err(LeaderboardError::EmptyName);
    }
    Ok(name)
}

/// High score leaderboard, sorted descending by score
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<LeaderboardEntry>,
}

impl HighScores {
    /// Create empty leaderboard
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u32) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        // Check if score beats the lowest entry
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Get the rank a score would achieve (1-indexed, None if doesn't qualify)
    pub fn potential_rank(&self, score: u32) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Add a new score to the leaderboard (if it qualifies)
    /// Returns the rank achieved (1-indexed) or None if didn't qualify
    pub fn add_score(&mut self, name: &str, score: u32, timestamp: f64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }

        let entry = LeaderboardEntry {
            name: name.to_string(),
            score,
            timestamp,
        };

        // Ties keep the earlier entry ahead
        let pos = self.entries.iter().position(|e| score > e.score);
        let rank = match pos {
            Some(i) => {
                self.entries.insert(i, entry);
                i + 1
            }
            None => {
                self.entries.push(entry);
                self.entries.len()
            }
        };

        self.entries.truncate(MAX_HIGH_SCORES);

        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u32> {
        self.entries.first().map(|e| e.score)
    }

    /// Re-sort and trim entries that came from storage
    fn normalized(mut self) -> Self {
        self.entries.sort_by(|a, b| b.score.cmp(&a.score));
        self.entries.retain(|e| e.score > 0);
        self.entries.truncate(MAX_HIGH_SCORES);
        self
    }
}

/// Where the leaderboard lives
pub trait LeaderboardStore: Send {
    /// Top scores, best first
    fn fetch_top_scores(&mut self) -> Result<Vec<LeaderboardEntry>, LeaderboardError>;

    /// Record a score; returns the rank if it made the table
    fn submit_score(&mut self, name: &str, score: u32) -> Result<Option<usize>, LeaderboardError>;
}

/// Leaderboard kept in a local JSON file
#[derive(Debug, Clone)]
pub struct LocalLeaderboard {
    path: PathBuf,
}

impl LocalLeaderboard {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load high scores; a missing file is an empty table
    pub fn load(&self) -> Result<HighScores, LeaderboardError> {
        match std::fs::read_to_string(&self.path) {
            Ok(json) => {
                let scores = serde_json::from_str::<HighScores>(&json)?.normalized();
                log::debug!("Loaded {} high scores", scores.entries.len());
                Ok(scores)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HighScores::new()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, scores: &HighScores) -> Result<(), LeaderboardError> {
        let json = serde_json::to_string_pretty(scores)?;
        std::fs::write(&self.path, json)?;
        log::info!("High scores saved ({} entries)", scores.entries.len());
        Ok(())
    }
}

impl LeaderboardStore for LocalLeaderboard {
    fn fetch_top_scores(&mut self) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        Ok(self.load()?.entries)
    }

    fn submit_score(&mut self, name: &str, score: u32) -> Result<Option<usize>, LeaderboardError> {
        let name = normalize_name(name)?;
        let mut scores = self.load()?;
        let rank = scores.add_score(&name, score, crate::now_millis());
        if rank.is_some() {
            self.save(&scores)?;
        }
        Ok(rank)
    }
}

/// Results delivered back to the game
#[derive(Debug, Clone, PartialEq)]
pub enum LeaderboardUpdate {
    TopScores(Vec<LeaderboardEntry>),
    Submitted { name: String, score: u32, rank: Option<usize> },
    FetchFailed(String),
    SubmitFailed(String),
}

enum Request {
    Fetch,
    Submit { name: String, score: u32 },
}

/// Asynchronous front end for a `LeaderboardStore`
///
/// Dropping the client never waits on the store. The worker thread is
/// detached and exits once it has nobody left to report to, abandoning
/// anything still queued.
#[derive(Debug)]
pub struct LeaderboardClient {
    requests: Sender<Request>,
    updates: Receiver<LeaderboardUpdate>,
}

impl LeaderboardClient {
    /// Start the worker thread that owns the store
    pub fn spawn<S>(store: S) -> Result<Self, LeaderboardError>
    where
        S: LeaderboardStore + 'static,
    {
        let (send_request, recv_request) = unbounded();
        let (send_update, recv_update) = unbounded();
        std::thread::Builder::new()
            .name("leaderboard".into())
            .spawn(move || worker_thread(store, recv_request, send_update))?;
        Ok(Self {
            requests: send_request,
            updates: recv_update,
        })
    }

    fn send(&self, request: Request) -> Result<(), LeaderboardError> {
        self.requests
            .send(request)
            .map_err(|_| LeaderboardError::WorkerGone)
    }

    /// Queue a fetch; the result arrives through `poll`
    pub fn request_top_scores(&self) -> Result<(), LeaderboardError> {
        self.send(Request::Fetch)
    }

    /// Queue a submit followed by a refreshed fetch
    pub fn submit_score(&self, name: &str, score: u32) -> Result<(), LeaderboardError> {
        let name = normalize_name(name)?;
        self.send(Request::Submit { name, score })
    }

    /// Everything that has arrived so far, without blocking
    pub fn poll(&self) -> Vec<LeaderboardUpdate> {
        self.updates.try_iter().collect()
    }

    /// Block for the next update, up to `timeout`
    pub fn wait(&self, timeout: Duration) -> Option<LeaderboardUpdate> {
        self.updates.recv_timeout(timeout).ok()
    }
}

// body of the worker thread
fn worker_thread<S: LeaderboardStore>(
    mut store: S,
    recv_request: Receiver<Request>,
    send_update: Sender<LeaderboardUpdate>,
) {
    for request in recv_request {
        let updates = match request {
            Request::Fetch => vec![fetch(&mut store)],
            Request::Submit { name, score } => {
                let submitted = match store.submit_score(&name, score) {
                    Ok(rank) => LeaderboardUpdate::Submitted { name, score, rank },
                    Err(e) => {
                        log::warn!("Leaderboard submit failed: {e}");
                        LeaderboardUpdate::SubmitFailed(e.to_string())
                    }
                };
                vec![submitted, fetch(&mut store)]
            }
        };
        for update in updates {
            if send_update.send(update).is_err() {
                log::debug!("Leaderboard client dropped, worker stopping");
                return;
            }
        }
    }
    log::debug!("Leaderboard worker stopped");
}

fn fetch<S: LeaderboardStore>(store: &mut S) -> LeaderboardUpdate {
    match store.fetch_top_scores() {
        Ok(entries) => LeaderboardUpdate::TopScores(entries),
        Err(e) => {
            log::warn!("Leaderboard fetch failed: {e}");
            LeaderboardUpdate::FetchFailed(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAIT: Duration = Duration::from_secs(5);

    #[derive(Default)]
    struct MemoryStore(HighScores);

    impl LeaderboardStore for MemoryStore {
        fn fetch_top_scores(&mut self) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
            Ok(self.0.entries.clone())
        }

        fn submit_score(
            &mut self,
            name: &str,
            score: u32,
        ) -> Result<Option<usize>, LeaderboardError> {
            Ok(self.0.add_score(name, score, 0.0))
        }
    }

    struct OfflineStore;

    impl LeaderboardStore for OfflineStore {
        fn fetch_top_scores(&mut self) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
            Err(LeaderboardError::Unavailable("offline".into()))
        }

        fn submit_score(&mut self, _: &str, _: u32) -> Result<Option<usize>, LeaderboardError> {
            Err(LeaderboardError::Unavailable("offline".into()))
        }
    }

    /// Store that takes its time answering
    struct SlowStore(Duration);

    impl LeaderboardStore for SlowStore {
        fn fetch_top_scores(&mut self) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
            std::thread::sleep(self.0);
            Ok(Vec::new())
        }

        fn submit_score(&mut self, _: &str, _: u32) -> Result<Option<usize>, LeaderboardError> {
            std::thread::sleep(self.0);
            Ok(None)
        }
    }

    #[test]
    fn test_ranking_and_trim() {
        let mut scores = HighScores::new();
        assert!(!scores.qualifies(0));
        for s in 1..=12 {
            scores.add_score("AAA", s, 0.0);
        }
        assert_eq!(scores.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(scores.top_score(), Some(12));
        assert_eq!(scores.entries.last().map(|e| e.score), Some(3));
        assert!(!scores.qualifies(3));
        assert_eq!(scores.potential_rank(4), Some(10));
        assert_eq!(scores.add_score("BBB", 100, 0.0), Some(1));
    }

    #[test]
    fn test_tie_keeps_earlier_entry_first() {
        let mut scores = HighScores::new();
        scores.add_score("FIRST", 5, 0.0);
        assert_eq!(scores.add_score("LATER", 5, 1.0), Some(2));
    }

    #[test]
    fn test_name_normalization() {
        assert_eq!(normalize_name("  ziggy stardust").unwrap(), "ZIGGY");
        assert_eq!(normalize_name("ab").unwrap(), "AB");
        assert!(matches!(normalize_name("   "), Err(LeaderboardError::EmptyName)));
    }

    #[test]
    fn test_local_store_round_trip() {
        let path = std::env::temp_dir().join("galactic_flappy_scores_test.json");
        let _ = std::fs::remove_file(&path);
        let mut store = LocalLeaderboard::new(&path);
        assert!(store.fetch_top_scores().unwrap().is_empty());
        assert_eq!(store.submit_score("ace", 7).unwrap(), Some(1));
        assert_eq!(store.submit_score("bob", 0).unwrap(), None);
        assert_eq!(store.submit_score("cat", 9).unwrap(), Some(1));

        let entries = LocalLeaderboard::new(&path).fetch_top_scores().unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["CAT", "ACE"]);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_corrupt_store_is_error() {
        let path = std::env::temp_dir().join("galactic_flappy_scores_corrupt_test.json");
        std::fs::write(&path, "not json").unwrap();
        let mut store = LocalLeaderboard::new(&path);
        assert!(matches!(store.fetch_top_scores(), Err(LeaderboardError::Parse(_))));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_client_submit_then_fetch() {
        let client = LeaderboardClient::spawn(MemoryStore::default()).unwrap();
        client.submit_score("nova", 12).unwrap();
        assert_eq!(
            client.wait(WAIT),
            Some(LeaderboardUpdate::Submitted {
                name: "NOVA".into(),
                score: 12,
                rank: Some(1),
            })
        );
        match client.wait(WAIT) {
            Some(LeaderboardUpdate::TopScores(entries)) => {
                assert_eq!(entries.len(), 1);
                assert_eq!(entries[0].score, 12);
            }
            other => panic!("unexpected update {other:?}"),
        }
        assert!(client.poll().is_empty());
    }

    #[test]
    fn test_client_reports_failures() {
        let client = LeaderboardClient::spawn(OfflineStore).unwrap();
        client.request_top_scores().unwrap();
        assert!(matches!(client.wait(WAIT), Some(LeaderboardUpdate::FetchFailed(_))));
        assert!(matches!(
            client.submit_score("", 3),
            Err(LeaderboardError::EmptyName)
        ));
    }

    #[test]
    fn test_drop_does_not_wait_for_queued_requests() {
        let client = LeaderboardClient::spawn(SlowStore(Duration::from_millis(500))).unwrap();
        client.request_top_scores().unwrap();
        client.request_top_scores().unwrap();
        client.submit_score("ace", 3).unwrap();

        let started = std::time::Instant::now();
        drop(client);
        assert!(started.elapsed() < Duration::from_millis(250));
    }
}
