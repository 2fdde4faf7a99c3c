//! Local leaderboard and best score
//!
//! Persisted to LocalStorage, keeps the top 25 runs. Ties keep insertion
//! order: a new score lands after existing entries with the same value.

use serde::{Deserialize, Serialize};

/// Maximum number of local entries to keep
pub const MAX_HIGH_SCORES: usize = 25;
/// Longest name stored locally
pub const MAX_LOCAL_NAME: usize = 16;

/// One finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEntry {
    pub name: String,
    pub score: u64,
    /// Survival time, whole seconds
    pub time: u32,
    #[serde(default, alias = "plush")]
    pub coin_count: u32,
    /// Best streak in the run
    #[serde(default)]
    pub streak: u32,
    /// ISO-8601 timestamp
    #[serde(default)]
    pub date: String,
}

/// Where finished runs go
pub trait ScoreStore {
    /// Persist locally, updating the best score and the capped board
    fn save_score(&mut self, entry: ScoreEntry);
    fn best_score(&self) -> u64;
    /// Highest score first
    fn leaderboard(&self) -> Vec<ScoreEntry>;
    /// Queue for the global board. Never blocks, never fails the caller.
    fn submit_to_global(&mut self, entry: &ScoreEntry);
}

/// Local leaderboard, highest first
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<ScoreEntry>,
}

impl HighScores {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "punch_run_leaderboard";

    /// Create empty leaderboard
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Check if a score would stay on the board
    pub fn qualifies(&self, score: u64) -> bool {
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Get the rank a score would achieve (1-indexed, None if doesn't qualify)
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Insert an entry, returning its rank (1-indexed) or None if it fell off
    pub fn add_score(&mut self, entry: ScoreEntry) -> Option<usize> {
        if !self.qualifies(entry.score) {
            return None;
        }

        // Find insertion point (sorted descending by score, ties after)
        let pos = self.entries.iter().position(|e| entry.score > e.score);
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

    /// Best score on the board, if any
    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// Load high scores from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        match read_storage(Self::STORAGE_KEY).and_then(|json| serde_json::from_str::<HighScores>(&json).ok()) {
            Some(scores) => {
                log::info!("Loaded {} high scores", scores.entries.len());
                scores
            }
            None => {
                log::info!("No high scores found, starting fresh");
                Self::new()
            }
        }
    }

    /// Save high scores to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            write_storage(Self::STORAGE_KEY, &json);
            log::info!("High scores saved ({} entries)", self.entries.len());
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::new()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

/// Browser-backed [`ScoreStore`]: local board, best score, and an outbox of
/// runs waiting to be sent to the global board
#[derive(Debug, Clone, Default)]
pub struct LocalScores {
    pub board: HighScores,
    best: u64,
    outbox: Vec<ScoreEntry>,
    persist: bool,
}

impl LocalScores {
    #[allow(dead_code)]
    const BEST_KEY: &'static str = "punch_run_best";

    /// In-memory store (tests, native)
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Store backed by LocalStorage
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let best = read_storage(Self::BEST_KEY)
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0);
        Self {
            board: HighScores::load(),
            best,
            outbox: Vec::new(),
            persist: true,
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::in_memory()
    }

    /// Drain runs queued for the global board
    pub fn take_submissions(&mut self) -> Vec<ScoreEntry> {
        std::mem::take(&mut self.outbox)
    }

    fn save(&self) {
        if !self.persist {
            return;
        }
        self.board.save();
        #[cfg(target_arch = "wasm32")]
        write_storage(Self::BEST_KEY, &self.best.to_string());
    }
}

impl ScoreStore for LocalScores {
    fn save_score(&mut self, mut entry: ScoreEntry) {
        entry.name = entry.name.chars().take(MAX_LOCAL_NAME).collect();
        if entry.date.is_empty() {
            entry.date = crate::iso_date(crate::now_ms());
        }
        self.best = self.best.max(entry.score);
        let rank = self.board.add_score(entry);
        log::info!("Score saved locally (rank {:?}, best {})", rank, self.best);
        self.save();
    }

    fn best_score(&self) -> u64 {
        self.best
    }

    fn leaderboard(&self) -> Vec<ScoreEntry> {
        self.board.entries.clone()
    }

    fn submit_to_global(&mut self, entry: &ScoreEntry) {
        self.outbox.push(entry.clone());
    }
}

#[cfg(target_arch = "wasm32")]
fn read_storage(key: &str) -> Option<String> {
    let storage = web_sys::window()?.local_storage().ok()??;
    storage.get_item(key).ok()?
}

#[cfg(target_arch = "wasm32")]
fn write_storage(key: &str, value: &str) {
    let storage = web_sys::window()
        .and_then(|w| w.local_storage().ok())
        .flatten();
    match storage {
        Some(storage) => {
            if storage.set_item(key, value).is_err() {
                log::warn!("LocalStorage write failed for {}", key);
            }
        }
        None => log::warn!("LocalStorage unavailable"),
    }
}

/// Format a timestamp as a relative date string
#[cfg(target_arch = "wasm32")]
pub fn format_date(timestamp: f64) -> String {
    let diff_mins = (js_sys::Date::now() - timestamp) / 60_000.0;
    let diff_hours = diff_mins / 60.0;
    let diff_days = diff_hours / 24.0;

    if diff_days >= 1.0 {
        let days = diff_days.floor() as i32;
        if days == 1 {
            "Yesterday".to_string()
        } else if days < 7 {
            format!("{} days ago", days)
        } else {
            let date = js_sys::Date::new(&wasm_bindgen::JsValue::from_f64(timestamp));
            format!(
                "{}/{}/{}",
                date.get_month() + 1,
                date.get_date(),
                date.get_full_year() % 100
            )
        }
    } else if diff_hours >= 1.0 {
        format!("{}h ago", diff_hours.floor() as i32)
    } else if diff_mins >= 1.0 {
        format!("{}m ago", diff_mins.floor() as i32)
    } else {
        "Just now".to_string()
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn format_date(_timestamp: f64) -> String {
    "N/A".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn entry(name: &str, score: u64) -> ScoreEntry {
        ScoreEntry {
            name: name.to_string(),
            score,
            time: 10,
            coin_count: 0,
            streak: 0,
            date: "2024-01-01T00:00:00.000Z".to_string(),
        }
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let mut hs = HighScores::new();
        hs.add_score(entry("first", 500));
        hs.add_score(entry("second", 500));
        hs.add_score(entry("top", 900));
        let names: Vec<&str> = hs.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["top", "first", "second"]);
    }

    #[test]
    fn test_cap_at_25() {
        let mut hs = HighScores::new();
        for i in 0..30 {
            hs.add_score(entry("x", i * 10));
        }
        assert_eq!(hs.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(hs.top_score(), Some(290));
        // Tie with the lowest kept entry does not qualify
        let lowest = hs.entries.last().map(|e| e.score).unwrap_or(0);
        assert!(!hs.qualifies(lowest));
        assert_eq!(hs.add_score(entry("tie", lowest)), None);
    }

    #[test]
    fn test_zero_score_recorded_when_room() {
        let mut hs = HighScores::new();
        assert_eq!(hs.add_score(entry("zero", 0)), Some(1));
    }

    #[test]
    fn test_potential_rank() {
        let mut hs = HighScores::new();
        hs.add_score(entry("a", 300));
        hs.add_score(entry("b", 100));
        assert_eq!(hs.potential_rank(200), Some(2));
        assert_eq!(hs.potential_rank(50), Some(3));
    }

    #[test]
    fn test_local_store_best_and_trim() {
        let mut store = LocalScores::in_memory();
        store.save_score(entry("a-very-long-player-name", 400));
        store.save_score(entry("b", 200));
        assert_eq!(store.best_score(), 400);
        assert_eq!(store.leaderboard()[0].name.chars().count(), MAX_LOCAL_NAME);
        assert_eq!(store.leaderboard()[1].score, 200);
    }

    #[test]
    fn test_outbox() {
        let mut store = LocalScores::in_memory();
        store.submit_to_global(&entry("a", 10));
        assert_eq!(store.take_submissions().len(), 1);
        assert!(store.take_submissions().is_empty());
        // Submitting does not touch the local board
        assert!(store.leaderboard().is_empty());
    }

    #[test]
    fn test_entry_json_shape() {
        let json = serde_json::to_value(entry("a", 1)).unwrap_or_default();
        assert!(json.get("coinCount").is_some());
        let legacy: ScoreEntry = serde_json::from_str(
            r#"{"name":"x","score":5,"time":1,"plush":3,"streak":2,"date":""}"#,
        )
        .unwrap_or_else(|_| entry("bad", 0));
        assert_eq!(legacy.coin_count, 3);
    }

    proptest! {
        #[test]
        fn prop_board_sorted_and_capped(scores in proptest::collection::vec(0u64..10_000, 0..80)) {
            let mut hs = HighScores::new();
            for s in &scores {
                hs.add_score(entry("p", *s));
            }
            prop_assert!(hs.entries.len() <= MAX_HIGH_SCORES);
            prop_assert!(hs.entries.windows(2).all(|w| w[0].score >= w[1].score));
            let max = scores.iter().copied().max();
            prop_assert_eq!(hs.top_score(), max);
        }
    }
}
