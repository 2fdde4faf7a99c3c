//! Global leaderboard
//!
//! Two halves share the entry format:
//! - [`ScoreTable`] and [`handle`]: the service side, a JSON file backed
//!   table behind three routes, served by the `leaderboard-server` binary
//! - [`GlobalBoard`] plus the wasm fetch helpers: the browser side, which
//!   never blocks a frame and keeps "offline" distinct from "empty"

use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use thiserror::Error;

use crate::highscores::ScoreEntry;

/// Rows kept by the service
pub const MAX_TABLE: usize = 500;
/// Rows returned by `GET /api/leaderboard`
pub const TOP_N: usize = 25;
/// Longest name the service stores
pub const MAX_REMOTE_NAME: usize = 20;

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("score required")]
    MissingScore,
    #[error("malformed body: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("could not persist scores: {0}")]
    Persist(#[from] std::io::Error),
}

impl SubmitError {
    pub fn status(&self) -> u16 {
        match self {
            SubmitError::MissingScore | SubmitError::Malformed(_) => 400,
            SubmitError::Persist(_) => 500,
        }
    }
}

/// Sorted score table, optionally mirrored to a JSON file
#[derive(Debug, Default)]
pub struct ScoreTable {
    scores: Vec<ScoreEntry>,
    path: Option<PathBuf>,
}

impl ScoreTable {
    /// Table that never touches disk
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load from `path` if it exists. An unreadable file starts empty.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let scores = match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<Vec<ScoreEntry>>(&text) {
                Ok(scores) => {
                    log::info!("Loaded {} scores from {}", scores.len(), path.display());
                    scores
                }
                Err(e) => {
                    log::warn!("Ignoring unreadable {}: {}", path.display(), e);
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        };
        Self {
            scores,
            path: Some(path),
        }
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn top(&self, n: usize) -> &[ScoreEntry] {
        &self.scores[..n.min(self.scores.len())]
    }

    /// Validate and insert a submission, returning its 1-based rank in the
    /// full table. A rejected body leaves the table untouched.
    pub fn submit(&mut self, body: &Value, date: String) -> Result<usize, SubmitError> {
        let score = body
            .get("score")
            .and_then(Value::as_f64)
            .ok_or(SubmitError::MissingScore)?;

        let name = match body.get("name") {
            None | Some(Value::Null) => "Anonymous".to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };
        let floor = |key: &str| -> u64 {
            body.get(key)
                .and_then(Value::as_f64)
                .map(|v| v.floor().max(0.0) as u64)
                .unwrap_or(0)
        };
        let coin_count = match body.get("coinCount") {
            Some(_) => floor("coinCount"),
            None => floor("plush"),
        };

        let entry = ScoreEntry {
            name: name.chars().take(MAX_REMOTE_NAME).collect(),
            score: score.floor().max(0.0) as u64,
            time: floor("time") as u32,
            coin_count: coin_count as u32,
            streak: floor("streak") as u32,
            date,
        };

        // Stable: after every existing entry with an equal score
        let pos = self
            .scores
            .iter()
            .position(|e| entry.score > e.score)
            .unwrap_or(self.scores.len());
        let mut next = self.scores.clone();
        next.insert(pos, entry);
        next.truncate(MAX_TABLE);
        // Only a table that reached disk is served
        self.persist(&next)?;
        self.scores = next;

        Ok(pos + 1)
    }

    fn persist(&self, scores: &[ScoreEntry]) -> Result<(), SubmitError> {
        if let Some(path) = &self.path {
            let json = serde_json::to_string_pretty(scores)?;
            std::fs::write(path, json)?;
        }
        Ok(())
    }
}

/// Status and JSON body for one request
#[derive(Debug, Clone, PartialEq)]
pub struct HttpReply {
    pub status: u16,
    /// `Null` means no body
    pub body: Value,
}

impl HttpReply {
    fn json(status: u16, body: Value) -> Self {
        Self { status, body }
    }
}

/// Headers attached to every response
pub const CORS_HEADERS: [(&str, &str); 3] = [
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Methods", "GET, POST, OPTIONS"),
    ("Access-Control-Allow-Headers", "Content-Type"),
];

/// Route a request. `date` stamps accepted submissions.
pub fn handle(table: &mut ScoreTable, method: &str, url: &str, body: &str, date: String) -> HttpReply {
    let path = url.split('?').next().unwrap_or(url);
    match (method, path) {
        ("OPTIONS", _) => HttpReply::json(204, Value::Null),
        ("GET", "/health") => HttpReply::json(200, json!({ "ok": true })),
        ("GET", "/api/leaderboard") => {
            let top = serde_json::to_value(table.top(TOP_N)).unwrap_or_else(|_| json!([]));
            HttpReply::json(200, top)
        }
        ("POST", "/api/score") => {
            let result = serde_json::from_str::<Value>(body)
                .map_err(SubmitError::from)
                .and_then(|value| table.submit(&value, date));
            match result {
                Ok(rank) => {
                    log::info!("Accepted score, rank {}", rank);
                    HttpReply::json(200, json!({ "ok": true, "rank": rank }))
                }
                Err(e) => {
                    log::warn!("Rejected submission: {}", e);
                    HttpReply::json(e.status(), json!({ "error": e.to_string() }))
                }
            }
        }
        _ => HttpReply::json(404, json!({ "error": "not found" })),
    }
}

/// Client-side view of the global board
#[derive(Debug, Clone, PartialEq, Default)]
pub enum GlobalBoard {
    #[default]
    Loading,
    Cached(Vec<ScoreEntry>),
    /// Server unreachable; not the same as an empty board
    Offline,
}

impl GlobalBoard {
    /// Fold a fetch result in. `None` means the server was unreachable.
    pub fn apply(&mut self, result: Option<Vec<ScoreEntry>>) {
        *self = match result {
            Some(entries) => GlobalBoard::Cached(entries),
            None => GlobalBoard::Offline,
        };
    }

    pub fn status_text(&self) -> &'static str {
        match self {
            GlobalBoard::Loading => "Loading...",
            GlobalBoard::Cached(entries) if entries.is_empty() => "No scores yet",
            GlobalBoard::Cached(_) => "",
            GlobalBoard::Offline => "Server offline",
        }
    }
}

/// Service base URL: `window.PUNCH_SERVER`, else this host on port 3001
#[cfg(target_arch = "wasm32")]
pub fn server_base() -> String {
    let Some(window) = web_sys::window() else {
        return String::new();
    };
    if let Some(base) = js_sys::Reflect::get(&window, &"PUNCH_SERVER".into())
        .ok()
        .and_then(|v| v.as_string())
    {
        return base;
    }
    let location = window.location();
    format!(
        "{}//{}:3001",
        location.protocol().unwrap_or_else(|_| "http:".into()),
        location.hostname().unwrap_or_default()
    )
}

#[cfg(target_arch = "wasm32")]
async fn fetch_json(request: &web_sys::Request) -> Option<Value> {
    use wasm_bindgen::JsCast;
    use wasm_bindgen_futures::JsFuture;

    let window = web_sys::window()?;
    let resp = JsFuture::from(window.fetch_with_request(request)).await.ok()?;
    let resp: web_sys::Response = resp.dyn_into().ok()?;
    if !resp.ok() {
        return None;
    }
    let text = JsFuture::from(resp.text().ok()?).await.ok()?;
    serde_json::from_str(&text.as_string()?).ok()
}

/// Submit a finished run. Returns the global rank, `None` on any failure.
#[cfg(target_arch = "wasm32")]
pub async fn submit_to_global(entry: &ScoreEntry) -> Option<u64> {
    let body = json!({
        "name": entry.name,
        "score": entry.score,
        "time": entry.time,
        "coinCount": entry.coin_count,
        "streak": entry.streak,
    });
    let init = web_sys::RequestInit::new();
    init.set_method("POST");
    init.set_mode(web_sys::RequestMode::Cors);
    init.set_body(&body.to_string().into());
    let url = format!("{}/api/score", server_base());
    let request = web_sys::Request::new_with_str_and_init(&url, &init).ok()?;
    request
        .headers()
        .set("Content-Type", "application/json")
        .ok()?;
    let reply = fetch_json(&request).await?;
    reply.get("rank").and_then(Value::as_u64)
}

/// Fetch the top of the global board. `None` means unreachable.
#[cfg(target_arch = "wasm32")]
pub async fn fetch_global_leaderboard() -> Option<Vec<ScoreEntry>> {
    let url = format!("{}/api/leaderboard", server_base());
    let request = web_sys::Request::new_with_str(&url).ok()?;
    let value = fetch_json(&request).await?;
    serde_json::from_value(value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATE: &str = "2024-06-01T12:00:00.000Z";

    fn post(table: &mut ScoreTable, body: &str) -> HttpReply {
        handle(table, "POST", "/api/score", body, DATE.to_string())
    }

    #[test]
    fn test_non_numeric_score_rejected() {
        let mut table = ScoreTable::in_memory();
        post(&mut table, r#"{"name":"a","score":10}"#);
        let reply = post(&mut table, r#"{"name":"b","score":"lots"}"#);
        assert_eq!(reply.status, 400);
        assert_eq!(table.len(), 1);

        let reply = post(&mut table, r#"{"name":"c"}"#);
        assert_eq!(reply.status, 400);
        let reply = post(&mut table, "not json");
        assert_eq!(reply.status, 400);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_rejected_submission_leaves_file_untouched() {
        let path = std::env::temp_dir().join(format!(
            "punch_run_scores_{}.json",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        let mut table = ScoreTable::load(&path);
        assert_eq!(post(&mut table, r#"{"name":"a","score":10}"#).status, 200);
        let before = std::fs::read_to_string(&path).unwrap_or_default();

        assert_eq!(post(&mut table, r#"{"score":null}"#).status, 400);
        let after = std::fs::read_to_string(&path).unwrap_or_default();
        assert_eq!(before, after);

        let reloaded = ScoreTable::load(&path);
        assert_eq!(reloaded.len(), 1);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_failed_write_keeps_table_unchanged() {
        // A directory cannot be written as a file
        let dir = std::env::temp_dir().join(format!("punch_run_db_dir_{}", std::process::id()));
        let _ = std::fs::create_dir_all(&dir);
        let mut table = ScoreTable::load(&dir);
        assert!(table.is_empty());

        let reply = post(&mut table, r#"{"name":"a","score":10}"#);
        assert_eq!(reply.status, 500);
        assert_eq!(table.len(), 0);
        let board = handle(&mut table, "GET", "/api/leaderboard", "", DATE.to_string());
        assert_eq!(board.body, json!([]));
        let _ = std::fs::remove_dir(&dir);
    }

    #[test]
    fn test_rank_and_ties() {
        let mut table = ScoreTable::in_memory();
        assert_eq!(
            post(&mut table, r#"{"name":"a","score":100}"#).body,
            json!({"ok": true, "rank": 1})
        );
        assert_eq!(post(&mut table, r#"{"name":"b","score":300}"#).body["rank"], 1);
        // Tie lands after the existing 100
        assert_eq!(post(&mut table, r#"{"name":"c","score":100}"#).body["rank"], 3);
        let names: Vec<&str> = table.top(10).iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_fields_normalized() {
        let mut table = ScoreTable::in_memory();
        post(
            &mut table,
            r#"{"name":"abcdefghijklmnopqrstuvwxyz","score":99.9,"time":12.8,"plush":4}"#,
        );
        let e = &table.top(1)[0];
        assert_eq!(e.name, "abcdefghijklmnopqrst");
        assert_eq!(e.score, 99);
        assert_eq!(e.time, 12);
        assert_eq!(e.coin_count, 4);
        assert_eq!(e.streak, 0);
        assert_eq!(e.date, DATE);

        post(&mut table, r#"{"score":5}"#);
        assert_eq!(table.top(2)[1].name, "Anonymous");
    }

    #[test]
    fn test_table_capped() {
        let mut table = ScoreTable::in_memory();
        for i in 0..(MAX_TABLE + 20) {
            let _ = table.submit(&json!({ "score": i }), DATE.to_string());
        }
        assert_eq!(table.len(), MAX_TABLE);
        let reply = handle(&mut table, "GET", "/api/leaderboard", "", DATE.to_string());
        assert_eq!(reply.body.as_array().map(Vec::len), Some(TOP_N));
        assert_eq!(reply.body[0]["score"], (MAX_TABLE + 19) as u64);
    }

    #[test]
    fn test_routes() {
        let mut table = ScoreTable::in_memory();
        let health = handle(&mut table, "GET", "/health", "", DATE.to_string());
        assert_eq!(health.body, json!({"ok": true}));
        assert_eq!(
            handle(&mut table, "OPTIONS", "/api/score", "", DATE.to_string()).status,
            204
        );
        assert_eq!(
            handle(&mut table, "GET", "/nope", "", DATE.to_string()).status,
            404
        );
        assert_eq!(
            handle(&mut table, "GET", "/api/leaderboard?x=1", "", DATE.to_string()).body,
            json!([])
        );
    }

    #[test]
    fn test_global_board_states() {
        let mut board = GlobalBoard::default();
        assert_eq!(board.status_text(), "Loading...");
        board.apply(Some(Vec::new()));
        assert_eq!(board.status_text(), "No scores yet");
        board.apply(None);
        assert_eq!(board, GlobalBoard::Offline);
        assert_eq!(board.status_text(), "Server offline");
    }
}
