//! Leaderboard HTTP service
//!
//! Single-threaded: requests are handled one at a time, so the score table
//! needs no locking. Configured with `PORT` (default 3001) and `SCORES_DB`
//! (default `scores.json`).

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use std::io::Read;

    use punch_run::leaderboard::{CORS_HEADERS, ScoreTable, handle};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3001);
    let db = std::env::var("SCORES_DB").unwrap_or_else(|_| "scores.json".to_string());

    let mut table = ScoreTable::load(&db);
    log::info!("Loaded {} scores from {}", table.len(), db);

    let server = match tiny_http::Server::http(("0.0.0.0", port)) {
        Ok(server) => server,
        Err(e) => {
            log::error!("Failed to bind port {}: {}", port, e);
            std::process::exit(1);
        }
    };
    log::info!("Leaderboard server listening on :{}", port);

    for mut request in server.incoming_requests() {
        let mut body = String::new();
        if let Err(e) = request.as_reader().read_to_string(&mut body) {
            log::warn!("Failed to read request body: {}", e);
        }

        let method = request.method().to_string().to_uppercase();
        let url = request.url().to_string();
        let reply = handle(
            &mut table,
            &method,
            &url,
            &body,
            punch_run::iso_date(punch_run::now_ms()),
        );
        log::debug!("{} {} -> {}", method, url, reply.status);

        let payload = if reply.body.is_null() {
            String::new()
        } else {
            reply.body.to_string()
        };
        let mut response = tiny_http::Response::from_string(payload).with_status_code(reply.status);
        let headers = CORS_HEADERS
            .iter()
            .copied()
            .chain(std::iter::once(("Content-Type", "application/json")));
        for (name, value) in headers {
            if let Ok(header) = tiny_http::Header::from_bytes(name.as_bytes(), value.as_bytes()) {
                response.add_header(header);
            }
        }

        if let Err(e) = request.respond(response) {
            log::warn!("Failed to send response: {}", e);
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The leaderboard service is native only
}
