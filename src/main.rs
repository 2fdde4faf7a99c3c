//! Punch Run entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlCanvasElement, HtmlInputElement, KeyboardEvent, TouchEvent};

    use punch_run::audio::AudioManager;
    use punch_run::consts::*;
    use punch_run::highscores::{LocalScores, ScoreEntry, format_date};
    use punch_run::leaderboard::{self, GlobalBoard};
    use punch_run::market::{self, MarketWatcher};
    use punch_run::renderer::{RenderState, SceneOptions, build_scene};
    use punch_run::settings::Settings;
    use punch_run::sim::{
        Collaborators, EngineConfig, FrameInput, GameEngine, GameEvent, GamePhase, PowerUpKind,
    };
    use punch_run::wallet::{Wallet, WalletState};
    use punch_run::ScoreStore;

    /// Swipe distance that counts as a duck
    const SWIPE_DUCK_PX: f32 = 28.0;

    // Wallet provider bindings
    #[wasm_bindgen(inline_js = "
        export async function connect_wallet() {
            const provider = (window.phantom && window.phantom.solana) || window.solana;
            if (!provider) {
                throw new Error('No wallet found');
            }
            const resp = await provider.connect();
            return resp.publicKey.toString();
        }

        export async function token_balance(owner) {
            const mint = window.PUNCH_TOKEN_MINT;
            if (!mint) {
                return 0;
            }
            const rpc = window.PUNCH_RPC || 'https://api.mainnet-beta.solana.com';
            const res = await fetch(rpc, {
                method: 'POST',
                headers: { 'Content-Type': 'application/json' },
                body: JSON.stringify({
                    jsonrpc: '2.0',
                    id: 1,
                    method: 'getTokenAccountsByOwner',
                    params: [owner, { mint }, { encoding: 'jsonParsed' }],
                }),
            });
            const json = await res.json();
            const accounts = (json.result && json.result.value) || [];
            return accounts.reduce(
                (sum, acc) => sum + (acc.account.data.parsed.info.tokenAmount.uiAmount || 0),
                0,
            );
        }
    ")]
    extern "C" {
        #[wasm_bindgen(catch)]
        async fn connect_wallet() -> Result<JsValue, JsValue>;
        #[wasm_bindgen(catch)]
        async fn token_balance(owner: &str) -> Result<JsValue, JsValue>;
    }

    /// Game instance holding all state
    struct Game {
        engine: GameEngine,
        render_state: Option<RenderState>,
        last_time: f64,
        input: FrameInput,
        /// Where the current touch started (client px)
        touch_start: Option<(f32, f32)>,
        audio: AudioManager,
        scores: LocalScores,
        wallet: WalletState,
        market: MarketWatcher,
        settings: Settings,
        global: GlobalBoard,
        // FPS tracking
        frame_times: [f64; 60],
        frame_index: usize,
        fps: u32,
    }

    impl Game {
        fn new(config: EngineConfig, settings: Settings) -> Self {
            let mut audio = AudioManager::new();
            audio.apply_settings(&settings);
            Self {
                engine: GameEngine::new(config),
                render_state: None,
                last_time: 0.0,
                input: FrameInput::default(),
                touch_start: None,
                audio,
                scores: LocalScores::load(),
                wallet: WalletState::new(),
                market: MarketWatcher::new(),
                settings,
                global: GlobalBoard::Loading,
                frame_times: [0.0; 60],
                frame_index: 0,
                fps: 0,
            }
        }

        /// Advance the engine and route its events
        fn update(&mut self, dt: f32, time: f64) {
            let input = self.input;
            let events = {
                let mut collab = Collaborators {
                    market: &self.market,
                    wallet: &self.wallet,
                    store: &mut self.scores,
                };
                self.engine.frame(dt, &input, &mut collab)
            };

            // Clear one-shot inputs after processing
            self.input.jump = false;
            self.input.pause = false;
            self.input.start = false;

            for event in &events {
                self.audio.handle(event);
                match event {
                    GameEvent::NamePrompt { score } => {
                        show_name_prompt(*score, self.scores.board.potential_rank(*score))
                    }
                    GameEvent::RunFinalized { name, score } => {
                        log::info!("Run saved for {} ({} pts)", name, score);
                        hide_name_prompt();
                    }
                    _ => {}
                }
            }
            self.audio.update();

            // Track frame times for FPS
            self.frame_times[self.frame_index] = time;
            self.frame_index = (self.frame_index + 1) % 60;
            let oldest_time = self.frame_times[self.frame_index];
            if oldest_time > 0.0 {
                let elapsed = time - oldest_time;
                if elapsed > 0.0 {
                    self.fps = (60000.0 / elapsed).round() as u32;
                }
            }
        }

        /// Render the current frame
        fn render(&mut self) {
            let options = SceneOptions {
                reduced_motion: self.settings.reduced_motion,
            };
            if let Some(ref mut render_state) = self.render_state {
                let vertices = build_scene(&self.engine, options);
                match render_state.render(&vertices) {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        render_state.resize(render_state.size.0, render_state.size.1);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory!");
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }
        }

        /// Save the pending run under the typed name
        fn submit_name(&mut self, name: &str) {
            let mut collab = Collaborators {
                market: &self.market,
                wallet: &self.wallet,
                store: &mut self.scores,
            };
            self.engine.finalize_game_over(name, &mut collab);
        }

        fn cycle_density(&mut self) {
            self.settings.density = self.settings.density.next();
            self.settings.particles = true;
            self.settings.save();
            self.engine.set_max_particles(self.settings.max_particles());
            log::info!("Particles: {}", self.settings.density.as_str());
        }

        fn toggle_fps(&mut self) {
            self.settings.show_fps = !self.settings.show_fps;
            self.settings.save();
        }

        /// Pause for a lost tab or focus. Only ever enters PAUSED, so a
        /// blur followed by a visibility change cannot resume the run.
        fn auto_pause(&mut self, reason: &str) {
            if !self.settings.pause_on_hide || self.engine.phase != GamePhase::Running {
                return;
            }
            self.engine.pause();
            for event in self.engine.take_events() {
                self.audio.handle(&event);
            }
            log::info!("Auto-paused ({})", reason);
        }

        fn toggle_mute(&mut self) {
            self.settings.toggle_mute();
            self.settings.save();
            self.audio.apply_settings(&self.settings);
            log::info!("Muted: {}", self.settings.muted);
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            let hud = self.engine.hud(self.scores.best_score());

            set_text(&document, "#hud-score .hud-value", &hud.score.to_string());
            set_text(&document, "#hud-best .hud-value", &hud.best.to_string());
            set_text(&document, "#hud-time .hud-value", &format!("{}s", hud.time));
            set_text(&document, "#hud-streak .hud-value", &hud.streak.to_string());
            set_text(&document, "#hud-biome", hud.biome);
            set_visible(&document, "hud-combo", hud.combo);
            set_visible(&document, "hud-weekend", hud.weekend);

            let market = format!(
                "{} {}",
                self.market.display_string(),
                self.engine.market_mode.label()
            );
            set_text(&document, "#hud-market", market.trim());

            let effects: Vec<String> = self
                .engine
                .powerups
                .hud_items()
                .into_iter()
                .map(|item| item.label)
                .collect();
            set_text(&document, "#hud-effects", &effects.join("  "));

            if self.settings.show_fps {
                set_text(&document, "#hud-fps .hud-value", &self.fps.to_string());
            }
            set_visible(&document, "hud-fps", self.settings.show_fps);

            // Popup banner
            if let Some(el) = document.get_element_by_id("popup") {
                match self.engine.popups.current() {
                    Some(popup) => {
                        el.set_text_content(Some(&popup.text));
                        let _ = el.set_attribute(
                            "style",
                            &format!("color:#{:06X};opacity:{:.2}", popup.color, popup.alpha()),
                        );
                        let _ = el.set_attribute("class", "");
                    }
                    None => {
                        let _ = el.set_attribute("class", "hidden");
                    }
                }
            }

            // Floating "+N" labels
            if let Some(layer) = document.get_element_by_id("float-layer") {
                layer.set_inner_html("");
                for float in &self.engine.popups.floats {
                    if let Ok(span) = document.create_element("span") {
                        span.set_text_content(Some(&float.text));
                        let _ = span.set_attribute(
                            "style",
                            &format!(
                                "left:{:.1}%;top:{:.1}%;color:#{:06X};opacity:{:.2}",
                                float.pos.x / WORLD_W * 100.0,
                                float.pos.y / WORLD_H * 100.0,
                                float.color,
                                (float.timer / FLOAT_TIME).clamp(0.0, 1.0)
                            ),
                        );
                        let _ = layer.append_child(&span);
                    }
                }
            }

            // Wallet button
            let wallet_label = if self.wallet.is_connected() {
                let perks = self.wallet.tier();
                match perks.display_name {
                    Some(tier) => format!("{} {}", self.wallet.short_address(), tier),
                    None => self.wallet.short_address(),
                }
            } else {
                "Connect Wallet".to_string()
            };
            set_text(&document, "#wallet-btn", &wallet_label);
            set_text(
                &document,
                "#wallet-error",
                self.wallet.error.as_deref().unwrap_or(""),
            );

            let phase = self.engine.phase;
            set_visible(&document, "menu", phase == GamePhase::Menu);
            set_visible(&document, "pause-menu", phase == GamePhase::Paused);
            set_visible(
                &document,
                "game-over",
                matches!(phase, GamePhase::GameOver | GamePhase::Ranking),
            );

            if let Some(data) = &self.engine.game_over {
                set_text(&document, "#final-score", &(data.score.floor() as u64).to_string());
                set_text(&document, "#final-time", &format!("{}s", data.time.floor() as u32));
                set_text(&document, "#final-coins", &data.coin_count.to_string());
                set_text(&document, "#final-streak", &data.best_streak.to_string());
                set_text(&document, "#final-best", &data.best_score.to_string());
                set_text(&document, "#final-biome", data.biome);
                set_text(
                    &document,
                    "#final-powerup",
                    data.best_powerup.map(PowerUpKind::label).unwrap_or("-"),
                );
                set_text(&document, "#final-name", data.player_name.as_deref().unwrap_or(""));
                if phase == GamePhase::Ranking {
                    set_text(&document, "#share-text", &data.share_text(&page_url()));
                }
            }
            set_visible(&document, "ranking", phase == GamePhase::Ranking);

            fill_board(&document, "local-board", &self.scores.board.entries);
            set_text(&document, "#global-status", self.global.status_text());
            match &self.global {
                GlobalBoard::Cached(entries) => fill_board(&document, "global-board", entries),
                _ => fill_board(&document, "global-board", &[]),
            }
        }
    }

    fn set_text(document: &Document, selector: &str, text: &str) {
        if let Some(el) = document.query_selector(selector).ok().flatten() {
            if el.text_content().as_deref() != Some(text) {
                el.set_text_content(Some(text));
            }
        }
    }

    fn set_visible(document: &Document, id: &str, visible: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
        }
    }

    /// Rebuild a leaderboard list; names go in as text, never markup
    fn fill_board(document: &Document, id: &str, entries: &[ScoreEntry]) {
        let Some(list) = document.get_element_by_id(id) else {
            return;
        };
        let stamp = entries
            .iter()
            .map(|e| format!("{}:{}", e.name, e.score))
            .collect::<Vec<_>>()
            .join("|");
        if list.get_attribute("data-stamp").as_deref() == Some(stamp.as_str()) {
            return;
        }
        let _ = list.set_attribute("data-stamp", &stamp);
        list.set_inner_html("");
        for (i, entry) in entries.iter().enumerate() {
            if let Ok(li) = document.create_element("li") {
                li.set_text_content(Some(&format!(
                    "{}. {}  {}  ({}s, {})",
                    i + 1,
                    entry.name,
                    entry.score,
                    entry.time,
                    format_date(js_sys::Date::parse(&entry.date))
                )));
                let _ = list.append_child(&li);
            }
        }
    }

    fn page_url() -> String {
        web_sys::window()
            .and_then(|w| w.location().href().ok())
            .unwrap_or_default()
    }

    fn name_input(document: &Document) -> Option<HtmlInputElement> {
        document.get_element_by_id("name-input")?.dyn_into().ok()
    }

    fn show_name_prompt(score: u64, rank: Option<usize>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        let label = match rank {
            Some(rank) => format!("{} (local #{})", score, rank),
            None => score.to_string(),
        };
        set_text(&document, "#name-score", &label);
        set_visible(&document, "name-modal", true);
        if let Some(input) = name_input(&document) {
            let _ = input.focus();
        }
    }

    fn hide_name_prompt() {
        if let Some(document) = web_sys::window().and_then(|w| w.document()) {
            set_visible(&document, "name-modal", false);
        }
    }

    /// Read the modal and finalize the run
    fn submit_name_from_modal(game: &Rc<RefCell<Game>>) {
        let name = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| name_input(&d))
            .map(|input| input.value())
            .unwrap_or_default();
        game.borrow_mut().submit_name(&name);
    }

    fn embed_mode() -> bool {
        web_sys::window()
            .and_then(|w| w.location().search().ok())
            .map(|q| q.contains("mode=embed"))
            .unwrap_or(false)
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Punch Run starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        // Set canvas size
        let dpr = window.device_pixel_ratio();
        let width = (canvas.client_width() as f64 * dpr) as u32;
        let height = (canvas.client_height() as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);

        let settings = Settings::load();
        let now = punch_run::now_ms();
        let config = EngineConfig {
            seed: now as u64,
            embed_mode: embed_mode(),
            weekend: punch_run::is_weekend(now),
            max_particles: settings.max_particles(),
        };
        log::info!(
            "Game initialized with seed {} (embed: {}, weekend: {})",
            config.seed,
            config.embed_mode,
            config.weekend
        );
        let game = Rc::new(RefCell::new(Game::new(config, settings)));

        // Initialize WebGPU
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .expect("Failed to create surface");

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("Failed to get adapter");

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let render_state = RenderState::new(surface, &adapter, width, height)
            .await
            .expect("Failed to create device");
        game.borrow_mut().render_state = Some(render_state);

        setup_input_handlers(&canvas, game.clone());
        setup_buttons(game.clone());
        setup_auto_pause(game.clone());

        if let Some(hud) = document.get_element_by_id("hud") {
            let _ = hud.set_attribute("class", "");
        }

        refresh_global_board(game.clone());

        // Start game loop
        request_animation_frame(game);

        log::info!("Punch Run running!");
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        // Keyboard
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let phase = game.borrow().engine.phase;
                if phase == GamePhase::GameOver {
                    // The name modal owns the keyboard
                    if event.key() == "Enter" {
                        submit_name_from_modal(&game);
                    }
                    return;
                }

                let mut g = game.borrow_mut();
                g.audio.unlock();
                match event.key().as_str() {
                    " " | "ArrowUp" | "w" | "W" => {
                        event.prevent_default();
                        if !event.repeat() {
                            g.input.jump = true;
                        }
                    }
                    "ArrowDown" | "s" | "S" => {
                        event.prevent_default();
                        g.input.duck_held = true;
                    }
                    "p" | "P" | "Escape" => g.input.pause = true,
                    "Enter" => g.input.start = true,
                    "m" | "M" => g.toggle_mute(),
                    "f" | "F" => g.toggle_fps(),
                    "d" | "D" => g.cycle_density(),
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if matches!(event.key().as_str(), "ArrowDown" | "s" | "S") {
                    game.borrow_mut().input.duck_held = false;
                }
            });
            let _ = window
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch start: upper/left jumps, lower-right ducks
        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                let Some(touch) = event.touches().get(0) else {
                    return;
                };
                let mut g = game.borrow_mut();
                g.audio.unlock();
                let rect = canvas_clone.get_bounding_client_rect();
                let x = touch.client_x() as f32 - rect.left() as f32;
                let y = touch.client_y() as f32 - rect.top() as f32;
                g.touch_start = Some((touch.client_x() as f32, touch.client_y() as f32));

                let lower_right = x > rect.width() as f32 / 2.0 && y > rect.height() as f32 / 2.0;
                if lower_right && g.engine.phase == GamePhase::Running {
                    g.input.duck_held = true;
                } else {
                    g.input.jump = true;
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch move: swipe down ducks
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                let Some(touch) = event.touches().get(0) else {
                    return;
                };
                let mut g = game.borrow_mut();
                if let Some((_, start_y)) = g.touch_start {
                    if touch.client_y() as f32 - start_y > SWIPE_DUCK_PX {
                        g.input.duck_held = true;
                    }
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("touchmove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch end releases the duck
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: TouchEvent| {
                let mut g = game.borrow_mut();
                g.touch_start = None;
                g.input.duck_held = false;
            });
            let _ = canvas
                .add_event_listener_with_callback("touchend", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn on_click(document: &Document, id: &str, mut handler: impl FnMut() + 'static) {
        if let Some(btn) = document.get_element_by_id(id) {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                handler();
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_buttons(game: Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        {
            let game = game.clone();
            on_click(&document, "start-btn", move || {
                let mut g = game.borrow_mut();
                g.audio.unlock();
                g.input.start = true;
            });
        }
        {
            let game = game.clone();
            on_click(&document, "restart-btn", move || {
                let mut g = game.borrow_mut();
                g.audio.unlock();
                g.input.start = true;
            });
        }
        {
            let game = game.clone();
            on_click(&document, "resume-btn", move || {
                game.borrow_mut().input.pause = true;
            });
        }
        {
            let game = game.clone();
            on_click(&document, "name-submit", move || submit_name_from_modal(&game));
        }
        {
            let game = game.clone();
            on_click(&document, "mute-btn", move || game.borrow_mut().toggle_mute());
        }
        on_click(&document, "wallet-btn", move || {
            if game.borrow().wallet.is_connected() {
                game.borrow_mut().wallet.disconnect();
                log::info!("Wallet disconnected");
            } else {
                connect_wallet_flow(game.clone());
            }
        });
    }

    fn connect_wallet_flow(game: Rc<RefCell<Game>>) {
        wasm_bindgen_futures::spawn_local(async move {
            let pubkey = match connect_wallet().await {
                Ok(value) => value.as_string(),
                Err(e) => {
                    let reason = e
                        .dyn_ref::<js_sys::Error>()
                        .map(|e| String::from(e.message()))
                        .unwrap_or_else(|| "Connection rejected".to_string());
                    game.borrow_mut().wallet.connect_failed(reason);
                    return;
                }
            };
            let Some(pubkey) = pubkey else {
                game.borrow_mut().wallet.connect_failed("Connection rejected");
                return;
            };
            game.borrow_mut().wallet.connect(pubkey.clone());

            let balance = match token_balance(&pubkey).await {
                Ok(value) => value.as_f64().unwrap_or(0.0),
                Err(_) => {
                    log::warn!("Token balance lookup failed");
                    0.0
                }
            };
            game.borrow_mut().wallet.set_balance(balance.max(0.0) as u64);
        });
    }

    fn setup_auto_pause(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(document) = window.document() else {
            return;
        };

        // Visibility change (tab switch, minimize)
        {
            let game = game.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    game.borrow_mut().auto_pause("tab hidden");
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Window blur (click outside)
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                game.borrow_mut().auto_pause("window blur");
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn refresh_global_board(game: Rc<RefCell<Game>>) {
        wasm_bindgen_futures::spawn_local(async move {
            let board = leaderboard::fetch_global_leaderboard().await;
            if board.is_none() {
                log::warn!("Global leaderboard unreachable");
            }
            game.borrow_mut().global.apply(board);
        });
    }

    fn submit_score(game: Rc<RefCell<Game>>, entry: ScoreEntry) {
        wasm_bindgen_futures::spawn_local(async move {
            match leaderboard::submit_to_global(&entry).await {
                Some(rank) => log::info!("Global rank #{} for {}", rank, entry.name),
                None => log::warn!("Score submission failed, server offline"),
            }
            let board = leaderboard::fetch_global_leaderboard().await;
            game.borrow_mut().global.apply(board);
        });
    }

    fn poll_market(game: Rc<RefCell<Game>>) {
        wasm_bindgen_futures::spawn_local(async move {
            let result = market::fetch_quote().await;
            game.borrow_mut().market.apply(result);
        });
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        let (submissions, market_due) = {
            let mut g = game.borrow_mut();

            // Calculate delta time
            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                0.0
            };
            g.last_time = time;

            g.update(dt, time);
            g.render();
            g.update_hud();

            (
                g.scores.take_submissions(),
                g.market.begin_poll(punch_run::now_ms()),
            )
        };

        for entry in submissions {
            submit_score(game.clone(), entry);
        }
        if market_due {
            poll_market(game.clone());
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Punch Run (native) starting...");
    log::info!("Native mode is headless - run with `trunk serve` for the web version");

    demo_run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Play one run with a naive autopilot and print the summary
#[cfg(not(target_arch = "wasm32"))]
fn demo_run() {
    use punch_run::consts::*;
    use punch_run::highscores::LocalScores;
    use punch_run::market::MarketMode;
    use punch_run::sim::{Collaborators, EngineConfig, FrameInput, GameEngine, GamePhase};
    use punch_run::wallet::NoWallet;

    let now = punch_run::now_ms();
    let mut engine = GameEngine::new(EngineConfig {
        seed: now as u64,
        embed_mode: true,
        weekend: punch_run::is_weekend(now),
        ..Default::default()
    });
    let market = MarketMode::Neutral;
    let wallet = NoWallet;
    let mut scores = LocalScores::in_memory();

    let mut input = FrameInput {
        start: true,
        ..Default::default()
    };
    let dt = 1.0 / 60.0;

    // Five minutes of frames at most
    for _ in 0..(60 * 300) {
        let mut collab = Collaborators {
            market: &market,
            wallet: &wallet,
            store: &mut scores,
        };
        engine.frame(dt, &input, &mut collab);
        if engine.phase == GamePhase::Ranking {
            break;
        }

        // Jump ground hazards, duck low bars
        let player_x = engine.player.pos.x + engine.player.size.x;
        let ahead = engine
            .spawn
            .obstacles
            .iter()
            .filter(|o| o.pos.x > player_x - 10.0 && o.pos.x - player_x < 90.0)
            .min_by(|a, b| a.pos.x.total_cmp(&b.pos.x));
        input = FrameInput::default();
        if let Some(o) = ahead {
            if o.kind.is_ground() {
                input.jump = engine.player.grounded;
            } else if o.pos.y + o.size.y > GROUND_Y - PLAYER_H {
                input.duck_held = true;
            }
        }
    }

    match &engine.game_over {
        Some(data) => println!(
            "Run over in {} after {:.1}s: {} pts, {} coins, best streak {}",
            data.biome,
            data.time,
            data.score.floor(),
            data.coin_count,
            data.best_streak
        ),
        None => println!(
            "Autopilot survived: {} pts after {:.1}s",
            engine.run.score.floor(),
            engine.run.survival_time
        ),
    }
}
