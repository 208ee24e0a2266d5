//! Browser shell: routing, the service bundle and the single app root kept
//! alive for the page lifetime.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use serde_json::{Map, Value, json};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, Url, window};

use crate::audio::EffectOptions;
use crate::audio::web::WebAudio;
use crate::config::AppConfig;
use crate::embed::OriginPolicy;
use crate::embed::web::WebEmbed;
use crate::error::{AppError, ContentError};
use crate::events::{EXPORT_FILE_NAME, EventLog, EventStore, LocalStorage, MemoryStore};
use crate::offline;
use crate::particles::ParticleOptions;
use crate::particles::canvas::ParticleField;
use crate::quiz::content::{FEELINGS_FILE, GOAT_FILE, PREDICT_FILE};
use crate::quiz::{
    Cluster, Content, FEEDBACK_DELAY_MS, FeelingsBoard, GoatPair, Modality, PredictSet, QuizRound, Side, Verdict,
    goat_ambient_level,
};

mod view;

pub const TITLE: &str = "I ONLY KNOW WHAT HAPPENS NEXT";
pub const AMBIENT_TRACK: &str = "audio/ambient_drone.m4a";
const AMBIENT_DELAY_MS: i32 = 1000;
/// How long a feelings item stays highlighted after it starts playing.
const PLAYING_HIGHLIGHT_MS: i32 = 2000;
const FEELINGS_VOLUME: f32 = 0.6;
const GOAT_FADE_SECONDS: f64 = 1.0;
/// Particles dropped on the goat card per correct pick.
const GOAT_BURST: usize = 15;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Home,
    Predict,
    Feelings,
    Goat,
}

impl Route {
    pub const ALL: [Route; 4] = [Route::Home, Route::Predict, Route::Feelings, Route::Goat];

    fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "predict" => Some(Route::Predict),
            "feelings" => Some(Route::Feelings),
            "goat" => Some(Route::Goat),
            _ => None,
        }
    }

    /// Matches on the last path segment so the app can live under a
    /// sub-path. Anything unrecognised is Home.
    pub fn from_path(path: &str) -> Self {
        path.trim_end_matches('/')
            .rsplit('/')
            .next()
            .and_then(Self::from_segment)
            .unwrap_or(Route::Home)
    }

    pub fn path(self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Predict => "/predict",
            Route::Feelings => "/feelings",
            Route::Goat => "/goat",
        }
    }

    /// Lowercase name used in `nav_<name>` events.
    pub fn name(self) -> &'static str {
        match self {
            Route::Home => "home",
            Route::Predict => "predict",
            Route::Feelings => "feelings",
            Route::Goat => "goat",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Route::Home => "Home",
            Route::Predict => "Predict",
            Route::Feelings => "Feelings",
            Route::Goat => "Goat",
        }
    }

    pub fn particle_color(self) -> &'static str {
        match self {
            Route::Home | Route::Goat => "#9cd3ff",
            Route::Predict => "#00ffff",
            Route::Feelings => "#c79bff",
        }
    }

    pub fn footer_text(self) -> &'static str {
        match self {
            Route::Home => "You are not allowed to remember. Only to predict.",
            _ => "Return to the shore when you\u{2019}re ready.",
        }
    }
}

/// Prefix the app is served under: `/contrastive-goat` for
/// `/contrastive-goat/goat`, empty at the domain root.
pub fn base_path(pathname: &str) -> &str {
    let trimmed = pathname.trim_end_matches('/');
    match trimmed.rsplit_once('/') {
        Some((base, last)) if Route::from_segment(last).is_some() || last.contains('.') => base,
        _ => trimmed,
    }
}

pub fn route_href(base: &str, route: Route) -> String {
    format!("{base}{}", route.path())
}

/// State of whichever view is on screen.
pub(crate) enum Screen {
    Home,
    Predict(QuizRound<PredictSet>),
    Feelings(FeelingsBoard),
    Goat(QuizRound<GoatPair>),
}

impl Screen {
    fn open(route: Route, content: &Content) -> Result<Self, ContentError> {
        Ok(match route {
            Route::Home => Screen::Home,
            Route::Predict => Screen::Predict(QuizRound::new(PREDICT_FILE, content.predict.clone())?),
            Route::Feelings => {
                if content.feelings.is_empty() {
                    return Err(ContentError::Empty { file: FEELINGS_FILE });
                }
                Screen::Feelings(FeelingsBoard::new(content.feelings.clone()))
            }
            Route::Goat => Screen::Goat(QuizRound::new(GOAT_FILE, content.goat.clone())?),
        })
    }

    fn route(&self) -> Route {
        match self {
            Screen::Home => Route::Home,
            Screen::Predict(_) => Route::Predict,
            Screen::Feelings(_) => Route::Feelings,
            Screen::Goat(_) => Route::Goat,
        }
    }

    fn score(&self) -> Option<i64> {
        match self {
            Screen::Predict(round) => Some(round.score()),
            Screen::Goat(round) => Some(round.score()),
            _ => None,
        }
    }
}

/// Constructed once at start and shared by every view.
pub struct Services {
    pub audio: WebAudio,
    pub embed: WebEmbed,
    pub events: RefCell<EventLog<Box<dyn EventStore>>>,
    pub particles: Option<ParticleField>,
}

impl Services {
    pub fn track(&self, name: &str, props: Value) {
        self.events.borrow_mut().track(name, props, js_sys::Date::now());
    }
}

type Listener = Closure<dyn FnMut()>;

pub struct App {
    config: AppConfig,
    content: Content,
    services: Services,
    base: String,
    shell: view::Shell,
    screen: RefCell<Screen>,
    /// Bumped on every route change so stale timers can tell.
    epoch: Cell<u64>,
    playing: RefCell<Option<String>>,
    listeners: RefCell<Vec<Listener>>,
    /// Previous render's listeners. One of them may still be on the stack.
    retired: RefCell<Vec<Listener>>,
    shell_listeners: RefCell<Vec<Listener>>,
}

thread_local! {
    static APP: RefCell<Option<Rc<App>>> = const { RefCell::new(None) };
}

/// Builds the services and the shell, renders the route in the address bar
/// and parks the app in the thread-local root.
pub fn start() -> Result<(), AppError> {
    if APP.with(|slot| slot.borrow().is_some()) {
        tracing::warn!("app already started");
        return Ok(());
    }
    let config = AppConfig::from_location();
    let win = window().ok_or(AppError::Missing("window"))?;
    let doc = win.document().ok_or(AppError::Missing("document"))?;
    let content = Content::builtin()?;

    let pathname = win.location().pathname()?;
    let route = Route::from_path(&pathname);
    let base = base_path(&pathname).to_string();

    let store: Box<dyn EventStore> = match LocalStorage::open() {
        Some(store) => Box::new(store),
        None => {
            tracing::warn!("local storage unavailable; events kept in memory");
            Box::new(MemoryStore::default())
        }
    };
    let embed = WebEmbed::install(OriginPolicy::for_build())?;
    let particles = ParticleField::mount(&doc, ParticleOptions::background(route.particle_color()))?;
    if let Some(field) = &particles {
        field.start();
    }

    let shell = view::Shell::build(&doc, config.embed, embed.bridge().borrow().is_embedded())?;
    let app = Rc::new(App {
        config,
        content,
        services: Services {
            audio: WebAudio::new(),
            embed,
            events: RefCell::new(EventLog::open(store)),
            particles,
        },
        base,
        shell,
        screen: RefCell::new(Screen::Home),
        epoch: Cell::new(0),
        playing: RefCell::new(None),
        listeners: RefCell::new(Vec::new()),
        retired: RefCell::new(Vec::new()),
        shell_listeners: RefCell::new(Vec::new()),
    });

    let shell_listeners = view::wire_shell(&app, &win)?;
    *app.shell_listeners.borrow_mut() = shell_listeners;
    app.wire_embed();
    if app.config.embed.auto_start {
        app.ensure_audio();
    }
    app.enter(route);
    offline::worker::register(&win, &app.base);
    tracing::info!(route = route.name(), embedded = app.is_embedded(), "contrastive goat started");

    APP.with(|slot| *slot.borrow_mut() = Some(app));
    Ok(())
}

impl App {
    pub fn route(&self) -> Route {
        self.screen.borrow().route()
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    fn is_embedded(&self) -> bool {
        self.services.embed.bridge().borrow().is_embedded()
    }

    /// Swaps in a fresh view for `route` without touching history.
    fn enter(self: &Rc<Self>, route: Route) {
        self.epoch.set(self.epoch.get() + 1);
        let screen = match Screen::open(route, &self.content) {
            Ok(screen) => screen,
            Err(err) => {
                tracing::error!(%err, "cannot open route; showing home");
                Screen::Home
            }
        };
        let route = screen.route();
        *self.screen.borrow_mut() = screen;
        self.playing.borrow_mut().take();

        if let Some(field) = &self.services.particles {
            field.set_color(route.particle_color());
        }
        self.shell.set_route(route);
        self.render();

        if route == Route::Home {
            self.services.track("view_home", Value::Null);
            let epoch = self.epoch.get();
            self.after(AMBIENT_DELAY_MS, epoch, |app| app.services.audio.start_ambient(AMBIENT_TRACK));
        }
    }

    /// Pushes history, tells the parent page and logs `nav_<route>`.
    pub(crate) fn navigate(self: &Rc<Self>, route: Route) {
        let href = route_href(&self.base, route);
        if let Some(history) = window().and_then(|w| w.history().ok()) {
            if let Err(err) = history.push_state_with_url(&JsValue::NULL, "", Some(&href)) {
                tracing::warn!(err = %crate::error::js_error_message(&err), "pushState failed");
            }
        }
        self.services.embed.bridge().borrow().send_navigation(route.path());
        self.services.track(&format!("nav_{}", route.name()), Value::Null);
        self.enter(route);
    }

    /// Back/forward: follow the address bar without pushing a new entry.
    pub(crate) fn on_popstate(self: &Rc<Self>) {
        let Some(path) = window().and_then(|w| w.location().pathname().ok()) else {
            return;
        };
        let route = Route::from_path(&path);
        self.services.embed.bridge().borrow().send_navigation(route.path());
        self.enter(route);
    }

    fn render(self: &Rc<Self>) {
        match view::render_screen(self, &self.screen.borrow(), self.playing.borrow().as_deref()) {
            Ok(listeners) => {
                let old = self.listeners.replace(listeners);
                *self.retired.borrow_mut() = old;
            }
            Err(err) => tracing::error!(%err, "render failed"),
        }
    }

    /// Runs `f` after `ms` unless the route changed in the meantime.
    fn after<F>(self: &Rc<Self>, ms: i32, epoch: u64, f: F)
    where
        F: FnOnce(&Rc<App>) + 'static,
    {
        let weak: Weak<App> = Rc::downgrade(self);
        let callback = Closure::once_into_js(move || {
            let Some(app) = weak.upgrade() else { return };
            if app.epoch.get() == epoch {
                f(&app);
            }
        });
        let scheduled = window().map(|w| {
            w.set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), ms)
        });
        if !matches!(scheduled, Some(Ok(_))) {
            tracing::warn!(ms, "failed to schedule timer");
        }
    }

    /// Builds the audio graph on the first gesture unless `noAudio` is set.
    pub(crate) fn ensure_audio(self: &Rc<Self>) {
        let audio = &self.services.audio;
        if self.config.embed.no_audio || audio.is_initialized() {
            return;
        }
        audio.init();
        if audio.is_initialized() && self.route() == Route::Home {
            audio.start_ambient(AMBIENT_TRACK);
        }
        self.refresh_panel();
    }

    pub(crate) fn toggle_mute(&self) {
        let muted = self.services.audio.toggle_mute();
        tracing::debug!(muted, "mute toggled");
        self.refresh_panel();
    }

    pub(crate) fn set_volume(&self, volume: f32) {
        self.services.audio.set_volume(volume);
        self.refresh_panel();
    }

    /// `pagehide`: stops the frame loop and closes the audio graph. Audio
    /// comes back on the next click, particles on `pageshow`.
    pub(crate) fn suspend(&self) {
        if let Some(field) = &self.services.particles {
            field.stop();
        }
        self.services.audio.teardown();
        self.refresh_panel();
        tracing::debug!("page hidden; audio closed");
    }

    pub(crate) fn resume(&self) {
        if let Some(field) = &self.services.particles {
            field.start();
        }
    }

    fn refresh_panel(&self) {
        let audio = &self.services.audio;
        self.shell
            .refresh_panel(audio.is_initialized(), audio.is_muted(), audio.volume());
    }

    fn report(&self, verdict: &Verdict) {
        let services = &self.services;
        services.track(verdict.event, verdict.props.clone());
        let bridge = services.embed.bridge();
        let bridge = bridge.borrow();
        bridge.send_interaction(verdict.event, verdict.props.clone());
        let mut state = Map::new();
        state.insert("route".into(), json!(self.route().path()));
        if let Some(score) = self.screen.borrow().score() {
            state.insert("score".into(), json!(score));
        }
        bridge.send_state(state);
    }

    fn feedback_sound(&self, correct: bool) {
        if correct {
            self.services.audio.play_success();
        } else {
            self.services.audio.play_failure();
        }
    }

    fn schedule_advance(self: &Rc<Self>) {
        let epoch = self.epoch.get();
        self.after(FEEDBACK_DELAY_MS, epoch, |app| {
            match &mut *app.screen.borrow_mut() {
                Screen::Predict(round) => round.advance(),
                Screen::Goat(round) => round.advance(),
                _ => return,
            }
            app.render();
        });
    }

    pub(crate) fn choose_predict(self: &Rc<Self>, idx: usize) {
        let verdict = match &mut *self.screen.borrow_mut() {
            Screen::Predict(round) => round.answer(idx),
            _ => None,
        };
        let Some(verdict) = verdict else { return };
        self.services.audio.play_click();
        self.report(&verdict);
        self.feedback_sound(verdict.correct);
        self.render();
        self.schedule_advance();
    }

    pub(crate) fn pick_goat(self: &Rc<Self>, side: Side) {
        let verdict = match &mut *self.screen.borrow_mut() {
            Screen::Goat(round) => round.answer(side),
            _ => None,
        };
        let Some(verdict) = verdict else { return };
        let audio = &self.services.audio;
        audio.play_click();
        self.report(&verdict);
        self.feedback_sound(verdict.correct);
        audio.fade_ambient(goat_ambient_level(verdict.previous_score, verdict.correct), GOAT_FADE_SECONDS);
        if verdict.correct {
            self.burst_on_goats();
        }
        self.render();
        self.schedule_advance();
    }

    fn burst_on_goats(&self) {
        let Some(field) = &self.services.particles else { return };
        let Some((x, y)) = self.shell.goat_center() else { return };
        for _ in 0..GOAT_BURST {
            field.add_burst(x, y);
        }
    }

    pub(crate) fn select_feeling(self: &Rc<Self>, id: &str) {
        let picked = match &mut *self.screen.borrow_mut() {
            Screen::Feelings(board) => board.select(id).cloned(),
            _ => None,
        };
        let Some(item) = picked else { return };
        let audio = &self.services.audio;
        audio.play_click();
        if let (Modality::Audio, Some(src)) = (item.modality, &item.src) {
            audio.play_effect(src, EffectOptions::with_volume(FEELINGS_VOLUME));
            *self.playing.borrow_mut() = Some(item.id.clone());
            let epoch = self.epoch.get();
            let id = item.id.clone();
            self.after(PLAYING_HIGHLIGHT_MS, epoch, move |app| {
                let still = app.playing.borrow().as_deref() == Some(id.as_str());
                if still {
                    app.playing.borrow_mut().take();
                    app.render();
                }
            });
        }
        self.render();
    }

    pub(crate) fn drop_feeling(self: &Rc<Self>, cluster: Cluster) {
        let props = match &mut *self.screen.borrow_mut() {
            Screen::Feelings(board) => board.drop_selected(cluster),
            _ => None,
        };
        let Some(props) = props else { return };
        self.services.track("feelings_drop", props);
        self.services.audio.play_click();
        self.render();
    }

    /// Downloads the event log as `events.jsonl`.
    pub(crate) fn export_events(&self) -> Result<(), AppError> {
        let text = self.services.events.borrow().export_jsonl();
        let doc = window()
            .and_then(|w| w.document())
            .ok_or(AppError::Missing("document"))?;
        let parts = js_sys::Array::of1(&JsValue::from_str(&text));
        let options = BlobPropertyBag::new();
        options.set_type("application/x-ndjson");
        let blob = Blob::new_with_str_sequence_and_options(&parts, &options)?;
        let url = Url::create_object_url_with_blob(&blob)?;
        let anchor: HtmlAnchorElement = doc
            .create_element("a")?
            .dyn_into()
            .map_err(|_| AppError::Dom("created element is not an anchor".to_string()))?;
        anchor.set_href(&url);
        anchor.set_download(EXPORT_FILE_NAME);
        anchor.click();
        Url::revoke_object_url(&url)?;
        tracing::info!(events = self.services.events.borrow().events().len(), "events exported");
        Ok(())
    }

    pub(crate) fn request_fullscreen(&self) {
        self.services.embed.bridge().borrow().request_fullscreen();
    }

    /// Inbound parent messages: `navigate {route}`, `setVolume {volume}`,
    /// `toggleMute`.
    fn wire_embed(self: &Rc<Self>) {
        let bridge = self.services.embed.bridge();
        let mut bridge = bridge.borrow_mut();

        let weak = Rc::downgrade(self);
        bridge.on("navigate", move |data| {
            let Some(app) = weak.upgrade() else { return };
            if let Some(path) = data.get("route").and_then(Value::as_str) {
                app.navigate(Route::from_path(path));
            }
        });

        let weak = Rc::downgrade(self);
        bridge.on("setVolume", move |data| {
            let Some(app) = weak.upgrade() else { return };
            if let Some(volume) = data.get("volume").and_then(Value::as_f64) {
                app.set_volume(volume as f32);
            }
        });

        let weak = Rc::downgrade(self);
        bridge.on("toggleMute", move |_| {
            if let Some(app) = weak.upgrade() {
                app.toggle_mute();
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_match_last_segment() {
        assert_eq!(Route::from_path("/"), Route::Home);
        assert_eq!(Route::from_path(""), Route::Home);
        assert_eq!(Route::from_path("/goat"), Route::Goat);
        assert_eq!(Route::from_path("/goat/"), Route::Goat);
        assert_eq!(Route::from_path("/contrastive-goat/feelings"), Route::Feelings);
        assert_eq!(Route::from_path("/contrastive-goat/"), Route::Home);
        assert_eq!(Route::from_path("/nowhere"), Route::Home);
        for route in Route::ALL {
            assert_eq!(Route::from_path(route.path()), route);
        }
    }

    #[test]
    fn base_path_strips_route_and_file() {
        assert_eq!(base_path("/"), "");
        assert_eq!(base_path("/predict"), "");
        assert_eq!(base_path("/contrastive-goat/goat"), "/contrastive-goat");
        assert_eq!(base_path("/contrastive-goat/"), "/contrastive-goat");
        assert_eq!(base_path("/contrastive-goat/index.html"), "/contrastive-goat");
        assert_eq!(route_href("/contrastive-goat", Route::Home), "/contrastive-goat/");
        assert_eq!(route_href("", Route::Predict), "/predict");
    }

    #[test]
    fn footer_depends_on_route() {
        assert_eq!(Route::Home.footer_text(), "You are not allowed to remember. Only to predict.");
        assert!(Route::Goat.footer_text().starts_with("Return to the shore"));
    }

    #[test]
    fn screens_open_from_builtin_content() {
        let content = Content::builtin().unwrap();
        for route in Route::ALL {
            let screen = Screen::open(route, &content).unwrap();
            assert_eq!(screen.route(), route);
        }
        assert_eq!(Screen::open(Route::Goat, &content).unwrap().score(), Some(0));
        assert_eq!(Screen::Home.score(), None);
    }
}
