//! DOM for the shell and the four views, built with inline styles and
//! rebuilt wholesale on every state change.

use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlElement, HtmlInputElement, Node, Window};

use super::{App, Listener, Route, Screen, TITLE};
use crate::embed::EmbedMode;
use crate::error::AppError;
use crate::quiz::{Cluster, FeelingsBoard, GoatPair, GoatShape, PredictSet, QuizRound, Side};

const ROOT_ID: &str = "root";
const GOAT_ID: &str = "cg-goat";

const ACCENT: &str = "#9cd3ff";
const FUTURE: &str = "#00ffff";
const DREAM: &str = "#c79bff";

const SHELL_STYLE: &str = "min-height:100%; display:flex; flex-direction:column; color:#e6f0f2; font-family:system-ui, sans-serif;";
const HEADER_STYLE: &str = "padding:1rem; display:flex; gap:.75rem; align-items:center; border-bottom:1px solid #18303d;";
const MAIN_STYLE: &str = "padding:1.25rem; flex:1;";
const FOOTER_STYLE: &str = "padding:1rem; border-top:1px solid #18303d; opacity:.7; font-size:.9rem;";
const PANEL_STYLE: &str = "position:fixed; right:12px; bottom:12px; display:flex; gap:.5rem; align-items:center; padding:6px 10px; background:rgba(15,26,33,0.85); border:1px solid #18303d; border-radius:10px; z-index:40; font-size:.85rem;";
const BTN: &str = "padding:.5rem .9rem; background:rgba(24,48,61,0.6); color:#e6f0f2; border:1px solid #18303d; border-radius:10px; cursor:pointer;";
const CARD: &str = "padding:1.25rem; margin-bottom:1rem; background:rgba(15,26,33,0.8); border:1px solid #18303d; border-radius:14px;";
const FEEDBACK: &str = "margin-top:1.5rem; padding:1rem; background:rgba(156,211,255,0.1); border-radius:12px; text-align:center; font-style:italic; font-size:1.05rem;";
const SCORE_BOX: &str = "margin-top:1.5rem; padding:.75rem; background:rgba(24,48,61,0.5); border-radius:10px; text-align:center;";

fn heading_style(from: &str, to: &str) -> String {
    format!(
        "margin-top:0; background:linear-gradient(90deg, {from}, {to}); -webkit-background-clip:text; -webkit-text-fill-color:transparent; background-clip:text;"
    )
}

fn el(doc: &Document, tag: &str, style: &str) -> Result<HtmlElement, AppError> {
    let node: HtmlElement = doc
        .create_element(tag)?
        .dyn_into()
        .map_err(|_| AppError::Dom(format!("<{tag}> is not an html element")))?;
    if !style.is_empty() {
        node.set_attribute("style", style).ok();
    }
    Ok(node)
}

fn text(doc: &Document, tag: &str, style: &str, content: &str) -> Result<HtmlElement, AppError> {
    let node = el(doc, tag, style)?;
    node.set_text_content(Some(content));
    Ok(node)
}

fn append_text(parent: &Node, doc: &Document, tag: &str, style: &str, content: &str) -> Result<(), AppError> {
    let child = text(doc, tag, style, content)?;
    parent.append_child(&child)?;
    Ok(())
}

fn button(doc: &Document, label: &str, style: &str, disabled: bool) -> Result<HtmlElement, AppError> {
    let b = text(doc, "button", style, label)?;
    if disabled {
        b.set_attribute("disabled", "").ok();
    }
    Ok(b)
}

/// Every click first gives audio its chance to start, since browsers only
/// allow that inside a user gesture.
fn on_click<F>(app: &Rc<App>, target: &HtmlElement, f: F) -> Listener
where
    F: Fn(&Rc<App>) + 'static,
{
    let weak = Rc::downgrade(app);
    let cb = Closure::wrap(Box::new(move || {
        let Some(app) = weak.upgrade() else { return };
        app.ensure_audio();
        f(&app);
    }) as Box<dyn FnMut()>);
    target.set_onclick(Some(cb.as_ref().unchecked_ref()));
    cb
}

struct Panel {
    enable: HtmlElement,
    mute: HtmlElement,
    volume: HtmlInputElement,
}

/// Header, main slot, footer and the audio panel.
pub(crate) struct Shell {
    nav: Vec<(Route, HtmlElement)>,
    main: Element,
    footer_text: HtmlElement,
    export: HtmlElement,
    fullscreen: Option<HtmlElement>,
    panel: Option<Panel>,
}

impl Shell {
    /// Mounts into `#root`, creating it when the page has none. `minimal`
    /// hides header and footer; `noAudio` drops the audio panel.
    pub(crate) fn build(doc: &Document, mode: EmbedMode, embedded: bool) -> Result<Self, AppError> {
        let body = doc.body().ok_or(AppError::Missing("document body"))?;
        let root: Element = match doc.get_element_by_id(ROOT_ID) {
            Some(root) => root,
            None => {
                let root = el(doc, "div", "")?;
                root.set_id(ROOT_ID);
                body.append_child(&root)?;
                root.into()
            }
        };
        root.set_inner_html("");
        let shell = el(doc, "div", SHELL_STYLE)?;
        root.append_child(&shell)?;

        let header = el(doc, "header", HEADER_STYLE)?;
        append_text(&header, doc, "div", "font-weight:700; letter-spacing:.4px; opacity:.9;", TITLE)?;
        let nav_bar = el(doc, "nav", "margin-left:auto; display:flex; gap:.5rem;")?;
        let mut nav = Vec::with_capacity(Route::ALL.len());
        for route in Route::ALL {
            let b = button(doc, route.label(), BTN, false)?;
            nav_bar.append_child(&b)?;
            nav.push((route, b));
        }
        let fullscreen = if embedded {
            let b = button(doc, "\u{26F6}", BTN, false)?;
            b.set_attribute("aria-label", "Fullscreen").ok();
            nav_bar.append_child(&b)?;
            Some(b)
        } else {
            None
        };
        header.append_child(&nav_bar)?;

        let main = el(doc, "main", MAIN_STYLE)?;

        let footer = el(doc, "footer", FOOTER_STYLE)?;
        let footer_text = el(doc, "span", "")?;
        let export = button(doc, "Export Events", "margin-left:1rem;", false)?;
        footer.append_child(&footer_text)?;
        footer.append_child(&export)?;

        if mode.minimal {
            header.style().set_property("display", "none")?;
            footer.style().set_property("display", "none")?;
        }
        shell.append_child(&header)?;
        shell.append_child(&main)?;
        shell.append_child(&footer)?;

        let panel = if mode.no_audio {
            None
        } else {
            let bar = el(doc, "div", PANEL_STYLE)?;
            let enable = button(doc, "Enable audio", BTN, false)?;
            let mute = button(doc, "Mute", BTN, true)?;
            let volume: HtmlInputElement = doc
                .create_element("input")?
                .dyn_into()
                .map_err(|_| AppError::Dom("<input> is not an input element".to_string()))?;
            volume.set_type("range");
            volume.set_min("0");
            volume.set_max("1");
            volume.set_step("0.01");
            volume.set_value("1");
            volume.set_attribute("aria-label", "Volume").ok();
            volume.set_disabled(true);
            bar.append_child(&enable)?;
            bar.append_child(&mute)?;
            bar.append_child(&volume)?;
            body.append_child(&bar)?;
            Some(Panel { enable, mute, volume })
        };

        Ok(Self {
            nav,
            main: main.into(),
            footer_text,
            export,
            fullscreen,
            panel,
        })
    }

    pub(crate) fn set_route(&self, route: Route) {
        self.footer_text.set_text_content(Some(route.footer_text()));
        for (r, b) in &self.nav {
            let border = if *r == route { ACCENT } else { "#18303d" };
            b.style().set_property("border-color", border).ok();
        }
    }

    pub(crate) fn refresh_panel(&self, initialized: bool, muted: bool, volume: f32) {
        let Some(panel) = &self.panel else { return };
        let label = if initialized { "Audio on" } else { "Enable audio" };
        panel.enable.set_text_content(Some(label));
        let (on, off) = if initialized {
            (&panel.mute, &panel.enable)
        } else {
            (&panel.enable, &panel.mute)
        };
        on.remove_attribute("disabled").ok();
        off.set_attribute("disabled", "").ok();
        panel.mute.set_text_content(Some(if muted { "Unmute" } else { "Mute" }));
        panel.volume.set_disabled(!initialized);
        panel.volume.set_value(&format!("{volume:.2}"));
    }

    /// Center of the goat card in window coordinates.
    pub(crate) fn goat_center(&self) -> Option<(f64, f64)> {
        let doc = self.main.owner_document()?;
        let rect = doc.get_element_by_id(GOAT_ID)?.get_bounding_client_rect();
        Some((rect.left() + rect.width() / 2.0, rect.top() + rect.height() / 2.0))
    }
}

/// Click handlers for the shell, `popstate` for back/forward and the
/// `pagehide`/`pageshow` pair.
pub(crate) fn wire_shell(app: &Rc<App>, win: &Window) -> Result<Vec<Listener>, AppError> {
    let shell = &app.shell;
    let mut listeners = Vec::new();
    for (route, b) in &shell.nav {
        let route = *route;
        listeners.push(on_click(app, b, move |app| {
            app.services.audio.play_click();
            app.navigate(route);
        }));
    }
    listeners.push(on_click(app, &shell.export, |app| {
        if let Err(err) = app.export_events() {
            tracing::error!(%err, "export failed");
        }
    }));
    if let Some(b) = &shell.fullscreen {
        listeners.push(on_click(app, b, |app| app.request_fullscreen()));
    }
    if let Some(panel) = &shell.panel {
        listeners.push(on_click(app, &panel.enable, |_| {}));
        listeners.push(on_click(app, &panel.mute, |app| app.toggle_mute()));

        let weak = Rc::downgrade(app);
        let input = panel.volume.clone();
        let on_input = Closure::wrap(Box::new(move || {
            let Some(app) = weak.upgrade() else { return };
            if let Ok(volume) = input.value().parse::<f32>() {
                app.set_volume(volume);
            }
        }) as Box<dyn FnMut()>);
        panel.volume.set_oninput(Some(on_input.as_ref().unchecked_ref()));
        listeners.push(on_input);
    }

    let weak = Rc::downgrade(app);
    let on_pop = Closure::wrap(Box::new(move || {
        if let Some(app) = weak.upgrade() {
            app.on_popstate();
        }
    }) as Box<dyn FnMut()>);
    win.add_event_listener_with_callback("popstate", on_pop.as_ref().unchecked_ref())?;
    listeners.push(on_pop);

    let weak = Rc::downgrade(app);
    let on_hide = Closure::wrap(Box::new(move || {
        if let Some(app) = weak.upgrade() {
            app.suspend();
        }
    }) as Box<dyn FnMut()>);
    win.add_event_listener_with_callback("pagehide", on_hide.as_ref().unchecked_ref())?;
    listeners.push(on_hide);

    let weak = Rc::downgrade(app);
    let on_show = Closure::wrap(Box::new(move || {
        if let Some(app) = weak.upgrade() {
            app.resume();
        }
    }) as Box<dyn FnMut()>);
    win.add_event_listener_with_callback("pageshow", on_show.as_ref().unchecked_ref())?;
    listeners.push(on_show);
    Ok(listeners)
}

/// Replaces the main slot with the current view. Returns the listeners the
/// new DOM needs kept alive.
pub(crate) fn render_screen(app: &Rc<App>, screen: &Screen, playing: Option<&str>) -> Result<Vec<Listener>, AppError> {
    let main = &app.shell.main;
    let doc = main.owner_document().ok_or(AppError::Missing("document"))?;
    main.set_inner_html("");
    let mut listeners = Vec::new();
    let view = match screen {
        Screen::Home => home(app, &doc, &mut listeners)?,
        Screen::Predict(round) => predict(app, &doc, round, &mut listeners)?,
        Screen::Feelings(board) => feelings(app, &doc, board, playing, &mut listeners)?,
        Screen::Goat(round) => goat(app, &doc, round, &mut listeners)?,
    };
    main.append_child(&view)?;
    Ok(listeners)
}

fn home(app: &Rc<App>, doc: &Document, listeners: &mut Vec<Listener>) -> Result<HtmlElement, AppError> {
    let wrap = el(doc, "div", "max-width:840px; margin:0 auto;")?;

    let intro = el(doc, "div", CARD)?;
    append_text(&intro, doc, "h1", &heading_style(ACCENT, DREAM), "Welcome to the Island")?;
    let lede = el(doc, "p", "font-size:1.1rem; line-height:1.6;")?;
    lede.set_inner_html("Three experiments in contrastive learning \u{2014} <em>felt, not explained</em>.");
    intro.append_child(&lede)?;

    let list = el(doc, "ul", "line-height:1.8;")?;
    for (color, name, blurb) in [
        (ACCENT, "Predict the Future Frame", " \u{2014} choose what comes five steps later."),
        (DREAM, "Label the Feeling", " \u{2014} cluster by vibe without labels."),
        (FUTURE, "Contrastive Goat", " \u{2014} pick the next goat in the sequence."),
    ] {
        let li = el(doc, "li", "")?;
        append_text(&li, doc, "strong", &format!("color:{color};"), name)?;
        li.append_child(&doc.create_text_node(blurb))?;
        list.append_child(&li)?;
    }
    intro.append_child(&list)?;

    let actions = el(doc, "div", "display:flex; gap:.5rem; margin-top:1.5rem; flex-wrap:wrap;")?;
    for route in [Route::Predict, Route::Feelings, Route::Goat] {
        let b = button(doc, &format!("Begin: {}", route.label()), &format!("{BTN} flex:1 1 auto;"), false)?;
        listeners.push(on_click(app, &b, move |app| {
            app.services.audio.play_click();
            app.navigate(route);
        }));
        actions.append_child(&b)?;
    }
    intro.append_child(&actions)?;
    wrap.append_child(&intro)?;

    let quote = el(doc, "div", &format!("{CARD} border-color:{DREAM};"))?;
    append_text(
        &quote,
        doc,
        "p",
        "opacity:.9; font-size:1.05rem; font-style:italic; text-align:center; margin:0;",
        "\"You learned to predict \u{2014} not because you remembered, but because you contrasted.\"",
    )?;
    wrap.append_child(&quote)?;

    let verse = el(doc, "div", &format!("{CARD} font-size:.95rem; opacity:.8;"))?;
    let lines = el(doc, "p", "margin:0; line-height:1.6;")?;
    lines.set_inner_html(
        "The future is a shape you cannot see, only feel.<br/>What comes next has already happened.<br/>Learn the pattern. Forget the past.",
    );
    verse.append_child(&lines)?;
    wrap.append_child(&verse)?;
    Ok(wrap)
}

fn feedback_and_score(
    doc: &Document,
    card: &HtmlElement,
    feedback: Option<&str>,
    label: &str,
    score: i64,
    gradient: (&str, &str),
) -> Result<(), AppError> {
    if let Some(message) = feedback {
        append_text(&card, doc, "div", FEEDBACK, message)?;
    }
    let panel = el(doc, "div", SCORE_BOX)?;
    append_text(&panel, doc, "div", "font-size:.9rem; opacity:.7; margin-bottom:.25rem;", label)?;
    let (from, to) = if score >= 0 { gradient } else { ("#ff6b6b", "#ff8e8e") };
    let style = format!("font-size:2rem; font-weight:bold; {}", heading_style(from, to));
    append_text(&panel, doc, "div", &style, &score.to_string())?;
    card.append_child(&panel)?;
    Ok(())
}

fn predict(
    app: &Rc<App>,
    doc: &Document,
    round: &QuizRound<PredictSet>,
    listeners: &mut Vec<Listener>,
) -> Result<HtmlElement, AppError> {
    let busy = round.is_transitioning();
    let set = round.current();
    let opacity = if busy { 0.7 } else { 1.0 };
    let card = el(doc, "div", &format!("{CARD} max-width:700px; margin:0 auto; opacity:{opacity};"))?;
    append_text(&card, doc, "h2", &heading_style(ACCENT, FUTURE), "Predict the Future Frame")?;

    let prompt = el(doc, "p", "font-size:1.1rem; opacity:.9;")?;
    append_text(&prompt, doc, "strong", "", "Prompt:")?;
    prompt.append_child(&doc.create_text_node(&format!(" {}", set.prompt)))?;
    card.append_child(&prompt)?;
    let ask = el(doc, "p", "font-style:italic; opacity:.8;")?;
    ask.set_inner_html("Which event is most likely <em>5 steps later</em>?");
    card.append_child(&ask)?;

    let grid = el(doc, "div", "display:grid; grid-template-columns:repeat(2, minmax(0,1fr)); gap:.75rem; margin-top:1rem;")?;
    for (idx, choice) in set.choices.iter().enumerate() {
        let style = format!("{BTN} padding:1rem; opacity:{};", if busy { 0.5 } else { 1.0 });
        let b = button(doc, choice, &style, busy)?;
        listeners.push(on_click(app, &b, move |app| app.choose_predict(idx)));
        grid.append_child(&b)?;
    }
    card.append_child(&grid)?;

    feedback_and_score(doc, &card, round.feedback(), "Pattern Recognition Score", round.score(), (FUTURE, DREAM))?;
    Ok(card)
}

fn goat(
    app: &Rc<App>,
    doc: &Document,
    round: &QuizRound<GoatPair>,
    listeners: &mut Vec<Listener>,
) -> Result<HtmlElement, AppError> {
    let busy = round.is_transitioning();
    let pair = round.current();
    let card = el(doc, "div", &format!("{CARD} max-width:900px; margin:0 auto; position:relative;"))?;
    card.set_id(GOAT_ID);
    append_text(&card, doc, "h2", &heading_style(ACCENT, "#e6f0f2"), "Contrastive Goat")?;
    let ask = el(doc, "p", "font-size:1.05rem; font-style:italic; opacity:.9;")?;
    ask.set_inner_html("Which goat came <em>next</em> in the sequence?");
    card.append_child(&ask)?;

    let opacity = if busy { 0.6 } else { 1.0 };
    let grid = el(
        doc,
        "div",
        &format!("display:grid; grid-template-columns:1fr 1fr; gap:1rem; margin-top:1.5rem; opacity:{opacity};"),
    )?;
    for seed in [pair.a_seed, pair.b_seed] {
        let frame = el(doc, "div", &format!("{CARD} padding:2rem; margin:0;"))?;
        frame.set_inner_html(&GoatShape::from_seed(seed).svg());
        grid.append_child(&frame)?;
    }
    card.append_child(&grid)?;

    let row = el(doc, "div", "display:flex; gap:.75rem; margin-top:1.5rem;")?;
    for (side, label) in [(Side::A, "\u{2190} Left was next"), (Side::B, "Right was next \u{2192}")] {
        let style = format!("{BTN} flex:1; padding:1rem; opacity:{};", if busy { 0.5 } else { 1.0 });
        let b = button(doc, label, &style, busy)?;
        listeners.push(on_click(app, &b, move |app| app.pick_goat(side)));
        row.append_child(&b)?;
    }
    card.append_child(&row)?;

    feedback_and_score(doc, &card, round.feedback(), "Goat Wisdom Score", round.score(), ("#e6f0f2", ACCENT))?;
    Ok(card)
}

fn feelings(
    app: &Rc<App>,
    doc: &Document,
    board: &FeelingsBoard,
    playing: Option<&str>,
    listeners: &mut Vec<Listener>,
) -> Result<HtmlElement, AppError> {
    let card = el(doc, "div", &format!("{CARD} max-width:900px; margin:0 auto;"))?;
    append_text(&card, doc, "h2", &heading_style(DREAM, ACCENT), "Label the Feeling (without labels)")?;
    let intro = el(doc, "p", "font-size:1.05rem; line-height:1.6;")?;
    intro.set_inner_html(
        "Click items to hear them, then sort into two piles by <em>vibe</em>. There is no right answer \u{2014} only structure emerging from contrast.",
    );
    card.append_child(&intro)?;

    let columns = el(doc, "div", "display:grid; grid-template-columns:repeat(3, 1fr); gap:1rem; margin-top:1.5rem;")?;
    let h4 = "margin-top:0; opacity:.8; font-size:.95rem;";

    let pool = el(doc, "div", "")?;
    append_text(&pool, doc, "h4", h4, "Available Sounds")?;
    let list = el(doc, "div", "display:grid; gap:.5rem;")?;
    let selected_id = board.selected().map(|item| item.id.as_str());
    for item in board.available() {
        let mut style = format!("{BTN} padding:.75rem; text-align:left;");
        if selected_id == Some(item.id.as_str()) {
            style.push_str(&format!(" border-color:{ACCENT};"));
        }
        if playing == Some(item.id.as_str()) {
            style.push_str(&format!(" border-color:{DREAM}; box-shadow:0 0 15px {DREAM};"));
        }
        let b = button(doc, &format!("\u{1F50A} {}", item.alt), &style, false)?;
        b.set_attribute("aria-label", &item.alt).ok();
        let id = item.id.clone();
        listeners.push(on_click(app, &b, move |app| app.select_feeling(&id)));
        list.append_child(&b)?;
    }
    pool.append_child(&list)?;
    if board.is_done() {
        append_text(&pool, doc, "p", "opacity:.8; font-style:italic;", "Every sound has found a pile.")?;
    }

    if let Some(item) = board.selected() {
        let picked = el(doc, "div", "margin-top:1rem; padding:.75rem; background:rgba(24,48,61,0.5); border-radius:8px;")?;
        let line = el(doc, "p", "font-size:.9rem; opacity:.8; margin:0 0 .5rem 0;")?;
        line.append_child(&doc.create_text_node("Selected: "))?;
        append_text(&line, doc, "strong", "", &item.alt)?;
        picked.append_child(&line)?;
        let row = el(doc, "div", "display:flex; gap:.5rem;")?;
        for cluster in [Cluster::A, Cluster::B] {
            let b = button(doc, &format!("\u{2192} {}", cluster.label()), &format!("{BTN} flex:1;"), false)?;
            listeners.push(on_click(app, &b, move |app| app.drop_feeling(cluster)));
            row.append_child(&b)?;
        }
        picked.append_child(&row)?;
        pool.append_child(&picked)?;
    }
    columns.append_child(&pool)?;

    for (cluster, tint, border) in [(Cluster::A, "0,255,255", FUTURE), (Cluster::B, "199,155,255", DREAM)] {
        let column = el(doc, "div", "")?;
        append_text(&column, doc, "h4", h4, cluster.label())?;
        let bin = el(
            doc,
            "div",
            &format!("{CARD} min-height:200px; border-color:{border}; display:grid; gap:.5rem; align-content:start;"),
        )?;
        for item in board.cluster(cluster) {
            let chip = text(
                doc,
                "div",
                &format!("padding:.5rem; background:rgba({tint},0.1); border-radius:6px; font-size:.9rem;"),
                &item.alt,
            )?;
            chip.set_attribute("aria-label", &item.alt).ok();
            bin.append_child(&chip)?;
        }
        column.append_child(&bin)?;
        columns.append_child(&column)?;
    }
    card.append_child(&columns)?;

    append_text(
        &card,
        doc,
        "p",
        "opacity:.7; margin-top:1.5rem; font-style:italic; text-align:center; font-size:.95rem;",
        "Later, we reveal the latent structure you taught yourself.",
    )?;
    Ok(card)
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn document() -> Document {
        web_sys::window().unwrap().document().unwrap()
    }

    #[wasm_bindgen_test]
    fn append_text_adds_a_styled_child() {
        let doc = document();
        let parent = el(&doc, "div", "").unwrap();
        append_text(&parent, &doc, "strong", "color:red;", "Prompt:").unwrap();
        let child = parent.first_element_child().unwrap();
        assert_eq!(child.tag_name(), "STRONG");
        assert_eq!(child.text_content().as_deref(), Some("Prompt:"));
        assert_eq!(child.get_attribute("style").as_deref(), Some("color:red;"));
    }

    #[wasm_bindgen_test]
    fn panel_buttons_follow_audio_state() {
        let shell = Shell::build(&document(), EmbedMode::default(), false).unwrap();
        let panel = shell.panel.as_ref().unwrap();

        shell.refresh_panel(true, false, 0.5);
        assert!(panel.enable.has_attribute("disabled"));
        assert!(!panel.mute.has_attribute("disabled"));
        assert_eq!(panel.volume.value(), "0.50");

        // After a teardown the panel offers to enable audio again.
        shell.refresh_panel(false, false, 1.0);
        assert!(!panel.enable.has_attribute("disabled"));
        assert!(panel.mute.has_attribute("disabled"));
        assert!(panel.volume.disabled());
    }

    #[wasm_bindgen_test]
    fn no_audio_mode_has_no_panel() {
        let mode = EmbedMode {
            no_audio: true,
            ..EmbedMode::default()
        };
        let shell = Shell::build(&document(), mode, false).unwrap();
        assert!(shell.panel.is_none());
    }
}
