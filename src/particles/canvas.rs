//! Browser side of the particle field: a fixed full-window canvas, the
//! `requestAnimationFrame` loop and the window resize hook.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement, Window, window};

use super::{ParticleOptions, ParticleSystem, Size, Surface};
use crate::error::AppError;

const CANVAS_ID: &str = "cg-particles";
const CANVAS_STYLE: &str = "position:fixed; top:0; left:0; width:100%; height:100%; pointer-events:none; z-index:-1; opacity:0.3;";

/// `Surface` over a 2d canvas context.
pub struct CanvasSurface {
    ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
    pub fn new(ctx: CanvasRenderingContext2d) -> Self {
        Self { ctx }
    }
}

impl Surface for CanvasSurface {
    fn clear(&mut self, size: Size) {
        self.ctx.clear_rect(0.0, 0.0, size.width, size.height);
    }

    fn line(&mut self, from: (f64, f64), to: (f64, f64), color: &str, alpha: f64) {
        self.ctx.save();
        self.ctx.set_global_alpha(alpha);
        self.ctx.set_stroke_style_str(color);
        self.ctx.begin_path();
        self.ctx.move_to(from.0, from.1);
        self.ctx.line_to(to.0, to.1);
        self.ctx.stroke();
        self.ctx.restore();
    }

    fn dot(&mut self, center: (f64, f64), radius: f64, color: &str, alpha: f64) {
        self.ctx.save();
        self.ctx.set_global_alpha(alpha);
        self.ctx.set_fill_style_str(color);
        self.ctx.begin_path();
        if self
            .ctx
            .arc(center.0, center.1, radius, 0.0, std::f64::consts::TAU)
            .is_ok()
        {
            self.ctx.fill();
        }
        self.ctx.restore();
    }
}

struct FieldState {
    system: ParticleSystem,
    surface: CanvasSurface,
    canvas: HtmlCanvasElement,
    frame_id: Option<i32>,
    running: bool,
}

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

/// A particle system bound to a canvas and scheduled on animation frames.
pub struct ParticleField {
    state: Rc<RefCell<FieldState>>,
    frame: FrameCallback,
    on_resize: Option<Closure<dyn FnMut()>>,
}

impl ParticleField {
    /// Creates (or reuses) the background canvas and a system sized to the
    /// window. Returns `Ok(None)` when the browser hands out no 2d context:
    /// the page just keeps a static background.
    pub fn mount(doc: &Document, options: ParticleOptions) -> Result<Option<Self>, AppError> {
        let win = window().ok_or(AppError::Missing("window"))?;
        let canvas: HtmlCanvasElement = match doc.get_element_by_id(CANVAS_ID) {
            Some(el) => el.dyn_into().map_err(|_| AppError::Dom(format!("#{CANVAS_ID} is not a canvas")))?,
            None => {
                let c: HtmlCanvasElement = doc
                    .create_element("canvas")?
                    .dyn_into()
                    .map_err(|_| AppError::Dom("created element is not a canvas".to_string()))?;
                c.set_id(CANVAS_ID);
                c.set_attribute("style", CANVAS_STYLE).ok();
                let body = doc.body().ok_or(AppError::Missing("document body"))?;
                body.append_child(&c)?;
                c
            }
        };
        let size = window_size(&win);
        canvas.set_width(size.width as u32);
        canvas.set_height(size.height as u32);

        let ctx = match canvas.get_context("2d") {
            Ok(Some(obj)) => match obj.dyn_into::<CanvasRenderingContext2d>() {
                Ok(ctx) => ctx,
                Err(_) => return Ok(None),
            },
            _ => {
                tracing::debug!("particle canvas has no 2d context; background stays static");
                return Ok(None);
            }
        };

        let state = Rc::new(RefCell::new(FieldState {
            system: ParticleSystem::new(size, options),
            surface: CanvasSurface::new(ctx),
            canvas,
            frame_id: None,
            running: false,
        }));

        let mut field = Self {
            state,
            frame: Rc::new(RefCell::new(None)),
            on_resize: None,
        };
        field.listen_resize(&win)?;
        Ok(Some(field))
    }

    fn listen_resize(&mut self, win: &Window) -> Result<(), AppError> {
        let state = self.state.clone();
        let closure = Closure::wrap(Box::new(move || {
            let Some(win) = window() else { return };
            let size = window_size(&win);
            let mut st = state.borrow_mut();
            st.canvas.set_width(size.width as u32);
            st.canvas.set_height(size.height as u32);
            st.system.resize(size);
        }) as Box<dyn FnMut()>);
        win.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())?;
        self.on_resize = Some(closure);
        Ok(())
    }

    /// Begins ticking and drawing once per animation frame. Calling it while
    /// already running does nothing.
    pub fn start(&self) {
        {
            let mut st = self.state.borrow_mut();
            if st.running {
                return;
            }
            st.running = true;
        }
        if self.frame.borrow().is_none() {
            let state = self.state.clone();
            let frame = self.frame.clone();
            *self.frame.borrow_mut() = Some(Closure::wrap(Box::new(move |_ts: f64| {
                let mut st = state.borrow_mut();
                if !st.running {
                    st.frame_id = None;
                    return;
                }
                let FieldState { system, surface, .. } = &mut *st;
                system.tick();
                system.render(surface);
                st.frame_id = request_frame(&frame);
            }) as Box<dyn FnMut(f64)>));
        }
        let id = request_frame(&self.frame);
        self.state.borrow_mut().frame_id = id;
    }

    /// Cancels the pending frame; particles keep their positions.
    pub fn stop(&self) {
        let mut st = self.state.borrow_mut();
        st.running = false;
        if let Some(id) = st.frame_id.take() {
            if let Some(win) = window() {
                win.cancel_animation_frame(id).ok();
            }
        }
    }

    /// Stops the loop, frees the particles and detaches the resize hook.
    pub fn destroy(mut self) {
        self.stop();
        self.state.borrow_mut().system.clear();
        self.frame.borrow_mut().take();
        if let (Some(win), Some(cb)) = (window(), self.on_resize.take()) {
            win.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref())
                .ok();
        }
    }

    pub fn is_running(&self) -> bool {
        self.state.borrow().running
    }

    pub fn set_color(&self, color: &str) {
        self.state.borrow_mut().system.set_color(color);
    }

    /// Drops a particle at a point in window coordinates.
    pub fn add_burst(&self, x: f64, y: f64) {
        self.state.borrow_mut().system.add_burst(x, y);
    }

    pub fn len(&self) -> usize {
        self.state.borrow().system.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().system.is_empty()
    }
}

fn request_frame(frame: &FrameCallback) -> Option<i32> {
    let win = window()?;
    let cb = frame.borrow();
    let closure = cb.as_ref()?;
    win.request_animation_frame(closure.as_ref().unchecked_ref()).ok()
}

/// Current viewport size, falling back to a small canvas when the window
/// reports nothing usable.
pub fn window_size(win: &Window) -> Size {
    let width = win
        .inner_width()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(800.0);
    let height = win
        .inner_height()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(600.0);
    Size::new(width, height)
}
