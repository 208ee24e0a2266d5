//! Web Audio implementation of `AudioBackend`, plus `WebAudio`, the shared
//! handle views use (it also performs the async fetch + decode of samples).

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use js_sys::ArrayBuffer;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    AudioBuffer, AudioBufferSourceNode, AudioContext, AudioContextState, AudioNode,
    AudioScheduledSourceNode, GainNode, Response, window,
};

use super::{AudioBackend, AudioManager, Bus, EffectOptions, Playback, Tone};
use crate::error::{AudioError, js_error_message};

fn graph_err(value: JsValue) -> AudioError {
    AudioError::Graph(js_error_message(&value))
}

// `stop` and `onended` live on the scheduled-source base; the buffer-source
// copies are deprecated.
fn scheduled(source: &AudioBufferSourceNode) -> &AudioScheduledSourceNode {
    source.as_ref()
}

/// `AudioContext` with master, ambient and effects gain nodes.
pub struct WebAudioBackend {
    ctx: AudioContext,
    master: GainNode,
    ambient: GainNode,
    effects: GainNode,
    ambient_source: Option<AudioBufferSourceNode>,
    // Sources drop themselves from here when they end.
    active: Rc<RefCell<Vec<AudioBufferSourceNode>>>,
}

impl WebAudioBackend {
    pub fn new() -> Result<Self, AudioError> {
        let ctx = AudioContext::new()
            .map_err(|e| AudioError::ContextUnavailable(js_error_message(&e)))?;
        let master = ctx.create_gain().map_err(graph_err)?;
        master
            .connect_with_audio_node(&ctx.destination())
            .map_err(graph_err)?;
        let ambient = ctx.create_gain().map_err(graph_err)?;
        ambient.connect_with_audio_node(&master).map_err(graph_err)?;
        let effects = ctx.create_gain().map_err(graph_err)?;
        effects.connect_with_audio_node(&master).map_err(graph_err)?;
        Ok(Self {
            ctx,
            master,
            ambient,
            effects,
            ambient_source: None,
            active: Rc::new(RefCell::new(Vec::new())),
        })
    }

    pub fn context(&self) -> &AudioContext {
        &self.ctx
    }

    fn bus(&self, bus: Bus) -> &GainNode {
        match bus {
            Bus::Ambient => &self.ambient,
            Bus::Effects => &self.effects,
        }
    }
}

impl AudioBackend for WebAudioBackend {
    type Buffer = AudioBuffer;

    fn set_master_gain(&mut self, gain: f32) {
        self.master.gain().set_value(gain);
    }

    fn set_bus_gain(&mut self, bus: Bus, gain: f32) {
        self.bus(bus).gain().set_value(gain);
    }

    fn ramp_bus_gain(&mut self, bus: Bus, target: f32, seconds: f64) {
        let param = self.bus(bus).gain();
        let now = self.ctx.current_time();
        let current = param.value();
        let ramp = param
            .cancel_scheduled_values(now)
            .and_then(|p| p.set_value_at_time(current, now))
            .and_then(|p| p.linear_ramp_to_value_at_time(target, now + seconds));
        if let Err(e) = ramp {
            tracing::warn!(error = %js_error_message(&e), "ambient fade failed");
        }
    }

    fn resume(&mut self) {
        if self.ctx.state() == AudioContextState::Suspended {
            // The promise settles on its own; nothing waits on it.
            let _ = self.ctx.resume();
        }
    }

    fn play_buffer(
        &mut self,
        bus: Bus,
        buffer: &AudioBuffer,
        options: EffectOptions,
    ) -> Result<(), AudioError> {
        let source = self.ctx.create_buffer_source().map_err(graph_err)?;
        source.set_buffer(Some(buffer));
        source.set_loop(options.looping);
        source.playback_rate().set_value(options.rate);

        let gain = self.ctx.create_gain().map_err(graph_err)?;
        gain.gain().set_value(options.volume);
        source.connect_with_audio_node(&gain).map_err(graph_err)?;
        let bus_node: &AudioNode = self.bus(bus);
        gain.connect_with_audio_node(bus_node).map_err(graph_err)?;

        match bus {
            Bus::Ambient => {
                if let Some(old) = self.ambient_source.replace(source.clone()) {
                    scheduled(&old).stop().ok();
                }
            }
            Bus::Effects => {
                self.active.borrow_mut().push(source.clone());
                let active = self.active.clone();
                let ended = source.clone();
                let on_ended = Closure::once_into_js(move || {
                    active.borrow_mut().retain(|s| s != &ended);
                });
                scheduled(&source).set_onended(Some(on_ended.unchecked_ref()));
            }
        }
        source.start().map_err(graph_err)
    }

    fn play_tone(&mut self, tone: &Tone) -> Result<(), AudioError> {
        let osc = self.ctx.create_oscillator().map_err(graph_err)?;
        let gain = self.ctx.create_gain().map_err(graph_err)?;
        osc.connect_with_audio_node(&gain).map_err(graph_err)?;
        gain.connect_with_audio_node(&self.effects).map_err(graph_err)?;

        let now = self.ctx.current_time();
        let freq = osc.frequency();
        for &(at, hz) in tone.steps {
            freq.set_value_at_time(hz, now + at).map_err(graph_err)?;
        }
        let level = gain.gain();
        level
            .set_value_at_time(tone.start_gain, now)
            .map_err(graph_err)?;
        level
            .exponential_ramp_to_value_at_time(tone.end_gain, now + tone.duration)
            .map_err(graph_err)?;

        osc.start_with_when(now).map_err(graph_err)?;
        osc.stop_with_when(now + tone.duration).map_err(graph_err)
    }

    fn stop_bus(&mut self, bus: Bus) {
        match bus {
            Bus::Ambient => {
                if let Some(src) = self.ambient_source.take() {
                    scheduled(&src).stop().ok();
                }
            }
            Bus::Effects => {
                // Already-stopped sources throw; ignore.
                for src in self.active.borrow_mut().drain(..) {
                    scheduled(&src).stop().ok();
                }
            }
        }
    }

    fn close(&mut self) {
        let _ = self.ctx.close();
    }
}

/// Fetches and decodes a sample.
pub async fn load_buffer(ctx: &AudioContext, url: &str) -> Result<AudioBuffer, AudioError> {
    let load_err = |reason: String| AudioError::Load {
        url: url.to_string(),
        reason,
    };
    let win = window().ok_or_else(|| load_err("no window".into()))?;
    let resp: Response = JsFuture::from(win.fetch_with_str(url))
        .await
        .map_err(|e| load_err(js_error_message(&e)))?
        .dyn_into()
        .map_err(|_| load_err("fetch did not yield a Response".into()))?;
    if !resp.ok() {
        return Err(load_err(format!("http status {}", resp.status())));
    }
    let bytes: ArrayBuffer = JsFuture::from(resp.array_buffer().map_err(|e| load_err(js_error_message(&e)))?)
        .await
        .map_err(|e| load_err(js_error_message(&e)))?
        .dyn_into()
        .map_err(|_| load_err("body is not an ArrayBuffer".into()))?;
    let decoded = ctx
        .decode_audio_data(&bytes)
        .map_err(|e| load_err(js_error_message(&e)))?;
    JsFuture::from(decoded)
        .await
        .map_err(|e| load_err(js_error_message(&e)))?
        .dyn_into()
        .map_err(|_| load_err("decode did not yield an AudioBuffer".into()))
}

#[derive(Clone, Copy)]
enum Pending {
    Effect(EffectOptions),
    Ambient,
}

/// Shared audio service handed to views. Cloning shares the same graph.
#[derive(Clone, Default)]
pub struct WebAudio {
    manager: Rc<RefCell<AudioManager<WebAudioBackend>>>,
    loading: Rc<RefCell<HashSet<String>>>,
}

impl WebAudio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the Web Audio graph; call from a user gesture.
    pub fn init(&self) {
        self.manager.borrow_mut().init(WebAudioBackend::new);
    }

    pub fn is_initialized(&self) -> bool {
        self.manager.borrow().is_initialized()
    }

    pub fn is_muted(&self) -> bool {
        self.manager.borrow().is_muted()
    }

    pub fn volume(&self) -> f32 {
        self.manager.borrow().volume()
    }

    pub fn play_effect(&self, url: &str, options: EffectOptions) {
        let outcome = self.manager.borrow_mut().play_effect(url, options);
        if let Playback::NeedsLoad(url) = outcome {
            self.load_then(url, Pending::Effect(options));
        }
    }

    pub fn start_ambient(&self, url: &str) {
        let outcome = self.manager.borrow_mut().start_ambient(url);
        if let Playback::NeedsLoad(url) = outcome {
            self.load_then(url, Pending::Ambient);
        }
    }

    pub fn fade_ambient(&self, target: f32, seconds: f64) {
        self.manager.borrow_mut().fade_ambient(target, seconds);
    }

    pub fn play_click(&self) {
        self.manager.borrow_mut().play_click();
    }

    pub fn play_success(&self) {
        self.manager.borrow_mut().play_success();
    }

    pub fn play_failure(&self) {
        self.manager.borrow_mut().play_failure();
    }

    pub fn toggle_mute(&self) -> bool {
        self.manager.borrow_mut().toggle_mute()
    }

    pub fn set_volume(&self, volume: f32) {
        self.manager.borrow_mut().set_volume(volume);
    }

    pub fn teardown(&self) {
        self.manager.borrow_mut().teardown();
    }

    fn load_then(&self, url: String, pending: Pending) {
        if !self.loading.borrow_mut().insert(url.clone()) {
            return;
        }
        let Some(ctx) = self.manager.borrow().backend().map(|b| b.context().clone()) else {
            self.loading.borrow_mut().remove(&url);
            return;
        };
        let manager = self.manager.clone();
        let loading = self.loading.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let loaded = load_buffer(&ctx, &url).await;
            loading.borrow_mut().remove(&url);
            match loaded {
                Ok(buffer) => {
                    let mut m = manager.borrow_mut();
                    m.insert_buffer(&url, buffer);
                    match pending {
                        Pending::Effect(options) => {
                            m.play_effect(&url, options);
                        }
                        Pending::Ambient => {
                            m.start_ambient(&url);
                        }
                    }
                }
                Err(err) => tracing::warn!(%err, "audio load failed"),
            }
        });
    }
}
