/// Skyfolio Web - the star scene on a WebGL2 canvas behind a scrolling page
///
/// The canvas stays fixed while the document scrolls; the body's bounding
/// rect top drives the camera exactly like the terminal's virtual page.
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use skyfolio_core::{Background, FrameLoop, Stage, StageConfig, Viewport};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Event, EventTarget, HtmlCanvasElement, MouseEvent, Window};

mod buffers;
mod logger;
mod webgl;

pub use buffers::{interleave, PrimitiveMode, VertexData, FLOATS_PER_VERTEX};
pub use webgl::WebGlRenderer;

type SharedLoop = Rc<RefCell<FrameLoop<WebGlRenderer>>>;
type AnimationCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

struct Listener {
    target: EventTarget,
    kind: &'static str,
    closure: Closure<dyn FnMut(Event)>,
}

impl Listener {
    fn attach(
        target: &EventTarget,
        kind: &'static str,
        handler: impl FnMut(Event) + 'static,
    ) -> Result<Self, JsValue> {
        let closure = Closure::<dyn FnMut(Event)>::new(handler);
        target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())?;
        Ok(Self {
            target: target.clone(),
            kind,
            closure,
        })
    }

    fn detach(self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.kind, self.closure.as_ref().unchecked_ref());
    }
}

fn window() -> Result<Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))
}

fn document(window: &Window) -> Result<Document, JsValue> {
    window
        .document()
        .ok_or_else(|| JsValue::from_str("window has no document"))
}

fn window_viewport(window: &Window) -> Viewport {
    let dimension = |value: Result<JsValue, JsValue>| {
        value.ok().and_then(|v| v.as_f64()).unwrap_or(1.0) as u32
    };
    Viewport::new(dimension(window.inner_width()), dimension(window.inner_height()))
}

/// Current scroll position as the body's offset from the top of the viewport
fn body_top(document: &Document) -> Option<f32> {
    document
        .body()
        .map(|body| body.get_bounding_client_rect().top() as f32)
}

fn request_frame(window: &Window, callback: &AnimationCallback) -> Result<i32, JsValue> {
    let slot = callback.borrow();
    let closure = slot
        .as_ref()
        .ok_or_else(|| JsValue::from_str("animation callback was released"))?;
    window.request_animation_frame(closure.as_ref().unchecked_ref())
}

#[wasm_bindgen]
pub struct WebApp {
    frame_loop: SharedLoop,
    window: Window,
    canvas: HtmlCanvasElement,
    animation: AnimationCallback,
    pending_frame: Rc<Cell<Option<i32>>>,
    listeners: Vec<Listener>,
}

#[wasm_bindgen]
impl WebApp {
    /// Build the scene on the canvas with the given id. `config` takes the
    /// same `key = value` text as the terminal's config file.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str, config: Option<String>) -> Result<WebApp, JsValue> {
        let window = window()?;
        let document = document(&window)?;

        let mut config = match config {
            Some(text) => {
                StageConfig::parse(&text).map_err(|err| JsValue::from_str(&err.to_string()))?
            }
            None => StageConfig::default(),
        };
        config.seed = (js_sys::Math::random() * u32::MAX as f64) as u32;

        let canvas = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| JsValue::from_str(&format!("no element with id `{canvas_id}`")))?
            .dyn_into::<HtmlCanvasElement>()?;

        // The background is drawn by the page, behind a transparent canvas
        if let Some(body) = document.body() {
            let style = body.style();
            match Background::from_setting(&config.background) {
                Background::Color(color) => {
                    style.set_property("background-color", &format!("#{:06x}", color.to_hex()))?;
                }
                Background::Texture(texture) => {
                    if let Some(path) = texture.path() {
                        style.set_property("background-image", &format!("url({})", path))?;
                        style.set_property("background-size", "cover")?;
                    }
                }
            }
        }
        canvas.style().set_property("position", "fixed")?;
        canvas.style().set_property("top", "0")?;
        canvas.style().set_property("left", "0")?;

        let viewport = window_viewport(&window);
        let stage = Stage::from_config(&config, viewport);
        let renderer = WebGlRenderer::new(canvas.clone())?;
        log::info!("stage ready at {}x{}", viewport.width, viewport.height);

        Ok(WebApp {
            frame_loop: Rc::new(RefCell::new(FrameLoop::new(stage, renderer))),
            window,
            canvas,
            animation: Rc::new(RefCell::new(None)),
            pending_frame: Rc::new(Cell::new(None)),
            listeners: Vec::new(),
        })
    }

    /// Attach input listeners and begin the animation frame loop
    pub fn start(&mut self) -> Result<(), JsValue> {
        self.frame_loop
            .borrow_mut()
            .start()
            .map_err(|err| JsValue::from_str(&err.to_string()))?;

        self.attach_listeners()?;

        let frame_loop = Rc::clone(&self.frame_loop);
        let callback = Rc::clone(&self.animation);
        let pending = Rc::clone(&self.pending_frame);
        let window = self.window.clone();
        *self.animation.borrow_mut() = Some(Closure::new(move || {
            pending.set(None);
            let ticked = frame_loop.borrow_mut().tick();
            match ticked {
                Ok(true) => match request_frame(&window, &callback) {
                    Ok(id) => pending.set(Some(id)),
                    Err(err) => log::error!("failed to schedule frame: {err:?}"),
                },
                Ok(false) => log::debug!("frame loop stopped"),
                Err(err) => {
                    log::error!("render failed: {err:?}");
                    frame_loop.borrow_mut().stop();
                }
            }
        }));

        let id = request_frame(&self.window, &self.animation)?;
        self.pending_frame.set(Some(id));
        Ok(())
    }

    /// Stop rendering and release every listener. The app cannot be restarted.
    pub fn stop(&mut self) {
        self.frame_loop.borrow_mut().stop();
        if let Some(id) = self.pending_frame.take() {
            let _ = self.window.cancel_animation_frame(id);
        }
        for listener in self.listeners.drain(..) {
            listener.detach();
        }
        // Breaks the callback's reference to itself
        self.animation.borrow_mut().take();
    }

    pub fn frames(&self) -> u64 {
        self.frame_loop.borrow().stage().frames()
    }
}

impl WebApp {
    fn attach_listeners(&mut self) -> Result<(), JsValue> {
        let window_target: &EventTarget = self.window.as_ref();
        let canvas_target: &EventTarget = self.canvas.as_ref();
        let document = document(&self.window)?;

        let frame_loop = Rc::clone(&self.frame_loop);
        let scroll = Listener::attach(window_target, "scroll", move |_| {
            if let Some(top) = body_top(&document) {
                frame_loop.borrow_mut().on_scroll(top);
            }
        })?;
        self.listeners.push(scroll);

        let frame_loop = Rc::clone(&self.frame_loop);
        let window = self.window.clone();
        let resize = Listener::attach(window_target, "resize", move |_| {
            let viewport = window_viewport(&window);
            frame_loop.borrow_mut().resize(viewport.width, viewport.height);
        })?;
        self.listeners.push(resize);

        let drag_from: Rc<Cell<Option<(f64, f64)>>> = Rc::new(Cell::new(None));

        let from = Rc::clone(&drag_from);
        let down = Listener::attach(canvas_target, "mousedown", move |event| {
            if let Some(mouse) = event.dyn_ref::<MouseEvent>() {
                from.set(Some((mouse.client_x() as f64, mouse.client_y() as f64)));
            }
        })?;
        self.listeners.push(down);

        let from = Rc::clone(&drag_from);
        let frame_loop = Rc::clone(&self.frame_loop);
        let drag = Listener::attach(canvas_target, "mousemove", move |event| {
            let (Some(mouse), Some((x, y))) = (event.dyn_ref::<MouseEvent>(), from.get()) else {
                return;
            };
            let (to_x, to_y) = (mouse.client_x() as f64, mouse.client_y() as f64);
            from.set(Some((to_x, to_y)));

            let mut frame_loop = frame_loop.borrow_mut();
            let height = frame_loop.stage().viewport().height;
            frame_loop
                .stage_mut()
                .controls_mut()
                .rotate((to_x - x) as f32, (to_y - y) as f32, height);
        })?;
        self.listeners.push(drag);

        let from = Rc::clone(&drag_from);
        let up = Listener::attach(window_target, "mouseup", move |_| from.set(None))?;
        self.listeners.push(up);

        log::debug!("attached {} listeners", self.listeners.len());
        Ok(())
    }
}

#[wasm_bindgen(start)]
pub fn main() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    logger::init(log::LevelFilter::Info);
    Ok(())
}
