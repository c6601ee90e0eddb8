use console_error_panic_hook::set_once;
use futures_util::future::try_join4;
use gloo_net::http::Request;
use std::cell::RefCell;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, Event, EventTarget, HtmlInputElement, MouseEvent, Window};

use formats::{LoadError, MapData, MapManifest, MapPayloads, VariantConfig};
use foundation::handles::Handle;
use foundation::math::Vec2;
use foundation::time::Time;
use layers::{MapView, Surfaces, Viewport};
use runtime::{EventBus, UiEvent};
use scene::handle_from_element_id;

mod dom;
use dom::{DomCanvas, DomTooltip};

/// Space the map leaves inside its container on each axis.
const MAP_MARGIN_PX: f64 = 60.0;
const FALLBACK_PLOT_SIZE: Vec2 = Vec2 { x: 400.0, y: 300.0 };

const MAP_ID: &str = "map";
const PLOT_ID: &str = "plot";
const SLIDER_ID: &str = "timeslide";
const CATEGORY_INPUTS: &str = r#"input[name="BCG"]"#;
const TOOLTIP_HOST: &str = ".container-fluid";

struct ViewerState {
    view: MapView,
    map: DomCanvas,
    plot: DomCanvas,
    tooltip: DomTooltip,
    window: Window,
    map_container: Element,
    plot_container: Option<Element>,
    plot_size: Vec2,
    frame_pending: bool,
}

impl ViewerState {
    fn handle(&mut self, event: &UiEvent, now: Time) {
        let mut surfaces = Surfaces {
            map: &mut self.map,
            plot: &mut self.plot,
            tooltip: &mut self.tooltip,
            plot_size: self.plot_size,
        };
        self.view.handle(event, now, &mut surfaces);
    }

    fn tick(&mut self, now: Time) -> bool {
        let mut surfaces = Surfaces {
            map: &mut self.map,
            plot: &mut self.plot,
            tooltip: &mut self.tooltip,
            plot_size: self.plot_size,
        };
        self.view.tick(now, &mut surfaces)
    }

    fn resize(&mut self, now: Time) {
        let viewport = viewport(&self.window, &self.map_container);
        if let Err(err) = self.map.set_size(viewport.size()) {
            log(&format!("resize failed: {err:?}"));
        }
        self.plot_size = plot_size(self.plot_container.as_ref());
        if let Err(err) = self.plot.set_size(self.plot_size) {
            log(&format!("resize failed: {err:?}"));
        }
        self.handle(
            &UiEvent::Resize {
                width: viewport.width,
                height: viewport.height,
                window_width: viewport.window_width,
            },
            now,
        );
    }
}

thread_local! {
    static STATE: RefCell<Option<ViewerState>> = const { RefCell::new(None) };
    static EVENTS: RefCell<EventBus> = RefCell::new(EventBus::new());
}

fn log(msg: &str) {
    web_sys::console::log_1(&JsValue::from_str(msg));
}

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn now() -> Time {
    web_sys::window()
        .and_then(|w| w.performance())
        .map_or(Time(0.0), |p| Time::from_millis(p.now()))
}

/// Runs `f` on the mounted viewer; `None` before mount or while busy.
fn with_state<R>(f: impl FnOnce(&mut ViewerState) -> R) -> Option<R> {
    STATE.with(|state| state.try_borrow_mut().ok()?.as_mut().map(f))
}

fn viewport(window: &Window, container: &Element) -> Viewport {
    let window_width = window
        .inner_width()
        .ok()
        .and_then(|w| w.as_f64())
        .unwrap_or(0.0);
    Viewport::new(
        (f64::from(container.client_width()) - MAP_MARGIN_PX).max(0.0),
        (f64::from(container.client_height()) - MAP_MARGIN_PX).max(0.0),
        window_width,
    )
}

fn plot_size(container: Option<&Element>) -> Vec2 {
    match container {
        Some(c) if c.client_width() > 0 && c.client_height() > 0 => {
            Vec2::new(f64::from(c.client_width()), f64::from(c.client_height()))
        }
        _ => FALLBACK_PLOT_SIZE,
    }
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    set_once();
    Ok(())
}

/// Fetches the map assets under `base_url` and mounts the map into `#map`.
///
/// `manifest_path` overrides the default asset list; `variant` names a
/// preset and otherwise falls back to the manifest's, then `combined`.
#[wasm_bindgen]
pub fn load_map(base_url: String, manifest_path: Option<String>, variant: Option<String>) {
    spawn_local(async move {
        if let Err(err) = load_map_inner(&base_url, manifest_path, variant).await {
            log(&format!("map load error: {err:?}"));
        }
    });
}

async fn load_map_inner(
    base_url: &str,
    manifest_path: Option<String>,
    variant: Option<String>,
) -> Result<(), JsValue> {
    let manifest = match manifest_path {
        Some(path) => {
            let text = fetch_text(asset_url(base_url, &path)).await.map_err(to_js)?;
            MapManifest::from_json_str(&text).map_err(to_js)?
        }
        None => MapManifest::default(),
    };
    let variant = match variant.as_deref().or(manifest.variant.as_deref()) {
        Some(name) => VariantConfig::preset(name).map_err(to_js)?,
        None => VariantConfig::default(),
    };

    let payloads = fetch_payloads(base_url, &manifest).await.map_err(to_js)?;
    let data = MapData::from_payloads(&manifest, variant, &payloads).map_err(to_js)?;
    mount(data)?;
    schedule_frame();
    Ok(())
}

fn asset_url(base_url: &str, path: &str) -> String {
    if base_url.is_empty() {
        path.to_string()
    } else {
        format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

async fn fetch_text(url: String) -> Result<String, LoadError> {
    let fail = |reason: String| LoadError::Fetch {
        url: url.clone(),
        reason,
    };
    let resp = Request::get(&url)
        .send()
        .await
        .map_err(|e| fail(e.to_string()))?;
    if !resp.ok() {
        return Err(fail(format!("HTTP {}", resp.status())));
    }
    resp.text().await.map_err(|e| fail(e.to_string()))
}

/// All four assets, fetched concurrently; the first failure wins.
async fn fetch_payloads(base_url: &str, manifest: &MapManifest) -> Result<MapPayloads, LoadError> {
    let [towns, water_polygons, water_lines, metrics] =
        manifest.asset_paths().map(|p| asset_url(base_url, p));
    try_join4(
        fetch_text(towns),
        fetch_text(water_polygons),
        fetch_text(water_lines),
        fetch_text(metrics),
    )
    .await
    .map(MapPayloads::from)
}

fn mount(data: MapData) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let map_container = document
        .get_element_by_id(MAP_ID)
        .ok_or_else(|| JsValue::from_str("missing #map"))?;
    let plot_container = document.get_element_by_id(PLOT_ID);
    let tooltip_host = document
        .query_selector(TOOLTIP_HOST)?
        .or_else(|| document.body().map(Element::from))
        .ok_or_else(|| JsValue::from_str("no tooltip host"))?;

    let viewport = viewport(&window, &map_container);
    let mut map = DomCanvas::mount(&document, &map_container)?;
    map.set_size(viewport.size())?;
    let mut plot = DomCanvas::mount(&document, plot_container.as_ref().unwrap_or(&map_container))?;
    let plot_size = plot_size(plot_container.as_ref());
    plot.set_size(plot_size)?;
    let mut tooltip = DomTooltip::mount(&document, &tooltip_host)?;

    let view_state = initial_view_state(&document, &data);
    let view = MapView::new(
        data,
        viewport,
        view_state,
        &mut Surfaces {
            map: &mut map,
            plot: &mut plot,
            tooltip: &mut tooltip,
            plot_size,
        },
        now(),
    );
    let svg = map.root().clone();

    STATE.with(|state| {
        *state.borrow_mut() = Some(ViewerState {
            view,
            map,
            plot,
            tooltip,
            window: window.clone(),
            map_container,
            plot_container,
            plot_size,
            frame_pending: false,
        });
    });
    install_listeners(&window, &document, &svg)
}

/// View state seeded from the slider and the checked category radio.
fn initial_view_state(document: &Document, data: &MapData) -> scene::ViewState {
    let mut state = MapView::initial_view_state(data);
    let slider = document
        .get_element_by_id(SLIDER_ID)
        .and_then(|el| el.dyn_into::<HtmlInputElement>().ok());
    if let Some(slider) = slider
        && let Err(err) = state.set_year(&slider.value())
    {
        log(&format!("ignoring slider value: {err}"));
    }
    let checked = document
        .query_selector(&format!("{CATEGORY_INPUTS}:checked"))
        .ok()
        .flatten()
        .and_then(|el| el.dyn_into::<HtmlInputElement>().ok());
    if let Some(radio) = checked
        && let Err(err) = state.set_category(&radio.value(), &data.variant.category_filter())
    {
        log(&format!("ignoring category value: {err}"));
    }
    state
}

fn listen(
    target: &EventTarget,
    name: &str,
    handler: impl FnMut(Event) + 'static,
) -> Result<(), JsValue> {
    let closure = Closure::<dyn FnMut(Event)>::new(handler);
    target.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

fn input_value(event: &Event) -> Option<String> {
    let input = event.target()?.dyn_into::<HtmlInputElement>().ok()?;
    Some(input.value())
}

fn marker_target(event: &Event) -> Option<Handle> {
    let el = event.target()?.dyn_into::<Element>().ok()?;
    handle_from_element_id(&el.id())
}

fn install_listeners(window: &Window, document: &Document, svg: &Element) -> Result<(), JsValue> {
    if let Some(slider) = document.get_element_by_id(SLIDER_ID) {
        listen(&slider, "input", |event| {
            if let Some(value) = input_value(&event) {
                dispatch(UiEvent::YearChanged(value));
            }
        })?;
    }

    let radios = document.query_selector_all(CATEGORY_INPUTS)?;
    for i in 0..radios.length() {
        if let Some(radio) = radios.item(i) {
            listen(&radio, "change", |event| {
                if let Some(value) = input_value(&event) {
                    dispatch(UiEvent::CategoryChanged(value));
                }
            })?;
        }
    }

    listen(svg, "mouseover", |event| {
        if let Some(marker) = marker_target(&event) {
            dispatch(UiEvent::PointerEnter { marker });
        }
    })?;
    listen(svg, "mouseout", |event| {
        if let Some(marker) = marker_target(&event) {
            dispatch(UiEvent::PointerLeave { marker });
        }
    })?;
    listen(svg, "mousemove", |event| {
        if let Some(mouse) = event.dyn_ref::<MouseEvent>() {
            dispatch(UiEvent::PointerMove {
                position: Vec2::new(f64::from(mouse.page_x()), f64::from(mouse.page_y())),
            });
        }
    })?;
    listen(window, "resize", |_| {
        with_state(|state| state.resize(now()));
        schedule_frame();
    })?;
    Ok(())
}

fn dispatch(event: UiEvent) {
    EVENTS.with(|bus| bus.borrow_mut().emit(event));
    flush();
}

/// Hands queued events to the view; events raised while it is busy wait
/// for the next flush.
fn flush() {
    with_state(|state| {
        let now = now();
        loop {
            let pending = EVENTS.with(|bus| bus.borrow_mut().drain());
            if pending.is_empty() {
                break;
            }
            for event in &pending {
                state.handle(event, now);
            }
        }
    });
    schedule_frame();
}

/// Requests an animation frame unless one is already pending.
fn schedule_frame() {
    let request = with_state(|state| !std::mem::replace(&mut state.frame_pending, true));
    if request != Some(true) {
        return;
    }
    let Some(window) = web_sys::window() else {
        return;
    };
    let callback = Closure::once_into_js(on_frame);
    if let Err(err) = window.request_animation_frame(callback.unchecked_ref()) {
        log(&format!("requestAnimationFrame failed: {err:?}"));
        with_state(|state| state.frame_pending = false);
    }
}

fn on_frame() {
    let animating = with_state(|state| {
        state.frame_pending = false;
        state.tick(now())
    });
    if animating == Some(true) {
        schedule_frame();
    }
}
