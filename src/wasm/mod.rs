//! WASM bindings for book mode

use crate::document::markup::refs_to_markup;
use crate::reflow::now_ms;
use crate::{
    BookConfig, ContentNode, ContentReady, ContentTree, Error, Measurer, ReflowController,
    ReflowTrigger, Result, Viewport,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn to_js(err: Error) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn ready_json(ready: Option<ContentReady>) -> std::result::Result<Option<String>, JsValue> {
    ready
        .map(|r| serde_json::to_string(&r).map_err(|e| to_js(e.into())))
        .transpose()
}

/// Measures through a host callback `(markup, width) => height`.
///
/// The host renders the markup into an off-screen container of the given
/// width and returns its height in pixels.
#[derive(Debug, Default)]
pub struct JsMeasurer {
    callback: Option<js_sys::Function>,
    width: Option<f32>,
}

impl JsMeasurer {
    pub fn new(callback: js_sys::Function) -> Self {
        Self {
            callback: Some(callback),
            width: None,
        }
    }

    pub fn set_callback(&mut self, callback: js_sys::Function) {
        self.callback = Some(callback);
    }
}

impl Measurer for JsMeasurer {
    fn begin(&mut self, width: f32) -> Result<()> {
        if self.callback.is_none() {
            return Err(Error::Measure("no measure callback installed".into()));
        }
        self.width = Some(width);
        Ok(())
    }

    fn measure(&mut self, nodes: &[&ContentNode]) -> Result<f32> {
        let (Some(callback), Some(width)) = (&self.callback, self.width) else {
            return Err(Error::Measure("measure called outside a session".into()));
        };
        let markup = JsValue::from_str(&refs_to_markup(nodes));
        let height = callback
            .call2(&JsValue::NULL, &markup, &JsValue::from_f64(width as f64))
            .map_err(|e| Error::Measure(format!("{e:?}")))?;
        height
            .as_f64()
            .map(|h| h as f32)
            .ok_or_else(|| Error::Measure("measure callback returned a non-number".into()))
    }

    fn end(&mut self) {
        self.width = None;
    }
}

/// WASM-exposed book mode controller
#[wasm_bindgen]
pub struct WasmBook {
    controller: ReflowController,
    measurer: JsMeasurer,
    viewport: Viewport,
}

#[wasm_bindgen]
impl WasmBook {
    /// Create a controller, optionally from a JSON config
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> std::result::Result<WasmBook, JsValue> {
        let config = match config_json {
            Some(json) => BookConfig::from_json(&json).map_err(to_js)?,
            None => BookConfig::default(),
        };
        Ok(Self {
            controller: ReflowController::new(config),
            measurer: JsMeasurer::default(),
            viewport: Viewport::default(),
        })
    }

    /// Install the `(markup, width) => height` callback
    #[wasm_bindgen(js_name = setMeasure)]
    pub fn set_measure(&mut self, callback: js_sys::Function) {
        self.measurer.set_callback(callback);
    }

    /// Record the current viewport metrics
    #[wasm_bindgen(js_name = setViewport)]
    pub fn set_viewport(
        &mut self,
        width: f32,
        height: f32,
        container_width: f32,
        header_height: f32,
        device_pixel_ratio: f32,
    ) {
        self.viewport = Viewport {
            width,
            height,
            container_width,
            header_height,
            device_pixel_ratio,
        };
    }

    /// Paginate freshly loaded content. Returns the content-ready signal
    /// as JSON, or nothing when book mode does not apply.
    pub fn enable(
        &mut self,
        source: &str,
        html: &str,
    ) -> std::result::Result<Option<String>, JsValue> {
        let tree = ContentTree::parse(source, html).map_err(to_js)?;
        let ready = self
            .controller
            .enable(tree, &self.viewport, &mut self.measurer)
            .map_err(to_js)?;
        ready_json(ready)
    }

    /// Note a DOM event (`resize`, `orientationchange`, `load`, `imageload`)
    pub fn trigger(&mut self, kind: &str) -> std::result::Result<(), JsValue> {
        let trigger: ReflowTrigger = kind.parse().map_err(to_js)?;
        self.controller.trigger(trigger, now_ms());
        Ok(())
    }

    /// Run a due reflow. Returns the content-ready signal as JSON.
    pub fn poll(&mut self) -> std::result::Result<Option<String>, JsValue> {
        let ready = self
            .controller
            .poll(now_ms(), &self.viewport, &mut self.measurer)
            .map_err(to_js)?;
        ready_json(ready)
    }

    /// Milliseconds until the next timed update, if one is armed
    #[wasm_bindgen(js_name = nextDeadline)]
    pub fn next_deadline(&self) -> Option<f64> {
        let book = self.controller.book().and_then(|b| b.next_deadline());
        let reflow = self.controller.next_deadline();
        let deadline = match (book, reflow) {
            (Some(a), Some(b)) => a.min(b),
            (a, b) => a.or(b)?,
        };
        Some(deadline.saturating_sub(now_ms()) as f64)
    }

    /// Book state for the host as JSON
    #[wasm_bindgen(js_name = renderData)]
    pub fn render_data(&self) -> String {
        serde_json::to_string(&RenderData::from_controller(&self.controller))
            .unwrap_or_else(|_| "null".to_string())
    }

    /// Markup for the book container
    #[wasm_bindgen(js_name = bookHtml)]
    pub fn book_html(&self) -> Option<String> {
        self.controller.book().map(|b| b.to_markup())
    }

    /// The book scrolled horizontally
    pub fn scroll(&mut self, scroll_left: f32) {
        if let Some(book) = self.controller.book_mut() {
            book.on_scroll(scroll_left, now_ms());
        }
    }

    /// The book's visible width changed
    pub fn resize(&mut self, client_width: f32) {
        if let Some(book) = self.controller.book_mut() {
            book.on_resize(client_width, now_ms());
        }
    }

    /// Refresh the indicator if due. Returns true if it changed.
    #[wasm_bindgen(js_name = pollIndicator)]
    pub fn poll_indicator(&mut self) -> bool {
        self.controller
            .book_mut()
            .is_some_and(|book| book.poll(now_ms()))
    }

    /// Scroll offset to smooth-scroll to for a tap at `x`
    pub fn tap(&self, x: f32) -> Option<f64> {
        self.controller
            .book()
            .and_then(|book| book.tap(x))
            .map(|target| target.left as f64)
    }

    #[wasm_bindgen(js_name = indicatorText)]
    pub fn indicator_text(&self) -> String {
        self.controller
            .book()
            .map(|book| book.indicator().text())
            .unwrap_or_default()
    }

    pub fn dispose(&mut self) {
        self.controller.dispose();
    }
}

/// Serializable render data for JS
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderData {
    pub source: String,
    pub state: &'static str,
    pub current_page: usize,
    pub indicator: String,
    pub sheets: Vec<SheetRenderData>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetRenderData {
    pub index: usize,
    pub html: String,
    pub overflow: bool,
}

impl RenderData {
    fn from_controller(controller: &ReflowController) -> Self {
        use crate::document::markup::to_markup;
        use crate::ReflowState;

        let state = match controller.state() {
            ReflowState::Unpaginated => "unpaginated",
            ReflowState::Paginating => "paginating",
            ReflowState::Paginated => "paginated",
            ReflowState::Disposed => "disposed",
        };

        let Some(book) = controller.book() else {
            return RenderData {
                source: controller.source().to_string(),
                state,
                current_page: 0,
                indicator: String::new(),
                sheets: Vec::new(),
            };
        };

        RenderData {
            source: controller.source().to_string(),
            state,
            current_page: book.indicator().index(),
            indicator: book.indicator().text(),
            sheets: book
                .sheets()
                .iter()
                .enumerate()
                .map(|(index, sheet)| SheetRenderData {
                    index,
                    html: to_markup(&sheet.nodes),
                    overflow: sheet.overflow,
                })
                .collect(),
        }
    }
}
