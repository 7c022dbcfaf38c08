//! WASM bindings for the paginator

pub mod flat_buffer;

use crate::audit::audit;
use crate::content::ContentKind;
use crate::error::{Error, Result};
use crate::font::{FontChain, FontLibrary};
use crate::geometry::{ContainerGeometry, FitConfig};
use crate::layout::{Page, PaginationConfig, RebalanceRules, WrapRules};
use crate::Paginator;
use flat_buffer::PageBuffer;
use serde::Deserialize;
use std::sync::Arc;
use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Host options, all optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct PaginatorOptions {
    geometry: ContainerGeometry,
    fit: FitConfig,
    kind: ContentKind,
    wrap: Option<WrapRules>,
    rebalance: Option<RebalanceRules>,
}

impl PaginatorOptions {
    fn from_json(json: &str) -> Result<Self> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(json)?)
    }

    fn config(&self) -> PaginationConfig {
        let defaults = PaginationConfig::for_kind(self.kind);
        PaginationConfig {
            kind: self.kind,
            wrap: self.wrap.clone().unwrap_or(defaults.wrap),
            rebalance: self.rebalance.clone().unwrap_or(defaults.rebalance),
        }
    }
}

/// WASM-exposed paginator for one text container
#[wasm_bindgen]
pub struct WasmPaginator {
    options: PaginatorOptions,
    library: FontLibrary,
    paginator: Paginator,
    pages: Vec<Page>,
    buffer: PageBuffer,
}

impl WasmPaginator {
    fn from_options(options: PaginatorOptions) -> Self {
        let library = FontLibrary::new();
        let paginator = build_paginator(&options, &library);
        Self {
            options,
            library,
            paginator,
            pages: Vec::new(),
            buffer: PageBuffer::new(),
        }
    }

    fn add_font_bytes(&mut self, bytes: Vec<u8>) -> Result<Vec<String>> {
        let families = self.library.add_font_data(bytes)?;
        // A new face may satisfy the declared family or a fallback
        self.paginator = build_paginator(&self.options, &self.library);
        Ok(families)
    }

    fn paginate_lines_json(&mut self, lines_json: &str) -> Result<usize> {
        let lines: Vec<String> = serde_json::from_str(lines_json)?;
        let pages = self.paginator.paginate_lyrics(&lines);
        Ok(self.store(pages))
    }

    fn store(&mut self, pages: Vec<Page>) -> usize {
        self.buffer.encode(&pages, self.paginator.fit());
        self.pages = pages;
        self.pages.len()
    }
}

fn build_paginator(options: &PaginatorOptions, library: &FontLibrary) -> Paginator {
    let mut fonts = FontChain::new();
    if !library.is_empty() {
        fonts = fonts.with_source(Arc::new(library.clone()));
    }
    let fit = crate::geometry::resolve_fit_with(&options.geometry, &options.fit);
    let paginator = Paginator::new(fit, &fonts, options.config());
    log::debug!(
        "paginator ready: face {:?}, fell back {}",
        paginator.face().family(),
        paginator.font_fell_back()
    );
    paginator
}

fn js_error(err: Error) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}

#[wasm_bindgen]
impl WasmPaginator {
    /// Create a paginator from JSON options `{geometry, fit, kind, wrap, rebalance}`
    #[wasm_bindgen(constructor)]
    pub fn new(options_json: &str) -> std::result::Result<WasmPaginator, JsValue> {
        let options = PaginatorOptions::from_json(options_json).map_err(js_error)?;
        Ok(Self::from_options(options))
    }

    /// Register a TrueType/OpenType file, returns the families it provides
    #[wasm_bindgen(js_name = addFont)]
    pub fn add_font(&mut self, bytes: &[u8]) -> std::result::Result<js_sys::Array, JsValue> {
        let families = self.add_font_bytes(bytes.to_vec()).map_err(js_error)?;
        Ok(families.iter().map(|f| JsValue::from_str(f)).collect())
    }

    /// Paginate a JSON array of lyric lines, returns the page count
    #[wasm_bindgen(js_name = paginateLyrics)]
    pub fn paginate_lyrics(&mut self, lines_json: &str) -> std::result::Result<usize, JsValue> {
        self.paginate_lines_json(lines_json).map_err(js_error)
    }

    /// Paginate a scripture passage, returns the page count
    #[wasm_bindgen(js_name = paginateScripture)]
    pub fn paginate_scripture(&mut self, text: &str) -> usize {
        let pages = self.paginator.paginate_scripture(text);
        self.store(pages)
    }

    #[wasm_bindgen(js_name = getPageCount)]
    pub fn get_page_count(&self) -> usize {
        self.pages.len()
    }

    /// Whether the declared font family was unavailable
    #[wasm_bindgen(js_name = fontFellBack)]
    pub fn font_fell_back(&self) -> bool {
        self.paginator.font_fell_back()
    }

    /// Last pagination result as JSON
    #[wasm_bindgen(js_name = pagesJson)]
    pub fn pages_json(&self) -> std::result::Result<String, JsValue> {
        serde_json::to_string(&self.pages).map_err(|e| js_error(e.into()))
    }

    /// Quality audit of the last result as JSON
    #[wasm_bindgen(js_name = auditJson)]
    pub fn audit_json(&self) -> std::result::Result<String, JsValue> {
        let report = audit(&self.pages, self.paginator.fit());
        serde_json::to_string(&report).map_err(|e| js_error(e.into()))
    }

    /// Resolved fit spec as JSON
    #[wasm_bindgen(js_name = fitJson)]
    pub fn fit_json(&self) -> std::result::Result<String, JsValue> {
        serde_json::to_string(self.paginator.fit()).map_err(|e| js_error(e.into()))
    }

    // Flat buffer accessors, valid until the next paginate call

    #[wasm_bindgen(js_name = u32Ptr)]
    pub fn u32_ptr(&self) -> u32 {
        self.buffer.u32_ptr()
    }

    #[wasm_bindgen(js_name = u32Len)]
    pub fn u32_len(&self) -> u32 {
        self.buffer.u32_len()
    }

    #[wasm_bindgen(js_name = f32Ptr)]
    pub fn f32_ptr(&self) -> u32 {
        self.buffer.f32_ptr()
    }

    #[wasm_bindgen(js_name = f32Len)]
    pub fn f32_len(&self) -> u32 {
        self.buffer.f32_len()
    }

    #[wasm_bindgen(js_name = textPtr)]
    pub fn text_ptr(&self) -> u32 {
        self.buffer.text_ptr()
    }

    #[wasm_bindgen(js_name = textLen)]
    pub fn text_len(&self) -> u32 {
        self.buffer.text_len()
    }
}

impl Default for WasmPaginator {
    fn default() -> Self {
        Self::from_options(PaginatorOptions::default())
    }
}
