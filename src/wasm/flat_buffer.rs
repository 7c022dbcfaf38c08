//! Flat buffer protocol for handing pages to a JS renderer
//!
//! ## u32 Buffer Layout:
//! ```text
//! Header:
//! [0]     MAGIC (0x53464954 = "SFIT" for validation)
//! [1]     SCHEMA_VERSION (protocol version, currently 1)
//! [2]     page_count
//! [3]     line_count (all pages)
//! [4]     text_buffer_len
//! [5]     overflow_count (pages taller than their budget)
//! [6..]   page data...
//!
//! Per-page:
//!   [unit_start, unit_end, line_count, page_flags]
//!   page_flags: bit0=overflow
//!   per-line: [text_offset, text_len, text_utf16_offset, text_utf16_len, unit, line_flags]
//!     text_offset/text_len: byte offsets in text_data (UTF-8)
//!     text_utf16_offset/text_utf16_len: offsets for JS substring (after single decode)
//!     line_flags: bit0=starts_unit, bit1=gap_before
//! ```
//!
//! ## f32 Buffer Layout:
//! ```text
//! Per-page: [used_height]
//! Per-line: [y] (top of the line inside the content box, gaps included)
//! ```

use crate::geometry::FitSpec;
use crate::layout::Page;

/// Magic number for format validation: "SFIT"
pub const MAGIC: u32 = 0x53464954;

/// Schema version for protocol compatibility checking
pub const SCHEMA_VERSION: u32 = 1;

/// Header size in u32 elements
pub const HEADER_SIZE: usize = 6;

/// Number of u32 values per page header
pub const U32_PER_PAGE: usize = 4;

/// Number of u32 values per line
pub const U32_PER_LINE: usize = 6;

pub const F32_PER_PAGE: usize = 1;
pub const F32_PER_LINE: usize = 1;

pub const PAGE_FLAG_OVERFLOW: u32 = 0b01;

pub const LINE_FLAG_STARTS_UNIT: u32 = 0b01;
pub const LINE_FLAG_GAP_BEFORE: u32 = 0b10;

/// Page buffers shared with JS by pointer
pub struct PageBuffer {
    /// Integer data (counts, offsets, flags)
    pub u32_data: Vec<u32>,
    /// Float data (heights, positions)
    pub f32_data: Vec<f32>,
    /// UTF-8 text buffer
    pub text_data: Vec<u8>,

    line_total: u32,
    overflow_total: u32,
    // Track cumulative UTF-16 offset for efficient JS decoding
    utf16_text_offset: usize,
}

impl Default for PageBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl PageBuffer {
    pub fn new() -> Self {
        Self {
            u32_data: Vec::with_capacity(256),
            f32_data: Vec::with_capacity(128),
            text_data: Vec::with_capacity(2048),
            line_total: 0,
            overflow_total: 0,
            utf16_text_offset: 0,
        }
    }

    pub fn clear(&mut self) {
        self.u32_data.clear();
        self.f32_data.clear();
        self.text_data.clear();
        self.line_total = 0;
        self.overflow_total = 0;
        self.utf16_text_offset = 0;
    }

    /// Reserve room up front; JS holds raw pointers, so buffers must not move while encoding
    pub fn prepare(&mut self, u32_needed: usize, f32_needed: usize, text_needed: usize) {
        self.clear();
        self.u32_data.reserve(u32_needed);
        self.f32_data.reserve(f32_needed);
        self.text_data.reserve(text_needed);
    }

    pub fn write_header(&mut self, page_count: u32) {
        self.u32_data.push(MAGIC); //          [0] magic number
        self.u32_data.push(SCHEMA_VERSION); // [1] schema version
        self.u32_data.push(page_count); //     [2] page_count
        self.u32_data.push(0); //              [3] line_count (placeholder)
        self.u32_data.push(0); //              [4] text_buffer_len (placeholder)
        self.u32_data.push(0); //              [5] overflow_count (placeholder)
    }

    /// Write page header, returns index where line_count should be written
    pub fn begin_page(&mut self, unit_start: usize, unit_end: usize, overflow: bool, used_height: f32) -> usize {
        self.u32_data.push(unit_start as u32);
        self.u32_data.push(unit_end as u32);
        let line_count_idx = self.u32_data.len();
        self.u32_data.push(0); // line_count placeholder
        self.u32_data.push(if overflow { PAGE_FLAG_OVERFLOW } else { 0 });
        self.f32_data.push(used_height);

        if overflow {
            self.overflow_total += 1;
        }
        line_count_idx
    }

    pub fn set_line_count(&mut self, idx: usize, count: u32) {
        if idx < self.u32_data.len() {
            self.u32_data[idx] = count;
        }
    }

    pub fn write_line(&mut self, y: f32, text: &str, unit: usize, flags: u32) {
        let text_offset = self.text_data.len() as u32;
        self.text_data.extend_from_slice(text.as_bytes());

        let text_utf16_offset = self.utf16_text_offset as u32;
        let text_utf16_len = text.chars().map(|c| c.len_utf16()).sum::<usize>() as u32;
        self.utf16_text_offset += text_utf16_len as usize;

        self.u32_data.push(text_offset);
        self.u32_data.push(text.len() as u32);
        self.u32_data.push(text_utf16_offset);
        self.u32_data.push(text_utf16_len);
        self.u32_data.push(unit as u32);
        self.u32_data.push(flags);
        self.f32_data.push(y);
        self.line_total += 1;
    }

    /// Synchronize header totals; call after all pages are written
    pub fn finalize(&mut self) {
        if self.u32_data.len() < HEADER_SIZE {
            return;
        }
        self.u32_data[3] = self.line_total;
        self.u32_data[4] = self.text_data.len() as u32;
        self.u32_data[5] = self.overflow_total;

        #[cfg(debug_assertions)]
        self.validate_text_offsets();
    }

    #[cfg(debug_assertions)]
    fn validate_text_offsets(&self) {
        let page_count = self.u32_data[2] as usize;
        let text_len = self.text_data.len();
        let mut idx = HEADER_SIZE;

        for page_idx in 0..page_count {
            if idx + U32_PER_PAGE > self.u32_data.len() {
                break;
            }
            let line_count = self.u32_data[idx + 2] as usize;
            idx += U32_PER_PAGE;

            for line_idx in 0..line_count {
                if idx + U32_PER_LINE > self.u32_data.len() {
                    break;
                }
                let text_offset = self.u32_data[idx] as usize;
                let text_length = self.u32_data[idx + 1] as usize;
                debug_assert!(
                    text_offset + text_length <= text_len,
                    "Invalid text range for page {}, line {}: offset {} + length {} > text buffer size {}",
                    page_idx,
                    line_idx,
                    text_offset,
                    text_length,
                    text_len
                );
                idx += U32_PER_LINE;
            }
        }
    }

    /// Encode a page sequence, replacing previous contents
    pub fn encode(&mut self, pages: &[Page], fit: &FitSpec) {
        let lines: usize = pages.iter().map(|p| p.line_count()).sum();
        let text: usize = pages
            .iter()
            .flat_map(|p| p.lines.iter())
            .map(|l| l.text.len())
            .sum();
        self.prepare(
            HEADER_SIZE + pages.len() * U32_PER_PAGE + lines * U32_PER_LINE,
            pages.len() * F32_PER_PAGE + lines * F32_PER_LINE,
            text,
        );

        self.write_header(pages.len() as u32);
        for page in pages {
            let line_count_idx = self.begin_page(
                page.units.start,
                page.units.end,
                !page.fits(fit),
                page.used_height(fit),
            );

            let mut y = 0.0;
            for line in &page.lines {
                let mut flags = 0;
                if line.starts_unit {
                    flags |= LINE_FLAG_STARTS_UNIT;
                }
                if line.gap_before {
                    flags |= LINE_FLAG_GAP_BEFORE;
                    y += fit.unit_gap;
                }
                self.write_line(y, &line.text, line.unit, flags);
                y += fit.line_height;
            }
            self.set_line_count(line_count_idx, page.line_count() as u32);
        }
        self.finalize();
    }

    // Accessors for WASM
    // Return u32 instead of usize for explicit WASM contract (wasm32 linear memory uses u32 offsets)
    pub fn u32_ptr(&self) -> u32 {
        self.u32_data.as_ptr() as u32
    }

    pub fn u32_len(&self) -> u32 {
        self.u32_data.len() as u32
    }

    pub fn f32_ptr(&self) -> u32 {
        self.f32_data.as_ptr() as u32
    }

    pub fn f32_len(&self) -> u32 {
        self.f32_data.len() as u32
    }

    pub fn text_ptr(&self) -> u32 {
        self.text_data.as_ptr() as u32
    }

    pub fn text_len(&self) -> u32 {
        self.text_data.len() as u32
    }
}
