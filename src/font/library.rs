//! Registry of host-supplied font files

use super::{FontFace, FontSource, LineMetrics};
use crate::error::{Error, Result};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use ttf_parser::{name_id, Face};

/// One parsed face of a font file, with metrics in font units
#[derive(Debug)]
struct FontData {
    bytes: Arc<Vec<u8>>,
    face_index: u32,
    family: String,
    units_per_em: u16,
    space_advance: u16,
    ascender: i16,
    descender: i16,
    /// Advances of ASCII characters (0-127), in font units
    ascii_advances: Vec<u16>,
}

impl FontData {
    fn advance(&self, face: Option<&Face<'_>>, c: char) -> u16 {
        if c.is_ascii() {
            return self.ascii_advances[c as usize];
        }
        face.and_then(|face| face.glyph_index(c))
            .and_then(|glyph| face.and_then(|face| face.glyph_hor_advance(glyph)))
            .unwrap_or(self.space_advance)
    }
}

/// A registered face at a fixed size
#[derive(Debug, Clone)]
pub struct TtfFace {
    data: Arc<FontData>,
    size_pt: f32,
}

impl TtfFace {
    fn scale(&self) -> f32 {
        self.size_pt / self.data.units_per_em.max(1) as f32
    }
}

impl FontFace for TtfFace {
    fn family(&self) -> &str {
        &self.data.family
    }

    fn size_pt(&self) -> f32 {
        self.size_pt
    }

    fn measure(&self, text: &str) -> f32 {
        // Only reparse when the table lookup cannot answer
        let face = if text.is_ascii() {
            None
        } else {
            Face::parse(&self.data.bytes, self.data.face_index).ok()
        };

        let mut advance: u32 = 0;
        for c in text.chars() {
            if c == '\n' || c == '\u{2060}' {
                continue;
            }
            advance = advance.saturating_add(self.data.advance(face.as_ref(), c) as u32);
        }
        advance as f32 * self.scale()
    }

    fn metrics(&self) -> LineMetrics {
        LineMetrics {
            ascent: self.data.ascender.max(0) as f32 * self.scale(),
            descent: (self.data.descender as i32).unsigned_abs() as f32 * self.scale(),
        }
    }
}

/// Font files registered by the host, looked up by family name
#[derive(Debug, Clone, Default)]
pub struct FontLibrary {
    /// Keyed by lower-cased family name
    faces: FxHashMap<String, Arc<FontData>>,
}

impl FontLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every face in a font file or collection, returning their families
    pub fn add_font_data(&mut self, bytes: Vec<u8>) -> Result<Vec<String>> {
        let bytes = Arc::new(bytes);
        let count = ttf_parser::fonts_in_collection(&bytes).unwrap_or(1);
        let mut families = Vec::new();

        for index in 0..count {
            let face = match Face::parse(&bytes, index) {
                Ok(face) => face,
                Err(err) => {
                    log::debug!("skipping face {} of font data: {}", index, err);
                    continue;
                }
            };
            let Some(family) = extract_family_name(&face) else {
                log::debug!("skipping face {} without a family name", index);
                continue;
            };

            let data = parse_face_data(&face, bytes.clone(), index, family.clone());
            let key = family.to_lowercase();
            // First face of a family wins (usually the regular weight)
            if !self.faces.contains_key(&key) {
                self.faces.insert(key, Arc::new(data));
                families.push(family);
            }
        }

        if families.is_empty() {
            return Err(Error::FontParse(
                "no usable face with a family name".to_string(),
            ));
        }
        log::debug!("registered font families {:?}", families);
        Ok(families)
    }

    /// Whether a family is registered
    pub fn contains(&self, family: &str) -> bool {
        self.faces.contains_key(&family.to_lowercase())
    }

    /// Number of registered families
    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }
}

impl FontSource for FontLibrary {
    fn load(&self, family: &str, size_pt: f32) -> Result<Arc<dyn FontFace>> {
        let data = self
            .faces
            .get(&family.to_lowercase())
            .ok_or_else(|| Error::FontNotFound {
                family: family.to_string(),
            })?;
        Ok(Arc::new(TtfFace {
            data: data.clone(),
            size_pt,
        }))
    }
}

fn parse_face_data(face: &Face<'_>, bytes: Arc<Vec<u8>>, face_index: u32, family: String) -> FontData {
    let units_per_em = face.units_per_em().max(1);
    let space_advance = face
        .glyph_index(' ')
        .and_then(|id| face.glyph_hor_advance(id))
        .unwrap_or(units_per_em / 2);

    let ascii_advances = (0u8..128)
        .map(|code| {
            let c = code as char;
            if c.is_ascii_control() {
                return 0;
            }
            face.glyph_index(c)
                .and_then(|id| face.glyph_hor_advance(id))
                .unwrap_or(space_advance)
        })
        .collect();

    FontData {
        bytes,
        face_index,
        family,
        units_per_em,
        space_advance,
        ascender: face.ascender(),
        descender: face.descender(),
        ascii_advances,
    }
}

fn extract_family_name(face: &Face<'_>) -> Option<String> {
    let mut fallback = None;
    for name in face.names() {
        if name.name_id == name_id::TYPOGRAPHIC_FAMILY {
            if let Some(value) = name.to_string() {
                return Some(value);
            }
        } else if name.name_id == name_id::FAMILY && fallback.is_none() {
            fallback = name.to_string();
        }
    }
    fallback
}
