// academy-export/src/surface/pdf.rs

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use pdf_writer::types::{CidFontType, FontFlags, SystemInfo};
use pdf_writer::{Content, Name, Pdf, Rect as PdfRect, Ref, Str, TextStr};
use tracing::debug;

use super::{Color, PageSize, Rect, Surface};
use crate::assets::{load_font_file, load_raster, FontFile, RasterImage};
use crate::error::{ExportError, Result};
use crate::fonts::{BuiltinFont, FontSource};

const DEFAULT_CID_WIDTH: f32 = 500.0;

struct RefAlloc(i32);

impl RefAlloc {
    fn bump(&mut self) -> Ref {
        let id = Ref::new(self.0);
        self.0 += 1;
        id
    }
}

struct EmbeddedFont {
    file: FontFile,
    base_name: String,
    /// Glyph id -> (character, advance in 1/1000 em) for every glyph drawn.
    used: BTreeMap<u16, (char, f32)>,
}

enum FontProgram {
    Builtin(BuiltinFont),
    Embedded(EmbeddedFont),
}

struct FontSlot {
    resource: String,
    program: FontProgram,
}

struct ImageSlot {
    resource: String,
    raster: RasterImage,
}

/// Writes a real PDF with pdf-writer.
///
/// Built-in fonts are referenced as standard Type1 fonts with WinAnsi
/// encoding. TrueType files are embedded whole as Type0/CIDFontType2 with
/// Identity-H encoding and a ToUnicode map, so Vietnamese text stays
/// selectable. Content is buffered per page and serialized in `finish`.
pub struct PdfSurface {
    size: PageSize,
    title: String,
    producer: String,
    pages: Vec<Content>,
    fonts: Vec<FontSlot>,
    font_keys: HashMap<String, usize>,
    images: Vec<ImageSlot>,
    image_keys: HashMap<String, usize>,
    active: Option<(String, usize)>,
}

impl PdfSurface {
    pub fn new(size: PageSize, title: &str, producer: &str) -> Self {
        Self {
            size,
            title: title.to_string(),
            producer: producer.to_string(),
            pages: Vec::new(),
            fonts: Vec::new(),
            font_keys: HashMap::new(),
            images: Vec::new(),
            image_keys: HashMap::new(),
            active: None,
        }
    }

    fn page_mut(&mut self) -> Result<&mut Content> {
        self.pages
            .last_mut()
            .ok_or_else(|| ExportError::DrawError("no page has been added".into()))
    }

    /// Encodes `text` for the font in `slot`, recording glyph usage of
    /// embedded fonts. Fails without recording anything when an embedded
    /// font lacks a glyph, so the caller can retry with another font.
    fn encode(&mut self, slot: usize, text: &str) -> Result<Vec<u8>> {
        match &mut self.fonts[slot].program {
            FontProgram::Builtin(font) => Ok(font.encode(text)),
            FontProgram::Embedded(font) => {
                if let Some(ch) = font.file.missing_glyph(text) {
                    return Err(ExportError::FontError(format!(
                        "font '{}' has no glyph for {ch:?}",
                        font.base_name
                    )));
                }
                let scale = 1000.0 / f32::from(font.file.units_per_em);
                let mut bytes = Vec::with_capacity(text.len() * 2);
                for ch in text.chars() {
                    if let Some(glyph) = font.file.glyph(ch) {
                        let advance = f32::from(glyph.advance) * scale;
                        font.used.entry(glyph.id).or_insert((ch, advance));
                        bytes.extend_from_slice(&glyph.id.to_be_bytes());
                    }
                }
                Ok(bytes)
            }
        }
    }
}

impl Surface for PdfSurface {
    fn page_size(&self) -> PageSize {
        self.size
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn add_page(&mut self) -> Result<()> {
        self.pages.push(Content::new());
        self.active = None;
        Ok(())
    }

    fn has_font(&self, key: &str) -> bool {
        self.font_keys.contains_key(key)
    }

    fn register_font(&mut self, key: &str, source: &FontSource) -> Result<()> {
        if self.font_keys.contains_key(key) {
            return Ok(());
        }
        let program = match source {
            FontSource::Builtin(font) => FontProgram::Builtin(*font),
            FontSource::File(path) => {
                let file = load_font_file(path)?;
                let base_name = file
                    .family
                    .as_deref()
                    .map(|family| family.replace(' ', ""))
                    .unwrap_or_else(|| format!("Embedded{}", self.fonts.len() + 1));
                FontProgram::Embedded(EmbeddedFont {
                    file,
                    base_name,
                    used: BTreeMap::new(),
                })
            }
        };
        let slot = self.fonts.len();
        self.fonts.push(FontSlot {
            resource: format!("F{}", slot + 1),
            program,
        });
        self.font_keys.insert(key.to_string(), slot);
        debug!(key, resource = %self.fonts[slot].resource, "Font registered");
        Ok(())
    }

    fn set_font(&mut self, key: &str) -> Result<()> {
        let slot = *self
            .font_keys
            .get(key)
            .ok_or_else(|| ExportError::FontError(format!("font '{key}' is not registered")))?;
        self.active = Some((key.to_string(), slot));
        Ok(())
    }

    fn active_font(&self) -> Option<&str> {
        self.active.as_ref().map(|(key, _)| key.as_str())
    }

    fn text_width(&self, text: &str, size: f64) -> f64 {
        let program = self.active.as_ref().map(|(_, slot)| &self.fonts[*slot].program);
        match program {
            Some(FontProgram::Embedded(font)) => font.file.text_width(text, size),
            Some(FontProgram::Builtin(font)) => font.text_width(text, size),
            None => BuiltinFont::Helvetica.text_width(text, size),
        }
    }

    fn draw_text(
        &mut self,
        text: &str,
        x: f64,
        baseline: f64,
        size: f64,
        color: Color,
    ) -> Result<()> {
        let page = self.page_count();
        self.page_mut()?;
        let slot = self
            .active
            .as_ref()
            .map(|(_, slot)| *slot)
            .ok_or(ExportError::FontNotSelected(page))?;
        let bytes = self.encode(slot, text)?;
        let resource = self.fonts[slot].resource.clone();
        let y = self.size.height - baseline;
        let (r, g, b) = color.components();

        let content = self.page_mut()?;
        content.set_fill_rgb(r, g, b);
        content
            .begin_text()
            .set_font(Name(resource.as_bytes()), size as f32)
            .next_line(x as f32, y as f32)
            .show(Str(&bytes))
            .end_text();
        Ok(())
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) -> Result<()> {
        let y = self.size.height - rect.bottom();
        let (r, g, b) = color.components();
        self.page_mut()?
            .set_fill_rgb(r, g, b)
            .rect(rect.x as f32, y as f32, rect.width as f32, rect.height as f32)
            .fill_nonzero();
        Ok(())
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color, line_width: f64) -> Result<()> {
        let y = self.size.height - rect.bottom();
        let (r, g, b) = color.components();
        self.page_mut()?
            .set_stroke_rgb(r, g, b)
            .set_line_width(line_width as f32)
            .rect(rect.x as f32, y as f32, rect.width as f32, rect.height as f32)
            .stroke();
        Ok(())
    }

    fn register_image(&mut self, key: &str, path: &Path) -> Result<(u32, u32)> {
        if let Some(slot) = self.image_keys.get(key) {
            let raster = &self.images[*slot].raster;
            return Ok((raster.width, raster.height));
        }
        let raster = load_raster(path)?;
        let dims = (raster.width, raster.height);
        let slot = self.images.len();
        self.images.push(ImageSlot {
            resource: format!("Im{}", slot + 1),
            raster,
        });
        self.image_keys.insert(key.to_string(), slot);
        Ok(dims)
    }

    fn draw_image(&mut self, key: &str, rect: Rect) -> Result<()> {
        let slot = *self
            .image_keys
            .get(key)
            .ok_or_else(|| ExportError::ImageError(format!("image '{key}' is not registered")))?;
        let resource = self.images[slot].resource.clone();
        let y = self.size.height - rect.bottom();
        let content = self.page_mut()?;
        content.save_state();
        content.transform([
            rect.width as f32,
            0.0,
            0.0,
            rect.height as f32,
            rect.x as f32,
            y as f32,
        ]);
        content.x_object(Name(resource.as_bytes()));
        content.restore_state();
        Ok(())
    }

    fn finish(self) -> Result<Vec<u8>> {
        let PdfSurface {
            size,
            title,
            producer,
            pages,
            fonts,
            images,
            ..
        } = self;

        if pages.is_empty() {
            return Err(ExportError::AssemblyFailed("document has no pages".into()));
        }

        let mut alloc = RefAlloc(1);
        let mut pdf = Pdf::new();
        let catalog_id = alloc.bump();
        let tree_id = alloc.bump();
        let info_id = alloc.bump();
        let page_ids: Vec<Ref> = pages.iter().map(|_| alloc.bump()).collect();
        let content_ids: Vec<Ref> = pages.iter().map(|_| alloc.bump()).collect();
        let font_ids: Vec<Ref> = fonts.iter().map(|_| alloc.bump()).collect();
        let image_ids: Vec<Ref> = images.iter().map(|_| alloc.bump()).collect();

        pdf.catalog(catalog_id).pages(tree_id);
        pdf.pages(tree_id)
            .kids(page_ids.iter().copied())
            .count(page_ids.len() as i32);

        for (i, page_id) in page_ids.iter().enumerate() {
            let mut page = pdf.page(*page_id);
            page.media_box(PdfRect::new(0.0, 0.0, size.width as f32, size.height as f32))
                .parent(tree_id)
                .contents(content_ids[i]);
            let mut resources = page.resources();
            {
                let mut dict = resources.fonts();
                for (slot, id) in fonts.iter().zip(&font_ids) {
                    dict.pair(Name(slot.resource.as_bytes()), *id);
                }
            }
            if !images.is_empty() {
                let mut dict = resources.x_objects();
                for (slot, id) in images.iter().zip(&image_ids) {
                    dict.pair(Name(slot.resource.as_bytes()), *id);
                }
            }
        }

        let page_count = pages.len();
        for (content, id) in pages.into_iter().zip(&content_ids) {
            pdf.stream(*id, &content.finish());
        }

        for (slot, id) in fonts.iter().zip(&font_ids) {
            match &slot.program {
                FontProgram::Builtin(font) => {
                    pdf.type1_font(*id)
                        .base_font(Name(font.base_name().as_bytes()))
                        .encoding_predefined(Name(b"WinAnsiEncoding"));
                }
                FontProgram::Embedded(font) => write_embedded(&mut pdf, &mut alloc, *id, font),
            }
        }

        for (slot, id) in images.iter().zip(&image_ids) {
            let raster = &slot.raster;
            let mut xobject = pdf.image_xobject(*id, &raster.rgb);
            xobject.width(raster.width as i32);
            xobject.height(raster.height as i32);
            xobject.color_space().device_rgb();
            xobject.bits_per_component(8);
        }

        pdf.document_info(info_id)
            .title(TextStr(&title))
            .producer(TextStr(&producer));

        let bytes = pdf.finish();
        debug!(pages = page_count, size_bytes = bytes.len(), "PDF serialized");
        Ok(bytes)
    }
}

fn write_embedded(
    pdf: &mut Pdf,
    alloc: &mut RefAlloc,
    font_id: Ref,
    font: &EmbeddedFont,
) {
    let file = &font.file;
    let scale = 1000.0 / f32::from(file.units_per_em);
    let [x_min, y_min, x_max, y_max] = file.bbox.map(|v| f32::from(v) * scale);
    let base_name = font.base_name.as_str();

    let cid_font_id = alloc.bump();
    let descriptor_id = alloc.bump();
    let file_id = alloc.bump();
    let gid_map_id = alloc.bump();
    let cmap_id = alloc.bump();

    pdf.stream(file_id, &file.data)
        .pair(Name(b"Length1"), file.data.len() as i32);

    // CID == GID for every glyph referenced.
    let max_gid = font.used.keys().next_back().copied().unwrap_or(0);
    let gid_map: Vec<u8> = (0..=max_gid).flat_map(|gid| gid.to_be_bytes()).collect();
    pdf.stream(gid_map_id, &gid_map);

    pdf.stream(cmap_id, to_unicode_cmap(&font.used).as_bytes());

    pdf.font_descriptor(descriptor_id)
        .name(Name(base_name.as_bytes()))
        .flags(FontFlags::NON_SYMBOLIC)
        .bbox(PdfRect::new(x_min, y_min, x_max, y_max))
        .italic_angle(0.0)
        .ascent(f32::from(file.ascender) * scale)
        .descent(f32::from(file.descender) * scale)
        .cap_height(f32::from(file.cap_height) * scale)
        .stem_v(80.0)
        .font_file2(file_id);

    {
        let mut cid_font = pdf.cid_font(cid_font_id);
        cid_font
            .subtype(CidFontType::Type2)
            .base_font(Name(base_name.as_bytes()))
            .system_info(SystemInfo {
                registry: Str(b"Adobe"),
                ordering: Str(b"Identity"),
                supplement: 0,
            })
            .font_descriptor(descriptor_id)
            .default_width(DEFAULT_CID_WIDTH)
            .cid_to_gid_map_stream(gid_map_id);
        let mut widths = cid_font.widths();
        for (gid, (_, advance)) in &font.used {
            widths.consecutive(*gid, [*advance]);
        }
    }

    pdf.type0_font(font_id)
        .base_font(Name(base_name.as_bytes()))
        .encoding_predefined(Name(b"Identity-H"))
        .descendant_font(cid_font_id)
        .to_unicode(cmap_id);
}

fn to_unicode_cmap(used: &BTreeMap<u16, (char, f32)>) -> String {
    let pairs: Vec<(u16, char)> = used.iter().map(|(gid, (ch, _))| (*gid, *ch)).collect();
    let mut sections = String::new();
    for chunk in pairs.chunks(100) {
        sections.push_str(&format!("{} beginbfchar\n", chunk.len()));
        for (gid, ch) in chunk {
            let mut units = [0u16; 2];
            let hex: String = ch
                .encode_utf16(&mut units)
                .iter()
                .map(|unit| format!("{unit:04X}"))
                .collect();
            sections.push_str(&format!("<{gid:04X}> <{hex}>\n"));
        }
        sections.push_str("endbfchar\n");
    }

    format!(
        "/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def
/CMapName /Adobe-Identity-UCS def
/CMapType 2 def
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
{sections}endcmap
CMapName currentdict /CMap defineresource pop
end
end"
    )
}
