//! PDF exporter built on lopdf. Standard-14 Helvetica fonts (not embedded),
//! uncompressed content streams, automatic page breaks.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use crate::errors::AppError;
use crate::export::font_metrics::{PageConfig, PdfFont};
use crate::generation::assembler::{ResumeDocument, DOCUMENT_TITLE};

const TITLE_SIZE: f32 = 16.0;
const HEADING_SIZE: f32 = 14.0;
const BODY_SIZE: f32 = 11.0;
const LEADING: f32 = 1.2;
const SPACE_AFTER_TITLE: f32 = 12.0;
const SPACE_AFTER_HEADING: f32 = 8.0;
const SPACE_AFTER_SECTION: f32 = 12.0;
/// Headings and title are drawn in dark blue.
const HEADING_RGB: [f32; 3] = [0.0, 0.0, 0.545];

struct Line {
    font: PdfFont,
    size: f32,
    text: String,
    colored: bool,
    space_after: f32,
}

/// Renders the document; sections with no content are omitted.
pub fn render_pdf(document: &ResumeDocument) -> Result<Vec<u8>, AppError> {
    let page = PageConfig::default();
    let lines = layout_lines(document, &page);
    let pages = paginate(&lines, &page);
    build_document(&pages, &page)
}

fn layout_lines(document: &ResumeDocument, page: &PageConfig) -> Vec<Line> {
    let width = page.text_width_pt();
    let mut lines = Vec::new();

    push_block(&mut lines, PdfFont::HelveticaBold, TITLE_SIZE, DOCUMENT_TITLE, width, true);
    if let Some(last) = lines.last_mut() {
        last.space_after = SPACE_AFTER_TITLE;
    }

    for (section, content) in document.non_empty_sections() {
        push_block(&mut lines, PdfFont::HelveticaBold, HEADING_SIZE, section.heading(), width, true);
        if let Some(last) = lines.last_mut() {
            last.space_after = SPACE_AFTER_HEADING;
        }

        for paragraph in content.lines() {
            push_block(&mut lines, PdfFont::Helvetica, BODY_SIZE, paragraph, width, false);
        }
        if let Some(last) = lines.last_mut() {
            last.space_after = SPACE_AFTER_SECTION;
        }
    }

    lines
}

fn push_block(lines: &mut Vec<Line>, font: PdfFont, size: f32, text: &str, width: f32, colored: bool) {
    for wrapped in font.metrics().wrap_lines(text, size, width) {
        lines.push(Line {
            font,
            size,
            text: wrapped,
            colored,
            space_after: 0.0,
        });
    }
}

/// Splits lines into pages. Each placed line is `(line, baseline_y)`.
fn paginate<'a>(lines: &'a [Line], page: &PageConfig) -> Vec<Vec<(&'a Line, f32)>> {
    let top = page.height_pt - page.margin_pt;
    let bottom = page.margin_pt;

    let mut pages = vec![Vec::new()];
    let mut y = top;

    for line in lines {
        let height = line.size * LEADING;
        let on_fresh_page = pages.last().map(Vec::is_empty).unwrap_or(true);
        if y - height < bottom && !on_fresh_page {
            pages.push(Vec::new());
            y = top;
        }
        y -= height;
        if let Some(current) = pages.last_mut() {
            current.push((line, y));
        }
        y -= line.space_after;
    }

    pages
}

fn build_document(pages: &[Vec<(&Line, f32)>], page: &PageConfig) -> Result<Vec<u8>, AppError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(font_dictionary(PdfFont::Helvetica));
    let bold_id = doc.add_object(font_dictionary(PdfFont::HelveticaBold));
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            PdfFont::Helvetica.resource_name() => regular_id,
            PdfFont::HelveticaBold.resource_name() => bold_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for placed in pages {
        let content = Content {
            operations: page_operations(placed, page.margin_pt),
        };
        let encoded = content
            .encode()
            .map_err(|e| AppError::Export(format!("PDF content encoding failed: {e}")))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => page_count,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), page.width_pt.into(), page.height_pt.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| AppError::Export(format!("PDF serialization failed: {e}")))?;
    Ok(buffer)
}

fn font_dictionary(font: PdfFont) -> lopdf::Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => font.base_font(),
        "Encoding" => "WinAnsiEncoding",
    }
}

fn page_operations(placed: &[(&Line, f32)], x: f32) -> Vec<Operation> {
    let mut ops = Vec::with_capacity(placed.len() * 6);
    for (line, y) in placed {
        let [r, g, b] = if line.colored { HEADING_RGB } else { [0.0, 0.0, 0.0] };
        ops.push(Operation::new("rg", vec![r.into(), g.into(), b.into()]));
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new(
            "Tf",
            vec![line.font.resource_name().into(), line.size.into()],
        ));
        ops.push(Operation::new("Td", vec![x.into(), (*y).into()]));
        ops.push(Operation::new("Tj", vec![Object::string_literal(win_ansi(&line.text))]));
        ops.push(Operation::new("ET", vec![]));
    }
    ops
}

/// Encodes text for WinAnsiEncoding; unmappable characters become '?'.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            ' '..='~' => c as u8,
            '\u{A0}'..='\u{FF}' => c as u32 as u8,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{2026}' => 0x85,
            '\u{20AC}' => 0x80,
            _ => b'?',
        })
        .collect()
}
