//! Floating images and charts of an xlsx container.
//!
//! Objects are found by following the package relationships
//! `xl/workbook.xml` -> worksheet -> drawing and reading the anchors of
//! each drawing part:
//! - `xdr:pic` inside an anchor is a floating image
//! - `c:chart` inside an anchor's graphic frame is a chart
//! - `xdr:from` gives the top-left anchor cell; `absoluteAnchor` has none

use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};

use quick_xml::events::Event;
use quick_xml::Reader as XmlReader;
use tracing::debug;
use zip::result::ZipResult;
use zip::ZipArchive;

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const MEDIA_DIR: &str = "xl/media/";
const MAX_COLUMNS: u32 = 16_384;
const MAX_ROWS: u32 = 1_048_576;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawingObject {
    /// `anchor` is the zero-based `(column, row)` of the top-left cell.
    Image { anchor: Option<(u32, u32)> },
    Chart,
}

impl DrawingObject {
    pub fn describe(&self, sheet_name: &str) -> String {
        match self {
            DrawingObject::Image {
                anchor: Some((col, row)),
            } => format!(
                "Image anchored at cell {}{} in sheet '{sheet_name}'.",
                column_name(*col),
                u64::from(*row) + 1
            ),
            DrawingObject::Image { anchor: None } => {
                format!("Image not anchored to any cell in sheet '{sheet_name}'.")
            }
            DrawingObject::Chart => format!("Chart found in sheet '{sheet_name}'."),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Relationship {
    id: String,
    kind: String,
    target: String,
}

/// One description per floating image or chart, sheet by sheet. Containers
/// that are not zip packages (xls, corrupted files) report nothing.
pub fn scan_non_cell_objects(bytes: &[u8]) -> Vec<String> {
    let Ok(mut archive) = ZipArchive::new(Cursor::new(bytes)) else {
        return Vec::new();
    };
    let Ok(workbook_xml) = read_part(&mut archive, WORKBOOK_PART) else {
        return Vec::new();
    };
    let workbook_rels: HashMap<String, String> = read_part(&mut archive, WORKBOOK_RELS_PART)
        .map(|xml| {
            parse_relationships(&xml)
                .into_iter()
                .map(|rel| (rel.id, rel.target))
                .collect()
        })
        .unwrap_or_default();

    let mut objects = Vec::new();
    for (sheet_name, rel_id) in parse_sheets(&workbook_xml) {
        let Some(target) = workbook_rels.get(&rel_id) else {
            continue;
        };
        let sheet_path = resolve_target("xl", target);
        for drawing in sheet_drawings(&mut archive, &sheet_path) {
            objects.extend(drawing.iter().map(|object| object.describe(&sheet_name)));
        }
    }

    debug!(objects = objects.len(), "scanned drawings");
    objects
}

/// Archive entries under `xl/media/`, sorted.
pub fn media_entries(bytes: &[u8]) -> Vec<String> {
    let Ok(archive) = ZipArchive::new(Cursor::new(bytes)) else {
        return Vec::new();
    };
    let mut entries: Vec<String> = archive
        .file_names()
        .filter(|name| name.starts_with(MEDIA_DIR))
        .map(ToString::to_string)
        .collect();
    entries.sort();
    entries
}

fn sheet_drawings<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    sheet_path: &str,
) -> Vec<Vec<DrawingObject>> {
    let Ok(rels_xml) = read_part(archive, &rels_path_for(sheet_path)) else {
        return Vec::new();
    };
    let sheet_dir = parent_dir(sheet_path);

    parse_relationships(&rels_xml)
        .into_iter()
        .filter(|rel| rel.kind.ends_with("/drawing"))
        .filter_map(|rel| {
            let drawing_path = resolve_target(sheet_dir, &rel.target);
            match read_part(archive, &drawing_path) {
                Ok(xml) => Some(parse_drawing(&xml)),
                Err(err) => {
                    debug!(%drawing_path, %err, "drawing part missing");
                    None
                }
            }
        })
        .collect()
}

fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> ZipResult<String> {
    let mut file = archive.by_name(path)?;
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    Ok(content)
}

fn parse_sheets(xml: &str) -> Vec<(String, String)> {
    let mut sheets = Vec::new();
    let mut reader = XmlReader::from_str(xml);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Start(e) | Event::Empty(e)) if e.local_name().as_ref() == b"sheet" => {
                let mut name = None;
                let mut rel_id = None;
                for attr in e.attributes().filter_map(Result::ok) {
                    let Ok(value) = attr.unescape_value() else {
                        continue;
                    };
                    match attr.key.local_name().as_ref() {
                        b"name" => name = Some(value.into_owned()),
                        b"id" => rel_id = Some(value.into_owned()),
                        _ => {}
                    }
                }
                if let (Some(name), Some(rel_id)) = (name, rel_id) {
                    sheets.push((name, rel_id));
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }
    sheets
}

fn parse_relationships(xml: &str) -> Vec<Relationship> {
    let mut relationships = Vec::new();
    let mut reader = XmlReader::from_str(xml);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Start(e) | Event::Empty(e)) if e.local_name().as_ref() == b"Relationship" => {
                let mut id = None;
                let mut kind = None;
                let mut target = None;
                for attr in e.attributes().filter_map(Result::ok) {
                    let Ok(value) = attr.unescape_value() else {
                        continue;
                    };
                    match attr.key.as_ref() {
                        b"Id" => id = Some(value.into_owned()),
                        b"Type" => kind = Some(value.into_owned()),
                        b"Target" => target = Some(value.into_owned()),
                        _ => {}
                    }
                }
                if let (Some(id), Some(kind), Some(target)) = (id, kind, target) {
                    relationships.push(Relationship { id, kind, target });
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }
    relationships
}

#[derive(Debug, Clone, Copy)]
enum Coordinate {
    Col,
    Row,
}

/// Objects of one drawing part, in anchor order.
fn parse_drawing(xml: &str) -> Vec<DrawingObject> {
    let mut objects = Vec::new();
    let mut reader = XmlReader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut in_anchor = false;
    let mut in_from = false;
    let mut coordinate: Option<Coordinate> = None;
    let mut from_col = 0_u32;
    let mut from_row = 0_u32;
    let mut anchor: Option<(u32, u32)> = None;
    let mut pictures = 0_usize;
    let mut charts = 0_usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"twoCellAnchor" | b"oneCellAnchor" | b"absoluteAnchor" => {
                    in_anchor = true;
                    anchor = None;
                    pictures = 0;
                    charts = 0;
                }
                b"from" if in_anchor => {
                    in_from = true;
                    from_col = 0;
                    from_row = 0;
                }
                b"col" if in_from => coordinate = Some(Coordinate::Col),
                b"row" if in_from => coordinate = Some(Coordinate::Row),
                b"pic" if in_anchor => pictures += 1,
                b"chart" if in_anchor => charts += 1,
                _ => {}
            },
            Ok(Event::Empty(e)) if in_anchor => match e.local_name().as_ref() {
                b"pic" => pictures += 1,
                b"chart" => charts += 1,
                _ => {}
            },
            Ok(Event::Text(text)) => {
                if let (Some(coordinate), Ok(text)) = (coordinate, text.unescape()) {
                    let value = text.trim().parse().unwrap_or(0);
                    match coordinate {
                        Coordinate::Col => from_col = value,
                        Coordinate::Row => from_row = value,
                    }
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"col" | b"row" => coordinate = None,
                b"from" if in_from => {
                    in_from = false;
                    anchor = (from_col < MAX_COLUMNS && from_row < MAX_ROWS)
                        .then_some((from_col, from_row));
                }
                b"twoCellAnchor" | b"oneCellAnchor" | b"absoluteAnchor" => {
                    objects.extend((0..pictures).map(|_| DrawingObject::Image { anchor }));
                    objects.extend((0..charts).map(|_| DrawingObject::Chart));
                    in_anchor = false;
                }
                _ => {}
            },
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }
    objects
}

/// `xl/worksheets/sheet1.xml` -> `xl/worksheets/_rels/sheet1.xml.rels`
fn rels_path_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

fn parent_dir(part: &str) -> &str {
    part.rsplit_once('/').map_or("", |(dir, _)| dir)
}

/// Resolves a relationship target against the directory of its source
/// part. Absolute targets are rooted at the package.
fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Zero-based column index to spreadsheet letters (0 -> `A`, 26 -> `AA`).
pub fn column_name(col: u32) -> String {
    let mut n = u64::from(col) + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}
