//! Cell number formats read straight from the .xlsx container
//!
//! calamine resolves cell values but not their formats, so the styles part and
//! each worksheet part are walked with quick-xml to recover the number format
//! (and named cell style, when there is one) behind every `s="N"` index.

use crate::error::{DiscountError, DiscountResult};
use crate::types::NamedStyle;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader as XmlReader;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use zip::result::ZipError;
use zip::ZipArchive;

/// Styled cells per sheet name, keyed by 1-indexed (row, column)
pub type SheetStyles = HashMap<String, BTreeMap<(u32, u32), NamedStyle>>;

/// Number format codes with an implicit id (ECMA-376 §18.8.30)
fn builtin_format(id: u32) -> Option<&'static str> {
    let code = match id {
        0 => "General",
        1 => "0",
        2 => "0.00",
        3 => "#,##0",
        4 => "#,##0.00",
        9 => "0%",
        10 => "0.00%",
        11 => "0.00E+00",
        12 => "# ?/?",
        13 => "# ??/??",
        14 => "mm-dd-yy",
        15 => "d-mmm-yy",
        16 => "d-mmm",
        17 => "mmm-yy",
        18 => "h:mm AM/PM",
        19 => "h:mm:ss AM/PM",
        20 => "h:mm",
        21 => "h:mm:ss",
        22 => "m/d/yy h:mm",
        37 => "#,##0 ;(#,##0)",
        38 => "#,##0 ;[Red](#,##0)",
        39 => "#,##0.00;(#,##0.00)",
        40 => "#,##0.00;[Red](#,##0.00)",
        45 => "mm:ss",
        46 => "[h]:mm:ss",
        47 => "mmss.0",
        48 => "##0.0E+0",
        49 => "@",
        _ => return None,
    };
    Some(code)
}

/// Read the style of every formatted cell in the workbook at `path`.
///
/// Cells whose format is `General` and that carry no named style are left out.
pub fn read_sheet_styles(path: &Path) -> DiscountResult<SheetStyles> {
    let load_err = |e: String| DiscountError::Load(format!("{}: {}", path.display(), e));

    let file = File::open(path).map_err(|e| load_err(e.to_string()))?;
    let mut archive = ZipArchive::new(file).map_err(|e| load_err(e.to_string()))?;

    let xfs = match read_part(&mut archive, "xl/styles.xml").map_err(&load_err)? {
        Some(xml) => parse_cell_xfs(&xml).map_err(&load_err)?,
        None => Vec::new(),
    };
    if xfs.iter().all(Option::is_none) {
        return Ok(SheetStyles::new());
    }

    let workbook_xml = read_part(&mut archive, "xl/workbook.xml")
        .map_err(&load_err)?
        .unwrap_or_default();
    let rels_xml = read_part(&mut archive, "xl/_rels/workbook.xml.rels")
        .map_err(&load_err)?
        .unwrap_or_default();
    let targets = parse_relationship_targets(&rels_xml).map_err(&load_err)?;

    let mut styles = SheetStyles::new();
    for (sheet, rid) in parse_workbook_sheets(&workbook_xml).map_err(&load_err)? {
        let Some(part) = targets.get(&rid).map(|t| part_path(t)) else {
            continue;
        };
        let Some(xml) = read_part(&mut archive, &part).map_err(&load_err)? else {
            continue;
        };

        let cells: BTreeMap<(u32, u32), NamedStyle> = parse_cell_style_ids(&xml)
            .map_err(&load_err)?
            .into_iter()
            .filter_map(|(pos, idx)| {
                let style = xfs.get(idx as usize)?.clone()?;
                Some((pos, style))
            })
            .collect();
        tracing::debug!(sheet = %sheet, styled = cells.len(), "read cell formats");
        styles.insert(sheet, cells);
    }

    Ok(styles)
}

fn read_part(archive: &mut ZipArchive<File>, name: &str) -> Result<Option<String>, String> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(format!("{}: {}", name, e)),
    };
    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(|e| format!("{}: {}", name, e))?;
    Ok(Some(xml))
}

/// Relationship targets are relative to `xl/` unless absolute
fn part_path(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{}", target),
    }
}

fn attr(reader: &XmlReader<&[u8]>, e: &BytesStart, key: &[u8]) -> Option<String> {
    e.try_get_attribute(key)
        .ok()
        .flatten()
        .and_then(|a| a.decode_and_unescape_value(reader.decoder()).ok())
        .map(|v| v.into_owned())
}

/// Resolve each `cellXfs` entry to the style it stands for
fn parse_cell_xfs(xml: &str) -> Result<Vec<Option<NamedStyle>>, String> {
    let mut reader = XmlReader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut custom_formats: HashMap<u32, String> = HashMap::new();
    // (numFmtId, xfId) per cellXfs entry
    let mut xfs: Vec<(u32, u32)> = Vec::new();
    // cellStyleXfs index -> user-defined style name
    let mut names: HashMap<u32, String> = HashMap::new();
    let mut in_cell_xfs = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"numFmt" => {
                    let id = attr(&reader, &e, b"numFmtId").and_then(|v| v.parse().ok());
                    if let (Some(id), Some(code)) = (id, attr(&reader, &e, b"formatCode")) {
                        custom_formats.insert(id, code);
                    }
                }
                b"cellXfs" => in_cell_xfs = true,
                b"xf" if in_cell_xfs => {
                    let num_fmt = attr(&reader, &e, b"numFmtId").and_then(|v| v.parse().ok());
                    let xf_id = attr(&reader, &e, b"xfId").and_then(|v| v.parse().ok());
                    xfs.push((num_fmt.unwrap_or(0), xf_id.unwrap_or(0)));
                }
                b"cellStyle" => {
                    // builtin styles (Normal, Comma, ...) are not user styles
                    if attr(&reader, &e, b"builtinId").is_none() {
                        let xf_id = attr(&reader, &e, b"xfId").and_then(|v| v.parse().ok());
                        if let (Some(xf_id), Some(name)) = (xf_id, attr(&reader, &e, b"name")) {
                            names.insert(xf_id, name);
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::End(e)) if e.local_name().as_ref() == b"cellXfs" => in_cell_xfs = false,
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("xl/styles.xml: {}", e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(xfs
        .into_iter()
        .map(|(num_fmt, xf_id)| {
            let code = custom_formats
                .get(&num_fmt)
                .map(String::as_str)
                .or_else(|| builtin_format(num_fmt));
            match (names.get(&xf_id), code) {
                (Some(name), code) => Some(NamedStyle::new(name, code.unwrap_or("General"))),
                (None, Some(code)) if code != "General" => Some(NamedStyle::new(code, code)),
                _ => None,
            }
        })
        .collect())
}

/// Sheet name -> relationship id, in workbook order
fn parse_workbook_sheets(xml: &str) -> Result<Vec<(String, String)>, String> {
    let mut reader = XmlReader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut sheets = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == b"sheet" => {
                // the relationship id is the namespaced `r:id`
                let rid = e
                    .attributes()
                    .flatten()
                    .find(|a| a.key.prefix().is_some() && a.key.local_name().as_ref() == b"id")
                    .and_then(|a| a.decode_and_unescape_value(reader.decoder()).ok())
                    .map(|v| v.into_owned());
                if let (Some(name), Some(rid)) = (attr(&reader, &e, b"name"), rid) {
                    sheets.push((name, rid));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("xl/workbook.xml: {}", e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(sheets)
}

/// Relationship id -> target
fn parse_relationship_targets(xml: &str) -> Result<HashMap<String, String>, String> {
    let mut reader = XmlReader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut targets = HashMap::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                if let (Some(id), Some(target)) =
                    (attr(&reader, &e, b"Id"), attr(&reader, &e, b"Target"))
                {
                    targets.insert(id, target);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("xl/_rels/workbook.xml.rels: {}", e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(targets)
}

/// `s` attribute of every `<c>` with a non-zero style index
fn parse_cell_style_ids(xml: &str) -> Result<Vec<((u32, u32), u32)>, String> {
    let mut reader = XmlReader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut cells = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == b"c" => {
                let style = attr(&reader, &e, b"s")
                    .and_then(|v| v.parse::<u32>().ok())
                    .unwrap_or(0);
                let pos = attr(&reader, &e, b"r").as_deref().and_then(a1_to_row_col);
                if let (Some(pos), true) = (pos, style != 0) {
                    cells.push((pos, style));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("worksheet: {}", e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(cells)
}

/// `"C2"` -> `(2, 3)`, 1-indexed
fn a1_to_row_col(a1: &str) -> Option<(u32, u32)> {
    let split = a1.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = a1.split_at(split);
    if letters.is_empty() {
        return None;
    }

    let mut col: u32 = 0;
    for ch in letters.chars() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        col = col * 26 + (ch.to_ascii_uppercase() as u8 - b'A' + 1) as u32;
    }
    let row: u32 = digits.parse().ok()?;
    (row >= 1).then_some((row, col))
}
