//! Conversion of buffered workbook state into `rust_xlsxwriter` objects

use super::xlsx::{CellContent, CellState, SheetState, XlsxWorkbook};
use super::{CellWrite, NumberFormat, StyleDescriptor};
use crate::address::{parse_cell, parse_range, CellRange, CellRef};
use crate::error::WorkbookError;
use crate::metadata::{
    AlignmentStyle, BorderStyle, DataValidation, DefinedName, DocumentProperties, FillStyle,
    FontStyle, Hyperlink, ImageFormat, ImageMetadata, SheetProtection,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_xlsxwriter::{
    Color, DataValidation as XlsxValidation, DataValidationRule, DocProperties, ExcelDateTime,
    Format, FormatAlign, FormatBorder, FormatDiagonalBorder, FormatPattern, FormatUnderline,
    Formula, Image, ObjectMovement, ProtectionOptions, Url, Workbook, Worksheet,
};
use std::path::Path;

/// Number format given to timestamps whose style carries none
const DEFAULT_DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

//==============================================================================
// Workbook
//==============================================================================

pub(super) fn save(book: &XlsxWorkbook, path: &Path) -> Result<(), WorkbookError> {
    let mut workbook = render(book)?;
    workbook.save(path)?;
    Ok(())
}

fn render(book: &XlsxWorkbook) -> Result<Workbook, WorkbookError> {
    let mut workbook = Workbook::new();

    if let Some(properties) = book.properties() {
        workbook.set_properties(&build_properties(properties)?);
    }

    let formats = book
        .styles()
        .iter()
        .map(build_format)
        .collect::<Result<Vec<_>, _>>()?;

    for (index, sheet) in book.sheets().iter().enumerate() {
        let active = book.active_sheet() == Some(index);
        let worksheet = render_sheet(sheet, book.styles(), &formats, active)?;
        workbook.push_worksheet(worksheet);
    }

    for name in book.defined_names() {
        let (qualified, refers_to) = defined_name_parts(name);
        workbook.define_name(qualified, &refers_to)?;
    }

    Ok(workbook)
}

fn render_sheet(
    sheet: &SheetState,
    styles: &[StyleDescriptor],
    formats: &[Format],
    active: bool,
) -> Result<Worksheet, WorkbookError> {
    let mut worksheet = Worksheet::new();
    worksheet.set_name(&sheet.name)?;

    if sheet.hidden {
        worksheet.set_hidden(true);
    }
    if active {
        worksheet.set_active(true);
    }

    for (&col, &width) in &sheet.column_widths {
        worksheet.set_column_width(col, width)?;
    }
    for (&row, &height) in &sheet.row_heights {
        worksheet.set_row_height(row, height)?;
    }

    // Merges first: merge_range writes a blank first cell that the cell pass
    // then overwrites with the real content.
    let merge_format = Format::new();
    for merge in &sheet.merges {
        worksheet.merge_range(
            merge.first.row,
            merge.first.col,
            merge.last.row,
            merge.last.col,
            "",
            &merge_format,
        )?;
    }

    for (&at, state) in &sheet.cells {
        write_cell(&mut worksheet, at, state, styles, formats)?;
    }

    for (ranges, rule) in &sheet.validations {
        let validation = build_validation(rule)?;
        for range in ranges {
            worksheet.add_data_validation(
                range.first.row,
                range.first.col,
                range.last.row,
                range.last.col,
                &validation,
            )?;
        }
    }

    for image in &sheet.images {
        let placed = build_image(image)?;
        let (row, col) = (placed.at.row, placed.at.col);
        match placed.placement {
            Placement::Floating { offset_x, offset_y } => {
                worksheet.insert_image_with_offset(row, col, &placed.image, offset_x, offset_y)?;
            }
            Placement::FitToCell { keep_aspect_ratio } => {
                worksheet.insert_image_fit_to_cell(row, col, &placed.image, keep_aspect_ratio)?;
            }
            Placement::InCell => {
                worksheet.embed_image(row, col, &placed.image)?;
            }
        }
    }

    if let Some(protection) = &sheet.protection {
        if let Some(password) = protection.password.as_deref().filter(|p| !p.is_empty()) {
            worksheet.protect_with_password(password);
        }
        worksheet.protect_with_options(&build_protection(protection));
    }

    Ok(worksheet)
}

fn write_cell(
    worksheet: &mut Worksheet,
    at: CellRef,
    state: &CellState,
    styles: &[StyleDescriptor],
    formats: &[Format],
) -> Result<(), WorkbookError> {
    let (row, col) = (at.row, at.col);

    let (mut format, has_num_format) = match state.style {
        Some(handle) => {
            let index = (handle.0 as usize)
                .checked_sub(1)
                .ok_or(WorkbookError::UnknownStyle(handle.0))?;
            let format = formats
                .get(index)
                .cloned()
                .ok_or(WorkbookError::UnknownStyle(handle.0))?;
            (format, styles[index].number_format.is_some())
        }
        None => (Format::new(), false),
    };

    if matches!(state.content, Some(CellContent::Value(CellWrite::DateTime(_)))) && !has_num_format
    {
        format = format.set_num_format(DEFAULT_DATETIME_FORMAT);
    }

    // The hyperlink goes in before the content so that non-text content keeps
    // its type; text content becomes the link's display text.
    if let Some(link) = &state.hyperlink {
        let mut url = Url::new(hyperlink_target(link));
        if let Some(tip) = &link.tooltip {
            url = url.set_tip(tip);
        }
        if let Some(CellContent::Value(CellWrite::Text(text))) = &state.content {
            worksheet.write_url_with_format(row, col, url.set_text(text), &format)?;
            return Ok(());
        }
        worksheet.write_url_with_format(row, col, url, &format)?;
    }

    match &state.content {
        Some(CellContent::Formula(formula)) => {
            worksheet.write_formula_with_format(row, col, Formula::new(formula), &format)?;
        }
        Some(CellContent::Value(value)) => match value {
            CellWrite::Number(n) => {
                worksheet.write_number_with_format(row, col, *n, &format)?;
            }
            CellWrite::Integer(i) => {
                worksheet.write_number_with_format(row, col, *i as f64, &format)?;
            }
            CellWrite::Boolean(b) => {
                worksheet.write_boolean_with_format(row, col, *b, &format)?;
            }
            CellWrite::Text(s) => {
                worksheet.write_string_with_format(row, col, s, &format)?;
            }
            CellWrite::DateTime(dt) => {
                worksheet.write_datetime_with_format(row, col, dt, &format)?;
            }
        },
        None if state.hyperlink.is_none() => {
            worksheet.write_blank(row, col, &format)?;
        }
        None => {}
    }

    Ok(())
}

fn hyperlink_target(link: &Hyperlink) -> String {
    if link.is_external() {
        link.link.clone()
    } else {
        format!("internal:{}", link.link.trim_start_matches('#'))
    }
}

fn defined_name_parts(name: &DefinedName) -> (String, String) {
    let qualified = match name.local_sheet() {
        Some(sheet) => format!("{}!{}", quote_sheet_name(sheet), name.name),
        None => name.name.clone(),
    };
    let refers_to = if name.refers_to.trim_start().starts_with('=') {
        name.refers_to.clone()
    } else {
        format!("={}", name.refers_to)
    };
    (qualified, refers_to)
}

pub(super) fn quote_sheet_name(sheet: &str) -> String {
    if sheet.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.') {
        sheet.to_string()
    } else {
        format!("'{}'", sheet.replace('\'', "''"))
    }
}

//==============================================================================
// Document properties
//==============================================================================

pub(super) fn build_properties(props: &DocumentProperties) -> Result<DocProperties, WorkbookError> {
    let mut out = DocProperties::new();

    if let Some(v) = &props.title {
        out = out.set_title(v);
    }
    if let Some(v) = &props.subject {
        out = out.set_subject(v);
    }
    if let Some(v) = &props.creator {
        out = out.set_author(v);
    }
    if let Some(v) = &props.keywords {
        out = out.set_keywords(v);
    }
    if let Some(v) = &props.description {
        out = out.set_comment(v);
    }
    if let Some(v) = &props.category {
        out = out.set_category(v);
    }
    if let Some(v) = &props.content_status {
        out = out.set_status(v);
    }
    if let Some(v) = props.created.as_deref().filter(|s| !s.is_empty()) {
        out = out.set_creation_datetime(&parse_timestamp("created", v)?);
    }
    if let Some(v) = props.modified.as_deref().filter(|s| !s.is_empty()) {
        // No native slot; validated the same way as the creation date.
        parse_timestamp("modified", v)?;
        out = out.set_custom_property("Modified", v);
    }

    let custom = [
        ("LastModifiedBy", &props.last_modified_by),
        ("Version", &props.version),
        ("Identifier", &props.identifier),
        ("Language", &props.language),
        ("Revision", &props.revision),
    ];
    for (name, value) in custom {
        if let Some(v) = value.as_deref().filter(|s| !s.is_empty()) {
            out = out.set_custom_property(name, v);
        }
    }

    Ok(out)
}

fn parse_timestamp(field: &str, text: &str) -> Result<ExcelDateTime, WorkbookError> {
    let naive = DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.naive_utc())
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f"))
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f"))
        .or_else(|_| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .map(|d| d.and_hms_opt(0, 0, 0).unwrap_or_default())
        })
        .map_err(|_| WorkbookError::InvalidProperty(format!("{field}: '{text}' is not a timestamp")))?;

    ExcelDateTime::parse_from_str(&naive.format("%Y-%m-%dT%H:%M:%S").to_string())
        .map_err(|e| WorkbookError::InvalidProperty(format!("{field}: {e}")))
}

//==============================================================================
// Styles
//==============================================================================

pub(super) fn build_format(style: &StyleDescriptor) -> Result<Format, WorkbookError> {
    let mut format = Format::new();

    if let Some(font) = &style.font {
        format = apply_font(format, font)?;
    }
    if let Some(fill) = &style.fill {
        format = apply_fill(format, fill)?;
    }
    format = apply_borders(format, &style.borders)?;
    if let Some(alignment) = &style.alignment {
        format = apply_alignment(format, alignment)?;
    }

    match &style.number_format {
        Some(NumberFormat::BuiltIn(index)) => {
            let index = u8::try_from(*index)
                .ok()
                .filter(|i| *i > 0)
                .ok_or_else(|| {
                    WorkbookError::InvalidStyle(format!("number format index {index} out of range"))
                })?;
            format = format.set_num_format_index(index);
        }
        Some(NumberFormat::Custom(code)) => {
            format = format.set_num_format(code);
        }
        None => {}
    }

    if let Some(protection) = &style.protection {
        if protection.hidden {
            format = format.set_hidden();
        }
        format = if protection.locked {
            format.set_locked()
        } else {
            format.set_unlocked()
        };
    }

    Ok(format)
}

fn parse_color(color: &str) -> Result<Color, WorkbookError> {
    let hex = color.trim().trim_start_matches('#');
    // ARGB values carry a leading alpha byte the format cannot express.
    let rgb = match hex.len() {
        6 => Some(hex),
        8 => hex.get(2..),
        _ => None,
    }
    .filter(|rgb| rgb.is_ascii())
    .ok_or_else(|| WorkbookError::InvalidStyle(format!("bad color '{color}'")))?;
    u32::from_str_radix(rgb, 16)
        .map(Color::RGB)
        .map_err(|_| WorkbookError::InvalidStyle(format!("bad color '{color}'")))
}

fn apply_font(mut format: Format, font: &FontStyle) -> Result<Format, WorkbookError> {
    if font.bold {
        format = format.set_bold();
    }
    if font.italic {
        format = format.set_italic();
    }
    if font.strike {
        format = format.set_font_strikethrough();
    }
    if !font.underline.is_empty() {
        let underline = match font.underline.to_ascii_lowercase().as_str() {
            "none" => FormatUnderline::None,
            "single" => FormatUnderline::Single,
            "double" => FormatUnderline::Double,
            "singleaccounting" => FormatUnderline::SingleAccounting,
            "doubleaccounting" => FormatUnderline::DoubleAccounting,
            other => {
                return Err(WorkbookError::InvalidStyle(format!("unknown underline '{other}'")))
            }
        };
        format = format.set_underline(underline);
    }
    if !font.family.is_empty() {
        format = format.set_font_name(&font.family);
    }
    if font.size < 0.0 || !font.size.is_finite() {
        return Err(WorkbookError::InvalidStyle(format!("font size {}", font.size)));
    }
    if font.size > 0.0 {
        format = format.set_font_size(font.size);
    }
    if !font.color.is_empty() {
        format = format.set_font_color(parse_color(&font.color)?);
    }
    Ok(format)
}

fn pattern_for(index: i32) -> Option<FormatPattern> {
    let pattern = match index {
        0 => FormatPattern::None,
        1 => FormatPattern::Solid,
        2 => FormatPattern::MediumGray,
        3 => FormatPattern::DarkGray,
        4 => FormatPattern::LightGray,
        5 => FormatPattern::DarkHorizontal,
        6 => FormatPattern::DarkVertical,
        7 => FormatPattern::DarkDown,
        8 => FormatPattern::DarkUp,
        9 => FormatPattern::DarkGrid,
        10 => FormatPattern::DarkTrellis,
        11 => FormatPattern::LightHorizontal,
        12 => FormatPattern::LightVertical,
        13 => FormatPattern::LightDown,
        14 => FormatPattern::LightUp,
        15 => FormatPattern::LightGrid,
        16 => FormatPattern::LightTrellis,
        17 => FormatPattern::Gray125,
        18 => FormatPattern::Gray0625,
        _ => return None,
    };
    Some(pattern)
}

fn apply_fill(mut format: Format, fill: &FillStyle) -> Result<Format, WorkbookError> {
    let colors = fill
        .color
        .iter()
        .map(|c| parse_color(c))
        .collect::<Result<Vec<_>, _>>()?;
    let Some(&primary) = colors.first() else {
        return Ok(format);
    };

    let pattern = match fill.kind.to_ascii_lowercase().as_str() {
        // Gradients have no xlsxwriter equivalent; the first stop becomes a solid fill.
        "gradient" => FormatPattern::Solid,
        "pattern" | "" => pattern_for(fill.pattern).ok_or_else(|| {
            WorkbookError::InvalidStyle(format!("fill pattern {} out of range", fill.pattern))
        })?,
        other => return Err(WorkbookError::InvalidStyle(format!("unknown fill type '{other}'"))),
    };

    match pattern {
        FormatPattern::None => {}
        FormatPattern::Solid => {
            format = format
                .set_pattern(FormatPattern::Solid)
                .set_background_color(primary);
        }
        other => {
            format = format.set_pattern(other).set_foreground_color(primary);
            if let Some(&background) = colors.get(1) {
                format = format.set_background_color(background);
            }
        }
    }
    Ok(format)
}

fn border_for(index: i32) -> Option<FormatBorder> {
    let border = match index {
        0 => FormatBorder::None,
        1 => FormatBorder::Thin,
        2 => FormatBorder::Medium,
        3 => FormatBorder::Dashed,
        4 => FormatBorder::Dotted,
        5 => FormatBorder::Thick,
        6 => FormatBorder::Double,
        7 => FormatBorder::Hair,
        8 => FormatBorder::MediumDashed,
        9 => FormatBorder::DashDot,
        10 => FormatBorder::MediumDashDot,
        11 => FormatBorder::DashDotDot,
        12 => FormatBorder::MediumDashDotDot,
        13 => FormatBorder::SlantDashDot,
        _ => return None,
    };
    Some(border)
}

fn apply_borders(mut format: Format, borders: &[BorderStyle]) -> Result<Format, WorkbookError> {
    let mut diagonal_up = false;
    let mut diagonal_down = false;

    for border in borders {
        let line = border_for(border.style).ok_or_else(|| {
            WorkbookError::InvalidStyle(format!("border style {} out of range", border.style))
        })?;
        let color = if border.color.is_empty() {
            None
        } else {
            Some(parse_color(&border.color)?)
        };

        match border.kind.to_ascii_lowercase().as_str() {
            "left" => {
                format = format.set_border_left(line);
                if let Some(c) = color {
                    format = format.set_border_left_color(c);
                }
            }
            "right" => {
                format = format.set_border_right(line);
                if let Some(c) = color {
                    format = format.set_border_right_color(c);
                }
            }
            "top" => {
                format = format.set_border_top(line);
                if let Some(c) = color {
                    format = format.set_border_top_color(c);
                }
            }
            "bottom" => {
                format = format.set_border_bottom(line);
                if let Some(c) = color {
                    format = format.set_border_bottom_color(c);
                }
            }
            kind @ ("diagonalup" | "diagonaldown") => {
                if kind == "diagonalup" {
                    diagonal_up = true;
                } else {
                    diagonal_down = true;
                }
                format = format.set_border_diagonal(line);
                if let Some(c) = color {
                    format = format.set_border_diagonal_color(c);
                }
            }
            other => {
                return Err(WorkbookError::InvalidStyle(format!("unknown border side '{other}'")))
            }
        }
    }

    let diagonal = match (diagonal_up, diagonal_down) {
        (true, true) => Some(FormatDiagonalBorder::BorderUpDown),
        (true, false) => Some(FormatDiagonalBorder::BorderUp),
        (false, true) => Some(FormatDiagonalBorder::BorderDown),
        (false, false) => None,
    };
    if let Some(kind) = diagonal {
        format = format.set_border_diagonal_type(kind);
    }
    Ok(format)
}

fn apply_alignment(mut format: Format, alignment: &AlignmentStyle) -> Result<Format, WorkbookError> {
    if !alignment.horizontal.is_empty() {
        let align = match alignment.horizontal.to_ascii_lowercase().as_str() {
            "general" => FormatAlign::General,
            "left" => FormatAlign::Left,
            "center" => FormatAlign::Center,
            "right" => FormatAlign::Right,
            "fill" => FormatAlign::Fill,
            "justify" => FormatAlign::Justify,
            "centercontinuous" => FormatAlign::CenterAcross,
            "distributed" => FormatAlign::Distributed,
            other => {
                return Err(WorkbookError::InvalidStyle(format!(
                    "unknown horizontal alignment '{other}'"
                )))
            }
        };
        format = format.set_align(align);
    }

    if !alignment.vertical.is_empty() {
        let align = match alignment.vertical.to_ascii_lowercase().as_str() {
            "top" => FormatAlign::Top,
            "center" => FormatAlign::VerticalCenter,
            "bottom" => FormatAlign::Bottom,
            "justify" => FormatAlign::VerticalJustify,
            "distributed" => FormatAlign::VerticalDistributed,
            other => {
                return Err(WorkbookError::InvalidStyle(format!(
                    "unknown vertical alignment '{other}'"
                )))
            }
        };
        format = format.set_align(align);
    }

    if alignment.wrap_text {
        format = format.set_text_wrap();
    }
    if alignment.shrink_to_fit {
        format = format.set_shrink();
    }

    let rotation: i16 = match alignment.text_rotation {
        0 => 0,
        r @ 1..=90 => r as i16,
        r @ 91..=180 => -((r - 90) as i16),
        255 => 270,
        r => return Err(WorkbookError::InvalidStyle(format!("text rotation {r} out of range"))),
    };
    if rotation != 0 {
        format = format.set_rotation(rotation);
    }

    match alignment.indent {
        0 => {}
        i @ 1..=250 => format = format.set_indent(i as u8),
        i => return Err(WorkbookError::InvalidStyle(format!("indent {i} out of range"))),
    }

    Ok(format)
}

//==============================================================================
// Data validation
//==============================================================================

/// Parse the target ranges of a rule
pub(super) fn validation_ranges(rule: &DataValidation) -> Result<Vec<CellRange>, WorkbookError> {
    let ranges = rule
        .range
        .split_whitespace()
        .map(parse_range)
        .collect::<Result<Vec<_>, _>>()?;
    if ranges.is_empty() {
        return Err(WorkbookError::InvalidValidation("rule has no target range".to_string()));
    }
    Ok(ranges)
}

fn strip_equals(formula: &str) -> &str {
    formula.trim().trim_start_matches('=')
}

fn comparison(rule: &DataValidation) -> Result<DataValidationRule<Formula>, WorkbookError> {
    let first = strip_equals(&rule.formula1);
    let second = strip_equals(&rule.formula2);
    if first.is_empty() {
        return Err(WorkbookError::InvalidValidation("formula1 is empty".to_string()));
    }

    let needs_second = |op: &str| -> Result<Formula, WorkbookError> {
        if second.is_empty() {
            Err(WorkbookError::InvalidValidation(format!("operator '{op}' needs formula2")))
        } else {
            Ok(Formula::new(second))
        }
    };

    let f1 = Formula::new(first);
    let op = rule.operator.to_ascii_lowercase();
    let comparison = match op.as_str() {
        "" | "between" => DataValidationRule::Between(f1, needs_second("between")?),
        "notbetween" => DataValidationRule::NotBetween(f1, needs_second("notBetween")?),
        "equal" => DataValidationRule::EqualTo(f1),
        "notequal" => DataValidationRule::NotEqualTo(f1),
        "greaterthan" => DataValidationRule::GreaterThan(f1),
        "lessthan" => DataValidationRule::LessThan(f1),
        "greaterthanorequal" => DataValidationRule::GreaterThanOrEqualTo(f1),
        "lessthanorequal" => DataValidationRule::LessThanOrEqualTo(f1),
        other => {
            return Err(WorkbookError::InvalidValidation(format!("unknown operator '{other}'")))
        }
    };
    Ok(comparison)
}

pub(super) fn build_validation(rule: &DataValidation) -> Result<XlsxValidation, WorkbookError> {
    let invalid = |e: rust_xlsxwriter::XlsxError| WorkbookError::InvalidValidation(e.to_string());

    let base = XlsxValidation::new();
    let mut validation = match rule.kind.to_ascii_lowercase().as_str() {
        "" | "none" | "any" => base.allow_any_value(),
        "whole" => base.allow_whole_number_formula(comparison(rule)?),
        "decimal" => base.allow_decimal_number_formula(comparison(rule)?),
        "date" => base.allow_date_formula(comparison(rule)?),
        "time" => base.allow_time_formula(comparison(rule)?),
        "textlength" => base.allow_text_length_formula(comparison(rule)?),
        "custom" => {
            let formula = strip_equals(&rule.formula1);
            if formula.is_empty() {
                return Err(WorkbookError::InvalidValidation("custom rule has no formula".to_string()));
            }
            base.allow_custom(Formula::new(formula))
        }
        "list" => {
            let source = rule.formula1.trim();
            if source.len() >= 2 && source.starts_with('"') && source.ends_with('"') {
                let items: Vec<&str> = source[1..source.len() - 1].split(',').collect();
                base.allow_list_strings(&items).map_err(invalid)?
            } else if source.is_empty() {
                return Err(WorkbookError::InvalidValidation("list rule has no source".to_string()));
            } else {
                base.allow_list_formula(Formula::new(strip_equals(source)))
            }
        }
        other => {
            return Err(WorkbookError::InvalidValidation(format!("unknown type '{other}'")))
        }
    };

    if let Some(title) = rule.error_title.as_deref().filter(|s| !s.is_empty()) {
        validation = validation.set_error_title(title).map_err(invalid)?;
    }
    if let Some(message) = rule.error_message.as_deref().filter(|s| !s.is_empty()) {
        validation = validation.set_error_message(message).map_err(invalid)?;
    }
    if let Some(title) = rule.prompt_title.as_deref().filter(|s| !s.is_empty()) {
        validation = validation.set_input_title(title).map_err(invalid)?;
    }
    if let Some(prompt) = rule.prompt.as_deref().filter(|s| !s.is_empty()) {
        validation = validation.set_input_message(prompt).map_err(invalid)?;
    }

    Ok(validation
        .show_error_message(rule.show_error)
        .show_input_message(rule.show_input)
        .ignore_blank(rule.allow_blank))
}

//==============================================================================
// Protection and images
//==============================================================================

fn build_protection(protection: &SheetProtection) -> ProtectionOptions {
    ProtectionOptions {
        edit_objects: protection.edit_objects,
        edit_scenarios: protection.edit_scenarios,
        select_locked_cells: protection.select_locked_cells,
        select_unlocked_cells: protection.select_unlocked_cells,
        ..ProtectionOptions::default()
    }
}

const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "bmp"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) enum Placement {
    Floating { offset_x: u32, offset_y: u32 },
    FitToCell { keep_aspect_ratio: bool },
    InCell,
}

pub(super) struct PlacedImage {
    pub at: CellRef,
    pub image: Image,
    pub placement: Placement,
}

pub(super) fn build_image(meta: &ImageMetadata) -> Result<PlacedImage, WorkbookError> {
    let at = parse_cell(&meta.cell)?;
    let invalid = |message: String| WorkbookError::InvalidImage(format!("{}: {message}", meta.cell));

    let extension = meta.extension.trim().trim_start_matches('.').to_ascii_lowercase();
    if !extension.is_empty() && !IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        return Err(invalid(format!("unsupported extension '{}'", meta.extension)));
    }

    let mut image = Image::new_from_buffer(&meta.file).map_err(|e| invalid(e.to_string()))?;

    let format = &meta.format;
    if !format.alt_text.is_empty() {
        image = image.set_alt_text(&format.alt_text);
    }
    if format.scale_x > 0.0 && format.scale_x != 1.0 {
        image = image.set_scale_width(format.scale_x);
    }
    if format.scale_y > 0.0 && format.scale_y != 1.0 {
        image = image.set_scale_height(format.scale_y);
    }
    if let Some(target) = image_link_target(format)? {
        image = image.set_url(target.as_str()).map_err(|e| invalid(e.to_string()))?;
    }

    let movement = match format.positioning.to_ascii_lowercase().as_str() {
        "" | "twocell" => ObjectMovement::MoveAndSizeWithCells,
        "onecell" => ObjectMovement::MoveButDontSizeWithCells,
        "absolute" => ObjectMovement::DontMoveOrSizeWithCells,
        other => return Err(invalid(format!("unknown positioning '{other}'"))),
    };
    image = image.set_object_movement(movement);

    let offset = |v: i32, axis: &str| {
        u32::try_from(v).map_err(|_| invalid(format!("negative {axis} offset {v}")))
    };

    let placement = match meta.insert_type {
        0 if format.auto_fit => Placement::FitToCell {
            keep_aspect_ratio: !format.auto_fit_ignore_aspect,
        },
        0 => Placement::Floating {
            offset_x: offset(format.offset_x, "x")?,
            offset_y: offset(format.offset_y, "y")?,
        },
        1 => Placement::InCell,
        other => return Err(invalid(format!("unsupported insert type {other}"))),
    };

    Ok(PlacedImage { at, image, placement })
}

fn image_link_target(format: &ImageFormat) -> Result<Option<String>, WorkbookError> {
    let link = format.hyperlink.trim();
    if link.is_empty() {
        return Ok(None);
    }
    let target = match format.hyperlink_type.to_ascii_lowercase().as_str() {
        "" => hyperlink_target(&Hyperlink {
            link: link.to_string(),
            tooltip: None,
        }),
        "external" => link.to_string(),
        "location" => format!("internal:{}", link.trim_start_matches('#')),
        other => {
            return Err(WorkbookError::InvalidImage(format!("unknown hyperlink type '{other}'")))
        }
    };
    Ok(Some(target))
}
