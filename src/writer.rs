//! Serialize a [`Workbook`] model with umya-spreadsheet.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use umya_spreadsheet::structs::{
    Border, ConditionalFormatValues, ConditionalFormatting, ConditionalFormattingOperatorValues,
    ConditionalFormattingRule, Formula, Pane, PaneStateValues, PaneValues, PatternValues,
    SheetView, Spreadsheet, Worksheet,
};

use crate::addr::column_name_to_number;
use crate::model::{
    BorderLine, CellValue, CompareOp, ConditionalFormatRule, DocProperties, FreezePane, Sheet,
    Style, Workbook,
};

// umya-spreadsheet's Color::set_argb() turns values that equal one of its
// INDEXED_COLORS into indexed="n", which viewers map through their own
// palette. Lowercase never matches that table and Excel ignores hex case.
fn argb_for_umya(argb: &str) -> String {
    argb.to_ascii_lowercase()
}

pub fn to_umya_style(style: &Style) -> umya_spreadsheet::Style {
    let mut out = umya_spreadsheet::Style::default();
    if style.bold {
        out.get_font_mut().set_bold(true);
    }
    if let Some(argb) = style.font_color {
        out.get_font_mut()
            .get_color_mut()
            .set_argb(argb_for_umya(argb).as_str());
    }
    if let Some(argb) = style.fill {
        let argb = argb_for_umya(argb);
        let pattern = out.get_fill_mut().get_pattern_fill_mut();
        pattern.set_pattern_type(PatternValues::Solid);
        pattern.get_foreground_color_mut().set_argb(argb.as_str());
        // Differential formats read the solid color from bgColor.
        pattern.get_background_color_mut().set_argb(argb.as_str());
    }
    if let Some(BorderLine::Thin) = style.bottom_border {
        out.get_borders_mut()
            .get_bottom_mut()
            .set_border_style(Border::BORDER_THIN);
    }
    if let Some(code) = style.number_format {
        out.get_number_format_mut().set_format_code(code);
    }
    out
}

fn to_umya_operator(op: CompareOp) -> ConditionalFormattingOperatorValues {
    match op {
        CompareOp::GreaterThan => ConditionalFormattingOperatorValues::GreaterThan,
        CompareOp::GreaterThanOrEqual => ConditionalFormattingOperatorValues::GreaterThanOrEqual,
        CompareOp::LessThan => ConditionalFormattingOperatorValues::LessThan,
        CompareOp::LessThanOrEqual => ConditionalFormattingOperatorValues::LessThanOrEqual,
        CompareOp::Equal => ConditionalFormattingOperatorValues::Equal,
        CompareOp::NotEqual => ConditionalFormattingOperatorValues::NotEqual,
    }
}

fn write_cells(ws: &mut Worksheet, sheet: &Sheet) {
    for ((row, col), model_cell) in sheet.cells() {
        let cell = ws.get_cell_mut((col, row));
        match &model_cell.value {
            CellValue::Empty => {}
            CellValue::Number(n) => {
                cell.set_value_number(*n);
            }
            CellValue::Text(text) => {
                cell.set_value_string(text.as_str());
            }
            CellValue::Formula(text) => {
                // The file stores formulas without the leading '='.
                cell.set_formula(text.trim_start_matches('='));
            }
        }
        if let Some(style) = &model_cell.style {
            cell.set_style(to_umya_style(style));
        }
    }
}

fn write_conditional_format(ws: &mut Worksheet, rule: &ConditionalFormatRule, priority: i32) {
    let mut formula = Formula::default();
    formula.set_string_value(rule.threshold.as_str());

    let mut cf_rule = ConditionalFormattingRule::default();
    cf_rule.set_type(ConditionalFormatValues::CellIs);
    cf_rule.set_operator(to_umya_operator(rule.operator));
    cf_rule.set_priority(priority);
    cf_rule.set_formula(formula);
    cf_rule.set_style(to_umya_style(&rule.style));

    let mut cf = ConditionalFormatting::default();
    cf.get_sequence_of_references_mut()
        .set_sqref(rule.range.to_string());
    cf.add_conditional_collection(cf_rule);
    ws.add_conditional_formatting_collection(cf);
}

fn write_freeze_pane(ws: &mut Worksheet, freeze: FreezePane) {
    let mut pane = Pane::default();
    if freeze.frozen_cols() > 0 {
        pane.set_horizontal_split(f64::from(freeze.frozen_cols()));
    }
    if freeze.frozen_rows() > 0 {
        pane.set_vertical_split(f64::from(freeze.frozen_rows()));
    }
    pane.get_top_left_cell_mut()
        .set_coordinate(freeze.anchor().as_str());
    pane.set_active_pane(match (freeze.frozen_rows() > 0, freeze.frozen_cols() > 0) {
        (true, true) => PaneValues::BottomRight,
        (true, false) => PaneValues::BottomLeft,
        _ => PaneValues::TopRight,
    });
    pane.set_state(PaneStateValues::Frozen);

    let views = ws.get_sheet_views_mut().get_sheet_view_list_mut();
    if views.is_empty() {
        views.push(SheetView::default());
    }
    for view in views.iter_mut() {
        view.set_pane(pane.clone());
    }
}

fn write_sheet(ws: &mut Worksheet, sheet: &Sheet) -> Result<()> {
    write_cells(ws, sheet);
    for (priority, rule) in (1..).zip(sheet.conditional_formats()) {
        write_conditional_format(ws, rule, priority);
    }
    if let Some(freeze) = sheet.freeze_pane() {
        write_freeze_pane(ws, freeze);
    }
    for (letters, width) in sheet.column_widths() {
        let col = column_name_to_number(&letters)?;
        let dim = ws.get_column_dimension_by_number_mut(&col);
        dim.set_width(width);
        dim.set_auto_width(false);
    }
    Ok(())
}

fn write_properties(book: &mut Spreadsheet, properties: &DocProperties) {
    let stamp = properties
        .created
        .format("%Y-%m-%dT%H:%M:%SZ")
        .to_string();
    let props = book.get_properties_mut();
    props.set_creator(properties.creator.as_str());
    props.set_last_modified_by(properties.creator.as_str());
    props.set_title(properties.title.as_str());
    props.set_created(stamp.as_str());
    props.set_modified(stamp.as_str());
}

pub fn to_spreadsheet(model: &Workbook) -> Result<Spreadsheet> {
    let Some((first, rest)) = model.sheets().split_first() else {
        bail!("workbook has no sheets");
    };

    let mut book = umya_spreadsheet::new_file();
    if let Some(properties) = model.properties() {
        write_properties(&mut book, properties);
    }

    let ws = book
        .get_sheet_by_name_mut("Sheet1")
        .ok_or_else(|| anyhow!("new workbook has no default sheet"))?;
    ws.set_name(first.name());
    write_sheet(ws, first).with_context(|| format!("failed to write sheet: {}", first.name()))?;

    for sheet in rest {
        let ws = book
            .new_sheet(sheet.name())
            .map_err(|e| anyhow!("cannot add sheet {}: {e}", sheet.name()))?;
        write_sheet(ws, sheet).with_context(|| format!("failed to write sheet: {}", sheet.name()))?;
    }

    // Names held by a worksheet are still written workbook-scoped (no localSheetId).
    for named in model.named_ranges() {
        let refers_to = named.refers_to();
        book.get_sheet_by_name_mut(&named.sheet)
            .ok_or_else(|| anyhow!("defined name {} points at missing sheet {}", named.name, named.sheet))?
            .add_defined_name(named.name.as_str(), refers_to.as_str())
            .map_err(|e| anyhow!("cannot add defined name {}: {e}", named.name))?;
    }
    Ok(book)
}

pub fn to_xlsx_bytes(model: &Workbook) -> Result<Vec<u8>> {
    let book = to_spreadsheet(model)?;
    let mut cursor = Cursor::new(Vec::new());
    umya_spreadsheet::writer::xlsx::write_writer(&book, &mut cursor)
        .context("failed to serialize workbook")?;
    Ok(cursor.into_inner())
}

pub fn write_xlsx(model: &Workbook, path: &Path) -> Result<()> {
    // Render fully before touching the file so a failure never truncates it.
    let bytes = to_xlsx_bytes(model)?;
    fs::write(path, bytes).with_context(|| format!("failed to save file: {}", path.display()))?;
    Ok(())
}
