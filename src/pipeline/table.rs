//! Table normalisation: HTML table markup → row mappings.
//!
//! The engine reports recognised tables as HTML. The first `<table>` in the
//! markup is split into a header section and a body section, each read into a
//! grid of cell strings (spans expanded), and then reshaped with a fixed
//! policy:
//!
//! 1. Header rows the markup declares (`<thead>` rows, or leading rows made
//!    only of `<th>` cells when there is no `<thead>`) are discarded.
//! 2. The first body row is always the header of the output.
//! 3. Every following body row becomes a mapping header → cell, in row order;
//!    `<tfoot>` rows come last.
//! 4. Duplicate header values collapse into one key; the right-most cell wins.
//!    This loses data and is accepted: the output schema depends on it.
//!
//! Markup that holds no table degrades to a `table_error` record carrying the
//! original HTML; it never fails the page.

use super::classify::normalize_whitespace;
use crate::error::{RegionError, TableParseError};
use crate::output::{Content, TableRow};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::error;

static TABLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table").expect("valid table selector"));

/// Upper bound on `colspan`/`rowspan`; larger values are treated as this.
const MAX_SPAN: usize = 1000;

/// Normalise table HTML into a `table` record, or `table_error` on failure.
pub fn normalize(html: &str) -> Content {
    match parse_grid(html) {
        Ok(grid) => Content::Table {
            data: grid_to_rows(grid.body),
        },
        Err(e) => {
            error!("Failed to process table: {}", RegionError::from(e));
            Content::TableError {
                text: html.to_string(),
            }
        }
    }
}

/// Cell text of one table, split by section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableGrid {
    /// Rows the markup declared as header.
    pub header: Vec<Vec<String>>,
    /// Body rows followed by footer rows.
    pub body: Vec<Vec<String>>,
}

/// Parse the first `<table>` in `html` into header and body grids.
///
/// Spans are expanded within a section; a `rowspan` never crosses from the
/// header into the body.
pub fn parse_grid(html: &str) -> Result<TableGrid, TableParseError> {
    if html.trim().is_empty() {
        return Err(TableParseError::Empty);
    }

    let document = Html::parse_document(html);
    let table = document
        .select(&TABLE_SELECTOR)
        .next()
        .ok_or(TableParseError::NoTable)?;

    let sections = direct_rows(table);
    let mut head = sections.head;
    let mut body = sections.body;
    if head.is_empty() {
        let leading_th = body.iter().take_while(|tr| is_all_th(**tr)).count();
        head = body.drain(..leading_th).collect();
    }
    body.extend(sections.foot);

    Ok(TableGrid {
        header: expand(&head),
        body: expand(&body),
    })
}

/// Read rows into a grid, expanding `colspan` and `rowspan`.
fn expand(rows: &[ElementRef<'_>]) -> Vec<Vec<String>> {
    let mut grid = Vec::with_capacity(rows.len());
    // Per column: text still owed to the rows below by a `rowspan`, and how many.
    let mut carry: Vec<Option<(String, usize)>> = Vec::new();

    for tr in rows {
        let mut row: Vec<String> = Vec::new();

        for cell in direct_cells(*tr) {
            while let Some(text) = take_carried(&mut carry, row.len()) {
                row.push(text);
            }

            let text = normalize_whitespace(&cell.text().collect::<String>());
            let colspan = span(cell, "colspan");
            let rowspan = span(cell, "rowspan");

            for _ in 0..colspan {
                let col = row.len();
                let owed = (rowspan > 1).then(|| (text.clone(), rowspan - 1));
                if col >= carry.len() {
                    carry.resize(col + 1, None);
                }
                carry[col] = owed;
                row.push(text.clone());
            }
        }

        while let Some(text) = take_carried(&mut carry, row.len()) {
            row.push(text);
        }
        grid.push(row);
    }

    grid
}

/// Reshape a grid using its first row as the header.
fn grid_to_rows(grid: Vec<Vec<String>>) -> Vec<TableRow> {
    let mut rows = grid.into_iter();
    let Some(header) = rows.next() else {
        return Vec::new();
    };

    rows.map(|cells| {
        let mut record = TableRow::with_capacity(header.len());
        for (i, key) in header.iter().enumerate() {
            record.insert(key.clone(), cells.get(i).cloned());
        }
        for (i, cell) in cells.iter().enumerate().skip(header.len()) {
            record.insert(i.to_string(), Some(cell.clone()));
        }
        record
    })
    .collect()
}

struct Sections<'a> {
    head: Vec<ElementRef<'a>>,
    body: Vec<ElementRef<'a>>,
    foot: Vec<ElementRef<'a>>,
}

/// Rows that belong to `table` itself, not to tables nested in its cells,
/// grouped by `<thead>`, `<tbody>` (or bare `<tr>`) and `<tfoot>`.
fn direct_rows(table: ElementRef<'_>) -> Sections<'_> {
    let mut sections = Sections {
        head: Vec::new(),
        body: Vec::new(),
        foot: Vec::new(),
    };

    for child in table.children().filter_map(ElementRef::wrap) {
        let target = match child.value().name() {
            "tr" => {
                sections.body.push(child);
                continue;
            }
            "thead" => &mut sections.head,
            "tbody" => &mut sections.body,
            "tfoot" => &mut sections.foot,
            _ => continue,
        };
        target.extend(
            child
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|e| e.value().name() == "tr"),
        );
    }

    sections
}

fn is_all_th(row: ElementRef<'_>) -> bool {
    let cells = direct_cells(row);
    !cells.is_empty() && cells.iter().all(|c| c.value().name() == "th")
}

fn direct_cells(row: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|e| matches!(e.value().name(), "td" | "th"))
        .collect()
}

fn span(cell: ElementRef<'_>, attr: &str) -> usize {
    cell.value()
        .attr(attr)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(1)
        .clamp(1, MAX_SPAN)
}

/// Pop one owed cell for `col`, if a rowspan above still covers it.
fn take_carried(carry: &mut [Option<(String, usize)>], col: usize) -> Option<String> {
    let slot = carry.get_mut(col)?;
    let (text, left) = slot.as_mut()?;
    let text = text.clone();
    *left -= 1;
    if *left == 0 {
        *slot = None;
    }
    Some(text)
}
