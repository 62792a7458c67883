//! Customer listings: a bordered console table and a standalone HTML export.
//! Both keep the store's scan order and the column order id, name, balance,
//! debt.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::models::Customer;

const HEADERS: [&str; 4] = ["id", "name", "balance", "debt"];

/// Format an amount the way every report shows it.
pub fn format_amount(value: f64) -> String {
    format!("{value:.2}")
}

fn cells(customer: &Customer) -> [String; 4] {
    [
        customer.id.to_string(),
        customer.name.clone(),
        format_amount(customer.balance),
        format_amount(customer.debt),
    ]
}

/// Render `customers` as a plain-text table:
///
/// ```text
/// +----+------+---------+-------+
/// | id | name | balance |  debt |
/// +----+------+---------+-------+
/// |  1 | Ana  |   70.00 | 50.00 |
/// +----+------+---------+-------+
/// ```
pub fn render_table(customers: &[Customer]) -> String {
    let rows: Vec<[String; 4]> = customers.iter().map(cells).collect();

    let mut widths = HEADERS.map(|header| header.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let separator = {
        let mut line = String::from("+");
        for width in widths {
            line.push_str(&"-".repeat(width + 2));
            line.push('+');
        }
        line
    };

    let mut out = String::new();
    out.push_str(&separator);
    out.push('\n');
    out.push_str(&render_row(&HEADERS.map(String::from), &widths));
    out.push_str(&separator);
    out.push('\n');
    for row in &rows {
        out.push_str(&render_row(row, &widths));
    }
    out.push_str(&separator);
    out.push('\n');
    out
}

fn render_row(cells: &[String; 4], widths: &[usize; 4]) -> String {
    let mut line = String::from("|");
    for (column, (cell, width)) in cells.iter().zip(widths.iter().copied()).enumerate() {
        // Name is the only text column; everything else lines up on the right.
        if column == 1 {
            line.push_str(&format!(" {cell:<width$} |"));
        } else {
            line.push_str(&format!(" {cell:>width$} |"));
        }
    }
    line.push('\n');
    line
}

/// Render `customers` as a complete HTML page.
pub fn render_html(customers: &[Customer]) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>Customers</title>\n</head>\n<body>\n<table border=\"1\">\n  <thead>\n    <tr>",
    );
    for header in HEADERS {
        html.push_str(&format!("<th>{header}</th>"));
    }
    html.push_str("</tr>\n  </thead>\n  <tbody>\n");
    for customer in customers {
        html.push_str("    <tr>");
        for cell in cells(customer) {
            html.push_str(&format!("<td>{}</td>", escape_html(&cell)));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("  </tbody>\n</table>\n</body>\n</html>\n");
    html
}

/// Write the HTML listing to `path`, replacing any previous export.
pub fn export_html(customers: &[Customer], path: &Path) -> Result<()> {
    fs::write(path, render_html(customers))
        .with_context(|| format!("failed to write report to {}", path.display()))?;
    info!(path = %path.display(), rows = customers.len(), "report exported");
    Ok(())
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
