//! Projection of a sealed quote into a printable Typst document.
//!
//! Rendering is a pure function of `(quote, kind)`: the same inputs always
//! produce the same source text, which is what the exporter compiles.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use comfy_table::{Attribute, Cell, CellAlignment, Table};
use serde::Serialize;
use tera::{Context, Tera, Value};
use tracing::info;

use crate::error::RenderError;
use crate::model::{format_money, DocumentKind, Quote};

pub const BRAND: &str = "EKIPHELP";
pub const TEMPLATE_NAME: &str = "quote.typ.tera";

// Embedded so a fresh data directory always has a template
const DEFAULT_TEMPLATE: &str = include_str!("../templates/quote.typ.tera");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub kind: DocumentKind,
    pub filename: String,
    pub source: String,
}

#[derive(Serialize)]
struct ItemRow {
    description: String,
    quantity: u32,
    unit_price: String,
    line_total: String,
}

#[derive(Serialize)]
struct DocumentContext<'a> {
    brand: &'a str,
    title: &'a str,
    client_name: &'a str,
    client_phone: &'a str,
    date: String,
    company_name: &'a str,
    company_phone: &'a str,
    company_address: &'a str,
    company_tax_id: &'a str,
    rows: Vec<ItemRow>,
    total: String,
    notes: Option<String>,
}

impl<'a> DocumentContext<'a> {
    fn new(quote: &'a Quote, kind: DocumentKind) -> Self {
        let rows = quote
            .items
            .iter()
            .map(|item| ItemRow {
                description: item.description.clone(),
                quantity: item.quantity,
                unit_price: format_money(item.unit_price),
                line_total: item.line_total().map_or_else(|| "-".to_string(), format_money),
            })
            .collect();

        Self {
            brand: BRAND,
            title: kind.title(),
            client_name: &quote.client_name,
            client_phone: &quote.client_phone,
            date: issue_date(quote),
            company_name: &quote.company.name,
            company_phone: &quote.company.phone,
            company_address: &quote.company.address,
            company_tax_id: &quote.company.tax_id,
            rows,
            // the stored total, so the document matches the persisted record
            total: format_money(quote.total),
            notes: (!quote.notes.is_empty()).then(|| unix_line_endings(&quote.notes)),
        }
    }
}

// CRLF and lone CR both become "\n"; the template breaks lines on "\n" only
fn unix_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

pub fn issue_date(quote: &Quote) -> String {
    quote.issued_at.format("%d/%m/%Y").to_string()
}

/// `EKIPHELP_<Orçamento|Recibo>_<dd-mm-yyyy>.pdf`, dated by issue, not by export.
pub fn export_filename(quote: &Quote, kind: DocumentKind) -> String {
    format!(
        "{}_{}_{}.pdf",
        BRAND,
        kind.label(),
        quote.issued_at.format("%d-%m-%Y")
    )
}

/// Quotes a value as a Typst string literal so user text is never read as markup.
pub fn typst_string_literal(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    out.push('"');
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

fn typst_str_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let raw = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    Ok(Value::String(typst_string_literal(&raw)))
}

pub struct DocumentRenderer {
    tera: Tera,
}

impl DocumentRenderer {
    /// Renderer backed by the built-in template only.
    pub fn embedded() -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.add_raw_template(TEMPLATE_NAME, DEFAULT_TEMPLATE)?;
        Ok(Self::with_tera(tera))
    }

    /// Loads `*.tera` from `template_dir`, writing the default template first
    /// if the operator has not customised one yet.
    pub fn load(template_dir: &Path) -> Result<Self, RenderError> {
        fs::create_dir_all(template_dir)?;
        let template_path = template_dir.join(TEMPLATE_NAME);
        if !template_path.exists() {
            info!(path = %template_path.display(), "initializing default template");
            fs::write(&template_path, DEFAULT_TEMPLATE)?;
        }

        let glob = template_dir.join("*.tera");
        let tera = Tera::new(&glob.to_string_lossy())?;
        Ok(Self::with_tera(tera))
    }

    fn with_tera(mut tera: Tera) -> Self {
        tera.register_filter("typst_str", typst_str_filter);
        Self { tera }
    }

    pub fn render(&self, quote: &Quote, kind: DocumentKind) -> Result<RenderedDocument, RenderError> {
        let context = Context::from_serialize(DocumentContext::new(quote, kind))?;
        let source = self.tera.render(TEMPLATE_NAME, &context)?;
        Ok(RenderedDocument {
            kind,
            filename: export_filename(quote, kind),
            source,
        })
    }
}

/// Terminal rendition of the same document, shown while reviewing.
pub fn preview(quote: &Quote, kind: DocumentKind) -> String {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Descrição"),
        Cell::new("Quantidade"),
        Cell::new("Preço"),
        Cell::new("Total"),
    ]);

    for item in &quote.items {
        table.add_row(vec![
            Cell::new(&item.description),
            Cell::new(item.quantity).set_alignment(CellAlignment::Right),
            Cell::new(format_money(item.unit_price)).set_alignment(CellAlignment::Right),
            Cell::new(item.line_total().map_or_else(|| "-".to_string(), format_money))
                .set_alignment(CellAlignment::Right),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total").add_attribute(Attribute::Bold),
        Cell::new(""),
        Cell::new(""),
        Cell::new(format_money(quote.total))
            .add_attribute(Attribute::Bold)
            .set_alignment(CellAlignment::Right),
    ]);

    let company = &quote.company;
    let mut out = format!(
        "{} - {}\n\nCliente: {} ({})\nData: {}\nEmpresa: {} | {} | {} | CNPJ: {}\n\n{}\n",
        BRAND,
        kind.title(),
        quote.client_name,
        quote.client_phone,
        issue_date(quote),
        company.name,
        company.phone,
        company.address,
        company.tax_id,
        table
    );
    if !quote.notes.is_empty() {
        out.push_str(&format!("\nObservações:\n{}\n", unix_line_endings(&quote.notes)));
    }
    out
}
