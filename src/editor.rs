//! Working copy of a quote while the operator fills it in.
//!
//! Numeric inputs are kept as drafts (the raw text plus the coerced value) so
//! that a half-typed price is "not yet valid" instead of an error. Only
//! [`QuoteEditor::submit`] turns the drafts into a sealed [`Quote`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::error::{SessionError, ValidationError};
use crate::model::{compute_total, CompanyProfile, DocumentKind, LineItem, Quote};
use crate::store::{QuoteStore, QUOTES_COLLECTION};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemField {
    Description,
    Quantity,
    UnitPrice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientField {
    Name,
    Phone,
}

impl fmt::Display for ClientField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientField::Name => write!(f, "client name"),
            ClientField::Phone => write!(f, "client phone"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompanyField {
    Name,
    Phone,
    Address,
    TaxId,
}

impl CompanyField {
    pub const ALL: [CompanyField; 4] = [
        CompanyField::Name,
        CompanyField::Phone,
        CompanyField::Address,
        CompanyField::TaxId,
    ];

    pub fn get(self, company: &CompanyProfile) -> &str {
        match self {
            CompanyField::Name => &company.name,
            CompanyField::Phone => &company.phone,
            CompanyField::Address => &company.address,
            CompanyField::TaxId => &company.tax_id,
        }
    }

    fn slot(self, company: &mut CompanyProfile) -> &mut String {
        match self {
            CompanyField::Name => &mut company.name,
            CompanyField::Phone => &mut company.phone,
            CompanyField::Address => &mut company.address,
            CompanyField::TaxId => &mut company.tax_id,
        }
    }
}

impl fmt::Display for CompanyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompanyField::Name => write!(f, "name"),
            CompanyField::Phone => write!(f, "phone"),
            CompanyField::Address => write!(f, "address"),
            CompanyField::TaxId => write!(f, "CNPJ"),
        }
    }
}

/// One editable row. `None` in a numeric slot means the input did not coerce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDraft {
    pub description: String,
    quantity_input: String,
    quantity: Option<u32>,
    unit_price_input: String,
    unit_price: Option<Decimal>,
}

impl ItemDraft {
    pub fn blank() -> Self {
        Self {
            description: String::new(),
            quantity_input: "1".to_string(),
            quantity: Some(1),
            unit_price_input: "0".to_string(),
            unit_price: Some(Decimal::ZERO),
        }
    }

    pub fn quantity(&self) -> Option<u32> {
        self.quantity
    }

    pub fn unit_price(&self) -> Option<Decimal> {
        self.unit_price
    }

    pub fn quantity_input(&self) -> &str {
        &self.quantity_input
    }

    pub fn unit_price_input(&self) -> &str {
        &self.unit_price_input
    }

    pub fn is_valid(&self) -> bool {
        self.quantity.is_some() && self.unit_price.is_some() && !is_blank(&self.description)
    }

    /// The finished row, or `None` while a numeric field is not yet valid.
    pub fn to_line_item(&self) -> Option<LineItem> {
        Some(LineItem {
            description: self.description.clone(),
            quantity: self.quantity?,
            unit_price: self.unit_price?,
        })
    }
}

impl From<&LineItem> for ItemDraft {
    fn from(item: &LineItem) -> Self {
        Self {
            description: item.description.clone(),
            quantity_input: item.quantity.to_string(),
            quantity: Some(item.quantity),
            unit_price_input: item.unit_price.to_string(),
            unit_price: Some(item.unit_price),
        }
    }
}

/// Whole number, at least one.
pub fn coerce_quantity(input: &str) -> Option<u32> {
    input.trim().parse::<u32>().ok().filter(|q| *q >= 1)
}

/// Non-negative decimal; a comma is accepted as the decimal separator.
pub fn coerce_unit_price(input: &str) -> Option<Decimal> {
    let normalized = input.trim().replace(',', ".");
    Decimal::from_str(&normalized)
        .ok()
        .filter(|p| !p.is_sign_negative() || p.is_zero())
        .map(|p| p.abs())
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteEditor {
    client_name: String,
    client_phone: String,
    items: Vec<ItemDraft>,
    notes: String,
    company: CompanyProfile,
    seeded: bool,
}

impl Default for QuoteEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl QuoteEditor {
    pub fn new() -> Self {
        Self {
            client_name: String::new(),
            client_phone: String::new(),
            items: vec![ItemDraft::blank()],
            notes: String::new(),
            company: CompanyProfile::default(),
            seeded: false,
        }
    }

    /// Empty quote with the company block pre-filled.
    pub fn with_company(company: CompanyProfile) -> Self {
        Self { company, ..Self::new() }
    }

    /// Fresh working copy of an already sealed quote.
    pub fn from_quote(quote: &Quote) -> Self {
        let mut items: Vec<ItemDraft> = quote.items.iter().map(ItemDraft::from).collect();
        if items.is_empty() {
            items.push(ItemDraft::blank());
        }
        Self {
            client_name: quote.client_name.clone(),
            client_phone: quote.client_phone.clone(),
            items,
            notes: quote.notes.clone(),
            company: quote.company.clone(),
            seeded: true,
        }
    }

    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    pub fn client_phone(&self) -> &str {
        &self.client_phone
    }

    pub fn items(&self) -> &[ItemDraft] {
        &self.items
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn company(&self) -> &CompanyProfile {
        &self.company
    }

    // ------------------------------------------
    // Items
    // ------------------------------------------

    pub fn add_item(&mut self) {
        self.items.push(ItemDraft::blank());
    }

    pub fn can_remove_item(&self) -> bool {
        self.items.len() > 1
    }

    /// Removes the row at `index`. The last remaining row is never removed.
    pub fn remove_item(&mut self, index: usize) -> bool {
        if !self.can_remove_item() || index >= self.items.len() {
            debug!(index, len = self.items.len(), "remove_item ignored");
            return false;
        }
        self.items.remove(index);
        true
    }

    /// Replaces one field of one row. Returns whether the new value is usable;
    /// an unusable numeric value is still recorded and blocks submission.
    pub fn update_item(&mut self, index: usize, field: ItemField, value: &str) -> bool {
        let Some(item) = self.items.get_mut(index) else {
            debug!(index, "update_item out of range");
            return false;
        };
        match field {
            ItemField::Description => {
                item.description = value.to_string();
                !is_blank(value)
            }
            ItemField::Quantity => {
                item.quantity_input = value.to_string();
                item.quantity = coerce_quantity(value);
                item.quantity.is_some()
            }
            ItemField::UnitPrice => {
                item.unit_price_input = value.to_string();
                item.unit_price = coerce_unit_price(value);
                item.unit_price.is_some()
            }
        }
    }

    // ------------------------------------------
    // Free text
    // ------------------------------------------

    pub fn update_client_field(&mut self, field: ClientField, value: &str) {
        match field {
            ClientField::Name => self.client_name = value.to_string(),
            ClientField::Phone => self.client_phone = value.to_string(),
        }
    }

    pub fn update_company_field(&mut self, field: CompanyField, value: &str) {
        *field.slot(&mut self.company) = value.to_string();
    }

    pub fn set_notes(&mut self, notes: &str) {
        self.notes = notes.to_string();
    }

    // ------------------------------------------
    // Totals & submission
    // ------------------------------------------

    fn line_items(&self) -> Option<Vec<LineItem>> {
        self.items.iter().map(ItemDraft::to_line_item).collect()
    }

    /// Live total while editing; `None` while any numeric input is invalid
    /// or the amounts are too large to add up.
    pub fn running_total(&self) -> Option<Decimal> {
        compute_total(&self.line_items()?)
    }

    /// Every reason the working copy cannot be sealed yet.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if is_blank(&self.client_name) {
            errors.push(ValidationError::EmptyClientField(ClientField::Name));
        }
        if is_blank(&self.client_phone) {
            errors.push(ValidationError::EmptyClientField(ClientField::Phone));
        }

        for (index, item) in self.items.iter().enumerate() {
            if is_blank(&item.description) {
                errors.push(ValidationError::EmptyDescription(index));
            }
            if item.quantity.is_none() {
                errors.push(ValidationError::InvalidQuantity(index));
            }
            if item.unit_price.is_none() {
                errors.push(ValidationError::InvalidUnitPrice(index));
            }
        }
        if self.line_items().is_some_and(|items| compute_total(&items).is_none()) {
            errors.push(ValidationError::TotalTooLarge);
        }

        for field in CompanyField::ALL {
            if is_blank(field.get(&self.company)) {
                errors.push(ValidationError::EmptyCompanyField(field));
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Validates and builds the sealed snapshot without touching any store.
    pub fn seal(
        &self,
        kind: DocumentKind,
        issued_at: DateTime<Local>,
    ) -> Result<Quote, Vec<ValidationError>> {
        self.validate()?;

        // every draft coerces and the total fits once validation passed
        let items = self.line_items().unwrap_or_default();
        let total = compute_total(&items).ok_or_else(|| vec![ValidationError::TotalTooLarge])?;

        Ok(Quote {
            client_name: self.client_name.clone(),
            client_phone: self.client_phone.clone(),
            total,
            items,
            notes: self.notes.clone(),
            company: self.company.clone(),
            issued_at,
            document_kind: kind,
        })
    }

    /// Seals the working copy and appends it to `store`.
    ///
    /// The sealed quote is only returned once the append is acknowledged. On
    /// any error the working copy is left untouched so the operator can retry.
    pub fn submit<S: QuoteStore>(
        &self,
        store: &mut S,
        kind: DocumentKind,
        issued_at: DateTime<Local>,
    ) -> Result<Quote, SessionError> {
        let quote = self.seal(kind, issued_at).map_err(SessionError::Invalid)?;
        let key = store.append(QUOTES_COLLECTION, &quote)?;
        info!(%key, total = %quote.total, items = quote.items.len(), "quote sealed");
        Ok(quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn filled_editor() -> QuoteEditor {
        let mut editor = QuoteEditor::new();
        editor.update_client_field(ClientField::Name, "Maria Souza");
        editor.update_client_field(ClientField::Phone, "(11) 91234-5678");
        editor.update_item(0, ItemField::Description, "Cable repair");
        editor.update_item(0, ItemField::Quantity, "2");
        editor.update_item(0, ItemField::UnitPrice, "50.00");
        editor.update_company_field(CompanyField::Name, "EkipHelp");
        editor.update_company_field(CompanyField::Phone, "(11) 3333-4444");
        editor.update_company_field(CompanyField::Address, "Rua das Flores, 10");
        editor.update_company_field(CompanyField::TaxId, "00.000.000/0001-00");
        editor
    }

    #[test]
    fn new_editor_has_one_blank_item() {
        let editor = QuoteEditor::new();
        assert_eq!(editor.items().len(), 1);
        assert_eq!(editor.items()[0].quantity(), Some(1));
        assert_eq!(editor.items()[0].unit_price(), Some(Decimal::ZERO));
        assert!(!editor.can_remove_item());
        assert!(!editor.is_seeded());
    }

    #[test]
    fn last_item_cannot_be_removed() {
        let mut editor = QuoteEditor::new();
        assert!(!editor.remove_item(0));
        assert_eq!(editor.items().len(), 1);

        editor.add_item();
        editor.add_item();
        assert!(editor.remove_item(1));
        assert!(editor.remove_item(0));
        assert!(!editor.remove_item(0));
        assert_eq!(editor.items().len(), 1);
    }

    #[test]
    fn remove_out_of_range_is_ignored() {
        let mut editor = QuoteEditor::new();
        editor.add_item();
        assert!(!editor.remove_item(5));
        assert_eq!(editor.items().len(), 2);
    }

    #[test]
    fn add_item_appends_at_end() {
        let mut editor = filled_editor();
        editor.add_item();
        assert_eq!(editor.items()[0].description, "Cable repair");
        assert_eq!(editor.items()[1], ItemDraft::blank());
    }

    #[test]
    fn quantity_coercion() {
        assert_eq!(coerce_quantity("3"), Some(3));
        assert_eq!(coerce_quantity(" 12 "), Some(12));
        assert_eq!(coerce_quantity("0"), None);
        assert_eq!(coerce_quantity("-1"), None);
        assert_eq!(coerce_quantity("1.5"), None);
        assert_eq!(coerce_quantity(""), None);
        assert_eq!(coerce_quantity("abc"), None);
    }

    #[test]
    fn price_coercion() {
        assert_eq!(coerce_unit_price("50"), Some(dec!(50)));
        assert_eq!(coerce_unit_price("49,90"), Some(dec!(49.90)));
        assert_eq!(coerce_unit_price("0"), Some(Decimal::ZERO));
        assert_eq!(coerce_unit_price("-0.01"), None);
        assert_eq!(coerce_unit_price(""), None);
        assert_eq!(coerce_unit_price("R$ 5"), None);
    }

    #[test]
    fn invalid_numeric_input_blocks_total_and_submission() {
        let mut editor = filled_editor();
        assert_eq!(editor.running_total(), Some(dec!(100.00)));

        assert!(!editor.update_item(0, ItemField::UnitPrice, ""));
        assert_eq!(editor.items()[0].unit_price_input(), "");
        assert_eq!(editor.running_total(), None);
        assert_eq!(
            editor.validate(),
            Err(vec![ValidationError::InvalidUnitPrice(0)])
        );

        assert!(editor.update_item(0, ItemField::UnitPrice, "55"));
        assert_eq!(editor.running_total(), Some(dec!(110.00)));
    }

    #[test]
    fn oversized_amounts_block_total_and_submission() {
        let mut editor = filled_editor();
        assert!(editor.update_item(0, ItemField::Quantity, "4000000000"));
        assert!(editor.update_item(0, ItemField::UnitPrice, "100000000000000000000"));

        assert_eq!(editor.running_total(), None);
        assert_eq!(editor.validate(), Err(vec![ValidationError::TotalTooLarge]));

        let now = Local::now();
        assert_eq!(
            editor.seal(DocumentKind::Estimate, now),
            Err(vec![ValidationError::TotalTooLarge])
        );

        // the draft survives; bringing the price down makes it sealable again
        assert!(editor.update_item(0, ItemField::UnitPrice, "2.50"));
        assert_eq!(editor.running_total(), Some(dec!(10000000000.00)));
        assert!(editor.seal(DocumentKind::Estimate, now).is_ok());
    }

    #[test]
    fn validation_reports_every_missing_field() {
        let editor = QuoteEditor::new();
        let errors = editor.validate().unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::EmptyClientField(ClientField::Name),
                ValidationError::EmptyClientField(ClientField::Phone),
                ValidationError::EmptyDescription(0),
                ValidationError::EmptyCompanyField(CompanyField::Name),
                ValidationError::EmptyCompanyField(CompanyField::Phone),
                ValidationError::EmptyCompanyField(CompanyField::Address),
                ValidationError::EmptyCompanyField(CompanyField::TaxId),
            ]
        );
    }

    #[test]
    fn whitespace_only_counts_as_empty() {
        let mut editor = filled_editor();
        editor.update_company_field(CompanyField::TaxId, "   ");
        assert_eq!(
            editor.validate(),
            Err(vec![ValidationError::EmptyCompanyField(CompanyField::TaxId)])
        );
    }

    #[test]
    fn seal_computes_total_and_stamps_metadata() {
        let mut editor = filled_editor();
        editor.add_item();
        editor.update_item(1, ItemField::Description, "Service fee");
        editor.update_item(1, ItemField::UnitPrice, "30");
        editor.set_notes("Pay within 5 days");

        let issued_at = Local::now();
        let quote = editor.seal(DocumentKind::Receipt, issued_at).unwrap();
        assert_eq!(quote.total, dec!(130.00));
        assert_eq!(quote.items.len(), 2);
        assert_eq!(quote.issued_at, issued_at);
        assert_eq!(quote.document_kind, DocumentKind::Receipt);
        assert_eq!(quote.notes, "Pay within 5 days");
    }

    #[test]
    fn seeded_editor_reproduces_quote() {
        let quote = filled_editor().seal(DocumentKind::Estimate, Local::now()).unwrap();
        let editor = QuoteEditor::from_quote(&quote);
        assert!(editor.is_seeded());
        assert_eq!(editor.client_name(), "Maria Souza");
        assert_eq!(editor.company(), &quote.company);
        assert_eq!(editor.items()[0].to_line_item().as_ref(), quote.items.first());
    }

    #[test]
    fn with_company_prefills_company_only() {
        let company = CompanyProfile {
            name: "EkipHelp".into(),
            ..CompanyProfile::default()
        };
        let editor = QuoteEditor::with_company(company.clone());
        assert_eq!(editor.company(), &company);
        assert_eq!(editor.client_name(), "");
        assert!(!editor.is_seeded());
    }
}
