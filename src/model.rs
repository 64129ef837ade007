use chrono::{DateTime, Local};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

pub const CURRENCY_SYMBOL: &str = "R$";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct LineItem {
    pub description: String,
    pub quantity: u32,
    #[serde(rename = "price")]
    pub unit_price: Decimal,
}

impl LineItem {
    /// `None` when quantity × price does not fit in a `Decimal`.
    pub fn line_total(&self) -> Option<Decimal> {
        Decimal::from(self.quantity).checked_mul(self.unit_price)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct CompanyProfile {
    pub name: String,
    pub phone: String,
    pub address: String,
    #[serde(rename = "cnpj")]
    pub tax_id: String,
}

/// Presentation flag: only the document title depends on it.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub enum DocumentKind {
    #[default]
    #[serde(rename = "orcamento")]
    Estimate,
    #[serde(rename = "recibo")]
    Receipt,
}

impl DocumentKind {
    pub fn title(self) -> &'static str {
        match self {
            DocumentKind::Estimate => "ORÇAMENTO",
            DocumentKind::Receipt => "RECIBO DE PAGAMENTO",
        }
    }

    /// Human label, also used as the export file prefix.
    pub fn label(self) -> &'static str {
        match self {
            DocumentKind::Estimate => "Orçamento",
            DocumentKind::Receipt => "Recibo",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            DocumentKind::Estimate => DocumentKind::Receipt,
            DocumentKind::Receipt => DocumentKind::Estimate,
        }
    }
}

/// A sealed quote. Only `QuoteEditor::submit` builds one for real use, so
/// `total` always matches `compute_total(&items)` and never overflowed.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub client_name: String,
    pub client_phone: String,
    pub items: Vec<LineItem>,
    pub notes: String,
    pub total: Decimal,
    #[serde(rename = "companyData")]
    pub company: CompanyProfile,
    #[serde(rename = "date")]
    pub issued_at: DateTime<Local>,
    #[serde(rename = "documentType", default)]
    pub document_kind: DocumentKind,
}

/// Σ quantity × price, rounded to cents. `None` if any step overflows.
pub fn compute_total(items: &[LineItem]) -> Option<Decimal> {
    items
        .iter()
        .try_fold(Decimal::ZERO, |sum, item| sum.checked_add(item.line_total()?))
        .map(|sum| sum.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

// "R$ 130.00": two fixed decimals, no grouping
pub fn format_money(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{} {:.2}", CURRENCY_SYMBOL, rounded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn item(description: &str, quantity: u32, unit_price: Decimal) -> LineItem {
        LineItem { description: description.into(), quantity, unit_price }
    }

    #[test]
    fn total_sums_quantity_times_price() {
        let items = vec![
            item("Cable repair", 2, dec!(50.00)),
            item("Service fee", 1, dec!(30.00)),
        ];
        assert_eq!(compute_total(&items), Some(dec!(130.00)));
        // same input, same answer
        assert_eq!(compute_total(&items), compute_total(&items));
    }

    #[test]
    fn total_rounds_to_cents() {
        let items = vec![item("Screws", 3, dec!(0.335))];
        assert_eq!(compute_total(&items), Some(dec!(1.01)));

        let half = vec![item("Washer", 1, dec!(0.125))];
        assert_eq!(compute_total(&half), Some(dec!(0.13)));
    }

    #[test]
    fn total_of_zero_valued_items_is_zero() {
        let items = vec![item("", 1, Decimal::ZERO)];
        assert_eq!(compute_total(&items), Some(Decimal::ZERO));
    }

    #[test]
    fn overflowing_amounts_have_no_total() {
        let huge = item("Turbine", 4_000_000_000, dec!(100000000000000000000));
        assert_eq!(huge.line_total(), None);
        assert_eq!(compute_total(&[huge]), None);

        // each line fits, the sum does not
        let big = item("Hangar", 1, Decimal::MAX);
        assert_eq!(compute_total(&[big.clone(), big]), None);
    }

    #[test]
    fn money_has_symbol_and_two_decimals() {
        assert_eq!(format_money(dec!(130)), "R$ 130.00");
        assert_eq!(format_money(dec!(1234567.5)), "R$ 1234567.50");
        assert_eq!(format_money(dec!(0.005)), "R$ 0.01");
    }

    #[test]
    fn kind_controls_title_only() {
        assert_eq!(DocumentKind::Estimate.title(), "ORÇAMENTO");
        assert_eq!(DocumentKind::Receipt.title(), "RECIBO DE PAGAMENTO");
        assert_eq!(DocumentKind::Estimate.toggled(), DocumentKind::Receipt);
        assert_eq!(DocumentKind::default(), DocumentKind::Estimate);
    }

    #[test]
    fn quote_serializes_with_stored_field_names() {
        let quote = Quote {
            client_name: "Maria".into(),
            client_phone: "(11) 91234-5678".into(),
            items: vec![item("Cable repair", 2, dec!(50))],
            notes: String::new(),
            total: dec!(100),
            company: CompanyProfile {
                name: "EkipHelp".into(),
                phone: "(11) 3333-4444".into(),
                address: "Rua A, 1".into(),
                tax_id: "00.000.000/0001-00".into(),
            },
            issued_at: Local.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap(),
            document_kind: DocumentKind::Receipt,
        };

        let value = serde_json::to_value(&quote).unwrap();
        assert_eq!(value["clientName"], "Maria");
        assert_eq!(value["clientPhone"], "(11) 91234-5678");
        assert_eq!(value["items"][0]["price"], 50.0);
        assert_eq!(value["companyData"]["cnpj"], "00.000.000/0001-00");
        assert_eq!(value["documentType"], "recibo");
        assert!(value["date"].is_string());
    }
}
