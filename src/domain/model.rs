use crate::utils::error::{Result, StockSyncError};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;

/// A single spreadsheet cell as handed over by the loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

static EMPTY_CELL: CellValue = CellValue::Empty;

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            CellValue::Number(_) => false,
        }
    }

    /// String form of the cell. Whole numbers print without a fraction.
    pub fn to_text(&self) -> Cow<'_, str> {
        match self {
            CellValue::Empty => Cow::Borrowed(""),
            CellValue::Text(s) => Cow::Borrowed(s.as_str()),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    Cow::Owned(format!("{}", *n as i64))
                } else {
                    Cow::Owned(n.to_string())
                }
            }
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value.to_string())
        }
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value)
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

/// One data row keyed by header.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    pub cells: HashMap<String, CellValue>,
}

impl RawRow {
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<CellValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            cells: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Value under `header`, or an empty cell when the column is absent.
    pub fn value(&self, header: &str) -> &CellValue {
        self.cells.get(header).unwrap_or(&EMPTY_CELL)
    }
}

/// First sheet of a workbook: header row plus data rows in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl Sheet {
    /// Headers labelled with their column letter, e.g. `Col E: Artículo`.
    pub fn column_labels(&self) -> Vec<String> {
        self.headers
            .iter()
            .enumerate()
            .map(|(idx, header)| format!("Col {}: {}", column_letter(idx), header))
            .collect()
    }
}

/// 0 = A, 25 = Z, 26 = AA.
pub fn column_letter(col: usize) -> String {
    let mut letters = Vec::new();
    let mut n = col + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Column selection as supplied by the user. Any field may still be unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingSelection {
    pub identifier: Option<String>,
    pub display_name: Option<String>,
    pub cd_stock: Option<String>,
    pub web_stock: Option<String>,
    pub sales_amount: Option<String>,
}

/// Header that feeds each semantic field. Fixed for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub identifier: String,
    pub display_name: String,
    pub cd_stock: String,
    pub web_stock: String,
    pub sales_amount: String,
}

impl ColumnMapping {
    pub fn names_share_identifier(&self) -> bool {
        self.identifier == self.display_name
    }
}

/// Identifier column used when none is selected: the fifth column (E).
const DEFAULT_IDENTIFIER_INDEX: usize = 4;

fn selected(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
}

impl MappingSelection {
    /// Fills defaults from the sheet headers and enforces the required fields.
    pub fn resolve(&self, headers: &[String]) -> Result<ColumnMapping> {
        let mut missing = Vec::new();

        let identifier = selected(&self.identifier).or_else(|| {
            headers
                .get(DEFAULT_IDENTIFIER_INDEX)
                .or_else(|| headers.first())
                .cloned()
        });
        if identifier.is_none() {
            missing.push("identifier".to_string());
        }

        let cd_stock = selected(&self.cd_stock);
        let web_stock = selected(&self.web_stock);
        let sales_amount = selected(&self.sales_amount);
        for (field, value) in [
            ("cd_stock", &cd_stock),
            ("web_stock", &web_stock),
            ("sales_amount", &sales_amount),
        ] {
            if value.is_none() {
                missing.push(field.to_string());
            }
        }

        match (identifier, cd_stock, web_stock, sales_amount) {
            (Some(identifier), Some(cd_stock), Some(web_stock), Some(sales_amount))
                if missing.is_empty() =>
            {
                let display_name =
                    selected(&self.display_name).unwrap_or_else(|| identifier.clone());
                Ok(ColumnMapping {
                    identifier,
                    display_name,
                    cd_stock,
                    web_stock,
                    sales_amount,
                })
            }
            _ => Err(StockSyncError::MissingColumnMapping { fields: missing }),
        }
    }
}

/// Stock aggregated over every row sharing one SKU token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockItem {
    pub id: String,
    pub name: String,
    pub cd_stock: f64,
    pub web_stock: f64,
    pub sales_amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportTotals {
    pub item_count: usize,
    pub total_sales_amount: f64,
    pub total_cd_stock: f64,
}

impl ReportTotals {
    pub fn from_items(items: &[StockItem]) -> Self {
        Self {
            item_count: items.len(),
            total_sales_amount: items.iter().map(|item| item.sales_amount).sum(),
            total_cd_stock: items.iter().map(|item| item.cd_stock).sum(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub items: Vec<StockItem>,
    pub totals: ReportTotals,
    pub rows_read: usize,
    pub summary: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|h| h.to_string()).collect()
    }

    #[test]
    fn test_cell_text_form() {
        assert_eq!(CellValue::Number(123.0).to_text(), "123");
        assert_eq!(CellValue::Number(1.5).to_text(), "1.5");
        assert_eq!(CellValue::Empty.to_text(), "");
        assert_eq!(CellValue::from("abc").to_text(), "abc");
        assert_eq!(CellValue::from(""), CellValue::Empty);
    }

    #[test]
    fn test_missing_column_reads_as_empty() {
        let row = RawRow::from_pairs([("Code", "1")]);
        assert_eq!(row.value("Nope"), &CellValue::Empty);
    }

    #[test]
    fn test_column_letters() {
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(4), "E");
        assert_eq!(column_letter(25), "Z");
        assert_eq!(column_letter(26), "AA");
        assert_eq!(column_letter(27), "AB");
    }

    #[test]
    fn test_column_labels() {
        let sheet = Sheet {
            headers: headers(&["Art", "Stock"]),
            rows: vec![],
        };
        assert_eq!(sheet.column_labels(), vec!["Col A: Art", "Col B: Stock"]);
    }

    #[test]
    fn test_resolve_defaults_identifier_to_column_e() {
        let selection = MappingSelection {
            cd_stock: Some("CD".to_string()),
            web_stock: Some("Web".to_string()),
            sales_amount: Some("Sales".to_string()),
            ..Default::default()
        };
        let mapping = selection
            .resolve(&headers(&["A", "B", "C", "D", "Article", "CD", "Web", "Sales"]))
            .unwrap();
        assert_eq!(mapping.identifier, "Article");
        assert_eq!(mapping.display_name, "Article");
        assert!(mapping.names_share_identifier());
    }

    #[test]
    fn test_resolve_falls_back_to_first_header() {
        let selection = MappingSelection {
            cd_stock: Some("CD".to_string()),
            web_stock: Some("Web".to_string()),
            sales_amount: Some("Sales".to_string()),
            ..Default::default()
        };
        let mapping = selection.resolve(&headers(&["Code", "CD", "Web"])).unwrap();
        assert_eq!(mapping.identifier, "Code");
    }

    #[test]
    fn test_resolve_reports_every_missing_field() {
        let selection = MappingSelection {
            web_stock: Some("Web".to_string()),
            sales_amount: Some("  ".to_string()),
            ..Default::default()
        };
        let err = selection.resolve(&headers(&["Code"])).unwrap_err();
        match err {
            StockSyncError::MissingColumnMapping { fields } => {
                assert_eq!(fields, vec!["cd_stock", "sales_amount"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_totals() {
        let items = vec![
            StockItem {
                id: "1".to_string(),
                name: "A".to_string(),
                cd_stock: 5.0,
                web_stock: 0.0,
                sales_amount: 100.0,
            },
            StockItem {
                id: "2".to_string(),
                name: "B".to_string(),
                cd_stock: 7.0,
                web_stock: 0.0,
                sales_amount: 50.5,
            },
        ];
        let totals = ReportTotals::from_items(&items);
        assert_eq!(totals.item_count, 2);
        assert_eq!(totals.total_cd_stock, 12.0);
        assert_eq!(totals.total_sales_amount, 150.5);
    }
}
