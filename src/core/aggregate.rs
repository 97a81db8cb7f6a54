use crate::core::normalize::{
    clean_display_name, extract_identifier_token, parse_locale_number, NO_NAME,
};
use crate::domain::model::{ColumnMapping, RawRow, StockItem};
use crate::utils::error::{Result, StockSyncError};
use regex::{Regex, RegexBuilder};
use std::collections::HashMap;

pub const DEFAULT_TOTALS_MARKER: &str = "totales";
pub const DEFAULT_ALLOW_PATTERNS: &[&str] = &["pardo"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    EmptyIdentifier,
    TotalsRow,
    NotAProductRow,
    NoSkuToken,
}

/// Decides which rows of an export describe products.
#[derive(Debug, Clone)]
pub struct RowRules {
    totals_marker: String,
    allow_patterns: Vec<Regex>,
}

impl RowRules {
    /// `allow_patterns` are case-insensitive regexes that admit rows whose
    /// identifier does not start with a digit.
    pub fn new(totals_marker: &str, allow_patterns: &[String]) -> Result<Self> {
        let allow_patterns = allow_patterns
            .iter()
            .map(|pattern| {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| StockSyncError::InvalidConfigValueError {
                        field: "allow_patterns".to_string(),
                        value: pattern.clone(),
                        reason: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            totals_marker: totals_marker.trim().to_lowercase(),
            allow_patterns,
        })
    }

    /// Checks a trimmed identifier. `None` means the row is a product row.
    pub fn skip_reason(&self, identifier: &str) -> Option<SkipReason> {
        let lower = identifier.to_lowercase();
        if lower.is_empty() {
            return Some(SkipReason::EmptyIdentifier);
        }
        if !self.totals_marker.is_empty() && lower.contains(&self.totals_marker) {
            return Some(SkipReason::TotalsRow);
        }

        let starts_with_digit = identifier.starts_with(|c: char| c.is_ascii_digit());
        if !starts_with_digit && !self.allow_patterns.iter().any(|re| re.is_match(identifier)) {
            return Some(SkipReason::NotAProductRow);
        }
        None
    }
}

impl Default for RowRules {
    fn default() -> Self {
        let patterns: Vec<String> = DEFAULT_ALLOW_PATTERNS.iter().map(|p| p.to_string()).collect();
        Self::new(DEFAULT_TOTALS_MARKER, &patterns).unwrap()
    }
}

/// Sums stock and sales per SKU token, in order of first appearance.
pub fn aggregate_stock(rows: &[RawRow], mapping: &ColumnMapping, rules: &RowRules) -> Vec<StockItem> {
    let mut items: Vec<StockItem> = Vec::new();
    let mut index_by_sku: HashMap<String, usize> = HashMap::new();

    for (row_idx, row) in rows.iter().enumerate() {
        let raw_id = row.value(&mapping.identifier).to_text();
        let raw_id = raw_id.trim();

        if let Some(reason) = rules.skip_reason(raw_id) {
            tracing::debug!("Skipping row {} ({:?}): {:?}", row_idx + 1, raw_id, reason);
            continue;
        }

        let sku = extract_identifier_token(row.value(&mapping.identifier));
        if sku.is_empty() {
            tracing::debug!(
                "Skipping row {} ({:?}): {:?}",
                row_idx + 1,
                raw_id,
                SkipReason::NoSkuToken
            );
            continue;
        }

        let cd_stock = parse_locale_number(row.value(&mapping.cd_stock));
        let web_stock = parse_locale_number(row.value(&mapping.web_stock));
        let sales_amount = parse_locale_number(row.value(&mapping.sales_amount));

        if let Some(&idx) = index_by_sku.get(&sku) {
            let existing = &mut items[idx];
            existing.cd_stock += cd_stock;
            existing.web_stock += web_stock;
            existing.sales_amount += sales_amount;
            continue;
        }

        let name = if mapping.names_share_identifier() {
            clean_display_name(&raw_id.into())
        } else {
            row.value(&mapping.display_name).to_text().into_owned()
        };

        index_by_sku.insert(sku.clone(), items.len());
        items.push(StockItem {
            id: sku,
            name: if name.is_empty() { NO_NAME.to_string() } else { name },
            cd_stock,
            web_stock,
            sales_amount,
        });
    }

    items
}

/// Items with CD stock and nothing on the web, largest CD stock first.
///
/// Ties keep their aggregation order.
pub fn select_replenishment_candidates(mut items: Vec<StockItem>) -> Vec<StockItem> {
    items.retain(|item| item.cd_stock > 0.0 && item.web_stock <= 0.0);
    items.sort_by(|a, b| b.cd_stock.total_cmp(&a.cd_stock));
    items
}

pub fn filter_and_sort_stock(
    rows: &[RawRow],
    mapping: &ColumnMapping,
    rules: &RowRules,
) -> Vec<StockItem> {
    let aggregated = aggregate_stock(rows, mapping, rules);
    let aggregated_count = aggregated.len();
    let candidates = select_replenishment_candidates(aggregated);

    tracing::info!(
        "Aggregated {} rows into {} SKUs, {} replenishment candidates",
        rows.len(),
        aggregated_count,
        candidates.len()
    );
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::CellValue;

    fn mapping() -> ColumnMapping {
        ColumnMapping {
            identifier: "Art".to_string(),
            display_name: "Art".to_string(),
            cd_stock: "CD".to_string(),
            web_stock: "Web".to_string(),
            sales_amount: "Sales".to_string(),
        }
    }

    fn row(id: &str, cd: &str, web: &str, sales: &str) -> RawRow {
        RawRow::from_pairs([("Art", id), ("CD", cd), ("Web", web), ("Sales", sales)])
    }

    #[test]
    fn test_rows_with_same_sku_are_summed() {
        let rows = vec![
            row("00123 - Widget", "1.000", "0", "10,5"),
            row("00123 - Widget (outlet)", "250", "", "4,5"),
            row("77 - Lamp", "3", "2", "1"),
        ];

        let items = aggregate_stock(&rows, &mapping(), &RowRules::default());

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "00123");
        assert_eq!(items[0].name, "Widget");
        assert_eq!(items[0].cd_stock, 1250.0);
        assert_eq!(items[0].web_stock, 0.0);
        assert_eq!(items[0].sales_amount, 15.0);
    }

    #[test]
    fn test_totals_rows_are_excluded() {
        let rows = vec![
            row("10 - Cup", "5", "0", "1"),
            row("Totales", "9999", "0", "9999"),
            row("10 subTOTALES", "9999", "0", "9999"),
        ];

        let items = aggregate_stock(&rows, &mapping(), &RowRules::default());

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].cd_stock, 5.0);
    }

    #[test]
    fn test_rows_must_start_with_digit_or_match_allow_pattern() {
        let rows = vec![
            row("Category: kitchen", "5", "0", "1"),
            row("PARDO 889 Kettle", "4", "0", "2"),
            row("", "4", "0", "2"),
            row("Pardo only", "4", "0", "2"),
        ];

        let items = aggregate_stock(&rows, &mapping(), &RowRules::default());

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "889");
        assert_eq!(items[0].name, "PARDO 889 Kettle");
    }

    #[test]
    fn test_custom_allow_pattern() {
        let rules = RowRules::new("total", &["^acme".to_string()]).unwrap();
        let rows = vec![
            row("ACME 12 Hammer", "4", "0", "2"),
            row("Pardo 13 Kettle", "4", "0", "2"),
            row("14 Total", "4", "0", "2"),
        ];

        let items = aggregate_stock(&rows, &mapping(), &rules);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "12");
    }

    #[test]
    fn test_invalid_allow_pattern_is_rejected() {
        assert!(RowRules::new("totales", &["[".to_string()]).is_err());
    }

    #[test]
    fn test_separate_name_column() {
        let mut mapping = mapping();
        mapping.display_name = "Description".to_string();
        let rows = vec![
            RawRow::from_pairs([
                ("Art", CellValue::from("00123")),
                ("Description", CellValue::from("Blue Widget")),
                ("CD", CellValue::Number(3.0)),
            ]),
            RawRow::from_pairs([("Art", "456"), ("CD", "1")]),
            RawRow::from_pairs([("Art", "00123"), ("Description", "Renamed"), ("CD", "1")]),
        ];

        let items = aggregate_stock(&rows, &mapping, &RowRules::default());

        assert_eq!(items[0].name, "Blue Widget");
        assert_eq!(items[0].cd_stock, 4.0);
        assert_eq!(items[1].name, NO_NAME);
    }

    #[test]
    fn test_output_sorted_by_cd_stock_descending() {
        let rows = vec![
            row("1 - A", "5", "0", "0"),
            row("2 - B", "50", "0", "0"),
            row("3 - C", "20", "0", "0"),
        ];

        let items = filter_and_sort_stock(&rows, &mapping(), &RowRules::default());

        let cd: Vec<f64> = items.iter().map(|i| i.cd_stock).collect();
        assert_eq!(cd, vec![50.0, 20.0, 5.0]);
    }

    #[test]
    fn test_filter_keeps_only_cd_stock_without_web_stock() {
        let rows = vec![
            row("1 - Listed", "10", "1", "0"),
            row("2 - Missing", "10", "0", "0"),
            row("3 - Negative web", "10", "-2", "0"),
            row("4 - Empty CD", "0", "0", "0"),
            row("5 - Oversold", "-1", "0", "0"),
        ];

        let items = filter_and_sort_stock(&rows, &mapping(), &RowRules::default());

        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3"]);
    }

    #[test]
    fn test_web_stock_is_judged_after_aggregation() {
        let rows = vec![row("9 - Split", "4", "0", "0"), row("9 - Split", "4", "3", "0")];

        let items = filter_and_sort_stock(&rows, &mapping(), &RowRules::default());

        assert!(items.is_empty());
    }

    #[test]
    fn test_ties_keep_first_appearance_order() {
        let rows = vec![
            row("7 - First", "5", "0", "0"),
            row("8 - Second", "5", "0", "0"),
            row("9 - Third", "9", "0", "0"),
        ];

        let items = filter_and_sort_stock(&rows, &mapping(), &RowRules::default());

        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["9", "7", "8"]);
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let rows = vec![
            row("1 - A", "5", "0", "1"),
            row("2 - B", "5", "0", "2"),
            row("1 - A", "1", "0", "1"),
        ];

        let first = filter_and_sort_stock(&rows, &mapping(), &RowRules::default());
        let second = filter_and_sort_stock(&rows, &mapping(), &RowRules::default());

        assert_eq!(first, second);
    }
}
