use crate::domain::model::{ReportTotals, StockItem};
use crate::utils::error::{Result, StockSyncError};
use rust_xlsxwriter::{Format, Workbook};
use serde::Serialize;

pub const REPORT_HEADERS: [&str; 5] = ["Code", "Product", "Sales (30 days)", "CD Stock", "Web Stock"];
pub const REPORT_SHEET_NAME: &str = "Replenishment";
const REPORT_STEM: &str = "missing_web_stock_with_sales";

/// Fixed report file name for a format extension (`xlsx`, `csv`, `json`).
pub fn report_file_name(format: &str) -> String {
    format!("{}.{}", REPORT_STEM, format)
}

pub fn write_xlsx_report(items: &[StockItem]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(REPORT_SHEET_NAME)?;

    for (col, header) in REPORT_HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }

    for (idx, item) in items.iter().enumerate() {
        let row = idx as u32 + 1;
        worksheet.write_string(row, 0, &item.id)?;
        worksheet.write_string(row, 1, &item.name)?;
        worksheet.write_number(row, 2, item.sales_amount)?;
        worksheet.write_number(row, 3, item.cd_stock)?;
        worksheet.write_number(row, 4, item.web_stock)?;
    }
    worksheet.set_column_width(1, 40)?;

    Ok(workbook.save_to_buffer()?)
}

pub fn write_csv_report(items: &[StockItem]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(REPORT_HEADERS)?;

    for item in items {
        writer.write_record([
            item.id.clone(),
            item.name.clone(),
            item.sales_amount.to_string(),
            item.cd_stock.to_string(),
            item.web_stock.to_string(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| StockSyncError::IoError(e.into_error()))
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: String,
    totals: &'a ReportTotals,
    items: &'a [StockItem],
}

pub fn write_json_report(items: &[StockItem], totals: &ReportTotals) -> Result<Vec<u8>> {
    let report = JsonReport {
        generated_at: chrono::Utc::now().to_rfc3339(),
        totals,
        items,
    };
    Ok(serde_json::to_vec_pretty(&report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{Data, Reader, Xlsx};
    use std::io::Cursor;

    fn items() -> Vec<StockItem> {
        vec![
            StockItem {
                id: "00123".to_string(),
                name: "Widget".to_string(),
                cd_stock: 50.0,
                web_stock: 0.0,
                sales_amount: 1234.5,
            },
            StockItem {
                id: "77".to_string(),
                name: "Lamp".to_string(),
                cd_stock: 3.0,
                web_stock: -1.0,
                sales_amount: 0.0,
            },
        ]
    }

    #[test]
    fn test_xlsx_report_layout() {
        let bytes = write_xlsx_report(&items()).unwrap();

        let mut workbook: Xlsx<_> = calamine::open_workbook_from_rs(Cursor::new(bytes)).unwrap();
        assert_eq!(workbook.sheet_names(), vec![REPORT_SHEET_NAME.to_string()]);

        let range = workbook.worksheet_range(REPORT_SHEET_NAME).unwrap();
        let rows: Vec<&[Data]> = range.rows().collect();
        assert_eq!(rows.len(), 3);

        let headers: Vec<String> = rows[0].iter().map(|c| c.to_string()).collect();
        assert_eq!(headers, REPORT_HEADERS);

        assert_eq!(rows[1][0], Data::String("00123".to_string()));
        assert_eq!(rows[1][1], Data::String("Widget".to_string()));
        assert_eq!(rows[1][2], Data::Float(1234.5));
        assert_eq!(rows[1][3], Data::Float(50.0));
        assert_eq!(rows[2][4], Data::Float(-1.0));
    }

    #[test]
    fn test_csv_report() {
        let bytes = write_csv_report(&items()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Code,Product,Sales (30 days),CD Stock,Web Stock");
        assert_eq!(lines[1], "00123,Widget,1234.5,50,0");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_json_report_contains_totals() {
        let items = items();
        let totals = ReportTotals::from_items(&items);
        let bytes = write_json_report(&items, &totals).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(value["totals"]["item_count"], 2);
        assert_eq!(value["items"][0]["id"], "00123");
        assert!(value["generated_at"].is_string());
    }

    #[test]
    fn test_report_file_name() {
        assert_eq!(report_file_name("xlsx"), "missing_web_stock_with_sales.xlsx");
    }
}
