use chrono::NaiveDate;
use proptest::prelude::*;

use okr_period_report::fields::{csv_row, escape, TimesheetField};
use okr_period_report::model::{ActionItem, Dataset, Goal};
use okr_period_report::period::Granularity;
use okr_period_report::render::{compile, CompileRequest, ExportMode};

fn read_single_record(line: &str) -> Vec<String> {
  let mut rdr = csv::ReaderBuilder::new().has_headers(false).from_reader(line.as_bytes());
  let rec = rdr.records().next().expect("one record").expect("parsable");
  rec.iter().map(str::to_string).collect()
}

proptest! {
  #[test]
  fn escaped_cells_read_back_verbatim(cells in prop::collection::vec("[^\r]{0,24}", 1..6)) {
    let line = csv_row(cells.as_slice()).unwrap();
    prop_assert_eq!(read_single_record(&line), cells);
  }

  #[test]
  fn escape_is_always_quoted(v in ".{0,32}") {
    let e = escape(&v).unwrap();
    prop_assert!(e.starts_with('"') && e.ends_with('"'));
    prop_assert_eq!(e.matches('"').count(), v.matches('"').count() * 2 + 2);
  }

  #[test]
  fn timesheet_action_text_survives_export(text in "[^\r\n]{0,40}") {
    let mut goal: Goal = serde_json::from_value(serde_json::json!({
      "id": "g", "name": "目标, \"引号\"", "status": "deviated"
    })).unwrap();
    goal.action_items = vec![ActionItem { text: text.clone(), hours: Some(1.5), ..ActionItem::default() }];
    let data = Dataset { goals: vec![goal], ..Dataset::default() };

    let mut req = CompileRequest::new(
      ExportMode::Timesheet,
      Granularity::Week,
      NaiveDate::from_ymd_opt(2026, 2, 26).unwrap(),
    );
    req.timesheet_fields = vec![TimesheetField::Name, TimesheetField::Action, TimesheetField::Hours];
    let body = compile(&req, &data).unwrap().to_csv_body().unwrap();

    let mut rdr = csv::ReaderBuilder::new().from_reader(body.as_bytes());
    let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
    prop_assert_eq!(rows.len(), 1);
    prop_assert_eq!(&rows[0][0], "目标, \"引号\"");
    prop_assert_eq!(&rows[0][1], text.as_str());
    prop_assert_eq!(&rows[0][2], "1.5");
  }
}
