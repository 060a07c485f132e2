use std::io::Write;

use crate::error::ReconError;
use crate::model::LookupReport;

/// Write the comparison as CSV: `Field Name`, one column per provider, then
/// the discrepancy status (empty when the providers agree).
pub fn write_comparison_csv<W: Write>(report: &LookupReport, writer: W) -> Result<(), ReconError> {
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);
    let io = |e: csv::Error| ReconError::Io(format!("CSV write error: {e}"));

    let labels: Vec<&str> = report.meta.providers.iter().map(String::as_str).collect();

    let mut header = vec!["Field Name"];
    header.extend(labels.iter().copied());
    header.push("Status");
    wtr.write_record(&header).map_err(io)?;

    for row in &report.comparison {
        let status = report
            .discrepancies
            .iter()
            .find(|d| d.field_name == row.field_name)
            .map(|d| d.status.label(&labels))
            .unwrap_or_default();

        let mut record = vec![row.field_name.as_str()];
        record.extend((0..labels.len()).map(|slot| row.value(slot)));
        record.push(status.as_str());
        wtr.write_record(&record).map_err(io)?;
    }

    wtr.flush()
        .map_err(|e| ReconError::Io(format!("CSV flush error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::reconcile;
    use crate::flatten::{flatten_payload, DEFAULT_SEPARATOR};
    use crate::schema::FieldRegistry;
    use serde_json::json;

    const REG: &str = r#"
name = "t"
[[providers]]
id = "a"
display_name = "Alpha"
markers = ["yearbuilt"]
[[providers]]
id = "b"
display_name = "Beta"

[[fields]]
name = "year_built"
sources = { a = "yearbuilt", b = "year_built" }

[[fields]]
name = "owner_name"
sources = { a = "owner", b = "owner" }
"#;

    #[test]
    fn one_line_per_field_with_status() {
        let reg = FieldRegistry::from_toml(REG).unwrap();
        let records = [
            flatten_payload("a", &json!({ "yearbuilt": 1998, "owner": "Smith, John" }), DEFAULT_SEPARATOR).unwrap(),
            flatten_payload("b", &json!({ "year_built": "1999" }), DEFAULT_SEPARATOR).unwrap(),
        ];
        let report = reconcile(&reg, "x", &records).unwrap();

        let mut buf = Vec::new();
        write_comparison_csv(&report, &mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "Field Name,Alpha,Beta,Status\n\
             year_built,1998,1999,Values Differ\n\
             owner_name,\"Smith, John\",,\n"
        );
    }
}
