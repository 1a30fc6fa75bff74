//! File writing utilities for aggregate export.
//!
//! Tables are written as aligned text, CSV with a header row, or a JSON array
//! of row objects.

use crate::error::Result;
use crate::models::OutputFormat;
use crate::table::Table;
use csv::Writer;
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Write `table` into `output_dir` as `<name>.<ext>`.
///
/// The directory is created when missing. Returns the written path.
pub fn write_table_to_dir(table: &Table, name: &str, format: OutputFormat, output_dir: &Path) -> Result<PathBuf> {
    create_dir_all(output_dir)?;
    let file_path = output_dir.join(format!("{name}.{}", format.extension()));
    write_table_to_file(table, format, &file_path)?;
    Ok(file_path)
}

/// Write `table` to a file in the specified format.
///
/// # Errors
///
/// Returns an error if file creation or writing fails.
pub fn write_table_to_file(table: &Table, format: OutputFormat, file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent)?;
    }
    let file = File::create(file_path)?;
    write_table(table, format, BufWriter::new(file))
}

/// Write `table` to any writer in the specified format
pub fn write_table<W: Write>(table: &Table, format: OutputFormat, writer: W) -> Result<()> {
    match format {
        OutputFormat::Txt => write_txt(table, writer),
        OutputFormat::Csv => write_csv(table, writer),
        OutputFormat::Json => write_json(table, writer),
    }
}

/// Aligned columns with a header and a dashed rule
fn write_txt<W: Write>(table: &Table, mut writer: W) -> Result<()> {
    let header: Vec<String> = table.column_names().iter().map(ToString::to_string).collect();
    let body: Vec<Vec<String>> = table
        .rows()
        .map(|row| row.iter().map(ToString::to_string).collect())
        .collect();

    let widths: Vec<usize> = header
        .iter()
        .enumerate()
        .map(|(i, name)| {
            body.iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or_default()
        })
        .collect();

    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    writeln!(writer, "{}", line(&header))?;
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    writeln!(writer, "{}", line(&rule))?;
    for row in &body {
        writeln!(writer, "{}", line(row))?;
    }

    writer.flush()?;
    Ok(())
}

/// Header row followed by one record per table row; nulls are empty fields
fn write_csv<W: Write>(table: &Table, writer: W) -> Result<()> {
    let mut writer = Writer::from_writer(writer);
    writer.write_record(table.column_names())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(ToString::to_string))?;
    }
    writer.flush()?;
    Ok(())
}

fn write_json<W: Write>(table: &Table, mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, table)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;

    fn sample() -> Table {
        Table::from_rows(
            &["Year", "Proportion"],
            vec![
                vec![Value::from(2005_i64), Value::from(50.0)],
                vec![Value::from(2006_i64), Value::Null],
            ],
        )
        .expect("valid table")
    }

    fn render(format: OutputFormat) -> String {
        let mut buffer = Vec::new();
        write_table(&sample(), format, &mut buffer).expect("write");
        String::from_utf8(buffer).expect("utf8")
    }

    #[test]
    fn test_txt_is_aligned() {
        let text = render(OutputFormat::Txt);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Year  Proportion");
        assert_eq!(lines[1], "----  ----------");
        assert_eq!(lines[2], "2005  50");
        assert_eq!(lines[3], "2006");
    }

    #[test]
    fn test_csv_has_header_and_empty_nulls() {
        assert_eq!(render(OutputFormat::Csv), "Year,Proportion\n2005,50\n2006,\n");
    }

    #[test]
    fn test_json_rows_are_objects() {
        let parsed: serde_json::Value = serde_json::from_str(&render(OutputFormat::Json)).expect("json");
        assert_eq!(parsed[0]["Year"], 2005);
        assert_eq!(parsed[0]["Proportion"], 50.0);
        assert!(parsed[1]["Proportion"].is_null());
    }

    #[test]
    fn test_write_to_dir_uses_extension() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_table_to_dir(&sample(), "oils", OutputFormat::Csv, dir.path()).expect("write");
        assert_eq!(path, dir.path().join("oils.csv"));
        assert!(path.exists());
    }
}
