use anyhow::Context;
use serde::Serialize;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> anyhow::Result<()> {
    let mut wtr =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Markdown table of the first `max_rows` rows.
pub fn render_table<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(slice).with(Style::markdown()).to_string()
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}\n", render_table(rows, max_rows));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RankingRow;

    fn rows() -> Vec<RankingRow> {
        vec![
            RankingRow {
                rank: 1,
                municipality: "Alpha".into(),
                metric: "composite".into(),
                value: "55.00".into(),
            },
            RankingRow {
                rank: 2,
                municipality: "Beta".into(),
                metric: "composite".into(),
                value: "12.50".into(),
            },
        ]
    }

    #[test]
    fn table_is_truncated() {
        let s = render_table(&rows(), 1);
        assert!(s.contains("Alpha"));
        assert!(!s.contains("Beta"));
        assert!(s.contains("Rank"));
    }

    #[test]
    fn empty_table() {
        let empty: Vec<RankingRow> = Vec::new();
        assert_eq!(render_table(&empty, 5), "(no rows)");
    }

    #[test]
    fn csv_and_json_round_out_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("ranking.csv");
        write_csv(&csv_path, &rows()).unwrap();
        let text = std::fs::read_to_string(&csv_path).unwrap();
        assert!(text.starts_with("Rank,Municipality,Metric,Value"));
        assert_eq!(text.lines().count(), 3);

        let json_path = dir.path().join("ranking.json");
        write_json(&json_path, &rows()).unwrap();
        let v: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(v[1]["Municipality"], "Beta");
    }
}
