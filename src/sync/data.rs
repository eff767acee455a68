use std::io::Write;

use anyhow::Result;
use tracing::debug;

use crate::config::TableFilter;
use crate::db::Database;

/// Compares `CHECKSUM TABLE` results for the source tables selected by
/// `tables_compare_data` and returns the ones that differ.
pub fn check_data_diff(
    source: &dyn Database,
    dest: &dyn Database,
    filter: &TableFilter,
    out: &mut dyn Write,
) -> Result<Vec<String>> {
    if filter.tables_compare_data.is_empty() {
        writeln!(out, "# Tables to CompareData is empty")?;
        return Ok(Vec::new());
    }

    let dest_tables = dest.list_tables()?;
    let mut diff_tables = Vec::new();
    for table in source.list_tables()? {
        if !filter.compares_data(&table) {
            continue;
        }
        if !dest_tables.contains(&table) {
            debug!(table, "missing on dest");
            diff_tables.push(table);
            continue;
        }
        let source_sum = source.checksum_table(&table)?;
        let dest_sum = dest.checksum_table(&table)?;
        debug!(table, ?source_sum, ?dest_sum, "checksum");
        if source_sum != dest_sum {
            diff_tables.push(table);
        }
    }

    if diff_tables.is_empty() {
        writeln!(out, "# no data of tables in difference")?;
    } else {
        writeln!(out, "# data diff tables: {}", diff_tables.join(", "))?;
    }
    Ok(diff_tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::fake::FakeDb;

    const DEF: &str = "CREATE TABLE `x` (\n  `id` int\n)";

    fn filter(patterns: &[&str]) -> TableFilter {
        TableFilter {
            tables_compare_data: patterns.iter().map(|p| p.to_string()).collect(),
            ..TableFilter::default()
        }
    }

    fn printed(out: Vec<u8>) -> String {
        String::from_utf8(out).expect("utf8")
    }

    #[test]
    fn empty_list_short_circuits() {
        let db = FakeDb::new("shop");
        let mut out: Vec<u8> = Vec::new();
        let diff = check_data_diff(&db, &db, &filter(&[]), &mut out).expect("check");
        assert!(diff.is_empty());
        assert_eq!(printed(out), "# Tables to CompareData is empty\n");
    }

    #[test]
    fn reports_missing_and_mismatched_tables() {
        let mut source = FakeDb::new("shop")
            .table("product_a", DEF)
            .table("product_b", DEF)
            .table("product_c", DEF)
            .table("users", DEF);
        source.checksums.insert("product_a".into(), Some(10));
        source.checksums.insert("product_b".into(), Some(20));
        source.checksums.insert("users".into(), Some(1));
        let mut dest = FakeDb::new("shop")
            .table("product_a", DEF)
            .table("product_b", DEF)
            .table("users", DEF);
        dest.checksums.insert("product_a".into(), Some(10));
        dest.checksums.insert("product_b".into(), Some(21));
        dest.checksums.insert("users".into(), Some(2));

        let mut out: Vec<u8> = Vec::new();
        let diff = check_data_diff(&source, &dest, &filter(&["product_*"]), &mut out)
            .expect("check");
        assert_eq!(diff, vec!["product_b", "product_c"]);
        assert_eq!(printed(out), "# data diff tables: product_b, product_c\n");
    }

    #[test]
    fn matching_checksums_report_no_difference() {
        let mut source = FakeDb::new("shop").table("t", DEF);
        source.checksums.insert("t".into(), Some(5));
        let mut dest = FakeDb::new("shop").table("t", DEF);
        dest.checksums.insert("t".into(), Some(5));

        let mut out: Vec<u8> = Vec::new();
        let diff = check_data_diff(&source, &dest, &filter(&["*"]), &mut out).expect("check");
        assert!(diff.is_empty());
        assert_eq!(printed(out), "# no data of tables in difference\n");
    }
}
