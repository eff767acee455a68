use std::io::Write;

use anyhow::Result;
use tracing::{debug, error, info};

use super::stats::RunStats;
use crate::db::Database;
use crate::schema::quote_ident;

/// Prints a replace script for every source procedure whose definition
/// differs on the destination, and applies it when `sync` is set.
pub fn check_procedures(
    source: &dyn Database,
    dest: &dyn Database,
    sync: bool,
    out: &mut dyn Write,
    stats: &mut RunStats,
) -> Result<()> {
    for name in source.list_procedures()? {
        let source_def = read_definition(source, &name);
        if source_def.trim().is_empty() {
            debug!(procedure = %name, "source definition unreadable; skipping");
            continue;
        }
        let dest_def = read_definition(dest, &name);
        if source_def == dest_def {
            continue;
        }

        let drop_sql = format!("DROP PROCEDURE IF EXISTS {}", quote_ident(&name));
        writeln!(
            out,
            "DELIMITER $$\n{}$$\n{}$$\nDELIMITER ;\n",
            drop_sql, source_def
        )?;

        if sync {
            let result = dest
                .execute(&drop_sql)
                .and_then(|_| dest.execute(&source_def))
                .map_err(|err| format!("{:#}", err));
            match &result {
                Ok(()) => info!(procedure = %name, "procedure replaced"),
                Err(err) => error!(procedure = %name, error = %err, "exec procedure failed"),
            }
            stats.record(&result);
        }
    }
    Ok(())
}

fn read_definition(db: &dyn Database, name: &str) -> String {
    match db.procedure_definition(name) {
        Ok(definition) => definition,
        Err(err) => {
            debug!(db = db.name(), procedure = %name, error = %err, "procedure definition unavailable");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::fake::FakeDb;

    const P1: &str = "CREATE DEFINER=`root`@`%` PROCEDURE `p1`()\nBEGIN\n  SELECT 1;\nEND";

    #[test]
    fn prints_and_applies_changed_procedures() {
        let mut source = FakeDb::new("shop");
        source.procedures = vec![
            ("p1".to_string(), P1.to_string()),
            ("same".to_string(), "CREATE PROCEDURE `same`() SELECT 2".to_string()),
            ("hidden".to_string(), String::new()),
        ];
        let mut dest = FakeDb::new("shop");
        dest.procedures = vec![("same".to_string(), "CREATE PROCEDURE `same`() SELECT 2".to_string())];

        let mut out: Vec<u8> = Vec::new();
        let mut stats = RunStats::start("shop", true);
        check_procedures(&source, &dest, true, &mut out, &mut stats).expect("procedures");

        let printed = String::from_utf8(out).expect("utf8");
        assert_eq!(
            printed,
            format!(
                "DELIMITER $$\nDROP PROCEDURE IF EXISTS `p1`$$\n{}$$\nDELIMITER ;\n\n",
                P1
            )
        );
        assert_eq!(
            dest.events(),
            vec![
                "exec:DROP PROCEDURE IF EXISTS `p1`".to_string(),
                format!("exec:{}", P1),
            ]
        );
        assert_eq!(stats.success_total, 1);
    }

    #[test]
    fn failure_is_counted_and_run_continues() {
        let mut source = FakeDb::new("shop");
        source.procedures = vec![
            ("p1".to_string(), P1.to_string()),
            ("p2".to_string(), "CREATE PROCEDURE `p2`() SELECT 2".to_string()),
        ];
        let mut dest = FakeDb::new("shop");
        dest.failing = vec!["`p1`".to_string()];

        let mut stats = RunStats::start("shop", true);
        check_procedures(&source, &dest, true, &mut Vec::<u8>::new(), &mut stats)
            .expect("procedures");
        assert_eq!(stats.failed_total, 1);
        assert_eq!(stats.success_total, 1);
    }

    #[test]
    fn unreadable_source_procedure_is_skipped() {
        let mut source = FakeDb::new("shop");
        source.procedures = vec![
            ("gone".to_string(), String::new()),
            ("p1".to_string(), P1.to_string()),
        ];
        source.unreadable = vec!["gone".to_string()];
        let dest = FakeDb::new("shop");

        let mut out: Vec<u8> = Vec::new();
        let mut stats = RunStats::start("shop", true);
        check_procedures(&source, &dest, true, &mut out, &mut stats).expect("procedures");

        let printed = String::from_utf8(out).expect("utf8");
        assert!(!printed.contains("`gone`"));
        assert!(printed.contains("DROP PROCEDURE IF EXISTS `p1`"));
        assert_eq!(dest.events().len(), 2);
        assert_eq!(stats.success_total, 1);
        assert_eq!(stats.failed_total, 0);
    }

    #[test]
    fn dry_run_never_executes() {
        let mut source = FakeDb::new("shop");
        source.procedures = vec![("p1".to_string(), P1.to_string())];
        let dest = FakeDb::new("shop");
        let mut stats = RunStats::start("shop", false);
        check_procedures(&source, &dest, false, &mut Vec::<u8>::new(), &mut stats)
            .expect("procedures");
        assert!(dest.events().is_empty());
        assert_eq!(stats.success_total + stats.failed_total, 0);
    }
}
