use crate::schema::quote_ident;

pub const TABLES: &str = "SHOW FULL TABLES";

pub const PROCEDURES: &str = "SHOW PROCEDURE STATUS WHERE Db = DATABASE()";

pub const PING: &str = "SELECT 1";

pub fn show_create_table(table: &str) -> String {
    format!("SHOW CREATE TABLE {}", quote_ident(table))
}

pub fn show_create_procedure(name: &str) -> String {
    format!("SHOW CREATE PROCEDURE {}", quote_ident(name))
}

pub fn checksum_table(table: &str) -> String {
    format!("CHECKSUM TABLE {}", quote_ident(table))
}
