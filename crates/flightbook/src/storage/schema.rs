//! `SQLite` schema definitions for flightbook.
//!
//! Table and column names match the layout of existing installs so their
//! databases open unchanged.

/// SQL statement to create the aircraft table.
///
/// Component lists are JSON arrays; `total_hours` holds integer minutes.
pub const CREATE_AIRCRAFT_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS aircraft (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    code TEXT NOT NULL UNIQUE,
    part_num TEXT,
    serial_num TEXT,
    motors TEXT NOT NULL,
    batteries_main TEXT NOT NULL,
    batteries_spare TEXT NOT NULL,
    cameras TEXT NOT NULL,
    total_hours INTEGER DEFAULT 0,
    created_at TEXT DEFAULT CURRENT_TIMESTAMP
)
";

/// SQL statement to create the owners table.
pub const CREATE_OWNERS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS owners (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    id_type TEXT NOT NULL,
    id_num TEXT NOT NULL
)
";

/// SQL statement to create the pilots table.
pub const CREATE_PILOTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS pilots (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    cc TEXT NOT NULL UNIQUE,
    license_num TEXT NOT NULL,
    license_type TEXT NOT NULL,
    license_expiry TEXT NOT NULL,
    created_at TEXT DEFAULT CURRENT_TIMESTAMP
)
";

/// SQL statement to create the flights table.
///
/// `cronometro` holds the timer lease of an in-progress flight.
pub const CREATE_FLIGHTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS flights (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    type TEXT NOT NULL,
    status TEXT NOT NULL,
    date TEXT NOT NULL,
    start_time TEXT,
    end_time TEXT,
    duration INTEGER DEFAULT 0,
    crew TEXT NOT NULL,
    equipment TEXT NOT NULL,
    prevuelo TEXT,
    postvuelo TEXT,
    cronometro TEXT,
    carga TEXT,
    fases TEXT,
    signatures TEXT,
    pdf_path TEXT,
    created_at TEXT DEFAULT CURRENT_TIMESTAMP
)
";

/// SQL statement to create an index on flight status for the active-flight lookup.
pub const CREATE_STATUS_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_flights_status ON flights(status)
";

/// SQL statement to create an index on flight date for the logbooks.
pub const CREATE_DATE_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_flights_date ON flights(date DESC)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_AIRCRAFT_TABLE,
    CREATE_OWNERS_TABLE,
    CREATE_PILOTS_TABLE,
    CREATE_FLIGHTS_TABLE,
    CREATE_STATUS_INDEX,
    CREATE_DATE_INDEX,
    CREATE_METADATA_TABLE,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_statements_not_empty() {
        assert!(!SCHEMA_STATEMENTS.is_empty());
        for stmt in SCHEMA_STATEMENTS {
            assert!(!stmt.trim().is_empty());
        }
    }

    #[test]
    fn test_flights_table_keeps_record_columns() {
        for column in [
            "type TEXT NOT NULL",
            "status TEXT NOT NULL",
            "duration INTEGER",
            "prevuelo TEXT",
            "postvuelo TEXT",
            "cronometro TEXT",
            "carga TEXT",
            "fases TEXT",
            "pdf_path TEXT",
        ] {
            assert!(CREATE_FLIGHTS_TABLE.contains(column), "missing {column}");
        }
    }

    #[test]
    fn test_unique_codes() {
        assert!(CREATE_AIRCRAFT_TABLE.contains("code TEXT NOT NULL UNIQUE"));
        assert!(CREATE_PILOTS_TABLE.contains("cc TEXT NOT NULL UNIQUE"));
    }
}
