//! SQL schema for the depletion store.

/// Returns the full SQL schema as a single batch string.
///
/// - `wells` - aquifer geometry per WAP (distance m, storage coefficient, transmissivity m²/day)
/// - `pumping` - pumping rate per WAP and day; `rate` is NULL for a missing reading
/// - `depletion` - computed stream depletion per WAP and day
pub fn create_schema() -> &'static str {
    r#"
    CREATE TABLE IF NOT EXISTS wells (
        wap TEXT PRIMARY KEY,
        distance REAL NOT NULL,
        storage_coefficient REAL NOT NULL,
        transmissivity REAL NOT NULL
    );

    CREATE TABLE IF NOT EXISTS pumping (
        wap TEXT NOT NULL,
        date TEXT NOT NULL,
        rate REAL,
        PRIMARY KEY (wap, date)
    );
    CREATE INDEX IF NOT EXISTS idx_pumping_wap ON pumping(wap);
    CREATE INDEX IF NOT EXISTS idx_pumping_date ON pumping(date);

    CREATE TABLE IF NOT EXISTS depletion (
        wap TEXT NOT NULL,
        date TEXT NOT NULL,
        value REAL NOT NULL,
        PRIMARY KEY (wap, date)
    );
    CREATE INDEX IF NOT EXISTS idx_depletion_wap ON depletion(wap);
    CREATE INDEX IF NOT EXISTS idx_depletion_date ON depletion(date);
    "#
}
