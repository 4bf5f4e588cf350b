//! Known error strings returned by the legacy web service.
//!
//! The service reports domain failures by returning the raw database driver
//! error text in place of a result. The strings below are matched exactly;
//! when the upstream changes its wording, this table is the only place to
//! update.

/// Semantic meaning of a recognised error string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyError {
    /// The unique index on the user e-mail rejected a registration.
    DuplicateEmail,

    /// A stored procedure raised its user-defined exception: wrong
    /// credentials, stale session token, unknown user or wrong database serial.
    Rejected,
}

const SENTINELS: &[(&str, LegacyError)] = &[
    (
        "ERROR [23000] [Sybase][ODBC Driver][SQL Anywhere]Index 'AK_WebQRScanKorisnikEmail' for table 'WebQRScanKorisnik' would not be unique",
        LegacyError::DuplicateEmail,
    ),
    (
        "ERROR [HY000] [Sybase][ODBC Driver][SQL Anywhere]User-defined exception signaled",
        LegacyError::Rejected,
    ),
];

impl LegacyError {
    /// Looks up `text` in the sentinel table.
    pub fn classify(text: &str) -> Option<Self> {
        SENTINELS
            .iter()
            .find(|(sentinel, _)| *sentinel == text)
            .map(|(_, kind)| *kind)
    }

    /// The exact upstream text for this error.
    pub fn sentinel(self) -> &'static str {
        SENTINELS
            .iter()
            .find(|(_, kind)| *kind == self)
            .map(|(sentinel, _)| *sentinel)
            .unwrap_or_default()
    }
}
