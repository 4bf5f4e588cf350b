//! Typed calls for the legacy QR-scan web service methods.
//!
//! Every method here is a thin wrapper around [`SoapClient::call`] with the
//! parameter list the service expects, in the order it expects.

use super::client::{LegacyResult, SoapClient};
use crate::error::GatewayError;

/// Registers a new user account.
pub const REGISTER_USER: &str = "UbaciWebQRScanKorisnik";

/// Multi-purpose account update (login, logout, password, profile, delete).
pub const UPDATE_ACCOUNT: &str = "AzurWebQRScanKorisnik";

/// Fetches a user record.
pub const FETCH_USER: &str = "DajWebQRScanKorisnik";

/// Stores scanned receipts.
pub const STORE_RECEIPTS: &str = "UbaciWebQRScanUcitaniRacuni";

/// Current time of the web server.
pub const WEB_SERVER_TIME: &str = "DatumVremeWebServera";

/// Current time of the database server.
pub const DB_SERVER_TIME: &str = "DatumVremeDBServera";

const REGISTER_PARAMS: [&str; 6] = ["email", "lozinka", "pib", "nazivfirme", "kontakt", "token"];

const UPDATE_PARAMS: [&str; 9] = [
    "korisniksk",
    "email",
    "lozinka",
    "novalozinka",
    "pib",
    "nazivfirme",
    "kontakt",
    "token",
    "tipazur",
];

const RECEIPT_PARAMS: [&str; 4] = ["sbbaze", "racuni", "korisniksk", "token"];

/// What an [`UPDATE_ACCOUNT`] call does, sent as `tipazur`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateKind {
    /// Check credentials and open a session.
    #[default]
    Login,
    /// Close a session.
    Logout,
    /// Change the password.
    Password,
    /// Change the contact details.
    Profile,
    /// Remove the account.
    Delete,
}

impl UpdateKind {
    /// Single-letter code understood by the service.
    pub fn code(self) -> &'static str {
        match self {
            UpdateKind::Login => "L",
            UpdateKind::Logout => "O",
            UpdateKind::Password => "R",
            UpdateKind::Profile => "P",
            UpdateKind::Delete => "D",
        }
    }
}

/// Arguments of an [`UPDATE_ACCOUNT`] call. Unused fields are sent empty.
#[derive(Debug, Clone, Default)]
pub struct AccountUpdate<'a> {
    /// User id (`korisniksk`).
    pub user_id: &'a str,
    /// E-mail address.
    pub email: &'a str,
    /// Current password.
    pub password: &'a str,
    /// Replacement password.
    pub new_password: &'a str,
    /// Company tax id (`pib`).
    pub company_id: &'a str,
    /// Company name.
    pub company_name: &'a str,
    /// Contact details.
    pub contact: &'a str,
    /// Session token.
    pub token: &'a str,
    /// Operation selector.
    pub kind: UpdateKind,
}

impl<'a> AccountUpdate<'a> {
    /// Login by e-mail and password. The service expects user id `0`.
    pub fn login(email: &'a str, password: &'a str) -> Self {
        Self {
            user_id: "0",
            email,
            password,
            kind: UpdateKind::Login,
            ..Default::default()
        }
    }

    /// Parameter values in the order of the method signature.
    pub fn values(&self) -> [&'a str; 9] {
        [
            self.user_id,
            self.email,
            self.password,
            self.new_password,
            self.company_id,
            self.company_name,
            self.contact,
            self.token,
            self.kind.code(),
        ]
    }
}

/// Arguments of a [`REGISTER_USER`] call.
#[derive(Debug, Clone, Default)]
#[allow(missing_docs)]
pub struct Registration<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub company_id: &'a str,
    pub company_name: &'a str,
    pub contact: &'a str,
}

impl SoapClient {
    /// Creates a user account. The session token is always sent empty.
    pub async fn register_user(
        &self,
        registration: &Registration<'_>,
    ) -> Result<LegacyResult, GatewayError> {
        let values = [
            registration.email,
            registration.password,
            registration.company_id,
            registration.company_name,
            registration.contact,
            "",
        ];
        self.call(REGISTER_USER, &REGISTER_PARAMS, &values).await
    }

    /// Runs one of the account operations selected by [`UpdateKind`].
    pub async fn update_account(
        &self,
        update: &AccountUpdate<'_>,
    ) -> Result<LegacyResult, GatewayError> {
        tracing::debug!(kind = ?update.kind, "Updating legacy account");
        self.call(UPDATE_ACCOUNT, &UPDATE_PARAMS, &update.values())
            .await
    }

    /// Fetches the record of user `user_id`.
    pub async fn fetch_user(&self, user_id: &str) -> Result<LegacyResult, GatewayError> {
        self.call(FETCH_USER, &["QRScanKorisnikSK"], &[user_id])
            .await
    }

    /// Stores a comma-separated list of receipt URLs in database `db_serial`.
    pub async fn store_receipts(
        &self,
        db_serial: &str,
        receipts: &str,
        user_id: &str,
        token: &str,
    ) -> Result<LegacyResult, GatewayError> {
        self.call(
            STORE_RECEIPTS,
            &RECEIPT_PARAMS,
            &[db_serial, receipts, user_id, token],
        )
        .await
    }

    /// Reads a server clock: [`WEB_SERVER_TIME`] or [`DB_SERVER_TIME`].
    pub async fn server_time(&self, method: &str) -> Result<LegacyResult, GatewayError> {
        self.call(method, &[], &[]).await
    }
}
