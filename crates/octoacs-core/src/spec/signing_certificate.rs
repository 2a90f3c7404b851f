use time::OffsetDateTime;

use crate::command::SigningCertificate;

/// Desired signing certificate of a relying party.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SigningCertificateSpec {
    bytes: Option<Vec<u8>>,
    password: Option<String>,
    start_date: Option<OffsetDateTime>,
    end_date: Option<OffsetDateTime>,
}

impl SigningCertificateSpec {
    /// Set the certificate bytes (PFX/PKCS#12).
    #[must_use]
    pub fn bytes(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.bytes = Some(bytes.into());
        self
    }

    /// Set the password protecting the private key.
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the start of the validity window.
    #[must_use]
    pub fn start_date(mut self, start_date: OffsetDateTime) -> Self {
        self.start_date = Some(start_date);
        self
    }

    /// Set the end of the validity window.
    #[must_use]
    pub fn end_date(mut self, end_date: OffsetDateTime) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub(crate) fn to_certificate(&self) -> SigningCertificate {
        SigningCertificate {
            bytes: self.bytes.clone(),
            password: self.password.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}
