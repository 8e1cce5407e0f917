use std::fmt;

/// Handle for the network-identity service, used downstream to turn an
/// online username into an account id.
///
/// Only the credential lives here; requests are made by the transport layer
/// that consumes this handle.
#[derive(Clone)]
pub struct IdentityClient {
    npsso: String,
}

impl IdentityClient {
    /// `None` for a blank token.
    pub fn new(npsso: &str) -> Option<Self> {
        let npsso = npsso.trim();
        (!npsso.is_empty()).then(|| Self { npsso: npsso.to_owned() })
    }

    pub fn npsso(&self) -> &str { &self.npsso }
}

impl fmt::Debug for IdentityClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityClient").field("npsso", &"<redacted>").finish()
    }
}
