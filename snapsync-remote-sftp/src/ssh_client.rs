use russh::client::Handler;
use russh::keys::{HashAlg, PublicKey, PublicKeyBase64};
use tracing::{info, warn};

/// Accepts the server key when it matches the configured whitelist, or any
/// key when no whitelist is set.
pub(crate) struct ClientHandler {
    pub pinned: Option<Vec<String>>, // OpenSSH SHA256 fingerprints or raw base64 keys
}

impl Handler for ClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        let fp_sha256 = server_public_key.fingerprint(HashAlg::Sha256).to_string();
        match &self.pinned {
            Some(allowed) => {
                let key_b64 = server_public_key.public_key_base64();
                let ok = allowed.iter().any(|s| s == &fp_sha256 || s == &key_b64);
                if !ok {
                    warn!(%fp_sha256, "server key does not match any pinned fingerprint");
                }
                Ok(ok)
            }
            None => {
                info!(%fp_sha256, "accepting server key, no fingerprints pinned");
                Ok(true)
            }
        }
    }
}
