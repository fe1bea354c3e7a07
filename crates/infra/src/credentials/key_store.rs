//! RSA key store
//!
//! Resolves the signing key pair from disk (generating or deriving what is
//! missing) and publishes the public key to the directory the engine
//! watches for trusted issuers.
//!
//! ## Files
//! - Private key: PKCS#8 DER, owner-only permissions on Unix. PKCS#8 and
//!   PKCS#1 PEM are accepted on load.
//! - Public key: SPKI PEM.
//! - Deployed copy: `{management_path}/{issuer}`, overwritten on every start.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use ekuiper_domain::constants::RSA_KEY_BITS;
use ekuiper_domain::JwtConfig;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::errors::CredentialError;

/// Holds the signing key for the lifetime of the client.
///
/// The private key is converted to a signing key at load time and is not
/// exposed; callers sign through [`KeyStore::sign`].
pub struct KeyStore {
    encoding_key: EncodingKey,
    public_key: RsaPublicKey,
    public_key_pem: String,
    private_key_path: PathBuf,
    public_key_path: PathBuf,
    deployed_path: Option<PathBuf>,
}

impl KeyStore {
    /// Resolve the key pair described by `config`.
    ///
    /// | private | public | action                                  |
    /// |---------|--------|-----------------------------------------|
    /// | missing | any    | generate a new pair, persist both       |
    /// | present | missing| derive the public key, persist it       |
    /// | present | present| load both as-is                         |
    ///
    /// When `config.enabled` is set the public key is then copied to
    /// `{management_path}/{issuer}`. A missing management directory is
    /// logged and skipped.
    ///
    /// # Errors
    /// Any I/O or key decoding failure is returned; the client cannot sign
    /// tokens without a valid key pair.
    #[instrument(skip(config), fields(issuer = %config.issuer))]
    pub fn initialize(config: &JwtConfig) -> Result<Self, CredentialError> {
        let private_key_path = config.resolved_private_key_path();
        let public_key_path = config.resolved_public_key_path();

        let (private_key, public_key) = resolve_key_pair(&private_key_path, &public_key_path)?;

        let public_key_pem = encode_public_pem(&public_key)?;
        let pkcs1 = private_key
            .to_pkcs1_der()
            .map_err(|e| CredentialError::Key(format!("Failed to encode signing key: {e}")))?;
        let encoding_key = EncodingKey::from_rsa_der(pkcs1.as_bytes());

        let deployed_path = if config.enabled {
            deploy_public_key(&public_key_pem, &config.management_path, &config.issuer)?
        } else {
            None
        };

        Ok(Self {
            encoding_key,
            public_key,
            public_key_pem,
            private_key_path,
            public_key_path,
            deployed_path,
        })
    }

    /// Sign `claims` as an RS256 JWT.
    ///
    /// # Errors
    /// Returns `CredentialError::Signing` if the claims cannot be serialized
    /// or signed.
    pub fn sign<T: Serialize>(&self, claims: &T) -> Result<String, CredentialError> {
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), claims, &self.encoding_key)
            .map_err(|e| CredentialError::Signing(e.to_string()))
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    pub fn public_key_pem(&self) -> &str {
        &self.public_key_pem
    }

    pub fn private_key_path(&self) -> &Path {
        &self.private_key_path
    }

    pub fn public_key_path(&self) -> &Path {
        &self.public_key_path
    }

    /// Where the public key was deployed, if it was.
    pub fn deployed_path(&self) -> Option<&Path> {
        self.deployed_path.as_deref()
    }
}

impl fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyStore")
            .field("private_key_path", &self.private_key_path)
            .field("public_key_path", &self.public_key_path)
            .field("deployed_path", &self.deployed_path)
            .finish_non_exhaustive()
    }
}

fn resolve_key_pair(
    private_path: &Path,
    public_path: &Path,
) -> Result<(RsaPrivateKey, RsaPublicKey), CredentialError> {
    if !private_path.exists() {
        info!(path = %private_path.display(), "No private key found, generating a new key pair");
        let private_key = generate_private_key()?;
        let public_key = RsaPublicKey::from(&private_key);
        write_private_key(private_path, &private_key)?;
        write_file(public_path, encode_public_pem(&public_key)?.as_bytes())?;
        return Ok((private_key, public_key));
    }

    let private_key = read_private_key(private_path)?;
    let derived = RsaPublicKey::from(&private_key);

    if !public_path.exists() {
        info!(path = %public_path.display(), "Public key missing, deriving it from the private key");
        write_file(public_path, encode_public_pem(&derived)?.as_bytes())?;
        return Ok((private_key, derived));
    }

    let public_key = read_public_key(public_path)?;
    if public_key != derived {
        warn!(
            private = %private_path.display(),
            public = %public_path.display(),
            "Public key on disk does not match the private key; tokens may fail verification"
        );
    }
    debug!(path = %private_path.display(), "Loaded existing key pair");
    Ok((private_key, public_key))
}

fn generate_private_key() -> Result<RsaPrivateKey, CredentialError> {
    let mut rng = rand::thread_rng();
    RsaPrivateKey::new(&mut rng, RSA_KEY_BITS)
        .map_err(|e| CredentialError::Key(format!("Failed to generate RSA key: {e}")))
}

fn read_private_key(path: &Path) -> Result<RsaPrivateKey, CredentialError> {
    let bytes = fs::read(path).map_err(|e| CredentialError::io(path, e))?;
    decode_private_key(&bytes)
        .map_err(|e| CredentialError::Key(format!("{}: {e}", path.display())))
}

pub(crate) fn decode_private_key(bytes: &[u8]) -> Result<RsaPrivateKey, String> {
    if bytes.starts_with(b"-----BEGIN") {
        let pem = std::str::from_utf8(bytes).map_err(|e| e.to_string())?;
        return RsaPrivateKey::from_pkcs8_pem(pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
            .map_err(|e| format!("unsupported private key PEM: {e}"));
    }
    RsaPrivateKey::from_pkcs8_der(bytes)
        .or_else(|_| RsaPrivateKey::from_pkcs1_der(bytes))
        .map_err(|e| format!("unsupported private key DER: {e}"))
}

fn read_public_key(path: &Path) -> Result<RsaPublicKey, CredentialError> {
    let pem = fs::read_to_string(path).map_err(|e| CredentialError::io(path, e))?;
    RsaPublicKey::from_public_key_pem(&pem)
        .map_err(|e| CredentialError::Key(format!("{}: {e}", path.display())))
}

fn encode_public_pem(key: &RsaPublicKey) -> Result<String, CredentialError> {
    key.to_public_key_pem(LineEnding::LF)
        .map_err(|e| CredentialError::Key(format!("Failed to encode public key: {e}")))
}

fn write_private_key(path: &Path, key: &RsaPrivateKey) -> Result<(), CredentialError> {
    let der = key
        .to_pkcs8_der()
        .map_err(|e| CredentialError::Key(format!("Failed to encode private key: {e}")))?;

    create_parent(path)?;
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path).map_err(|e| CredentialError::io(path, e))?;
    file.write_all(der.as_bytes()).map_err(|e| CredentialError::io(path, e))
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), CredentialError> {
    create_parent(path)?;
    fs::write(path, contents).map_err(|e| CredentialError::io(path, e))
}

fn create_parent(path: &Path) -> Result<(), CredentialError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| CredentialError::io(parent, e))
        }
        _ => Ok(()),
    }
}

fn deploy_public_key(
    pem: &str,
    management_path: &Path,
    issuer: &str,
) -> Result<Option<PathBuf>, CredentialError> {
    if !management_path.is_dir() {
        warn!(
            path = %management_path.display(),
            "Management directory does not exist; public key not deployed"
        );
        return Ok(None);
    }

    let target = management_path.join(issuer);
    fs::write(&target, pem).map_err(|e| CredentialError::io(&target, e))?;
    info!(path = %target.display(), "Deployed public key");
    Ok(Some(target))
}
