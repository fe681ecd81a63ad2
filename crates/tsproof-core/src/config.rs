//! Parse and hash limits, loaded from TOML.
//!
//! Sources, lowest precedence first:
//!
//! 1. built-in defaults
//! 2. user config, `<config dir>/tsproof/config.toml`
//! 3. project config, `<root>/.tsproof/config.toml`
//! 4. `TSPROOF_MAX_DEPTH` in the environment
//!
//! ```toml
//! [limits]
//! max_depth = 256
//!
//! [hashing]
//! chunk_size = 1048576
//! ```

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::env;
use std::io::Read;
use std::path::Path;

use crate::op::{HASH_CHUNK_SIZE, HashAlgo};
use crate::timestamp::{DEFAULT_MAX_DEPTH, Timestamp};

/// Environment variable overriding `limits.max_depth`.
pub const MAX_DEPTH_ENV: &str = "TSPROOF_MAX_DEPTH";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofConfig {
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub hashing: HashingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Deepest proof nesting accepted by the parser.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

impl LimitsConfig {
    /// Parse a complete proof for `msg` under these limits.
    ///
    /// # Errors
    ///
    /// As [`Timestamp::from_bytes`], with the recursion limit taken from
    /// `max_depth`.
    pub fn read_timestamp(&self, bytes: &[u8], msg: impl Into<Vec<u8>>) -> crate::Result<Timestamp> {
        let mut r = crate::codec::ByteReader::new(bytes);
        let ts = Timestamp::deserialize_with_limit(&mut r, msg, self.max_depth)?;
        r.assert_eof()?;
        Ok(ts)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashingConfig {
    /// Bytes read per step when hashing a stream.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
        }
    }
}

impl HashingConfig {
    /// Stream `reader` through `algo` using the configured chunk size.
    ///
    /// # Errors
    ///
    /// Propagates read errors.
    pub fn hash_reader<R: Read>(&self, algo: HashAlgo, reader: R) -> crate::Result<Vec<u8>> {
        algo.hash_reader_chunked(reader, self.chunk_size)
    }
}

/// One config file. Every key is optional so a file only overrides what it
/// names.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigLayer {
    #[serde(default)]
    limits: LimitsLayer,
    #[serde(default)]
    hashing: HashingLayer,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct LimitsLayer {
    max_depth: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct HashingLayer {
    chunk_size: Option<usize>,
}

impl ConfigLayer {
    fn apply(self, cfg: &mut ProofConfig) {
        if let Some(max_depth) = self.limits.max_depth {
            cfg.limits.max_depth = max_depth;
        }
        if let Some(chunk_size) = self.hashing.chunk_size {
            cfg.hashing.chunk_size = chunk_size;
        }
    }
}

fn read_layer(path: &Path) -> Result<ConfigLayer> {
    if !path.exists() {
        return Ok(ConfigLayer::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ConfigLayer>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

fn project_config_path(project_root: &Path) -> std::path::PathBuf {
    project_root.join(".tsproof/config.toml")
}

/// Load `<root>/.tsproof/config.toml` over the defaults.
///
/// # Errors
///
/// The file exists but cannot be read, parsed or validated.
pub fn load_project_config(project_root: &Path) -> Result<ProofConfig> {
    let mut cfg = ProofConfig::default();
    read_layer(&project_config_path(project_root))?.apply(&mut cfg);
    validate(&cfg)?;
    Ok(cfg)
}

/// Load the per-user config over the defaults.
///
/// # Errors
///
/// The file exists but cannot be read, parsed or validated.
pub fn load_user_config() -> Result<ProofConfig> {
    let mut cfg = ProofConfig::default();
    if let Some(config_dir) = dirs::config_dir() {
        read_layer(&config_dir.join("tsproof/config.toml"))?.apply(&mut cfg);
    }
    validate(&cfg)?;
    Ok(cfg)
}

/// Defaults, then user config, then project config, then the environment.
///
/// # Errors
///
/// Any file fails to load, `TSPROOF_MAX_DEPTH` is not a positive integer,
/// or a resulting limit is zero.
pub fn resolve_config(project_root: &Path) -> Result<ProofConfig> {
    let mut cfg = ProofConfig::default();
    if let Some(config_dir) = dirs::config_dir() {
        read_layer(&config_dir.join("tsproof/config.toml"))?.apply(&mut cfg);
    }
    read_layer(&project_config_path(project_root))?.apply(&mut cfg);

    apply_env_max_depth(&mut cfg, env::var(MAX_DEPTH_ENV).ok())?;
    validate(&cfg)?;

    tracing::debug!(
        max_depth = cfg.limits.max_depth,
        chunk_size = cfg.hashing.chunk_size,
        "resolved config"
    );
    Ok(cfg)
}

fn apply_env_max_depth(cfg: &mut ProofConfig, raw: Option<String>) -> Result<()> {
    let Some(raw) = raw else {
        return Ok(());
    };
    cfg.limits.max_depth = raw
        .trim()
        .parse()
        .with_context(|| format!("{MAX_DEPTH_ENV}={raw:?} is not a valid depth"))?;
    Ok(())
}

fn validate(cfg: &ProofConfig) -> Result<()> {
    if cfg.limits.max_depth == 0 {
        bail!("limits.max_depth must be at least 1");
    }
    if cfg.hashing.chunk_size == 0 {
        bail!("hashing.chunk_size must be at least 1");
    }
    Ok(())
}

const fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

const fn default_chunk_size() -> usize {
    HASH_CHUNK_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attestation::Attestation;
    use crate::op::Op;

    fn write_project_config(root: &Path, content: &str) {
        let dir = root.join(".tsproof");
        std::fs::create_dir_all(&dir).expect("create .tsproof");
        std::fs::write(dir.join("config.toml"), content).expect("write config");
    }

    #[test]
    fn missing_project_config_uses_defaults() {
        let root = tempfile::tempdir().expect("temp dir");
        let cfg = load_project_config(root.path()).expect("load should succeed");
        assert_eq!(cfg, ProofConfig::default());
        assert_eq!(cfg.limits.max_depth, 256);
        assert_eq!(cfg.hashing.chunk_size, 1 << 20);
    }

    #[test]
    fn partial_file_overrides_only_named_keys() {
        let root = tempfile::tempdir().expect("temp dir");
        write_project_config(root.path(), "[limits]\nmax_depth = 32\n");
        let cfg = load_project_config(root.path()).expect("load should succeed");
        assert_eq!(cfg.limits.max_depth, 32);
        assert_eq!(cfg.hashing.chunk_size, HASH_CHUNK_SIZE);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let root = tempfile::tempdir().expect("temp dir");
        write_project_config(root.path(), "[limits]\nmax_dpeth = 32\n");
        let err = load_project_config(root.path()).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse"));
    }

    #[test]
    fn zero_limits_are_rejected() {
        let root = tempfile::tempdir().expect("temp dir");
        write_project_config(root.path(), "[hashing]\nchunk_size = 0\n");
        assert!(load_project_config(root.path()).is_err());
    }

    #[test]
    fn layers_apply_in_order() {
        let mut cfg = ProofConfig::default();
        let user: ConfigLayer =
            toml::from_str("[limits]\nmax_depth = 10\n[hashing]\nchunk_size = 64\n").expect("parse");
        let project: ConfigLayer = toml::from_str("[limits]\nmax_depth = 20\n").expect("parse");
        user.apply(&mut cfg);
        project.apply(&mut cfg);
        assert_eq!(cfg.limits.max_depth, 20);
        assert_eq!(cfg.hashing.chunk_size, 64);

        apply_env_max_depth(&mut cfg, Some(" 30 ".to_string())).expect("env");
        assert_eq!(cfg.limits.max_depth, 30);
        apply_env_max_depth(&mut cfg, None).expect("no env");
        assert_eq!(cfg.limits.max_depth, 30);
    }

    #[test]
    fn invalid_env_depth_is_an_error() {
        let mut cfg = ProofConfig::default();
        let err = apply_env_max_depth(&mut cfg, Some("deep".to_string())).unwrap_err();
        assert!(err.to_string().contains(MAX_DEPTH_ENV));
        assert_eq!(cfg, ProofConfig::default());
    }

    #[test]
    fn limits_drive_parsing() {
        let mut ts = Timestamp::new(b"m".to_vec());
        ts.add_op(Op::Sha256)
            .expect("add")
            .add_op(Op::Sha1)
            .expect("add")
            .attest(Attestation::Bitcoin { height: 1 });
        let bytes = ts.to_bytes().expect("serialize");

        let roomy = LimitsConfig { max_depth: 3 };
        assert_eq!(roomy.read_timestamp(&bytes, b"m".to_vec()).expect("parse"), ts);

        let tight = LimitsConfig { max_depth: 2 };
        assert!(matches!(
            tight.read_timestamp(&bytes, b"m".to_vec()),
            Err(crate::Error::RecursionLimit { limit: 2 })
        ));
    }

    #[test]
    fn hashing_uses_configured_chunks() {
        let cfg = HashingConfig { chunk_size: 3 };
        let got = cfg
            .hash_reader(HashAlgo::Sha256, std::io::Cursor::new(b"hello world"))
            .expect("hash");
        assert_eq!(got, HashAlgo::Sha256.digest(b"hello world"));
    }

    #[test]
    fn config_serializes_back_to_toml() {
        let cfg = ProofConfig::default();
        let text = toml::to_string(&cfg).expect("serialize");
        let back: ProofConfig = toml::from_str(&text).expect("parse");
        assert_eq!(back, cfg);
    }
}
