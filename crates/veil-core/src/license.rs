//! Offline license key validation and tier gating.
//!
//! Keys look like `VEIL-XXXX-XXXX-XXXX-XXXX`: a fixed prefix, three
//! payload groups, and a checksum group, all uppercase alphanumerics. The
//! checksum is derived from a digest of the 16-character payload, so
//! validation is fully offline and deterministic — no server, no clock.
//!
//! The free tier caps batch size and forces a watermark; a valid persisted
//! key lifts both limits.

use std::path::PathBuf;

/// File name the key is persisted under.
const LICENSE_FILENAME: &str = ".license_key";

/// Key prefix; also the first 4 characters of the checksum payload.
const KEY_PREFIX: &str = "VEIL";

/// Maximum files per batch on the free tier.
const FREE_BATCH_LIMIT: usize = 5;

/// Base-36 digit alphabet (digits then uppercase letters).
const BASE36: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// License state, derived once at construction.
///
/// Immutable from the pipeline's point of view: `activate` / `deactivate`
/// update the persisted key and this instance, but a batch run only ever
/// reads the tier it was constructed with.
pub struct LicenseManager {
    search_paths: Vec<PathBuf>,
    is_pro: bool,
}

impl LicenseManager {
    /// Construct by scanning the default search paths: the per-user config
    /// directory first, then the current working directory.
    pub fn new() -> Self {
        Self::with_search_paths(Self::default_search_paths())
    }

    /// Construct with explicit search paths (first path is also where
    /// `activate` persists the key).
    pub fn with_search_paths(search_paths: Vec<PathBuf>) -> Self {
        let mut manager = Self {
            search_paths,
            is_pro: false,
        };
        manager.is_pro = manager.load_persisted_key();
        manager
    }

    fn default_search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(dirs) = directories::ProjectDirs::from("com", "veil", "veil") {
            paths.push(dirs.config_dir().join(LICENSE_FILENAME));
        }
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd.join(LICENSE_FILENAME));
        }
        paths
    }

    /// Scan the search paths for a valid persisted key. Unreadable or
    /// invalid files are skipped, not fatal.
    fn load_persisted_key(&self) -> bool {
        for path in &self.search_paths {
            if !path.is_file() {
                continue;
            }
            match std::fs::read_to_string(path) {
                Ok(contents) => {
                    let key = contents.trim();
                    if !key.is_empty() && Self::validate_key(key) {
                        tracing::debug!("Valid license key found at {:?}", path);
                        return true;
                    }
                }
                Err(e) => {
                    tracing::debug!("Skipping unreadable license file {:?}: {}", path, e);
                }
            }
        }
        false
    }

    /// Checksum group for a 16-character payload (prefix + three groups).
    ///
    /// Deterministic: the first 4 digest bytes, big-endian, reduced modulo
    /// 36^4 and written as 4 base-36 digits, most significant first.
    pub(crate) fn checksum(payload: &str) -> String {
        let digest = blake3::hash(payload.as_bytes());
        let n = u32::from_be_bytes(digest.as_bytes()[..4].try_into().unwrap()) % 36u32.pow(4);
        let mut out = String::with_capacity(4);
        for i in (0..4).rev() {
            out.push(BASE36[(n / 36u32.pow(i)) as usize % 36] as char);
        }
        out
    }

    /// Validate a candidate key offline.
    ///
    /// The candidate is trimmed and uppercased, checked against the
    /// `VEIL-XXXX-XXXX-XXXX-XXXX` shape, and its checksum group compared
    /// against the recomputed checksum of the payload. Any
    /// single-character change in any group invalidates the key.
    pub fn validate_key(key: &str) -> bool {
        let key = key.trim().to_uppercase();
        let groups: Vec<&str> = key.split('-').collect();
        if groups.len() != 5 || groups[0] != KEY_PREFIX {
            return false;
        }
        if !groups[1..]
            .iter()
            .all(|g| g.len() == 4 && g.bytes().all(|b| b.is_ascii_digit() || b.is_ascii_uppercase()))
        {
            return false;
        }
        let payload: String = groups[..4].concat();
        debug_assert_eq!(payload.len(), 16);
        Self::checksum(&payload) == groups[4]
    }

    /// Validate and persist a key to the primary search path.
    ///
    /// Returns `false` for an invalid key or a failed write; on success
    /// this instance becomes pro immediately.
    pub fn activate(&mut self, key: &str) -> bool {
        if !Self::validate_key(key) {
            return false;
        }
        let normalized = key.trim().to_uppercase();
        let Some(target) = self.search_paths.first() else {
            return false;
        };
        if let Some(parent) = target.parent() {
            if std::fs::create_dir_all(parent).is_err() {
                return false;
            }
        }
        match std::fs::write(target, &normalized) {
            Ok(()) => {
                self.is_pro = true;
                true
            }
            Err(e) => {
                tracing::warn!("Failed to persist license key to {:?}: {}", target, e);
                false
            }
        }
    }

    /// Remove any persisted key from all search paths.
    pub fn deactivate(&mut self) {
        for path in &self.search_paths {
            if path.is_file() {
                if let Err(e) = std::fs::remove_file(path) {
                    tracing::warn!("Failed to remove license file {:?}: {}", path, e);
                }
            }
        }
        self.is_pro = false;
    }

    pub fn is_pro(&self) -> bool {
        self.is_pro
    }

    /// Batch size cap: 0 (unlimited) for pro, a fixed cap for free.
    pub fn batch_limit(&self) -> usize {
        if self.is_pro {
            0
        } else {
            FREE_BATCH_LIMIT
        }
    }

    /// Whether the orchestrator must force a watermark (free tier only).
    pub fn watermark_enabled(&self) -> bool {
        !self.is_pro
    }
}

impl Default for LicenseManager {
    fn default() -> Self {
        Self::new()
    }
}
