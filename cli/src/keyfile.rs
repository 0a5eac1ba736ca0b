//! Keypair files: a JSON array of the 64 `secret ∥ public` bytes.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

use gem_bank::Keypair;

/// Read a keypair file written by [`write`].
pub fn read(path: &Path) -> Result<Keypair> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read keypair file {}", path.display()))?;
    let bytes: Vec<u8> = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON byte array", path.display()))?;
    Keypair::from_bytes(&bytes).with_context(|| format!("invalid keypair in {}", path.display()))
}

/// Write `keypair` to `path`, refusing to clobber unless `force` is set.
pub fn write(path: &Path, keypair: &Keypair, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    let json = serde_json::to_string(&keypair.to_bytes().to_vec())?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn written_keypair_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("id.json");
        let kp = Keypair::generate();

        write(&path, &kp, false).unwrap();
        assert_eq!(read(&path).unwrap().pubkey(), kp.pubkey());
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("id.json");
        write(&path, &Keypair::generate(), false).unwrap();

        assert!(write(&path, &Keypair::generate(), false).is_err());
        let replacement = Keypair::generate();
        write(&path, &replacement, true).unwrap();
        assert_eq!(read(&path).unwrap().pubkey(), replacement.pubkey());
    }

    #[test]
    fn rejects_truncated_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "[1,2,3]").unwrap();
        assert!(read(&path).is_err());
    }
}
