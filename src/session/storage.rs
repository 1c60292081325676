use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};

use super::snapshot::{CURRENT_VERSION, SNAPSHOT_FORMAT, SessionSnapshot, SnapshotMetadata};
use crate::store::SourceTile;

/// Load a session snapshot from disk.
///
/// Nothing is applied to a session here; callers restore only after a successful load,
/// so a failed load leaves in-memory state unchanged.
pub fn load_snapshot(path: &Path) -> Result<SessionSnapshot> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read database file {}", path.display()))?;
    let snapshot: SessionSnapshot = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse database file {}", path.display()))?;

    if snapshot.format != SNAPSHOT_FORMAT {
        bail!(
            "{} is not a CAST database (format '{}')",
            path.display(),
            snapshot.format
        );
    }
    if snapshot.version > CURRENT_VERSION {
        bail!(
            "{} was written by a newer version (database version {}, supported {})",
            path.display(),
            snapshot.version,
            CURRENT_VERSION
        );
    }

    let snapshot = if snapshot.version < CURRENT_VERSION {
        migrate_snapshot(snapshot)?
    } else {
        snapshot
    };

    log::info!(
        "Loaded {} source tiles from {}",
        snapshot.tiles.len(),
        path.display()
    );
    Ok(snapshot)
}

/// Save a session snapshot to disk as pretty-printed JSON
pub fn save_snapshot(path: &Path, snapshot: &SessionSnapshot) -> Result<()> {
    let content =
        serde_json::to_string_pretty(snapshot).context("failed to serialize database")?;
    fs::write(path, &content)
        .with_context(|| format!("failed to write database file {}", path.display()))?;

    // extracted contact data stays private to the owner
    #[cfg(unix)]
    {
        use std::fs::Permissions;
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, Permissions::from_mode(0o600))
            .context("failed to set database file permissions")?;
    }

    log::info!("Saved {} source tiles to {}", snapshot.tiles.len(), path.display());
    Ok(())
}

/// Migrate snapshots written by older versions
fn migrate_snapshot(mut snapshot: SessionSnapshot) -> Result<SessionSnapshot> {
    // version 1 files carried no metadata block
    if snapshot.version < 2 {
        let tiles: Vec<SourceTile> = snapshot
            .tiles
            .values()
            .cloned()
            .map(SourceTile::from_snapshot)
            .collect();
        snapshot.metadata = SnapshotMetadata::of(tiles.iter());
    }

    log::debug!(
        "Migrated database from version {} to {}",
        snapshot.version,
        CURRENT_VERSION
    );
    snapshot.version = CURRENT_VERSION;
    Ok(snapshot)
}
