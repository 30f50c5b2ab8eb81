use std::collections::BTreeMap;
use std::path::Path;

use tidemark_common::{Error, Result};
use tracing::debug;

use crate::migrations::Migration;

const UP_SUFFIX: &str = ".up.sql";
const DOWN_SUFFIX: &str = ".down.sql";

#[derive(Default)]
struct Pair {
    up: Option<String>,
    down: Option<String>,
}

/// Load `<name>.up.sql` / `<name>.down.sql` pairs from `dir`, sorted by name.
///
/// A missing directory yields no migrations. Files that match neither suffix
/// are ignored; a half of a pair without the other is an error.
pub fn load_migrations(dir: &Path) -> Result<Vec<Migration>> {
    if !dir.exists() {
        debug!("migrations directory {} does not exist", dir.display());
        return Ok(Vec::new());
    }

    let mut pairs: BTreeMap<String, Pair> = BTreeMap::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|f| f.to_str()) else {
            continue;
        };

        if let Some(name) = file_name.strip_suffix(UP_SUFFIX) {
            pairs.entry(name.to_string()).or_default().up = Some(std::fs::read_to_string(&path)?);
        } else if let Some(name) = file_name.strip_suffix(DOWN_SUFFIX) {
            pairs.entry(name.to_string()).or_default().down =
                Some(std::fs::read_to_string(&path)?);
        }
    }

    let mut migrations = Vec::with_capacity(pairs.len());
    for (name, pair) in pairs {
        match (pair.up, pair.down) {
            (Some(up), Some(down)) => migrations.push(Migration::new(name, up, down)),
            (Some(_), None) => {
                return Err(Error::Migration(format!("missing {name}{DOWN_SUFFIX}")));
            }
            (None, _) => {
                return Err(Error::Migration(format!("missing {name}{UP_SUFFIX}")));
            }
        }
    }

    debug!("loaded {} migrations from {}", migrations.len(), dir.display());
    Ok(migrations)
}
