use crate::commands::db::DistributionCache;
use crate::commands::store::parse_season_file_name;
use notify::Watcher;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

/// Drop cached distributions whose season file changes on disk.
///
/// Started by `serve` when `--watch` or `watchDataDir` is set; otherwise cache
/// entries live forever. The watcher thread runs until the process exits.
pub fn start_data_watcher(
    data_dir: &Path,
    cache: Arc<dyn DistributionCache>,
) -> Result<(), String> {
    let (tx, rx) = mpsc::channel();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        if let Ok(event) = res {
            let _ = tx.send(event);
        }
    })
    .map_err(|e| format!("Watcher init error: {e}"))?;

    watcher
        .watch(data_dir, notify::RecursiveMode::NonRecursive)
        .map_err(|e| format!("Watch error: {e}"))?;

    log::info!("Watching {} for season changes", data_dir.display());

    std::thread::spawn(move || {
        let _watcher = watcher; // keep alive

        loop {
            match rx.recv_timeout(Duration::from_millis(500)) {
                Ok(event) => {
                    if !is_content_change(&event.kind) {
                        continue;
                    }
                    for year in seasons_touched(&event.paths) {
                        match cache.invalidate(year) {
                            Ok(true) => log::info!("Season {year} changed on disk; cache entry dropped"),
                            Ok(false) => {}
                            Err(e) => log::warn!("Failed to invalidate cache for {year}: {e}"),
                        }
                    }
                }
                Err(mpsc::RecvTimeoutError::Timeout) => continue,
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
        }
    });

    Ok(())
}

fn is_content_change(kind: &notify::EventKind) -> bool {
    matches!(
        kind,
        notify::EventKind::Create(_) | notify::EventKind::Modify(_) | notify::EventKind::Remove(_)
    )
}

pub fn seasons_touched(paths: &[PathBuf]) -> Vec<i32> {
    let mut years: Vec<i32> = paths
        .iter()
        .filter_map(|p| p.file_name())
        .filter_map(|name| parse_season_file_name(&name.to_string_lossy()))
        .collect();
    years.sort_unstable();
    years.dedup();
    years
}
