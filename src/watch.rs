use std::path::PathBuf;
use std::sync::mpsc::{Receiver, channel};

use notify::EventKind;

/// Editors save in place, by create-and-rename, or by remove-and-rename.
fn triggers_reload(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_) | EventKind::Any
    )
}

/// Spawns a thread watching the terrain config file; every change sends a unit message.
pub fn spawn_config_watcher(path: PathBuf) -> Receiver<()> {
    let (tx, rx) = channel::<()>();
    std::thread::spawn(move || {
        use notify::{RecursiveMode, Watcher};
        let watcher = notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
            if let Ok(event) = res {
                if triggers_reload(&event.kind) {
                    let _ = tx.send(());
                }
            }
        });
        match watcher {
            Ok(mut watcher) => {
                if let Err(e) = watcher.watch(path.as_path(), RecursiveMode::NonRecursive) {
                    log::warn!("cannot watch {}: {}", path.display(), e);
                    return;
                }
                loop {
                    std::thread::sleep(std::time::Duration::from_secs(3600));
                }
            }
            Err(e) => log::warn!("config watcher unavailable: {}", e),
        }
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, ModifyKind, RemoveKind};

    #[test]
    fn reload_follows_writes_and_replacements() {
        assert!(triggers_reload(&EventKind::Modify(ModifyKind::Any)));
        assert!(triggers_reload(&EventKind::Create(CreateKind::File)));
        assert!(triggers_reload(&EventKind::Remove(RemoveKind::File)));
        assert!(triggers_reload(&EventKind::Any));
        assert!(!triggers_reload(&EventKind::Access(AccessKind::Any)));
        assert!(!triggers_reload(&EventKind::Other));
    }
}
