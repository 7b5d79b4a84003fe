use std::io;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::thread;

use crate::ordering::SortOrder;
use crate::parser;
use crate::waypoint::Waypoint;

/// Outcome of a background load, sent exactly once per load.
#[derive(Debug)]
pub enum LoadUpdate {
    Completed {
        path: PathBuf,
        places: Vec<Waypoint>,
    },
    /// The file could not be used. The session shows an empty list.
    Failed { path: PathBuf, error_msg: String },
}

impl LoadUpdate {
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Completed { path, .. } | Self::Failed { path, .. } => path,
        }
    }

    /// The loaded places; empty for a failed load.
    pub fn into_places(self) -> Vec<Waypoint> {
        match self {
            Self::Completed { places, .. } => places,
            Self::Failed { .. } => Vec::new(),
        }
    }
}

/// Parse and sort a file off the calling thread. The result goes to `tx`;
/// a dropped receiver means the load was superseded and is not an error.
pub fn spawn_load(
    path: PathBuf,
    format_tag: String,
    order: SortOrder,
    tx: Sender<LoadUpdate>,
) -> io::Result<thread::JoinHandle<()>> {
    let thread_name = path.to_string_lossy().into_owned();
    log::debug!("Starting loader thread: {thread_name}");

    thread::Builder::new().name(thread_name).spawn(move || {
        let update = match parser::try_waypoints_from_file(&path, &format_tag) {
            Ok(mut places) => {
                order.sort(&mut places);
                LoadUpdate::Completed { path, places }
            }
            Err(e) => LoadUpdate::Failed {
                path,
                error_msg: e.to_string(),
            },
        };

        if let Err(e) = tx.send(update) {
            log::debug!("load of {} superseded", e.0.path().display());
        }
    })
}
