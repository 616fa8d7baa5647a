//! Background autosave
//!
//! Native builds hand saves to a writer thread over a channel so the
//! simulation step never waits on disk. Queued saves are coalesced and only
//! the newest one is written. A failed write is logged and the next
//! submitted save tries again. On wasm32 there are no threads and the write
//! happens inline.

use super::{BoxedStore, SaveState};

#[cfg(not(target_arch = "wasm32"))]
mod imp {
    use std::sync::mpsc::{self, Receiver, Sender};
    use std::thread::{self, JoinHandle};

    use super::{BoxedStore, SaveState};

    pub struct Writer {
        tx: Option<Sender<SaveState>>,
        handle: Option<JoinHandle<()>>,
    }

    fn run(mut store: BoxedStore, rx: Receiver<SaveState>) {
        while let Ok(mut latest) = rx.recv() {
            while let Ok(newer) = rx.try_recv() {
                latest = newer;
            }
            match store.save(&latest) {
                Ok(()) => log::debug!("Progress saved (best score {})", latest.best_score),
                Err(e) => log::warn!("Autosave failed, will retry on next save: {}", e),
            }
        }
    }

    impl Writer {
        pub fn spawn(store: BoxedStore) -> Self {
            let (tx, rx) = mpsc::channel();
            match thread::Builder::new()
                .name("autosave".into())
                .spawn(move || run(store, rx))
            {
                Ok(handle) => Self {
                    tx: Some(tx),
                    handle: Some(handle),
                },
                Err(e) => {
                    log::warn!("Could not start autosave thread, progress will not be saved: {}", e);
                    Self { tx: None, handle: None }
                }
            }
        }

        pub fn submit(&mut self, state: SaveState) {
            let Some(tx) = &self.tx else {
                return;
            };
            if tx.send(state).is_err() {
                log::warn!("Autosave thread is gone, dropping save");
                self.tx = None;
            }
        }

        /// Close the channel and wait for pending writes
        pub fn shutdown(&mut self) {
            self.tx = None;
            if let Some(handle) = self.handle.take()
                && handle.join().is_err()
            {
                log::warn!("Autosave thread panicked");
            }
        }
    }
}

#[cfg(target_arch = "wasm32")]
mod imp {
    use super::{BoxedStore, SaveState};

    pub struct Writer {
        store: BoxedStore,
    }

    impl Writer {
        pub fn spawn(store: BoxedStore) -> Self {
            Self { store }
        }

        pub fn submit(&mut self, state: SaveState) {
            if let Err(e) = self.store.save(&state) {
                log::warn!("Save failed, will retry on next save: {}", e);
            }
        }

        pub fn shutdown(&mut self) {}
    }
}

/// Non-blocking save sink
pub struct AutoSaver {
    writer: imp::Writer,
}

impl AutoSaver {
    pub fn spawn(store: BoxedStore) -> Self {
        Self {
            writer: imp::Writer::spawn(store),
        }
    }

    /// Queue a save; returns immediately
    pub fn submit(&mut self, state: SaveState) {
        self.writer.submit(state);
    }

    /// Flush pending saves and stop the writer
    pub fn shutdown(&mut self) {
        self.writer.shutdown();
    }
}

impl Drop for AutoSaver {
    fn drop(&mut self) {
        self.writer.shutdown();
    }
}
