//! Inference engine seam and the shared slot holding the loaded model.

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};

use ndarray::ArrayView2;
use thiserror::Error;

/// First-break pick for a single trace.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TracePick {
    /// Sample index of the first arrival.
    pub sample: usize,
    /// Engine confidence in `[0, 1]`.
    pub confidence: f32,
}

/// Errors raised by an inference engine.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Failed to read weights {path}: {source}")]
    ReadWeights {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid weights {path}: {reason}")]
    InvalidWeights { path: PathBuf, reason: String },
    #[error("Inference failed: {0}")]
    Inference(String),
}

/// A loaded model able to pick first breaks on one gather at a time.
pub trait PickingModel: Send + Sync {
    /// Pick every trace (column) of `gather`, sampled every `dt_ms` milliseconds.
    fn pick_gather(&self, gather: ArrayView2<'_, f32>, dt_ms: f32)
    -> Result<Vec<TracePick>, ModelError>;

    /// Short name for status messages and logs.
    fn name(&self) -> &str;
}

/// Builds a [`PickingModel`] from a weights file.
pub trait ModelLoader: Send + Sync {
    fn load(&self, weights: &Path) -> Result<ModelHandle, ModelError>;
}

/// Shared, immutable reference to a loaded model.
pub type ModelHandle = Arc<dyn PickingModel>;

/// Single slot holding the currently loaded model, readable from worker threads.
///
/// Writes replace the whole handle under the lock, so readers observe either
/// the previous model or the new one, never a partially built value.
#[derive(Clone, Default)]
pub struct SharedModelHandle {
    slot: Arc<RwLock<Option<ModelHandle>>>,
}

impl SharedModelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `handle`, replacing any previous model.
    pub fn set(&self, handle: ModelHandle) {
        let mut guard = self.slot.write().unwrap_or_else(|err| err.into_inner());
        *guard = Some(handle);
    }

    /// Clone out the current model, if any.
    pub fn get(&self) -> Option<ModelHandle> {
        self.slot
            .read()
            .unwrap_or_else(|err| err.into_inner())
            .clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.slot
            .read()
            .map(|guard| guard.is_some())
            .unwrap_or_else(|err| err.into_inner().is_some())
    }

    pub fn clear(&self) {
        let mut guard = self.slot.write().unwrap_or_else(|err| err.into_inner());
        *guard = None;
    }
}

impl fmt::Debug for SharedModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.get().map(|model| model.name().to_string());
        f.debug_struct("SharedModelHandle")
            .field("model", &name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);

    impl PickingModel for Named {
        fn pick_gather(
            &self,
            gather: ArrayView2<'_, f32>,
            _dt_ms: f32,
        ) -> Result<Vec<TracePick>, ModelError> {
            Ok(vec![
                TracePick {
                    sample: 0,
                    confidence: 1.0
                };
                gather.ncols()
            ])
        }

        fn name(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn starts_empty_and_last_write_wins() {
        let shared = SharedModelHandle::new();
        assert!(!shared.is_loaded());
        assert!(shared.get().is_none());

        shared.set(Arc::new(Named("first")));
        shared.set(Arc::new(Named("second")));
        assert!(shared.is_loaded());
        assert_eq!(shared.get().unwrap().name(), "second");

        shared.clear();
        assert!(!shared.is_loaded());
    }

    #[test]
    fn clones_share_the_same_slot_across_threads() {
        let shared = SharedModelHandle::new();
        let writer = shared.clone();
        std::thread::spawn(move || writer.set(Arc::new(Named("worker"))))
            .join()
            .unwrap();
        assert_eq!(shared.get().unwrap().name(), "worker");
    }

    #[test]
    fn concurrent_readers_only_see_whole_handles() {
        let shared = SharedModelHandle::new();
        let readers = (0..4)
            .map(|_| {
                let shared = shared.clone();
                std::thread::spawn(move || {
                    for _ in 0..1_000 {
                        if let Some(model) = shared.get() {
                            assert!(matches!(model.name(), "a" | "b"));
                        }
                    }
                })
            })
            .collect::<Vec<_>>();
        for idx in 0..1_000 {
            shared.set(Arc::new(Named(if idx % 2 == 0 { "a" } else { "b" })));
        }
        for reader in readers {
            reader.join().unwrap();
        }
    }
}
