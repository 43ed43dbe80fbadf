//! Background model loading.
//!
//! One worker thread decodes queued sources strictly in submission order, so
//! at most one decode is in flight. Everything CPU heavy that depends only on
//! the file (transform baking, index validation, preview proxies) happens on
//! the worker; the main thread only registers the prepared result.

use std::collections::VecDeque;
use std::sync::mpsc;
use std::sync::Arc;

use glam::Vec3;

use super::decoder::{DecodedModel, ModelDecoder, ModelSource};
use crate::error::StrataError;
use crate::options::PreviewStrategy;
use crate::preview::PreviewProxy;
use crate::scene::{Geometry, ModelId, NewPart};

enum LoadRequest {
    Load {
        model: ModelId,
        source: ModelSource,
        preview: Option<PreviewStrategy>,
    },
    Shutdown,
}

/// A decoded model ready for registration.
#[derive(Debug)]
pub struct PreparedModel {
    /// Id reserved when the load was queued.
    pub model: ModelId,
    /// Source GUID.
    pub guid: String,
    /// Display name.
    pub name: String,
    /// World-space parts in file order.
    pub parts: Vec<NewPart>,
    /// Bounding proxy, when previews are enabled.
    pub preview: Option<PreviewProxy>,
}

/// Outcome of one queued load.
#[derive(Debug)]
pub enum LoadResult {
    /// Decoded and prepared.
    Ready(PreparedModel),
    /// The decoder rejected the file.
    Failed {
        /// Model whose load failed.
        model: ModelId,
        /// Decoder-supplied reason.
        reason: String,
    },
}

impl LoadResult {
    /// Model the result belongs to.
    #[must_use]
    pub fn model(&self) -> ModelId {
        match self {
            Self::Ready(prepared) => prepared.model,
            Self::Failed { model, .. } => *model,
        }
    }
}

/// Serialized loader worker.
pub struct LoadQueue {
    request_tx: mpsc::Sender<LoadRequest>,
    result_rx: mpsc::Receiver<LoadResult>,
    /// Submitted, not yet received, in submission order.
    pending: VecDeque<ModelId>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl std::fmt::Debug for LoadQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadQueue")
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

impl LoadQueue {
    /// Spawn the loader thread.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::ThreadSpawn`] if the thread fails to spawn.
    pub fn new(decoder: impl ModelDecoder) -> Result<Self, StrataError> {
        let (request_tx, request_rx) = mpsc::channel::<LoadRequest>();
        let (result_tx, result_rx) = mpsc::channel::<LoadResult>();

        let thread = std::thread::Builder::new()
            .name("model-loader".into())
            .spawn(move || {
                Self::thread_loop(decoder, &request_rx, &result_tx);
            })
            .map_err(StrataError::ThreadSpawn)?;

        Ok(Self {
            request_tx,
            result_rx,
            pending: VecDeque::new(),
            thread: Some(thread),
        })
    }

    /// Queue a source for decoding (non-blocking).
    ///
    /// A worker that died mid-queue is not an error here; its loads surface
    /// later as [`LoadResult::Failed`].
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::InvalidState`] after [`Self::shutdown`].
    pub fn submit(
        &mut self,
        model: ModelId,
        source: ModelSource,
        preview: Option<PreviewStrategy>,
    ) -> Result<(), StrataError> {
        if self.thread.is_none() {
            return Err(StrataError::InvalidState("load queued after loader shutdown"));
        }
        self.pending.push_back(model);
        if self
            .request_tx
            .send(LoadRequest::Load {
                model,
                source,
                preview,
            })
            .is_err()
        {
            log::error!("loader thread is gone; {model} will fail");
        }
        Ok(())
    }

    /// Number of loads submitted but not yet received.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    /// Models still waiting for a result, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = ModelId> + '_ {
        self.pending.iter().copied()
    }

    /// Non-blocking check for the next finished load.
    pub fn try_recv(&mut self) -> Option<LoadResult> {
        match self.result_rx.try_recv() {
            Ok(result) => Some(self.accept(result)),
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => self.fail_next(),
        }
    }

    /// Block until the next load finishes. `None` when nothing is queued.
    pub fn recv(&mut self) -> Option<LoadResult> {
        if self.pending.is_empty() {
            return None;
        }
        match self.result_rx.recv() {
            Ok(result) => Some(self.accept(result)),
            Err(mpsc::RecvError) => self.fail_next(),
        }
    }

    /// Shut down the loader thread and wait for it to finish.
    pub fn shutdown(&mut self) {
        let _ = self.request_tx.send(LoadRequest::Shutdown);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }

    fn accept(&mut self, result: LoadResult) -> LoadResult {
        if self.pending.front() == Some(&result.model()) {
            let _ = self.pending.pop_front();
        } else {
            self.pending.retain(|m| *m != result.model());
        }
        result
    }

    /// A dead worker (decoder panic) fails the remaining loads one by one.
    fn fail_next(&mut self) -> Option<LoadResult> {
        let model = self.pending.pop_front()?;
        log::error!("loader thread stopped before finishing {model}");
        Some(LoadResult::Failed {
            model,
            reason: "loader thread stopped".to_owned(),
        })
    }

    fn thread_loop(
        mut decoder: impl ModelDecoder,
        request_rx: &mpsc::Receiver<LoadRequest>,
        result_tx: &mpsc::Sender<LoadResult>,
    ) {
        while let Ok(request) = request_rx.recv() {
            let LoadRequest::Load {
                model,
                source,
                preview,
            } = request
            else {
                break;
            };
            let result = match decoder.decode(&source) {
                Ok(decoded) => {
                    LoadResult::Ready(prepare(model, source, decoded, preview))
                }
                Err(reason) => LoadResult::Failed { model, reason },
            };
            if result_tx.send(result).is_err() {
                break;
            }
        }
    }
}

impl Drop for LoadQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Bake transforms, drop malformed triangles and build the preview proxy.
fn prepare(
    model: ModelId,
    source: ModelSource,
    decoded: DecodedModel,
    preview: Option<PreviewStrategy>,
) -> PreparedModel {
    let mut dropped = 0_usize;
    let parts: Vec<NewPart> = decoded
        .parts
        .into_iter()
        .map(|part| {
            let world = part.geometry.transformed(&part.transform);
            let vertex_count = world.positions.len();
            let indices: Vec<u32> = world
                .indices
                .chunks_exact(3)
                .filter(|tri| tri.iter().all(|&i| (i as usize) < vertex_count))
                .flatten()
                .copied()
                .collect();
            dropped += world.indices.len() - indices.len();
            NewPart {
                name: part.name,
                geometry: Arc::new(Geometry::new(world.positions, indices)),
                base: part.appearance,
            }
        })
        .collect();
    if dropped > 0 {
        log::warn!("{model}: dropped {dropped} malformed indices");
    }

    let preview = preview.and_then(|strategy| {
        let points: Vec<Vec3> = parts
            .iter()
            .flat_map(|p| p.geometry.positions.iter().copied())
            .collect();
        PreviewProxy::build(strategy, &points)
    });

    log::debug!(
        "prepared {model} '{}': {} parts",
        source.name,
        parts.len()
    );
    PreparedModel {
        model,
        guid: source.guid,
        name: source.name,
        parts,
        preview,
    }
}
