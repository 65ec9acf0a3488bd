use std::{
    sync::mpsc::{self, Receiver, Sender, TryRecvError},
    thread::{self, JoinHandle},
};

use eframe::egui::Color32;

use crate::{
    art::{synthesized_disc, ArtImage, ImageSource, Provenance, TrackRef},
    error::{ArtError, Result},
};

enum FetchCommand {
    Fetch {
        request_id: u64,
        track: TrackRef,
        size: u32,
    },
    Shutdown,
}

struct FetchReply {
    request_id: u64,
    track: TrackRef,
    art: ArtImage,
}

/// Background artwork fetcher.
///
/// The wrapped source moves to a worker thread that loops on a command
/// channel. Requests carry a monotonically increasing id and only the reply
/// matching the latest in-flight id is ever surfaced: an older reply whose
/// track no longer matches the newest request is discarded, last write wins,
/// nothing is queued. The worker runs the full degrade chain itself so every
/// reply carries a displayable image.
pub struct ArtWorker {
    command_tx: Sender<FetchCommand>,
    reply_rx: Receiver<FetchReply>,
    handle: Option<JoinHandle<()>>,
    next_request_id: u64,
    inflight: Option<(u64, TrackRef)>,
}

impl ArtWorker {
    pub fn spawn<S>(mut source: S) -> Self
    where
        S: ImageSource + Send + 'static,
    {
        let (command_tx, command_rx) = mpsc::channel();
        let (reply_tx, reply_rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            while let Ok(command) = command_rx.recv() {
                match command {
                    FetchCommand::Fetch {
                        request_id,
                        track,
                        size,
                    } => {
                        let art = match source.get(&track, size) {
                            Some(art) => art,
                            None => match source.default_image(size) {
                                Ok(art) => art,
                                Err(err) => {
                                    tracing::warn!(
                                        track = %track,
                                        error = %err,
                                        "default artwork unavailable, synthesizing"
                                    );
                                    source.synthesize_fallback(size)
                                }
                            },
                        };
                        if reply_tx
                            .send(FetchReply {
                                request_id,
                                track,
                                art,
                            })
                            .is_err()
                        {
                            break;
                        }
                    }
                    FetchCommand::Shutdown => break,
                }
            }
        });

        Self {
            command_tx,
            reply_rx,
            handle: Some(handle),
            next_request_id: 1,
            inflight: None,
        }
    }

    /// Issues a fetch unless one is already in flight for the same track.
    /// A request for a different track supersedes the in-flight one.
    pub fn request(&mut self, track: &TrackRef, size: u32) {
        if self.inflight.as_ref().map(|(_, t)| t) == Some(track) {
            return;
        }

        let request_id = self.next_request_id;
        self.next_request_id = self.next_request_id.wrapping_add(1);
        self.inflight = Some((request_id, track.clone()));

        let _ = self.command_tx.send(FetchCommand::Fetch {
            request_id,
            track: track.clone(),
            size,
        });
    }

    pub fn is_inflight(&self) -> bool {
        self.inflight.is_some()
    }

    /// Drains completed replies, discarding any whose request id is not the
    /// latest in flight. Returns the surviving completion, if any.
    pub fn drain(&mut self) -> Option<(TrackRef, ArtImage)> {
        let mut latest = None;
        loop {
            match self.reply_rx.try_recv() {
                Ok(reply) => {
                    let matches = self
                        .inflight
                        .as_ref()
                        .is_some_and(|(id, _)| *id == reply.request_id);
                    if matches {
                        self.inflight = None;
                        latest = Some((reply.track, reply.art));
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.inflight = None;
                    break;
                }
            }
        }
        latest
    }
}

impl Drop for ArtWorker {
    fn drop(&mut self) {
        let _ = self.command_tx.send(FetchCommand::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Adapts an [`ArtWorker`] into an [`ImageSource`] so the presenter never
/// blocks on retrieval.
///
/// `get` answers immediately: from the ready slot when the completed track
/// matches, otherwise it issues a background fetch and reports a miss so the
/// caller shows a stand-in. Completions surface through `poll`; the
/// presenter's `pump` then re-applies the pending transition. The real
/// default image lives behind the worker, so the synchronous default here
/// fails by contract and the synthesized disc covers the wait.
pub struct AsyncArtSource {
    worker: ArtWorker,
    ready: Option<(TrackRef, ArtImage)>,
    fallback_tint: Color32,
}

impl AsyncArtSource {
    pub fn new<S>(source: S) -> Self
    where
        S: ImageSource + Send + 'static,
    {
        Self {
            worker: ArtWorker::spawn(source),
            ready: None,
            fallback_tint: Color32::from_rgb(0x40, 0x40, 0x40),
        }
    }

    pub fn with_fallback_tint(mut self, tint: Color32) -> Self {
        self.fallback_tint = tint;
        self
    }
}

impl ImageSource for AsyncArtSource {
    fn get(&mut self, track: &TrackRef, size: u32) -> Option<ArtImage> {
        if let Some(reply) = self.worker.drain() {
            self.ready = Some(reply);
        }

        if self.ready.as_ref().is_some_and(|(t, _)| t == track) {
            return self.ready.take().map(|(_, art)| art);
        }

        self.worker.request(track, size);
        None
    }

    fn default_image(&mut self, _size: u32) -> Result<ArtImage> {
        Err(ArtError::PlaceholderUnavailable)
    }

    fn synthesize_fallback(&self, size: u32) -> ArtImage {
        ArtImage::new(
            synthesized_disc(size, self.fallback_tint),
            Provenance::Synthesized,
        )
    }

    fn poll(&mut self) -> Option<TrackRef> {
        if let Some(reply) = self.worker.drain() {
            self.ready = Some(reply);
        }
        self.ready.as_ref().map(|(track, _)| track.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::ColorImage;
    use std::time::{Duration, Instant};

    struct StubSource;

    impl StubSource {
        fn art_for(track: &TrackRef) -> ArtImage {
            // Encode the title length in the image width so replies are
            // distinguishable.
            let side = 4 + track.title.len();
            ArtImage::new(
                ColorImage::new([side, side], vec![Color32::WHITE; side * side]),
                Provenance::Produced,
            )
        }
    }

    impl ImageSource for StubSource {
        fn get(&mut self, track: &TrackRef, _size: u32) -> Option<ArtImage> {
            Some(Self::art_for(track))
        }

        fn default_image(&mut self, _size: u32) -> Result<ArtImage> {
            Err(ArtError::PlaceholderUnavailable)
        }

        fn synthesize_fallback(&self, size: u32) -> ArtImage {
            ArtImage::new(synthesized_disc(size, Color32::GRAY), Provenance::Synthesized)
        }
    }

    fn drain_with_timeout(worker: &mut ArtWorker) -> Option<(TrackRef, ArtImage)> {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if let Some(reply) = worker.drain() {
                return Some(reply);
            }
            thread::sleep(Duration::from_millis(5));
        }
        None
    }

    #[test]
    fn newer_request_supersedes_older_reply() {
        let mut worker = ArtWorker::spawn(StubSource);
        let first = TrackRef::new("One", "", "");
        let second = TrackRef::new("Three", "", "");

        worker.request(&first, 64);
        worker.request(&second, 64);

        let (track, art) = drain_with_timeout(&mut worker).expect("reply within timeout");
        assert_eq!(track, second);
        assert_eq!(art.size()[0], 4 + second.title.len());
        assert!(!worker.is_inflight());
    }

    #[test]
    fn duplicate_request_is_not_reissued() {
        let mut worker = ArtWorker::spawn(StubSource);
        let track = TrackRef::new("Same", "", "");

        worker.request(&track, 64);
        worker.request(&track, 64);

        assert!(drain_with_timeout(&mut worker).is_some());
        // The second request was coalesced, so no further reply arrives.
        thread::sleep(Duration::from_millis(30));
        assert!(worker.drain().is_none());
    }

    #[test]
    fn async_source_misses_then_serves_ready_art() {
        let mut source = AsyncArtSource::new(StubSource);
        let track = TrackRef::new("Song", "", "");

        assert!(source.get(&track, 64).is_none());

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut completed = None;
        while Instant::now() < deadline {
            if let Some(ready) = source.poll() {
                completed = Some(ready);
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(completed.as_ref(), Some(&track));

        let art = source.get(&track, 64).expect("ready art served");
        assert_eq!(art.provenance, Provenance::Produced);
        // The ready slot is consumed.
        assert!(source.poll().is_none());
    }

    #[test]
    fn dropping_worker_joins_cleanly() {
        let worker = ArtWorker::spawn(StubSource);
        drop(worker);
    }
}
