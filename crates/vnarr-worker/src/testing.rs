//! In-memory collaborators for tests.

use std::collections::{HashMap, VecDeque};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};

use vnarr_cache::{CacheResult, CaptionCache, ProgressPublisher};
use vnarr_media::{FrameSampling, MediaError};
use vnarr_models::{frame_file_name, CaptionResult, ProgressEvent};
use vnarr_storage::{ObjectInfo, ObjectStore, StorageError, StorageResult};
use vnarr_vision::{ChatReply, ChatRequest, VisionError, VisionModel, VisionResult};

use crate::captioner::ImageFetcher;
use crate::error::WorkerResult;
use crate::extractor::FrameExtractor;

/// Object store keeping objects in insertion order.
pub struct MemoryStore {
    base_url: String,
    objects: Mutex<Vec<(String, Vec<u8>, String)>>,
    fail_puts: AtomicBool,
}

impl MemoryStore {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            objects: Mutex::new(Vec::new()),
            fail_puts: AtomicBool::new(false),
        }
    }

    pub fn insert(&self, key: &str, data: &[u8]) {
        self.objects
            .lock()
            .unwrap()
            .push((key.to_string(), data.to_vec(), "application/octet-stream".to_string()));
    }

    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub fn object(&self, key: &str) -> Option<(Vec<u8>, String)> {
        self.objects
            .lock()
            .unwrap()
            .iter()
            .find(|(k, _, _)| k == key)
            .map(|(_, data, ct)| (data.clone(), ct.clone()))
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().iter().map(|(k, _, _)| k.clone()).collect()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put_bytes(&self, key: &str, data: Vec<u8>, content_type: &str) -> StorageResult<()> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(StorageError::upload_failed(format!("{}: bucket unavailable", key)));
        }
        let mut objects = self.objects.lock().unwrap();
        objects.retain(|(k, _, _)| k != key);
        objects.push((key.to_string(), data, content_type.to_string()));
        Ok(())
    }

    async fn list_objects(&self, prefix: &str) -> StorageResult<Vec<ObjectInfo>> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _, _)| k.starts_with(prefix))
            .map(|(k, data, _)| ObjectInfo {
                key: k.clone(),
                size: data.len() as u64,
                last_modified: None,
            })
            .collect())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }
}

#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CaptionResult>>,
}

#[async_trait]
impl CaptionCache for MemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<CaptionResult>> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, result: &CaptionResult) -> CacheResult<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(result.key.clone(), result.clone());
        Ok(())
    }

    async fn expire(&self, key: &str, seconds: u64) -> CacheResult<()> {
        if let Some(entry) = self.entries.lock().unwrap().get_mut(key) {
            entry.ttl_seconds = Some(seconds);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingPublisher {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn payloads(&self, channel: &str) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|e| e.channel == channel)
            .map(|e| e.payload)
            .collect()
    }
}

#[async_trait]
impl ProgressPublisher for RecordingPublisher {
    async fn publish(&self, event: &ProgressEvent) -> CacheResult<()> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// Vision model answering from a script; fails once the script runs out.
pub struct ScriptedVision {
    replies: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedVision {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl VisionModel for ScriptedVision {
    async fn chat(&self, request: ChatRequest) -> VisionResult<ChatReply> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .map(|text| ChatReply { text })
            .ok_or(VisionError::Status {
                status: 503,
                body: "model unavailable".to_string(),
            })
    }
}

pub struct StaticFetcher(Vec<u8>);

impl StaticFetcher {
    pub fn new(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

#[async_trait]
impl ImageFetcher for StaticFetcher {
    async fn fetch(&self, _url: &str) -> WorkerResult<Vec<u8>> {
        Ok(self.0.clone())
    }
}

/// Extractor whose video decodes to nothing.
pub struct EmptyExtractor;

#[async_trait]
impl FrameExtractor for EmptyExtractor {
    async fn extract(&self, _video: &Path, _dest: &Path, _sampling: FrameSampling) -> WorkerResult<()> {
        Ok(())
    }
}

/// Extractor whose first decode dies after writing two frames; later
/// decodes write `count` frames.
pub struct FlakyExtractor {
    count: usize,
    calls: AtomicUsize,
}

impl FlakyExtractor {
    pub fn new(count: usize) -> Self {
        Self {
            count,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FrameExtractor for FlakyExtractor {
    async fn extract(&self, video: &Path, dest: &Path, _sampling: FrameSampling) -> WorkerResult<()> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            write_frames(dest, 2);
            return Err(MediaError::extraction(video, "decoder exited with status 1").into());
        }
        write_frames(dest, self.count);
        Ok(())
    }
}

/// Write `count` small PNG frames named the way the extractor names them.
pub fn write_frames(dir: &Path, count: usize) -> Vec<PathBuf> {
    std::fs::create_dir_all(dir).unwrap();
    (1..=count)
        .map(|ordinal| {
            let shade = (ordinal * 10 % 256) as u8;
            let path = dir.join(frame_file_name(ordinal as u32));
            RgbImage::from_pixel(16, 9, Rgb([shade, 255 - shade, 128]))
                .save(&path)
                .unwrap();
            path
        })
        .collect()
}

/// A tiny PNG as base64.
pub fn png_base64() -> String {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([200, 40, 40])));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
        .unwrap();
    STANDARD.encode(bytes)
}
