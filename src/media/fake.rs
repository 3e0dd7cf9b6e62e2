//! In-memory media store for tests: hands out deterministic URLs and
//! counts uploads so tests can assert that no upload happened.

use super::{MediaError, MediaStore};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Default)]
pub struct FakeMediaStore {
    uploads: AtomicUsize,
}

impl FakeMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaStore for FakeMediaStore {
    async fn upload_image(&self, _bytes: Vec<u8>) -> Result<String, MediaError> {
        let n = self.uploads.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("https://media.test/evote/img-{n}"))
    }
}
