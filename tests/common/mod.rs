//! Shared harness for integration tests: a storage client that records every
//! call and can be told to fail specific ones.

#![allow(dead_code)]

use akavelink_gateway::{create_router, AppState, GatewayConfig};
use akavelink_storage::{
    BucketRecord, DownloadSession, FileRecord, MemoryStorageClient, StorageClient, StorageError,
    UploadSession,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::Barrier;
use tokio::time::Instant;

/// One backend call, with its arguments
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    CreateBucket(String),
    DeleteBucket(String),
    ListBuckets,
    ListFiles(String),
    FileInfo(String, String),
    OpenUpload(String, String),
    WriteAndCommit(String, String),
    OpenDownload(String, String),
    ReadInto(String, String),
    DeleteFile(String, String),
}

impl Call {
    pub fn delete_file(bucket: &str, file: &str) -> Self {
        Self::DeleteFile(bucket.to_string(), file.to_string())
    }
}

type ErrorFactory = Box<dyn Fn() -> StorageError + Send + Sync>;

struct Fault {
    call: Call,
    remaining: usize,
    error: ErrorFactory,
}

/// Wraps [`MemoryStorageClient`], recording calls with their (tokio) time
pub struct RecordingClient {
    inner: MemoryStorageClient,
    calls: Mutex<Vec<(Call, Instant)>>,
    faults: Mutex<Vec<Fault>>,
    create_gate: Mutex<Option<Arc<Barrier>>>,
    vanishing: Mutex<Vec<Call>>,
}

impl RecordingClient {
    pub fn new(inner: MemoryStorageClient) -> Arc<Self> {
        Arc::new(Self {
            inner,
            calls: Mutex::new(Vec::new()),
            faults: Mutex::new(Vec::new()),
            create_gate: Mutex::new(None),
            vanishing: Mutex::new(Vec::new()),
        })
    }

    pub fn memory() -> Arc<Self> {
        Self::new(MemoryStorageClient::new())
    }

    pub fn inner(&self) -> &MemoryStorageClient {
        &self.inner
    }

    /// Fail the next `times` calls equal to `call`
    pub fn fail(
        &self,
        call: Call,
        times: usize,
        error: impl Fn() -> StorageError + Send + Sync + 'static,
    ) {
        self.faults.lock().push(Fault {
            call,
            remaining: times,
            error: Box::new(error),
        });
    }

    /// Every create_bucket waits on `barrier` before reaching the backend
    pub fn gate_create_bucket(&self, barrier: Arc<Barrier>) {
        *self.create_gate.lock() = Some(barrier);
    }

    /// The next delete of `bucket/file` removes it but reports it missing,
    /// as if another caller had deleted it first
    pub fn vanish(&self, bucket: &str, file: &str) {
        self.vanishing.lock().push(Call::delete_file(bucket, file));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().iter().map(|(call, _)| call.clone()).collect()
    }

    pub fn timed_calls(&self) -> Vec<(Call, Instant)> {
        self.calls.lock().clone()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().iter().filter(|(call, _)| matches(call)).count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    fn record(&self, call: Call) -> Result<(), StorageError> {
        self.calls.lock().push((call.clone(), Instant::now()));

        let mut faults = self.faults.lock();
        if let Some(fault) = faults
            .iter_mut()
            .find(|fault| fault.call == call && fault.remaining > 0)
        {
            fault.remaining -= 1;
            return Err((fault.error)());
        }
        Ok(())
    }
}

#[async_trait]
impl StorageClient for RecordingClient {
    async fn create_bucket(&self, name: &str) -> Result<BucketRecord, StorageError> {
        let gate = self.create_gate.lock().clone();
        if let Some(barrier) = gate {
            barrier.wait().await;
        }
        self.record(Call::CreateBucket(name.to_string()))?;
        self.inner.create_bucket(name).await
    }

    async fn delete_bucket(&self, name: &str) -> Result<(), StorageError> {
        self.record(Call::DeleteBucket(name.to_string()))?;
        self.inner.delete_bucket(name).await
    }

    async fn list_buckets(&self) -> Result<Vec<BucketRecord>, StorageError> {
        self.record(Call::ListBuckets)?;
        self.inner.list_buckets().await
    }

    async fn list_files(&self, bucket: &str) -> Result<Vec<FileRecord>, StorageError> {
        self.record(Call::ListFiles(bucket.to_string()))?;
        self.inner.list_files(bucket).await
    }

    async fn file_info(&self, bucket: &str, file: &str) -> Result<FileRecord, StorageError> {
        self.record(Call::FileInfo(bucket.to_string(), file.to_string()))?;
        self.inner.file_info(bucket, file).await
    }

    async fn open_upload(&self, bucket: &str, file: &str) -> Result<UploadSession, StorageError> {
        self.record(Call::OpenUpload(bucket.to_string(), file.to_string()))?;
        self.inner.open_upload(bucket, file).await
    }

    async fn write_and_commit(
        &self,
        session: UploadSession,
        source: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<FileRecord, StorageError> {
        self.record(Call::WriteAndCommit(
            session.bucket_name.clone(),
            session.file_name.clone(),
        ))?;
        self.inner.write_and_commit(session, source).await
    }

    async fn open_download(
        &self,
        bucket: &str,
        file: &str,
    ) -> Result<DownloadSession, StorageError> {
        self.record(Call::OpenDownload(bucket.to_string(), file.to_string()))?;
        self.inner.open_download(bucket, file).await
    }

    async fn read_into(
        &self,
        session: DownloadSession,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<u64, StorageError> {
        self.record(Call::ReadInto(
            session.bucket_name.clone(),
            session.file_name.clone(),
        ))?;
        self.inner.read_into(session, sink).await
    }

    async fn delete_file(&self, bucket: &str, file: &str) -> Result<(), StorageError> {
        let call = Call::delete_file(bucket, file);
        self.record(call.clone())?;

        let vanished = {
            let mut vanishing = self.vanishing.lock();
            match vanishing.iter().position(|c| *c == call) {
                Some(i) => {
                    vanishing.remove(i);
                    true
                }
                None => false,
            }
        };
        self.inner.delete_file(bucket, file).await?;
        if vanished {
            return Err(StorageError::FileNotFound {
                bucket: bucket.to_string(),
                file: file.to_string(),
            });
        }
        Ok(())
    }
}

/// Serves downloads that go wrong after bytes have left: `read_into` writes
/// `delivered` bytes and then either fails or stops short. Everything else
/// goes to the wrapped memory backend.
pub struct BrokenStreamClient {
    inner: MemoryStorageClient,
    delivered: usize,
    announced: Option<u64>,
    fail: bool,
}

impl BrokenStreamClient {
    /// Deliver `delivered` bytes, then fail with `Unavailable`; no size is announced
    pub fn failing_after(delivered: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryStorageClient::new(),
            delivered,
            announced: None,
            fail: true,
        })
    }

    /// Announce `announced` bytes but end cleanly after `delivered`
    pub fn short(delivered: usize, announced: u64) -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryStorageClient::new(),
            delivered,
            announced: Some(announced),
            fail: false,
        })
    }

    pub fn inner(&self) -> &MemoryStorageClient {
        &self.inner
    }
}

#[async_trait]
impl StorageClient for BrokenStreamClient {
    async fn create_bucket(&self, name: &str) -> Result<BucketRecord, StorageError> {
        self.inner.create_bucket(name).await
    }

    async fn delete_bucket(&self, name: &str) -> Result<(), StorageError> {
        self.inner.delete_bucket(name).await
    }

    async fn list_buckets(&self) -> Result<Vec<BucketRecord>, StorageError> {
        self.inner.list_buckets().await
    }

    async fn list_files(&self, bucket: &str) -> Result<Vec<FileRecord>, StorageError> {
        self.inner.list_files(bucket).await
    }

    async fn file_info(&self, bucket: &str, file: &str) -> Result<FileRecord, StorageError> {
        self.inner.file_info(bucket, file).await
    }

    async fn open_upload(&self, bucket: &str, file: &str) -> Result<UploadSession, StorageError> {
        self.inner.open_upload(bucket, file).await
    }

    async fn write_and_commit(
        &self,
        session: UploadSession,
        source: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<FileRecord, StorageError> {
        self.inner.write_and_commit(session, source).await
    }

    async fn open_download(
        &self,
        bucket: &str,
        file: &str,
    ) -> Result<DownloadSession, StorageError> {
        self.inner.file_info(bucket, file).await?;
        Ok(DownloadSession::new(bucket, file, self.announced))
    }

    async fn read_into(
        &self,
        _session: DownloadSession,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<u64, StorageError> {
        sink.write_all(&payload(self.delivered)).await?;
        sink.flush().await?;
        if self.fail {
            return Err(StorageError::Unavailable(
                "stream reset mid-transfer".into(),
            ));
        }
        Ok(self.delivered as u64)
    }

    async fn delete_file(&self, bucket: &str, file: &str) -> Result<(), StorageError> {
        self.inner.delete_file(bucket, file).await
    }
}

/// Create `bucket` holding `files`, each containing its own name
pub async fn seed(client: &MemoryStorageClient, bucket: &str, files: &[&str]) {
    client.create_bucket(bucket).await.unwrap();
    for name in files {
        let session = client.open_upload(bucket, name).await.unwrap();
        client
            .write_and_commit(session, &mut name.as_bytes())
            .await
            .unwrap();
    }
}

/// Deterministic pseudo-random payload
pub fn payload(len: usize) -> Vec<u8> {
    use rand::{rngs::StdRng, Rng, SeedableRng};
    let mut rng = StdRng::seed_from_u64(len as u64);
    (0..len).map(|_| rng.gen()).collect()
}

/// Gateway settings for tests: loopback, no pacing, no rate limit
pub fn test_config() -> GatewayConfig {
    GatewayConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        delete_pause_ms: 0,
        rate_limit_rps: 0,
        ..Default::default()
    }
}

/// Spawn the gateway on a random port, returning its base url
pub async fn spawn_server(config: GatewayConfig, client: Arc<dyn StorageClient>) -> String {
    let state = Arc::new(AppState::new(config, client));
    let app = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}
