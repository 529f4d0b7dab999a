//! Contract checks shared by every backend's integration tests.

#![allow(dead_code)]

use bytes::Bytes;
use filestore::storage::{ErrorKind, FileStore};
use futures::TryStreamExt;
use futures::io::{AsyncRead, AsyncWrite};
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

pub const TEST_KEY_PREFIX: &str = "oss-test-images";
pub const TEST_KEY: &str = "oss-test-images/logo.png";

/// Some bytes that are not valid UTF-8, so text handling would show up.
pub fn sample_content() -> Bytes {
    let mut content = b"\x89PNG\r\n\x1a\n".to_vec();
    content.extend((0..4096u32).map(|i| (i * 31 % 251) as u8));
    Bytes::from(content)
}

pub async fn list_all(store: &dyn FileStore, prefix: Option<&str>) -> Vec<String> {
    let mut keys: Vec<String> = store
        .list(prefix)
        .await
        .unwrap()
        .try_collect()
        .await
        .unwrap();
    keys.sort();
    keys
}

/// A source that fails on the first read.
struct BrokenReader;

impl AsyncRead for BrokenReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut [u8],
    ) -> Poll<io::Result<usize>> {
        Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "source closed")))
    }
}

/// A destination that rejects every write.
struct BrokenWriter;

impl AsyncWrite for BrokenWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Poll::Ready(Err(io::Error::new(io::ErrorKind::StorageFull, "disk full")))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

pub async fn round_trip(store: &dyn FileStore) {
    let content = sample_content();
    store.upload_bytes(TEST_KEY, content.clone()).await.unwrap();

    assert_eq!(store.download_bytes(TEST_KEY).await.unwrap(), content);
    store.delete(TEST_KEY).await.unwrap();
}

pub async fn overwrite_replaces_content(store: &dyn FileStore) {
    let key = "txt/overwrite.txt";
    store.upload_bytes(key, Bytes::from_static(b"first version")).await.unwrap();
    store.upload_bytes(key, Bytes::from_static(b"second")).await.unwrap();

    assert_eq!(store.download_bytes(key).await.unwrap(), Bytes::from_static(b"second"));
    assert_eq!(store.size_of(key).await.unwrap(), 6);
    store.delete(key).await.unwrap();
}

pub async fn list_visibility(store: &dyn FileStore) {
    store.upload_bytes(TEST_KEY, sample_content()).await.unwrap();
    store.upload_bytes("txt/test.txt", Bytes::from_static(b"Hello World")).await.unwrap();

    assert_eq!(list_all(store, Some(TEST_KEY_PREFIX)).await, vec![TEST_KEY.to_string()]);
    assert_eq!(list_all(store, Some("oss-test-images/lo")).await, vec![TEST_KEY.to_string()]);
    assert!(list_all(store, Some("missing/")).await.is_empty());

    let everything = list_all(store, None).await;
    assert!(everything.contains(&TEST_KEY.to_string()));
    assert!(everything.contains(&"txt/test.txt".to_string()));

    store.delete(TEST_KEY).await.unwrap();
    store.delete("txt/test.txt").await.unwrap();
    assert!(list_all(store, Some(TEST_KEY_PREFIX)).await.is_empty());
}

pub async fn list_can_stop_early(store: &dyn FileStore) {
    for i in 0..5 {
        store
            .upload_bytes(&format!("early/{}.bin", i), Bytes::from(vec![i as u8]))
            .await
            .unwrap();
    }

    {
        let mut keys = store.list(Some("early/")).await.unwrap();
        let first = keys.try_next().await.unwrap();
        assert!(first.unwrap().starts_with("early/"));
        // Dropped here without draining the rest.
    }

    assert_eq!(list_all(store, Some("early/")).await.len(), 5);
    for i in 0..5 {
        store.delete(&format!("early/{}.bin", i)).await.unwrap();
    }
}

pub async fn upload_from_file_and_reader(store: &dyn FileStore) {
    let content = sample_content();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logo.png");
    std::fs::write(&path, &content).unwrap();

    store.upload_file(TEST_KEY, &path).await.unwrap();
    assert_eq!(store.download_bytes(TEST_KEY).await.unwrap(), content);

    let mut reader: &[u8] = b"streamed content";
    store.upload_reader("txt/stream.txt", &mut reader).await.unwrap();
    assert!(reader.is_empty(), "reader should be drained");
    assert_eq!(
        store.download_bytes("txt/stream.txt").await.unwrap(),
        Bytes::from_static(b"streamed content")
    );

    let err = store
        .upload_file("txt/none.txt", &dir.path().join("does-not-exist"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(!store.exists("txt/none.txt").await.unwrap());

    store.delete(TEST_KEY).await.unwrap();
    store.delete("txt/stream.txt").await.unwrap();
}

pub async fn download_to_writer(store: &dyn FileStore) {
    let content = sample_content();
    store.upload_bytes(TEST_KEY, content.clone()).await.unwrap();

    let mut out = Vec::new();
    store.download_to(TEST_KEY, &mut out).await.unwrap();
    assert_eq!(out, content.to_vec());

    let mut out = Vec::new();
    let err = store.download_to("missing/key.bin", &mut out).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(out.is_empty());

    store.delete(TEST_KEY).await.unwrap();
}

pub async fn caller_stream_failures(store: &dyn FileStore) {
    let err = store
        .upload_reader("txt/broken.txt", &mut BrokenReader)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(!store.exists("txt/broken.txt").await.unwrap());

    store.upload_bytes(TEST_KEY, sample_content()).await.unwrap();
    let err = store.download_to(TEST_KEY, &mut BrokenWriter).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(store.exists(TEST_KEY).await.unwrap());

    store.delete(TEST_KEY).await.unwrap();
}

pub async fn missing_key_failures(store: &dyn FileStore) {
    let err = store.download_bytes("missing/key.bin").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = store.size_of("missing/key.bin").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

pub async fn delete_is_idempotent(store: &dyn FileStore) {
    store.delete("never/uploaded.bin").await.unwrap();
    store.delete("never/uploaded.bin").await.unwrap();
}

pub async fn existence(store: &dyn FileStore) {
    let key = "exists/check.txt";
    assert!(!store.exists(key).await.unwrap());

    store.upload_bytes(key, Bytes::from_static(b"x")).await.unwrap();
    assert!(store.exists(key).await.unwrap());

    store.delete(key).await.unwrap();
    assert!(!store.exists(key).await.unwrap());
}

pub async fn move_semantics(store: &dyn FileStore) {
    let content = sample_content();
    let dest = "oss-test-images/logo2.png";
    store.upload_bytes(TEST_KEY, content.clone()).await.unwrap();

    assert!(store.move_object(TEST_KEY, dest).await.unwrap());
    assert!(store.exists(dest).await.unwrap());
    assert!(!store.exists(TEST_KEY).await.unwrap());
    assert_eq!(store.download_bytes(dest).await.unwrap(), content);

    assert!(!store.move_object("missing/key.bin", "moved/key.bin").await.unwrap());
    assert!(!store.exists("moved/key.bin").await.unwrap());

    store.delete(dest).await.unwrap();
}

pub async fn copy_semantics(store: &dyn FileStore) {
    let content = sample_content();
    let dest = "copies/logo.png";
    store.upload_bytes(TEST_KEY, content.clone()).await.unwrap();

    assert!(store.copy(TEST_KEY, dest).await.unwrap());
    assert!(store.exists(TEST_KEY).await.unwrap());
    assert!(store.exists(dest).await.unwrap());
    assert_eq!(
        store.download_bytes(TEST_KEY).await.unwrap(),
        store.download_bytes(dest).await.unwrap()
    );

    assert!(!store.copy("missing/key.bin", "copies/none.bin").await.unwrap());
    assert!(!store.exists("copies/none.bin").await.unwrap());

    store.delete(TEST_KEY).await.unwrap();
    store.delete(dest).await.unwrap();
}

pub async fn size_accuracy(store: &dyn FileStore) {
    let content = sample_content();
    store.upload_bytes(TEST_KEY, content.clone()).await.unwrap();
    assert_eq!(store.size_of(TEST_KEY).await.unwrap(), content.len() as u64);

    store.upload_bytes("empty.bin", Bytes::new()).await.unwrap();
    assert_eq!(store.size_of("empty.bin").await.unwrap(), 0);

    store.delete(TEST_KEY).await.unwrap();
    store.delete("empty.bin").await.unwrap();
}

/// Run every backend-independent check against `store`.
pub async fn run_contract(store: &dyn FileStore) {
    round_trip(store).await;
    overwrite_replaces_content(store).await;
    list_visibility(store).await;
    list_can_stop_early(store).await;
    upload_from_file_and_reader(store).await;
    download_to_writer(store).await;
    caller_stream_failures(store).await;
    missing_key_failures(store).await;
    delete_is_idempotent(store).await;
    existence(store).await;
    move_semantics(store).await;
    copy_semantics(store).await;
    size_accuracy(store).await;
}
