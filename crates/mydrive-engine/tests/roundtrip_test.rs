//! Integration tests for the full encrypt → store → decrypt path.
//!
//! Each test runs the engine against fresh temp directories and checks that
//! restored files match the originals byte for byte.

use mydrive_core::config::StorageConfig;
use mydrive_engine::CryptoEngine;
use proptest::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn engine(tmp: &TempDir, chunk_size: usize) -> CryptoEngine {
    let storage = StorageConfig {
        metadata_dir: tmp.path().join("keys"),
        chunks_dir: tmp.path().join("output"),
        output_dir: tmp.path().join("restored"),
    };
    CryptoEngine::open(&storage, chunk_size).expect("open engine")
}

fn write_test_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("write test file");
    path
}

#[test]
fn roundtrip_restores_bytes_and_name() {
    let tmp = TempDir::new().unwrap();
    let engine = engine(&tmp, 32);

    let original = b"hello encrypted world! this file will be encrypted, chunked, \
                     stored, reassembled, verified, and decrypted.";
    let src = write_test_file(tmp.path(), "secret.txt", original);

    let result = engine.encrypt(&src).expect("encrypt should succeed");
    assert_eq!(result.original_name, "secret.txt");

    let out = engine
        .decrypt(&result.file_id, None)
        .expect("decrypt should succeed");
    assert_eq!(out.file_name().unwrap(), "secret.txt");
    assert_eq!(std::fs::read(&out).unwrap(), original);
}

#[test]
fn two_and_a_half_megabytes_in_one_megabyte_chunks() {
    let tmp = TempDir::new().unwrap();
    let engine = engine(&tmp, 1024 * 1024);

    let len = 5 * 1024 * 1024 / 2;
    let original: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
    let src = write_test_file(tmp.path(), "big.bin", &original);

    let result = engine.encrypt(&src).expect("encrypt");
    let meta = &result.metadata;

    assert_eq!(meta.chunks.len(), 3);
    let indices: Vec<u64> = meta.chunks.iter().map(|c| c.index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
    assert_eq!(meta.original_size, len as u64);
    assert_eq!(meta.encrypted_size, len as u64 + 16);

    let chunk_files: Vec<_> = std::fs::read_dir(tmp.path().join("output"))
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.starts_with(&result.file_id))
        .collect();
    assert_eq!(chunk_files.len(), 3);
    assert!(chunk_files.contains(&format!("{}_chunk_0002.enc", result.file_id)));

    // file_id is stable across listings
    let first = engine.list().unwrap();
    let second = engine.list().unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].file_id, result.file_id);
    assert_eq!(first, second);

    let out = engine.decrypt(&result.file_id, None).expect("decrypt");
    assert_eq!(std::fs::read(out).unwrap(), original);
}

#[test]
fn empty_file_roundtrips() {
    let tmp = TempDir::new().unwrap();
    let engine = engine(&tmp, 64);
    let src = write_test_file(tmp.path(), "empty.txt", b"");

    let result = engine.encrypt(&src).unwrap();
    let out = engine.decrypt(&result.file_id, None).unwrap();
    assert!(std::fs::read(out).unwrap().is_empty());
}

#[test]
fn record_on_disk_has_expected_shape() {
    let tmp = TempDir::new().unwrap();
    let engine = engine(&tmp, 16);
    let src = write_test_file(tmp.path(), "shape.txt", b"0123456789");

    let result = engine.encrypt(&src).unwrap();
    let path = tmp.path().join("keys").join(format!("{}.json", result.file_id));
    let json: serde_json::Value = serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap();

    assert_eq!(json["file_id"], result.file_id.as_str());
    assert_eq!(json["original_name"], "shape.txt");
    assert_eq!(json["original_size"], 10);
    assert_eq!(json["encrypted_size"], 26);
    assert_eq!(json["encryption"]["algorithm"], "AES-256-GCM");
    assert_eq!(json["encryption"]["key"].as_str().unwrap().len(), 64);
    assert_eq!(json["encryption"]["nonce"].as_str().unwrap().len(), 24);
    assert_eq!(json["encryption"]["key_size_bits"], 256);
    assert_eq!(json["encryption"]["nonce_size_bits"], 96);
    assert_eq!(json["chunks"].as_array().unwrap().len(), 2);
    assert_eq!(json["chunks"][0]["hash"].as_str().unwrap().len(), 64);
    assert!(json["created_at"].as_str().unwrap().ends_with('Z'));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn any_content_any_chunk_size_roundtrips(
        data in proptest::collection::vec(any::<u8>(), 0..=4096),
        chunk_size in 1usize..=512,
    ) {
        let tmp = TempDir::new().unwrap();
        let engine = engine(&tmp, chunk_size);
        let src = write_test_file(tmp.path(), "p.bin", &data);

        let result = engine.encrypt(&src).unwrap();
        prop_assert_eq!(result.chunks.len(), (data.len() + 16).div_ceil(chunk_size));

        let out = engine.decrypt(&result.file_id, Some(&tmp.path().join("back.bin"))).unwrap();
        prop_assert_eq!(std::fs::read(out).unwrap(), data);
    }
}
