use assert_cmd::prelude::*;
use std::path::Path;
use std::process::Command;
use tempfile;

type STDRESULT = Result<(), Box<dyn std::error::Error>>;

fn round_trip(base_name: &str, ext: &str, preset: &str) -> STDRESULT {
    let in_path = Path::new("tests").join([base_name, ".", ext].concat());
    let temp_dir = tempfile::tempdir()?;
    let packed_path = temp_dir.path().join([base_name, ".shr"].concat());
    let restored_path = temp_dir.path().join([base_name, ".out"].concat());

    Command::cargo_bin("shrinkler")?
        .arg("compress")
        .arg("-i").arg(&in_path)
        .arg("-o").arg(&packed_path)
        .arg("-p").arg(preset)
        .assert()
        .success();

    Command::cargo_bin("shrinkler")?
        .arg("expand")
        .arg("-i").arg(&packed_path)
        .arg("-o").arg(&restored_path)
        .assert()
        .success();

    let original = std::fs::read(&in_path)?;
    let restored = std::fs::read(&restored_path)?;
    assert_eq!(original, restored, "round trip mismatch for {base_name}.{ext}");

    let packed = std::fs::read(&packed_path)?;
    assert!(!packed.is_empty());
    Ok(())
}

#[test]
fn sample_text_round_trips_at_preset_1() -> STDRESULT {
    round_trip("sample", "txt", "1")
}

#[test]
fn sample_text_round_trips_at_default_preset() -> STDRESULT {
    round_trip("sample", "txt", "3")
}

#[test]
fn empty_file_round_trips() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let empty_path = temp_dir.path().join("empty.bin");
    std::fs::write(&empty_path, b"")?;
    let packed_path = temp_dir.path().join("empty.shr");
    let restored_path = temp_dir.path().join("empty.out");

    Command::cargo_bin("shrinkler")?
        .arg("compress")
        .arg("-i").arg(&empty_path)
        .arg("-o").arg(&packed_path)
        .assert()
        .success();
    Command::cargo_bin("shrinkler")?
        .arg("expand")
        .arg("-i").arg(&packed_path)
        .arg("-o").arg(&restored_path)
        .assert()
        .success();

    assert_eq!(std::fs::read(&restored_path)?, Vec::<u8>::new());
    Ok(())
}

#[test]
fn realistic_corpus_compresses_below_85_percent() -> STDRESULT {
    let in_path = Path::new("tests").join("corpus.txt");
    let temp_dir = tempfile::tempdir()?;
    let packed_path = temp_dir.path().join("corpus.shr");

    Command::cargo_bin("shrinkler")?
        .arg("compress")
        .arg("-i").arg(&in_path)
        .arg("-o").arg(&packed_path)
        .arg("-p").arg("5")
        .assert()
        .success();

    let original_len = std::fs::metadata(&in_path)?.len();
    let packed_len = std::fs::metadata(&packed_path)?.len();
    assert!(
        (packed_len as f64) < 0.85 * (original_len as f64),
        "expected packed size {packed_len} to be under 85% of original size {original_len}"
    );
    Ok(())
}

#[test]
fn rejects_truncated_input() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let bogus_path = temp_dir.path().join("bogus.shr");
    std::fs::write(&bogus_path, b"not a shrinkler stream")?;
    let restored_path = temp_dir.path().join("bogus.out");

    Command::cargo_bin("shrinkler")?
        .arg("expand")
        .arg("-i").arg(&bogus_path)
        .arg("-o").arg(&restored_path)
        .assert()
        .failure();
    Ok(())
}
