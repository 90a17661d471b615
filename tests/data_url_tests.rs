use animthumb::{try_write_data_url, write_data_url, EncodedImage, ImageFormat};
use std::path::PathBuf;

fn scratch(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("animthumb-{}-{}", std::process::id(), name));
    let _ = std::fs::remove_file(&path);
    path
}

#[test]
fn jpeg_data_url_is_written_verbatim() {
    let payload: Vec<u8> = (0u8..=255).cycle().take(1000).collect();
    let url = EncodedImage::from_bytes(ImageFormat::Jpeg, &payload).into_string();
    let dest = scratch("thumb.jpg");

    let returned = write_data_url(&url, &dest);

    assert_eq!(returned, url);
    assert_eq!(std::fs::read(&dest).unwrap(), payload);
}

#[test]
fn existing_file_is_overwritten() {
    let dest = scratch("overwrite.jpg");
    std::fs::write(&dest, b"old contents that are longer than the new ones").unwrap();

    try_write_data_url("data:image/jpeg;base64,/9j/4A==", &dest).unwrap();

    assert_eq!(std::fs::read(&dest).unwrap(), vec![0xFF, 0xD8, 0xFF, 0xE0]);
}

#[test]
fn png_data_url_is_not_persisted() {
    let url = EncodedImage::from_bytes(ImageFormat::Png, b"\x89PNG\r\n\x1a\n").into_string();
    let dest = scratch("thumb.png");

    let returned = write_data_url(&url, &dest);

    assert_eq!(returned, url);
    assert!(!dest.exists());
}

#[test]
fn malformed_input_is_returned_unchanged() {
    let dest = scratch("malformed.jpg");

    assert_eq!(write_data_url("not a data url", &dest), "not a data url");
    assert_eq!(
        write_data_url("data:image/jpeg;base64,***", &dest),
        "data:image/jpeg;base64,***"
    );
    assert!(!dest.exists());
}

#[test]
fn io_failure_is_swallowed() {
    let dest = std::env::temp_dir().join("animthumb-missing-dir").join("nested").join("thumb.jpg");
    let url = "data:image/jpeg;base64,/9j/4A==";

    assert_eq!(write_data_url(url, &dest), url);
    assert!(try_write_data_url(url, &dest).is_err());
}
