use actix_web::web;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::path::{Path, PathBuf};

/// Subdirectory of the media root post images are stored in.
pub const POST_IMAGE_DIR: &str = "posts";

/// A file part read out of a multipart submission.
#[derive(Clone, Debug)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<mime::Mime>,
    pub data: Vec<u8>,
}

impl UploadedFile {
    /// Checks the declared type, then decodes the data to reject files that
    /// are not images or are corrupted.
    pub fn is_image(&self) -> bool {
        if let Some(content_type) = &self.content_type {
            if content_type.type_() != mime::IMAGE {
                return false;
            }
        }
        match image::load_from_memory(&self.data) {
            Ok(_) => true,
            Err(e) => {
                log::debug!("is_image: {}: {}", self.filename, e);
                false
            }
        }
    }
}

/// Public URL of a stored media path.
pub fn get_url_for_path(path: &str) -> String {
    format!("/media/{}", path)
}

/// Reduces a client-supplied filename to a safe base name.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();
    let clean: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let clean = clean.trim_start_matches('.');

    if clean.is_empty() {
        "image".to_owned()
    } else {
        clean.to_owned()
    }
}

/// Appends a random suffix to the stem: `cat.png` becomes `cat_Xa9kQ2b.png`.
fn alternate_filename(filename: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(7)
        .map(char::from)
        .collect();
    match filename.rsplit_once('.') {
        Some((stem, ext)) => format!("{}_{}.{}", stem, suffix, ext),
        None => format!("{}_{}", filename, suffix),
    }
}

fn write_new_file(dir: &Path, filename: &str, data: &[u8]) -> std::io::Result<String> {
    std::fs::DirBuilder::new().recursive(true).create(dir)?;

    let mut name = filename.to_owned();
    loop {
        let path: PathBuf = dir.join(&name);
        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(mut file) => {
                std::io::Write::write_all(&mut file, data)?;
                return Ok(name);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                name = alternate_filename(filename);
            }
            Err(e) => return Err(e),
        }
    }
}

/// Writes a post image below the media root and returns its media path,
/// e.g. `posts/cat.png`. Existing files are never overwritten.
pub async fn save_post_image(
    media_root: &Path,
    upload: UploadedFile,
) -> Result<String, actix_web::Error> {
    let dir = media_root.join(POST_IMAGE_DIR);
    let filename = sanitize_filename(&upload.filename);

    let name = web::block(move || write_new_file(&dir, &filename, &upload.data))
        .await?
        .map_err(|e| {
            log::error!("save_post_image: {}", e);
            actix_web::error::ErrorInternalServerError("Could not store the uploaded image.")
        })?;

    Ok(format!("{}/{}", POST_IMAGE_DIR, name))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A complete 1x1 RGBA PNG.
    pub(crate) const SMALL_PNG: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR\x00\x00\x00\x01\x00\x00\x00\x01\x08\x06\x00\x00\x00\x1f\x15\xc4\x89\x00\x00\x00\rIDATx\xdacd`\xf8_\x0f\x00\x02\x87\x01\x80\xebG\xba\x92\x00\x00\x00\x00IEND\xaeB`\x82";

    fn png_upload(data: &[u8]) -> UploadedFile {
        UploadedFile {
            filename: "a.png".to_owned(),
            content_type: Some(mime::IMAGE_PNG),
            data: data.to_vec(),
        }
    }

    #[test]
    fn test_decodable_png_is_image() {
        assert!(png_upload(SMALL_PNG).is_image());
    }

    #[test]
    fn test_corrupted_image_is_rejected() {
        assert!(!png_upload(b"\x89PNG\r\n\x1a\nthis is garbage, not a png").is_image());
        assert!(!png_upload(&SMALL_PNG[..40]).is_image());
        assert!(!png_upload(b"plain text").is_image());
    }

    #[test]
    fn test_declared_type_must_be_image() {
        let mut upload = png_upload(SMALL_PNG);
        assert!(upload.is_image());

        upload.content_type = Some(mime::TEXT_PLAIN);
        assert!(!upload.is_image());
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("cat.png"), "cat.png");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\pics\\my cat.png"), "my_cat.png");
        assert_eq!(sanitize_filename(".htaccess"), "htaccess");
        assert_eq!(sanitize_filename(""), "image");
    }

    #[test]
    fn test_alternate_filename_keeps_extension() {
        let name = alternate_filename("cat.png");
        assert!(name.starts_with("cat_"));
        assert!(name.ends_with(".png"));
        assert_eq!(name.len(), "cat_.png".len() + 7);
    }

    #[test]
    fn test_write_new_file_never_overwrites() {
        let dir = std::env::temp_dir().join(format!("yatube-media-{}", std::process::id()));
        let first = write_new_file(&dir, "same.png", b"one").expect("first write");
        let second = write_new_file(&dir, "same.png", b"two").expect("second write");

        assert_eq!(first, "same.png");
        assert_ne!(second, "same.png");
        assert_eq!(std::fs::read(dir.join(&first)).expect("read"), b"one");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
