use std::{
    io,
    path::{Path, PathBuf},
};
use time::OffsetDateTime;

pub const PUBLIC_MEDIA_PATH: &str = "/media/post-images";

const EXTENSION_MAX_LEN: usize = 8;

/// On-disk blob storage for uploaded post images, served back statically
/// under [`PUBLIC_MEDIA_PATH`].
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct MediaStore {
    root: PathBuf,
    public_base_url: Option<String>,
}

impl MediaStore {
    pub fn new(root: PathBuf, public_base_url: Option<String>) -> io::Result<Self> {
        std::fs::create_dir_all(&root)?;

        Ok(Self {
            root,
            public_base_url,
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stores the blob under a name derived from the current time and the
    /// original file extension, and returns its publicly resolvable url.
    /// Two uploads within the same millisecond overwrite each other; the
    /// last write wins.
    pub async fn store(&self, original_file_name: Option<&str>, bytes: &[u8]) -> io::Result<String> {
        let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        let name = blob_name(millis, original_file_name);

        tokio::fs::write(self.root.join(&name), bytes).await?;

        Ok(self.public_url(&name))
    }

    #[must_use]
    pub fn public_url(&self, name: &str) -> String {
        match &self.public_base_url {
            Some(base) => format!("{}{PUBLIC_MEDIA_PATH}/{name}", base.trim_end_matches('/')),
            None => format!("{PUBLIC_MEDIA_PATH}/{name}"),
        }
    }
}

fn blob_name(millis: i128, original_file_name: Option<&str>) -> String {
    match sanitized_extension(original_file_name) {
        Some(extension) => format!("{millis}.{extension}"),
        None => millis.to_string(),
    }
}

fn sanitized_extension(file_name: Option<&str>) -> Option<String> {
    let (_, extension) = file_name?.rsplit_once('.')?;
    let extension: String = extension
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(EXTENSION_MAX_LEN)
        .collect::<String>()
        .to_ascii_lowercase();

    (!extension.is_empty()).then_some(extension)
}

#[cfg(test)]
mod tests {
    use crate::server::media::{MediaStore, blob_name, sanitized_extension};
    use std::path::PathBuf;

    #[test]
    fn blob_names_carry_the_sanitized_extension() {
        assert_eq!(
            blob_name(1_700_000_000_000, Some("holiday.JPG")),
            "1700000000000.jpg"
        );
        assert_eq!(
            blob_name(1_700_000_000_000, Some("archive.tar.gz")),
            "1700000000000.gz"
        );
        assert_eq!(
            blob_name(1_700_000_000_000, Some("no-extension")),
            "1700000000000"
        );
        assert_eq!(blob_name(1_700_000_000_000, None), "1700000000000");
    }

    #[test]
    fn extensions_are_reduced_to_alphanumerics() {
        assert_eq!(
            sanitized_extension(Some("evil.p/n:g")),
            Some("png".to_owned())
        );
        assert_eq!(sanitized_extension(Some("dots.only....")), None);
        assert_eq!(sanitized_extension(Some("trailing.")), None);
        assert_eq!(
            sanitized_extension(Some("a.verylongextension")),
            Some("verylong".to_owned())
        );
    }

    #[test]
    fn public_urls_join_with_the_base() {
        let relative = MediaStore {
            root: PathBuf::from("/tmp/media"),
            public_base_url: None,
        };
        assert_eq!(
            relative.public_url("17.png"),
            "/media/post-images/17.png"
        );

        let absolute = MediaStore {
            root: PathBuf::from("/tmp/media"),
            public_base_url: Some("https://waypost.example/".to_owned()),
        };
        assert_eq!(
            absolute.public_url("17.png"),
            "https://waypost.example/media/post-images/17.png"
        );
    }
}
