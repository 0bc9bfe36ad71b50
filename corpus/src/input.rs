use std::fs::File;
use std::io::Read;
use std::path::Path;

use zstd::stream::read::Decoder as ZstdDecoder;

use crate::error::CorpusError;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Compression {
    /// Zstd for `.zst` paths, plain otherwise.
    Auto,
    Plain,
    Zstd,
}

impl Compression {
    fn resolve(self, path: &Path) -> Self {
        match self {
            Compression::Auto => {
                if path.extension().is_some_and(|ext| ext == "zst") {
                    Compression::Zstd
                } else {
                    Compression::Plain
                }
            }
            other => other,
        }
    }
}

/// Open `path` as a forward-only byte stream, decompressing zstd frames
/// incrementally as they are read.
pub fn open_input(
    path: &Path,
    compression: Compression,
) -> Result<Box<dyn Read + Send>, CorpusError> {
    let open_error = |source| CorpusError::Open {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(open_error)?;

    match compression.resolve(path) {
        Compression::Zstd => ZstdDecoder::new(file)
            .map(|decoder| Box::new(decoder) as Box<dyn Read + Send>)
            .map_err(open_error),
        _ => Ok(Box::new(file)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_auto_detects_zstd_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lines.txt.zst");
        let compressed = zstd::stream::encode_all("hello\nworld\n".as_bytes(), 3).unwrap();
        File::create(&path).unwrap().write_all(&compressed).unwrap();

        let mut text = String::new();
        open_input(&path, Compression::Auto)
            .unwrap()
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, "hello\nworld\n");
    }

    #[test]
    fn test_plain_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lines.txt");
        File::create(&path).unwrap().write_all(b"plain\n").unwrap();

        let mut text = String::new();
        open_input(&path, Compression::Auto)
            .unwrap()
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, "plain\n");
    }

    #[test]
    fn test_missing_file_is_open_error() {
        let result = open_input(Path::new("/nonexistent/corpus.zst"), Compression::Auto);
        assert!(matches!(result, Err(CorpusError::Open { .. })));
    }
}
