use crate::error::SheetLinkError;
use std::fs::File;
use std::io::BufReader;
use std::io::Cursor;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::path::Path;

/// Bytes of a workbook package, read from disk or handed over in memory.
pub(crate) enum PackageSource {
    File(BufReader<File>),
    Bytes(Cursor<Vec<u8>>),
}

impl PackageSource {
    pub(crate) fn open<P: AsRef<Path>>(path: P) -> Result<PackageSource, SheetLinkError> {
        Ok(PackageSource::File(BufReader::new(File::open(path)?)))
    }
}

impl From<Vec<u8>> for PackageSource {
    fn from(bytes: Vec<u8>) -> Self {
        PackageSource::Bytes(Cursor::new(bytes))
    }
}

impl Read for PackageSource {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            PackageSource::File(file) => file.read(buf),
            PackageSource::Bytes(bytes) => bytes.read(buf),
        }
    }
}

impl Seek for PackageSource {
    fn seek(&mut self, position: SeekFrom) -> std::io::Result<u64> {
        match self {
            PackageSource::File(file) => file.seek(position),
            PackageSource::Bytes(bytes) => bytes.seek(position),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_missing_file() {
        assert!(PackageSource::open("Cargo.toml").is_ok());
        assert!(matches!(
            PackageSource::open("missing.xlsx"),
            Err(SheetLinkError::IoError(_))
        ));
    }

    #[test]
    fn seek_in_memory() {
        let mut source = PackageSource::from(b"PK\x03\x04".to_vec());
        source.seek(SeekFrom::End(-2)).unwrap();
        let mut tail = Vec::new();
        source.read_to_end(&mut tail).unwrap();
        assert_eq!(tail, b"\x03\x04");
    }
}
