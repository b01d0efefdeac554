use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unexpected end of data at offset {offset:#X} (need {need} bytes, have {have})")]
    TruncatedInput { offset: usize, need: usize, have: usize },

    #[error("offset {offset:#X} is outside of the buffer (length {len:#X})")]
    OutOfBounds { offset: usize, len: usize },

    #[error("corrupt resource file: {0}")]
    CorruptFile(String),

    #[error("{what} {value:#X} does not fit in its field (max {max:#X})")]
    ValueOverflow { what: &'static str, value: usize, max: usize },

    #[error("resource file too big: {what} {value:#X} exceeds {max:#X}")]
    FileTooBig { what: &'static str, value: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<binrw::Error> for Error {
    fn from(e: binrw::Error) -> Self {
        match e {
            binrw::Error::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                // Offsets are filled in by the cursor that owns the record
                Error::TruncatedInput { offset: 0, need: 0, have: 0 }
            }
            e => Error::CorruptFile(e.to_string()),
        }
    }
}
