//! Wire reader error types.
//!
//! Every failure the reader can hit on an attacker-influenced packet is a
//! typed value here. Callers decide whether a failure poisons the whole
//! reply or only the record that produced it.

use thiserror::Error;

/// Result type alias for wire operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Wire format errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // =========================================================================
    // Cursor Errors
    // =========================================================================
    /// Buffer is too short to contain the expected data.
    #[error("buffer too short: expected at least {expected} bytes, got {actual}")]
    BufferTooShort {
        /// Expected minimum size.
        expected: usize,
        /// Actual buffer size.
        actual: usize,
    },

    /// Buffer overflow during serialization.
    #[error("buffer overflow: cannot write {needed} bytes to buffer with {available} available")]
    BufferOverflow {
        /// Bytes needed to write.
        needed: usize,
        /// Available space in buffer.
        available: usize,
    },

    /// Unexpected end of data while parsing.
    #[error("unexpected end of data at offset {offset}")]
    UnexpectedEof {
        /// Byte offset where EOF was encountered.
        offset: usize,
    },

    /// Invalid data encountered during parsing.
    #[error("invalid data at offset {offset}: {message}")]
    InvalidData {
        /// Byte offset of the invalid data.
        offset: usize,
        /// Description of the error.
        message: String,
    },

    // =========================================================================
    // Domain Name Errors
    // =========================================================================
    /// Label exceeds maximum length of 63 bytes.
    #[error("label too long: {length} bytes exceeds maximum of 63")]
    LabelTooLong {
        /// Actual label length.
        length: usize,
    },

    /// Domain name exceeds maximum length of 255 bytes.
    #[error("name too long: {length} bytes exceeds maximum of 255")]
    NameTooLong {
        /// Actual name length in wire format.
        length: usize,
    },

    /// Empty label in the middle of a domain name.
    #[error("empty label at position {position} (only allowed at end for root)")]
    EmptyLabel {
        /// Position of the empty label.
        position: usize,
    },

    /// Invalid label character.
    #[error("invalid character '{character}' in label at position {position}")]
    InvalidLabelChar {
        /// The invalid character.
        character: char,
        /// Position in the label.
        position: usize,
    },

    /// Reserved label type (`0x40` or `0x80` prefix).
    #[error("reserved label type {label_type:#04x} at offset {offset}")]
    ReservedLabelType {
        /// Offset of the length octet.
        offset: usize,
        /// The offending length octet.
        label_type: u8,
    },

    /// Invalid compression pointer.
    #[error("invalid compression pointer at offset {offset}: points to {target}")]
    InvalidCompressionPointer {
        /// Offset of the pointer.
        offset: usize,
        /// Target offset the pointer references.
        target: usize,
    },

    /// Too many compression pointer jumps.
    #[error("too many compression pointer jumps (>{max_jumps})")]
    TooManyCompressionJumps {
        /// Maximum allowed jumps.
        max_jumps: usize,
    },

    // =========================================================================
    // Record Errors
    // =========================================================================
    /// Declared RDATA length runs past the end of the message.
    #[error("record at offset {offset} declares {rdlength} bytes of RDATA, only {remaining} remain")]
    RecordOverrun {
        /// Offset of the RDATA.
        offset: usize,
        /// Declared RDLENGTH.
        rdlength: usize,
        /// Bytes left in the message.
        remaining: usize,
    },

    /// RDATA length mismatch.
    #[error("RDATA length mismatch for {rtype}: expected {expected}, got {actual}")]
    RDataLengthMismatch {
        /// Record type.
        rtype: String,
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// Invalid RDATA content.
    #[error("invalid RDATA for {rtype}: {message}")]
    InvalidRData {
        /// Record type.
        rtype: String,
        /// Error description.
        message: String,
    },

    // =========================================================================
    // Message Errors
    // =========================================================================
    /// Message has no question section.
    #[error("message has no question")]
    MissingQuestion,

    /// Message ID mismatch.
    #[error("message ID mismatch: expected {expected}, got {actual}")]
    MessageIdMismatch {
        /// Expected message ID.
        expected: u16,
        /// Actual message ID.
        actual: u16,
    },
}

impl Error {
    /// Creates a new `BufferTooShort` error.
    #[inline]
    pub fn buffer_too_short(expected: usize, actual: usize) -> Self {
        Self::BufferTooShort { expected, actual }
    }

    /// Creates a new `BufferOverflow` error.
    #[inline]
    pub fn buffer_overflow(needed: usize, available: usize) -> Self {
        Self::BufferOverflow { needed, available }
    }

    /// Creates a new `UnexpectedEof` error.
    #[inline]
    pub fn unexpected_eof(offset: usize) -> Self {
        Self::UnexpectedEof { offset }
    }

    /// Creates a new `InvalidData` error.
    #[inline]
    pub fn invalid_data(offset: usize, message: impl Into<String>) -> Self {
        Self::InvalidData {
            offset,
            message: message.into(),
        }
    }

    /// Creates a new `LabelTooLong` error.
    #[inline]
    pub fn label_too_long(length: usize) -> Self {
        Self::LabelTooLong { length }
    }

    /// Creates a new `NameTooLong` error.
    #[inline]
    pub fn name_too_long(length: usize) -> Self {
        Self::NameTooLong { length }
    }

    /// Creates a new `RecordOverrun` error.
    #[inline]
    pub fn record_overrun(offset: usize, rdlength: usize, remaining: usize) -> Self {
        Self::RecordOverrun {
            offset,
            rdlength,
            remaining,
        }
    }

    /// Creates a new `RDataLengthMismatch` error.
    #[inline]
    pub fn rdata_length(rtype: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::RDataLengthMismatch {
            rtype: rtype.into(),
            expected,
            actual,
        }
    }

    /// Creates a new `InvalidRData` error.
    #[inline]
    pub fn invalid_rdata(rtype: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRData {
            rtype: rtype.into(),
            message: message.into(),
        }
    }

    /// Returns true if the error came from a byte layout that cannot be trusted.
    #[inline]
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::BufferTooShort { .. }
                | Self::UnexpectedEof { .. }
                | Self::InvalidData { .. }
                | Self::ReservedLabelType { .. }
                | Self::InvalidCompressionPointer { .. }
                | Self::TooManyCompressionJumps { .. }
                | Self::RecordOverrun { .. }
        )
    }

    /// Returns true if the error is confined to a single record's payload.
    ///
    /// The record can be skipped because its length field was still
    /// trustworthy.
    #[inline]
    pub fn is_payload_error(&self) -> bool {
        matches!(
            self,
            Self::RDataLengthMismatch { .. } | Self::InvalidRData { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::buffer_too_short(12, 8);
        assert_eq!(
            err.to_string(),
            "buffer too short: expected at least 12 bytes, got 8"
        );

        let err = Error::record_overrun(40, 200, 16);
        assert_eq!(
            err.to_string(),
            "record at offset 40 declares 200 bytes of RDATA, only 16 remain"
        );
    }

    #[test]
    fn test_error_classification() {
        assert!(Error::buffer_too_short(10, 5).is_malformed());
        assert!(Error::TooManyCompressionJumps { max_jumps: 128 }.is_malformed());
        assert!(Error::record_overrun(0, 10, 2).is_malformed());
        assert!(!Error::record_overrun(0, 10, 2).is_payload_error());
        assert!(Error::invalid_rdata("TXT", "overrun").is_payload_error());
        assert!(Error::rdata_length("A", 4, 3).is_payload_error());
    }
}
