// SPDX-License-Identifier: PolyForm-Shield-1.0

//! length-prefixed tensor codecs.
//!
//! a byte tensor travels on the wire as one contiguous buffer: for each
//! element, in order, a 4-byte little-endian length followed by that many
//! raw bytes. an empty tensor is an empty buffer — there is no element
//! count and no zero prefix. numeric tensors are densely packed
//! little-endian values with no framing at all.
//!
//! elements are opaque byte strings. the codec never assumes a text
//! encoding; converting elements to UTF-8 is a separate, explicit step via
//! [`utf8_strings`].

use thiserror::Error;

/// width of the per-element length prefix.
pub const PREFIX_SIZE: usize = 4;

/// errors surfaced by the tensor codecs.
///
/// all of these are reported to the caller as values; none are retried
/// internally and none are treated as fatal. a malformed buffer is the
/// caller's to correct.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TensorError {
    /// an element is too long for its length to fit the 4-byte prefix.
    #[error("element {index} is {len} bytes, which does not fit a 4-byte length prefix")]
    ElementTooLarge { index: usize, len: usize },

    /// fewer than four bytes remain where a length prefix is expected.
    #[error("truncated length prefix at offset {offset}: {remaining} byte(s) remain")]
    TruncatedHeader { offset: usize, remaining: usize },

    /// a length prefix claims more bytes than the buffer holds.
    #[error("truncated element at offset {offset}: prefix claims {claimed} bytes, {remaining} remain")]
    TruncatedBody {
        offset: usize,
        claimed: usize,
        remaining: usize,
    },

    /// a fixed-width buffer's length is not a whole number of elements.
    #[error("buffer of {len} bytes is not a whole number of {width}-byte elements")]
    Misaligned { len: usize, width: usize },

    /// an element expected to carry text is not valid UTF-8.
    #[error("element {index} is not valid UTF-8")]
    InvalidUtf8 { index: usize },
}

/// encode a sequence of byte elements into one length-prefixed buffer.
///
/// order and content are preserved exactly; an empty slice encodes to an
/// empty buffer. the only failure mode is an element whose length does not
/// fit the prefix field.
pub fn serialize_bytes_tensor<T: AsRef<[u8]>>(elements: &[T]) -> Result<Vec<u8>, TensorError> {
    if elements.is_empty() {
        return Ok(Vec::new());
    }

    let total: usize = elements
        .iter()
        .map(|e| PREFIX_SIZE + e.as_ref().len())
        .sum();
    let mut buf = Vec::with_capacity(total);

    for (index, element) in elements.iter().enumerate() {
        let bytes = element.as_ref();
        let len = u32::try_from(bytes.len()).map_err(|_| TensorError::ElementTooLarge {
            index,
            len: bytes.len(),
        })?;
        buf.extend_from_slice(&len.to_le_bytes());
        buf.extend_from_slice(bytes);
    }

    Ok(buf)
}

/// decode a length-prefixed buffer back into its byte elements.
///
/// the walk starts at offset zero and must consume the buffer exactly. a
/// partial prefix is a [`TensorError::TruncatedHeader`]; a prefix claiming
/// bytes past the end of the buffer is a [`TensorError::TruncatedBody`]. an
/// empty buffer decodes to an empty sequence.
pub fn deserialize_bytes_tensor(buf: &[u8]) -> Result<Vec<Vec<u8>>, TensorError> {
    let mut elements = Vec::new();
    let mut offset = 0;

    while offset < buf.len() {
        let remaining = buf.len() - offset;
        if remaining < PREFIX_SIZE {
            return Err(TensorError::TruncatedHeader { offset, remaining });
        }

        let claimed = u32::from_le_bytes([
            buf[offset],
            buf[offset + 1],
            buf[offset + 2],
            buf[offset + 3],
        ]) as usize;
        offset += PREFIX_SIZE;

        let remaining = buf.len() - offset;
        if remaining < claimed {
            return Err(TensorError::TruncatedBody {
                offset,
                claimed,
                remaining,
            });
        }

        elements.push(buf[offset..offset + claimed].to_vec());
        offset += claimed;
    }

    Ok(elements)
}

/// convert decoded byte elements into owned strings.
///
/// text conversion is deliberately separate from decoding: the codec itself
/// assumes nothing about element encoding, and callers that transport raw
/// image bytes or JSON blobs never pay for (or trip over) a UTF-8 check.
pub fn utf8_strings(elements: Vec<Vec<u8>>) -> Result<Vec<String>, TensorError> {
    elements
        .into_iter()
        .enumerate()
        .map(|(index, e)| String::from_utf8(e).map_err(|_| TensorError::InvalidUtf8 { index }))
        .collect()
}

/// encode f32 values as densely packed little-endian bytes.
pub fn serialize_f32_tensor(values: &[f32]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(values.len() * 4);
    for v in values {
        buf.extend_from_slice(&v.to_le_bytes());
    }
    buf
}

/// decode densely packed little-endian f32 values.
///
/// a buffer whose length is not a multiple of four is rejected rather than
/// floor-divided; trailing bytes always indicate a framing mistake upstream.
pub fn deserialize_f32_tensor(buf: &[u8]) -> Result<Vec<f32>, TensorError> {
    if buf.len() % 4 != 0 {
        return Err(TensorError::Misaligned {
            len: buf.len(),
            width: 4,
        });
    }
    Ok(buf
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// encode i32 values as densely packed little-endian bytes.
pub fn serialize_i32_tensor(values: &[i32]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(values.len() * 4);
    for v in values {
        buf.extend_from_slice(&v.to_le_bytes());
    }
    buf
}

/// decode densely packed little-endian i32 values.
pub fn deserialize_i32_tensor(buf: &[u8]) -> Result<Vec<i32>, TensorError> {
    if buf.len() % 4 != 0 {
        return Err(TensorError::Misaligned {
            len: buf.len(),
            width: 4,
        });
    }
    Ok(buf
        .chunks_exact(4)
        .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// encode i64 values as densely packed little-endian bytes.
pub fn serialize_i64_tensor(values: &[i64]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(values.len() * 8);
    for v in values {
        buf.extend_from_slice(&v.to_le_bytes());
    }
    buf
}

/// decode densely packed little-endian i64 values.
pub fn deserialize_i64_tensor(buf: &[u8]) -> Result<Vec<i64>, TensorError> {
    if buf.len() % 8 != 0 {
        return Err(TensorError::Misaligned {
            len: buf.len(),
            width: 8,
        });
    }
    Ok(buf
        .chunks_exact(8)
        .map(|c| i64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_preserves_content_and_order() {
        let elements: Vec<&[u8]> = vec![b"first", b"second", b"third"];
        let buf = serialize_bytes_tensor(&elements).unwrap();
        let decoded = deserialize_bytes_tensor(&buf).unwrap();
        assert_eq!(decoded, vec![b"first".to_vec(), b"second".to_vec(), b"third".to_vec()]);
    }

    #[test]
    fn empty_sequence_is_empty_buffer() {
        let elements: Vec<&[u8]> = Vec::new();
        assert_eq!(serialize_bytes_tensor(&elements).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn empty_buffer_is_empty_sequence() {
        assert_eq!(deserialize_bytes_tensor(&[]).unwrap(), Vec::<Vec<u8>>::new());
    }

    #[test]
    fn single_element_layout() {
        // "1:match" is seven ASCII bytes; the buffer is the 4-byte prefix
        // plus the content, eleven bytes in all.
        let buf = serialize_bytes_tensor(&[b"1:match"]).unwrap();
        assert_eq!(buf.len(), 11);
        assert_eq!(&buf[..4], &[0x07, 0x00, 0x00, 0x00]);
        assert_eq!(&buf[4..], b"1:match");
    }

    #[test]
    fn zero_length_elements_roundtrip() {
        let elements: Vec<&[u8]> = vec![b"a", b""];
        let buf = serialize_bytes_tensor(&elements).unwrap();
        assert_eq!(
            buf,
            vec![0x01, 0x00, 0x00, 0x00, b'a', 0x00, 0x00, 0x00, 0x00]
        );
        let decoded = deserialize_bytes_tensor(&buf).unwrap();
        assert_eq!(decoded, vec![b"a".to_vec(), Vec::new()]);
    }

    #[test]
    fn order_is_not_permuted() {
        let buf = serialize_bytes_tensor(&[b"a".as_slice(), b"b".as_slice()]).unwrap();
        let decoded = deserialize_bytes_tensor(&buf).unwrap();
        assert_eq!(decoded, vec![b"a".to_vec(), b"b".to_vec()]);
    }

    #[test]
    fn partial_prefix_is_truncated_header() {
        for len in 1..=3 {
            let buf = vec![0u8; len];
            assert_eq!(
                deserialize_bytes_tensor(&buf),
                Err(TensorError::TruncatedHeader {
                    offset: 0,
                    remaining: len,
                })
            );
        }
    }

    #[test]
    fn stray_bytes_after_valid_record_are_truncated_header() {
        let mut buf = serialize_bytes_tensor(&[b"1:match"]).unwrap();
        buf.extend_from_slice(&[0xff, 0xff]);
        assert_eq!(
            deserialize_bytes_tensor(&buf),
            Err(TensorError::TruncatedHeader {
                offset: 11,
                remaining: 2,
            })
        );
    }

    #[test]
    fn short_body_is_truncated_body() {
        // prefix claims five bytes, only three follow.
        let buf = [0x05, 0x00, 0x00, 0x00, b'a', b'b', b'c'];
        assert_eq!(
            deserialize_bytes_tensor(&buf),
            Err(TensorError::TruncatedBody {
                offset: 4,
                claimed: 5,
                remaining: 3,
            })
        );
    }

    #[test]
    fn arbitrary_binary_content_roundtrips() {
        let elements: Vec<Vec<u8>> = vec![
            vec![0x00, 0xff, 0x01, 0xfe],
            (0..=255u8).collect(),
            Vec::new(),
        ];
        let buf = serialize_bytes_tensor(&elements).unwrap();
        assert_eq!(deserialize_bytes_tensor(&buf).unwrap(), elements);
    }

    #[test]
    fn utf8_conversion_is_explicit_and_checked() {
        let decoded =
            deserialize_bytes_tensor(&serialize_bytes_tensor(&[b"tree"]).unwrap()).unwrap();
        assert_eq!(utf8_strings(decoded).unwrap(), vec!["tree".to_string()]);

        let invalid = vec![vec![0xff, 0xfe]];
        assert_eq!(
            utf8_strings(invalid),
            Err(TensorError::InvalidUtf8 { index: 0 })
        );
    }

    #[test]
    fn f32_roundtrip() {
        let values = [0.0f32, 0.0, 0.0, 0.0, 1.0];
        let buf = serialize_f32_tensor(&values);
        assert_eq!(buf.len(), 20);
        assert_eq!(deserialize_f32_tensor(&buf).unwrap(), values);
    }

    #[test]
    fn f32_trailing_bytes_are_misaligned() {
        let mut buf = serialize_f32_tensor(&[1.0]);
        buf.push(0);
        assert_eq!(
            deserialize_f32_tensor(&buf),
            Err(TensorError::Misaligned { len: 5, width: 4 })
        );
    }

    #[test]
    fn i32_and_i64_roundtrip() {
        let ints = [-1i32, 0, 42];
        assert_eq!(
            deserialize_i32_tensor(&serialize_i32_tensor(&ints)).unwrap(),
            ints
        );
        let longs = [i64::MIN, 0, i64::MAX];
        assert_eq!(
            deserialize_i64_tensor(&serialize_i64_tensor(&longs)).unwrap(),
            longs
        );
        assert_eq!(
            deserialize_i64_tensor(&[0u8; 7]),
            Err(TensorError::Misaligned { len: 7, width: 8 })
        );
    }
}
