//! `SpatiaLite` point BLOB codec.
//!
//! Both position columns hold geometries in `SpatiaLite`'s internal BLOB
//! format, so files written here can be queried with `X()`/`Y()` and the
//! spatial index by any `SpatiaLite`-enabled reader. Encoding is done in
//! process, which keeps the bytes identical whether or not the extension is
//! loaded.
//!
//! ```text
//! offset  size  content
//!      0     1  0x00 start marker
//!      1     1  endianness (0x01 little, 0x00 big)
//!      2     4  SRID (i32)
//!      6    32  MBR min_x, min_y, max_x, max_y (f64)
//!     38     1  0x7C MBR end marker
//!     39     4  geometry class (i32, 1 = POINT)
//!     43    16  x, y (f64)
//!     59     1  0xFE end marker
//! ```

use overlore_types::RealmPosition;

/// Total length of an XY point BLOB.
pub const POINT_BLOB_LEN: usize = 60;

/// SRID used for both position columns.
pub const POINT_SRID: i32 = 0;

const START_MARKER: u8 = 0x00;
const MBR_END_MARKER: u8 = 0x7C;
const END_MARKER: u8 = 0xFE;
const LITTLE_ENDIAN: u8 = 0x01;
const BIG_ENDIAN: u8 = 0x00;
const CLASS_POINT: i32 = 1;

const OFFSET_ENDIAN: usize = 1;
const OFFSET_SRID: usize = 2;
const OFFSET_MBR_END: usize = 38;
const OFFSET_CLASS: usize = 39;
const OFFSET_X: usize = 43;
const OFFSET_Y: usize = 51;
const OFFSET_END: usize = 59;

/// Errors decoding a stored geometry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeometryError {
    /// The BLOB is not the size of an XY point.
    #[error("point blob has {0} bytes, expected {POINT_BLOB_LEN}")]
    BadLength(usize),

    /// A framing byte is wrong.
    #[error("bad marker at offset {offset}: {found:#04x}")]
    BadMarker {
        /// Byte offset of the marker.
        offset: usize,
        /// The byte found there.
        found: u8,
    },

    /// The geometry is not a POINT.
    #[error("unsupported geometry class {0}")]
    UnsupportedClass(i32),

    /// The point belongs to a different spatial reference system.
    #[error("point has SRID {found}, expected {expected}")]
    UnexpectedSrid {
        /// SRID of the column.
        expected: i32,
        /// SRID found in the BLOB.
        found: i32,
    },
}

/// A decoded point geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointGeometry {
    /// Spatial reference id.
    pub srid: i32,
    /// The coordinates.
    pub position: RealmPosition,
}

impl PointGeometry {
    /// The coordinates, provided the point uses `srid`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::UnexpectedSrid`] on a mismatch.
    pub const fn position_in(self, srid: i32) -> Result<RealmPosition, GeometryError> {
        if self.srid == srid {
            Ok(self.position)
        } else {
            Err(GeometryError::UnexpectedSrid {
                expected: srid,
                found: self.srid,
            })
        }
    }
}

/// Encode a position as a little-endian `SpatiaLite` POINT BLOB.
pub fn encode_point(position: RealmPosition, srid: i32) -> Vec<u8> {
    let RealmPosition { x, y } = position;
    let mut blob = vec![START_MARKER, LITTLE_ENDIAN];
    blob.extend_from_slice(&srid.to_le_bytes());
    // A point's MBR is degenerate: min == max.
    for coord in [x, y, x, y] {
        blob.extend_from_slice(&coord.to_le_bytes());
    }
    blob.push(MBR_END_MARKER);
    blob.extend_from_slice(&CLASS_POINT.to_le_bytes());
    blob.extend_from_slice(&x.to_le_bytes());
    blob.extend_from_slice(&y.to_le_bytes());
    blob.push(END_MARKER);
    blob
}

/// Copy `N` bytes starting at `offset`.
fn bytes_at<const N: usize>(blob: &[u8], offset: usize) -> Result<[u8; N], GeometryError> {
    offset
        .checked_add(N)
        .and_then(|end| blob.get(offset..end))
        .and_then(|slice| <[u8; N]>::try_from(slice).ok())
        .ok_or(GeometryError::BadLength(blob.len()))
}

/// Check that the byte at `offset` equals `expected`.
fn expect_marker(blob: &[u8], offset: usize, expected: u8) -> Result<(), GeometryError> {
    let [found] = bytes_at::<1>(blob, offset)?;
    if found == expected {
        Ok(())
    } else {
        Err(GeometryError::BadMarker { offset, found })
    }
}

/// Decode a `SpatiaLite` POINT BLOB of either endianness.
///
/// # Errors
///
/// Returns [`GeometryError`] if the BLOB is not a well-formed XY point.
pub fn decode_point(blob: &[u8]) -> Result<PointGeometry, GeometryError> {
    if blob.len() != POINT_BLOB_LEN {
        return Err(GeometryError::BadLength(blob.len()));
    }
    expect_marker(blob, 0, START_MARKER)?;
    expect_marker(blob, OFFSET_MBR_END, MBR_END_MARKER)?;
    expect_marker(blob, OFFSET_END, END_MARKER)?;

    let [endian] = bytes_at::<1>(blob, OFFSET_ENDIAN)?;
    let little = match endian {
        LITTLE_ENDIAN => true,
        BIG_ENDIAN => false,
        found => {
            return Err(GeometryError::BadMarker {
                offset: OFFSET_ENDIAN,
                found,
            });
        }
    };
    let read_i32 = |offset| -> Result<i32, GeometryError> {
        let raw = bytes_at::<4>(blob, offset)?;
        Ok(if little {
            i32::from_le_bytes(raw)
        } else {
            i32::from_be_bytes(raw)
        })
    };
    let read_f64 = |offset| -> Result<f64, GeometryError> {
        let raw = bytes_at::<8>(blob, offset)?;
        Ok(if little {
            f64::from_le_bytes(raw)
        } else {
            f64::from_be_bytes(raw)
        })
    };

    let class = read_i32(OFFSET_CLASS)?;
    if class != CLASS_POINT {
        return Err(GeometryError::UnsupportedClass(class));
    }
    Ok(PointGeometry {
        srid: read_i32(OFFSET_SRID)?,
        position: RealmPosition::new(read_f64(OFFSET_X)?, read_f64(OFFSET_Y)?),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::float_cmp, clippy::indexing_slicing)]

    use super::*;

    #[test]
    fn encoded_point_has_spatialite_framing() {
        let blob = encode_point(RealmPosition::new(1.0, 2.0), POINT_SRID);
        assert_eq!(blob.len(), POINT_BLOB_LEN);
        assert_eq!(blob[0], 0x00);
        assert_eq!(blob[1], 0x01);
        assert_eq!(blob[38], 0x7C);
        assert_eq!(&blob[39..43], &1_i32.to_le_bytes());
        assert_eq!(blob[59], 0xFE);
    }

    #[test]
    fn decode_recovers_coordinates_and_srid() {
        let blob = encode_point(RealmPosition::new(-12.25, 1e6), 4326);
        let point = decode_point(&blob).unwrap();
        assert_eq!(point.srid, 4326);
        assert_eq!(point.position.as_tuple(), (-12.25, 1e6));
    }

    #[test]
    fn decodes_big_endian_points() {
        let (x, y) = (3.5_f64, -7.0_f64);
        let mut blob = vec![0x00, 0x00];
        blob.extend_from_slice(&0_i32.to_be_bytes());
        for coord in [x, y, x, y] {
            blob.extend_from_slice(&coord.to_be_bytes());
        }
        blob.push(0x7C);
        blob.extend_from_slice(&1_i32.to_be_bytes());
        blob.extend_from_slice(&x.to_be_bytes());
        blob.extend_from_slice(&y.to_be_bytes());
        blob.push(0xFE);

        let point = decode_point(&blob).unwrap();
        assert_eq!(point.position.as_tuple(), (x, y));
    }

    #[test]
    fn position_in_checks_srid() {
        let point = decode_point(&encode_point(RealmPosition::new(2.0, 3.0), 4326)).unwrap();
        assert_eq!(point.position_in(4326).unwrap().as_tuple(), (2.0, 3.0));
        assert_eq!(
            point.position_in(POINT_SRID),
            Err(GeometryError::UnexpectedSrid {
                expected: 0,
                found: 4326
            })
        );
    }

    #[test]
    fn rejects_wrong_length() {
        assert_eq!(decode_point(&[0x00; 12]), Err(GeometryError::BadLength(12)));
    }

    #[test]
    fn rejects_corrupt_markers_and_classes() {
        let mut blob = encode_point(RealmPosition::new(0.0, 0.0), 0);
        blob[59] = 0x00;
        assert!(matches!(
            decode_point(&blob),
            Err(GeometryError::BadMarker { offset: 59, .. })
        ));

        let mut blob = encode_point(RealmPosition::new(0.0, 0.0), 0);
        blob[39..43].copy_from_slice(&2_i32.to_le_bytes());
        assert_eq!(decode_point(&blob), Err(GeometryError::UnsupportedClass(2)));
    }
}
