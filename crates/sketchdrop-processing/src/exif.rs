//! Minimal EXIF (TIFF) serializer for creation-time stamping.
//!
//! Produces a little-endian TIFF block with IFD0 `DateTime` plus an Exif IFD
//! carrying `DateTimeOriginal` and `DateTimeDigitized`. The block goes into
//! the PNG `eXIf` chunk, which holds the raw TIFF structure without any
//! `Exif\0\0` prefix.

const TAG_DATETIME: u16 = 0x0132;
const TAG_EXIF_IFD_POINTER: u16 = 0x8769;
const TAG_DATETIME_ORIGINAL: u16 = 0x9003;
const TAG_DATETIME_DIGITIZED: u16 = 0x9004;

const TYPE_ASCII: u16 = 2;
const TYPE_LONG: u16 = 4;

/// EXIF datetime strings are exactly 19 characters plus a NUL terminator.
const DATETIME_LEN: u32 = 20;

fn push_u16(buf: &mut Vec<u8>, value: u16) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn push_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn push_entry(buf: &mut Vec<u8>, tag: u16, field_type: u16, count: u32, value: u32) {
    push_u16(buf, tag);
    push_u16(buf, field_type);
    push_u32(buf, count);
    push_u32(buf, value);
}

fn push_datetime(buf: &mut Vec<u8>, datetime: &str) {
    debug_assert_eq!(datetime.len(), 19, "EXIF datetime must be YYYY:MM:DD HH:MM:SS");
    buf.extend_from_slice(datetime.as_bytes());
    buf.push(0);
}

/// Build an EXIF block stamping `datetime` (format `YYYY:MM:DD HH:MM:SS`)
/// into DateTime, DateTimeOriginal and DateTimeDigitized.
pub fn datetime_exif(datetime: &str) -> Vec<u8> {
    // Fixed layout, all offsets precomputed:
    //   0   TIFF header
    //   8   IFD0 (2 entries + next pointer)         -> ends 38
    //   38  DateTime string                          -> ends 58
    //   58  Exif IFD (2 entries + next pointer)      -> ends 88
    //   88  DateTimeOriginal string                  -> ends 108
    //   108 DateTimeDigitized string                 -> ends 128
    const IFD0_OFFSET: u32 = 8;
    const DATETIME_OFFSET: u32 = 38;
    const EXIF_IFD_OFFSET: u32 = 58;
    const ORIGINAL_OFFSET: u32 = 88;
    const DIGITIZED_OFFSET: u32 = 108;

    let mut buf = Vec::with_capacity(128);

    // TIFF header: little-endian marker, magic 42, offset of IFD0.
    buf.extend_from_slice(b"II");
    push_u16(&mut buf, 42);
    push_u32(&mut buf, IFD0_OFFSET);

    // IFD0: DateTime + pointer to the Exif sub-IFD (tags ascending).
    push_u16(&mut buf, 2);
    push_entry(&mut buf, TAG_DATETIME, TYPE_ASCII, DATETIME_LEN, DATETIME_OFFSET);
    push_entry(&mut buf, TAG_EXIF_IFD_POINTER, TYPE_LONG, 1, EXIF_IFD_OFFSET);
    push_u32(&mut buf, 0);

    push_datetime(&mut buf, datetime);

    // Exif IFD: DateTimeOriginal + DateTimeDigitized.
    push_u16(&mut buf, 2);
    push_entry(
        &mut buf,
        TAG_DATETIME_ORIGINAL,
        TYPE_ASCII,
        DATETIME_LEN,
        ORIGINAL_OFFSET,
    );
    push_entry(
        &mut buf,
        TAG_DATETIME_DIGITIZED,
        TYPE_ASCII,
        DATETIME_LEN,
        DIGITIZED_OFFSET,
    );
    push_u32(&mut buf, 0);

    push_datetime(&mut buf, datetime);
    push_datetime(&mut buf, datetime);

    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "2024:06:01 12:30:45";

    #[test]
    fn test_block_layout() {
        let block = datetime_exif(SAMPLE);

        assert_eq!(block.len(), 128);
        assert_eq!(&block[0..2], b"II");
        assert_eq!(u16::from_le_bytes([block[2], block[3]]), 42);
        assert_eq!(u32::from_le_bytes([block[4], block[5], block[6], block[7]]), 8);
        // IFD0 entry count
        assert_eq!(u16::from_le_bytes([block[8], block[9]]), 2);
        // First entry tag is DateTime
        assert_eq!(u16::from_le_bytes([block[10], block[11]]), TAG_DATETIME);
    }

    #[test]
    fn test_datetime_strings_nul_terminated() {
        let block = datetime_exif(SAMPLE);

        for offset in [38usize, 88, 108] {
            assert_eq!(&block[offset..offset + 19], SAMPLE.as_bytes());
            assert_eq!(block[offset + 19], 0);
        }
    }

    #[test]
    fn test_exif_ifd_points_inside_block() {
        let block = datetime_exif(SAMPLE);

        // Second IFD0 entry holds the Exif IFD pointer.
        let value_offset = 10 + 12 + 8;
        let pointer = u32::from_le_bytes([
            block[value_offset],
            block[value_offset + 1],
            block[value_offset + 2],
            block[value_offset + 3],
        ]);
        assert_eq!(pointer, 58);
        // Exif IFD entry count
        assert_eq!(u16::from_le_bytes([block[58], block[59]]), 2);
    }
}
