use streamvod_protocol::constants::MAX_PARTS;

use crate::TransferError;

/// A contiguous byte range of the source, uploaded as one part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartRange {
    /// 1-indexed part number.
    pub part_number: u32,
    /// First byte of the part.
    pub start: u64,
    /// One past the last byte of the part.
    pub end: u64,
}

impl PartRange {
    /// Number of bytes in the part.
    pub fn size(&self) -> u64 {
        self.end - self.start
    }
}

/// Number of parts needed to cover `total_size` bytes.
pub fn part_count(total_size: u64, part_size: u64) -> Result<u32, TransferError> {
    if total_size == 0 {
        return Err(TransferError::InvalidInput("source is empty".into()));
    }
    if part_size == 0 {
        return Err(TransferError::InvalidInput(
            "part size must be greater than zero".into(),
        ));
    }

    let count = total_size.div_ceil(part_size);
    if count > u64::from(MAX_PARTS) {
        return Err(TransferError::InvalidInput(format!(
            "{total_size} bytes at {part_size} bytes per part needs {count} parts, limit is {MAX_PARTS}"
        )));
    }
    Ok(count as u32)
}

/// Splits `total_size` bytes into ordered parts of `part_size` bytes.
///
/// Every part but the last is exactly `part_size` long; the last holds the
/// remainder. Part numbers run `1..=n` with no gaps. The same inputs always
/// yield the same plan.
pub fn plan_parts(total_size: u64, part_size: u64) -> Result<Vec<PartRange>, TransferError> {
    let count = part_count(total_size, part_size)?;

    let parts = (1..=count)
        .map(|part_number| {
            let start = u64::from(part_number - 1) * part_size;
            let end = start + part_size.min(total_size - start);
            PartRange {
                part_number,
                start,
                end,
            }
        })
        .collect();
    Ok(parts)
}
