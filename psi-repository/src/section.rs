//! PSI section header parsing.
//!
//! Display routines and table factories receive a [`PsiSection`]: the
//! common header decoded, the payload between header and CRC left raw.

use crate::error::SectionError;
use crate::ids::Tid;

/// PSI section header (common to all PSI tables).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PsiHeader {
    /// Table ID.
    pub table_id: Tid,
    /// Section syntax indicator.
    pub section_syntax_indicator: bool,
    /// Section length (12 bits).
    pub section_length: u16,
    /// Table ID extension (for long sections).
    pub table_id_extension: u16,
    /// Version number (5 bits).
    pub version_number: u8,
    /// Current/next indicator.
    pub current_next_indicator: bool,
    /// Section number.
    pub section_number: u8,
    /// Last section number.
    pub last_section_number: u8,
}

/// A parsed PSI section.
#[derive(Debug, Clone)]
pub struct PsiSection<'a> {
    /// Section header.
    pub header: PsiHeader,
    /// Section data (after header, before CRC for long sections).
    pub data: &'a [u8],
    /// CRC32 value, zero for short sections.
    pub crc32: u32,
}

impl<'a> PsiSection<'a> {
    /// Parse a PSI section from raw bytes starting at the table id.
    ///
    /// Short sections (TDT, TOT, ST) have no CRC of their own in the
    /// payload sense: everything after the 3-byte header is data. TOT does
    /// end with a CRC, which is left in `data` for the table to check.
    pub fn parse(data: &'a [u8]) -> Result<Self, SectionError> {
        if data.len() < 3 {
            return Err(SectionError::TooShort);
        }

        let table_id = data[0];
        let section_syntax_indicator = data[1] & 0x80 != 0;
        let section_length = ((data[1] as u16 & 0x0F) << 8) | data[2] as u16;

        let total_length = 3 + section_length as usize;
        if data.len() < total_length {
            return Err(SectionError::Incomplete {
                expected: total_length,
                actual: data.len(),
            });
        }

        if !section_syntax_indicator {
            return Ok(PsiSection {
                header: PsiHeader {
                    table_id,
                    section_syntax_indicator,
                    section_length,
                    table_id_extension: 0,
                    version_number: 0,
                    current_next_indicator: true,
                    section_number: 0,
                    last_section_number: 0,
                },
                data: &data[3..total_length],
                crc32: 0,
            });
        }

        // Extended header (5 bytes) + CRC (4 bytes)
        if section_length < 9 {
            return Err(SectionError::LengthTooSmall(section_length));
        }
        if data.len() < 8 {
            return Err(SectionError::TooShortForLongHeader);
        }

        let header = PsiHeader {
            table_id,
            section_syntax_indicator,
            section_length,
            table_id_extension: ((data[3] as u16) << 8) | data[4] as u16,
            version_number: (data[5] >> 1) & 0x1F,
            current_next_indicator: data[5] & 0x01 != 0,
            section_number: data[6],
            last_section_number: data[7],
        };

        let crc_offset = total_length - 4;
        let crc32 = u32::from_be_bytes([
            data[crc_offset],
            data[crc_offset + 1],
            data[crc_offset + 2],
            data[crc_offset + 3],
        ]);

        Ok(PsiSection {
            header,
            data: &data[8..crc_offset],
            crc32,
        })
    }

    /// Verify CRC32 of the section against the raw bytes it was parsed from.
    pub fn verify_crc(&self, full_data: &[u8]) -> bool {
        if !self.header.section_syntax_indicator {
            return true;
        }
        let total_length = self.total_length();
        if full_data.len() < total_length {
            return false;
        }

        crc32_mpeg2(&full_data[..total_length - 4]) == self.crc32
    }

    /// Get the total section length including header and CRC.
    pub fn total_length(&self) -> usize {
        3 + self.header.section_length as usize
    }

    /// Table id of the section.
    pub fn table_id(&self) -> Tid {
        self.header.table_id
    }
}

/// Calculate CRC32 for MPEG-2 (polynomial 0x04C11DB7).
pub fn crc32_mpeg2(data: &[u8]) -> u32 {
    static CRC_TABLE: [u32; 256] = {
        let mut table = [0u32; 256];
        let mut i = 0;
        while i < 256 {
            let mut crc = (i as u32) << 24;
            let mut j = 0;
            while j < 8 {
                if crc & 0x80000000 != 0 {
                    crc = (crc << 1) ^ 0x04C11DB7;
                } else {
                    crc <<= 1;
                }
                j += 1;
            }
            table[i] = crc;
            i += 1;
        }
        table
    };

    let mut crc = 0xFFFFFFFFu32;
    for &byte in data {
        let index = ((crc >> 24) ^ byte as u32) as usize;
        crc = (crc << 8) ^ CRC_TABLE[index];
    }
    crc
}

/// Build a complete long section (header, payload, CRC) in memory.
///
/// Used by tests and by callers that synthesize sections.
pub fn build_long_section(
    table_id: Tid,
    table_id_extension: u16,
    version_number: u8,
    payload: &[u8],
) -> Vec<u8> {
    let section_length = 5 + payload.len() + 4;
    let mut out = Vec::with_capacity(3 + section_length);
    out.push(table_id);
    out.push(0xB0 | ((section_length >> 8) as u8 & 0x0F));
    out.push(section_length as u8);
    out.extend_from_slice(&table_id_extension.to_be_bytes());
    out.push(0xC1 | ((version_number & 0x1F) << 1));
    out.push(0);
    out.push(0);
    out.extend_from_slice(payload);
    let crc = crc32_mpeg2(&out);
    out.extend_from_slice(&crc.to_be_bytes());
    out
}
