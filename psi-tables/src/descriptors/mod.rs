//! Descriptors and descriptor loop helpers.
//!
//! Descriptor loops are displayed through the repository: each tag is
//! resolved in the context of the enclosing table, with the private data
//! specifier updated as `private_data_specifier_descriptor`s go by.

use std::fmt;

use log::trace;
use psi_repository::{did, DescriptorContext, DescriptorRegistration, Did, Registry, Resolution};

pub mod atsc;
pub mod dvb;
pub mod isdb;
pub mod mpeg;

pub use atsc::ServiceLocationDescriptor;
pub use dvb::{
    LogicalChannelNumberDescriptor, NetworkNameDescriptor, PrivateDataSpecifierDescriptor,
    ServiceDescriptor, SupplementaryAudioDescriptor, TargetIpAddressDescriptor,
};
pub use isdb::TsInformationDescriptor;
pub use mpeg::{CaDescriptor, LanguageDescriptor, RegistrationDescriptor};

/// Built-in descriptor registrations.
pub const DESCRIPTORS: &[DescriptorRegistration] = &[
    CaDescriptor::REGISTRATION,
    RegistrationDescriptor::REGISTRATION,
    LanguageDescriptor::REGISTRATION,
    NetworkNameDescriptor::REGISTRATION,
    ServiceDescriptor::REGISTRATION,
    PrivateDataSpecifierDescriptor::REGISTRATION,
    LogicalChannelNumberDescriptor::REGISTRATION,
    TargetIpAddressDescriptor::REGISTRATION,
    SupplementaryAudioDescriptor::REGISTRATION,
    TsInformationDescriptor::REGISTRATION,
    ServiceLocationDescriptor::REGISTRATION,
];

/// Implements [`psi_repository::AbstractDescriptor`] for a descriptor type
/// that has a `parse` constructor.
macro_rules! abstract_descriptor {
    ($ty:ty, $name:expr, $standards:expr, $tag:expr) => {
        impl psi_repository::AbstractDescriptor for $ty {
            fn tag(&self) -> psi_repository::Did {
                $tag
            }

            fn defining_standards(&self) -> psi_repository::Standards {
                $standards
            }

            fn xml_name(&self) -> &'static str {
                $name
            }

            fn deserialize(&mut self, payload: &[u8]) -> Result<(), psi_repository::DecodeError> {
                *self = <$ty>::parse(payload)?;
                Ok(())
            }
        }
    };
}

pub(crate) use abstract_descriptor;

/// Split a descriptor loop into (tag, payload) pairs.
///
/// A truncated trailing descriptor ends the loop.
pub fn parse_descriptor_loop(data: &[u8]) -> Vec<(Did, &[u8])> {
    let mut descriptors = Vec::new();
    let mut offset = 0;

    while offset + 2 <= data.len() {
        let tag = data[offset];
        let length = data[offset + 1] as usize;
        offset += 2;

        if offset + length > data.len() {
            break;
        }

        descriptors.push((tag, &data[offset..offset + length]));
        offset += length;
    }

    descriptors
}

/// Find the payload of the first descriptor with `tag` in a loop.
pub fn find_descriptor(data: &[u8], tag: Did) -> Option<&[u8]> {
    parse_descriptor_loop(data)
        .into_iter()
        .find(|(t, _)| *t == tag)
        .map(|(_, d)| d)
}

/// Display every descriptor of a loop.
///
/// Known descriptors are displayed with the routine `registry` resolves,
/// unknown and ambiguous ones as a hex dump.
pub fn display_descriptor_loop(
    out: &mut dyn fmt::Write,
    registry: &Registry,
    data: &[u8],
    mut ctx: DescriptorContext,
    indent: usize,
) -> fmt::Result {
    for (tag, payload) in parse_descriptor_loop(data) {
        let ext = match tag {
            did::MPEG_EXTENSION | did::DVB_EXTENSION => payload.first().copied(),
            _ => None,
        };
        match registry.descriptor(tag, ext, ctx) {
            Resolution::Found(entry) => {
                writeln!(
                    out,
                    "{:indent$}- {}, tag 0x{:02X}, {} bytes",
                    "",
                    entry.name(),
                    tag,
                    payload.len(),
                    indent = indent
                )?;
                (entry.display())(out, payload, indent + 2)?;
            }
            other => {
                trace!("descriptor 0x{:02X} not displayable: {:?}", tag, other.map(|e| e.name()));
                writeln!(
                    out,
                    "{:indent$}- Unknown descriptor, tag 0x{:02X}, {} bytes",
                    "",
                    tag,
                    payload.len(),
                    indent = indent
                )?;
                hex_dump(out, payload, indent + 2)?;
            }
        }

        if tag == did::PRIV_DATA_SPECIF && payload.len() >= 4 {
            ctx.pds = Some(u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]));
        }
    }
    Ok(())
}

/// Hex dump, 16 bytes per line.
pub fn hex_dump(out: &mut dyn fmt::Write, data: &[u8], indent: usize) -> fmt::Result {
    for line in data.chunks(16) {
        write!(out, "{:indent$}", "", indent = indent)?;
        for (i, byte) in line.iter().enumerate() {
            if i > 0 {
                out.write_char(' ')?;
            }
            write!(out, "{:02X}", byte)?;
        }
        out.write_char('\n')?;
    }
    Ok(())
}

/// Decode a broadcast text string.
///
/// Simplified: a leading character table selector is skipped, valid UTF-8
/// is kept, anything else degrades to ASCII with `?` for other bytes.
pub(crate) fn decode_string(data: &[u8]) -> String {
    let slice = match data.first() {
        Some(&b) if b < 0x20 => &data[1..],
        _ => data,
    };

    if let Ok(s) = std::str::from_utf8(slice) {
        return s.to_string();
    }

    slice
        .iter()
        .filter(|&&b| b >= 0x20 || b == 0x0A || b == 0x0D)
        .map(|&b| if b.is_ascii() { b as char } else { '?' })
        .collect()
}

/// Three-character ISO-639 code.
pub(crate) fn language_code(data: &[u8]) -> String {
    data.iter()
        .take(3)
        .map(|&b| if b.is_ascii_graphic() { b as char } else { '.' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_descriptor_loop() {
        let data = [
            0x48, 0x02, 0xAA, 0xBB, // Service descriptor, length 2
            0x40, 0x03, 0xCC, 0xDD, 0xEE, // Network name, length 3
        ];

        let descriptors = parse_descriptor_loop(&data);
        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0], (0x48, &[0xAA, 0xBB][..]));
        assert_eq!(descriptors[1], (0x40, &[0xCC, 0xDD, 0xEE][..]));
    }

    #[test]
    fn test_truncated_loop() {
        let data = [0x48, 0x02, 0xAA, 0xBB, 0x40, 0x09, 0xCC];
        assert_eq!(parse_descriptor_loop(&data).len(), 1);
    }

    #[test]
    fn test_find_descriptor() {
        let data = [0x48, 0x02, 0xAA, 0xBB, 0x40, 0x03, 0xCC, 0xDD, 0xEE];

        assert_eq!(find_descriptor(&data, 0x40), Some(&[0xCC, 0xDD, 0xEE][..]));
        assert!(find_descriptor(&data, 0x99).is_none());
    }

    #[test]
    fn test_decode_string() {
        assert_eq!(decode_string(b"\x15NHK"), "NHK");
        assert_eq!(decode_string(&[b'A', 0xFF, b'B']), "A?B");
        assert_eq!(decode_string(&[]), "");
    }

    #[test]
    fn test_hex_dump() {
        let mut out = String::new();
        hex_dump(&mut out, &[0x01, 0xAB], 2).unwrap();
        assert_eq!(out, "  01 AB\n");
    }

    #[test]
    fn test_display_loop_tracks_private_data_specifier() {
        let data = [
            0x83, 0x04, 0x04, 0x01, 0xFC, 0x05, // LCN before any PDS: unknown
            0x5F, 0x04, 0x00, 0x00, 0x00, 0x28, // PDS = EICTA
            0x83, 0x04, 0x04, 0x01, 0xFC, 0x05, // LCN
        ];
        let mut out = String::new();
        let registry = crate::repository().snapshot();
        display_descriptor_loop(&mut out, &registry, &data, DescriptorContext::new(), 0).unwrap();

        let lines: Vec<&str> = out.lines().filter(|l| l.starts_with("- ")).collect();
        assert_eq!(lines[0], "- Unknown descriptor, tag 0x83, 4 bytes");
        assert_eq!(lines[1], "- private_data_specifier_descriptor, tag 0x5F, 4 bytes");
        assert_eq!(lines[2], "- logical_channel_number_descriptor, tag 0x83, 4 bytes");
        assert!(out.contains("Service id: 0x0401 (1025), visible: yes, channel: 5"));
    }
}
