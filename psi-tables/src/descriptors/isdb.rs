//! ISDB descriptors (ARIB STD-B10).

use std::fmt;

use psi_repository::{did, AbstractDescriptor, DecodeError, DescriptorRegistration, Edid, Standards};

use super::{abstract_descriptor, decode_string};

/// TS information descriptor (0xCD).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TsInformationDescriptor {
    /// Remote control key ID.
    pub remote_control_key_id: u8,
    /// TS name.
    pub ts_name: String,
    /// Transmission types: (transmission type info, service ids).
    pub transmission_types: Vec<(u8, Vec<u16>)>,
}

impl TsInformationDescriptor {
    pub const NAME: &'static str = "TS_information_descriptor";

    pub const REGISTRATION: DescriptorRegistration = DescriptorRegistration {
        name: Self::NAME,
        edid: Edid::Standard { tag: did::ISDB_TS_INFO },
        standards: Standards::ISDB,
        factory: Self::create,
        display: Self::display,
    };

    fn create() -> Box<dyn AbstractDescriptor> {
        Box::new(Self::default())
    }

    /// Parse a TS information descriptor.
    pub fn parse(data: &[u8]) -> Result<Self, DecodeError> {
        if data.len() < 2 {
            return Err(DecodeError::TooShort {
                name: Self::NAME,
                needed: 2,
                actual: data.len(),
            });
        }

        let remote_control_key_id = data[0];
        let ts_name_length = (data[1] >> 2) as usize;
        let transmission_type_count = (data[1] & 0x03) as usize;

        if data.len() < 2 + ts_name_length {
            return Err(DecodeError::InvalidLength {
                name: Self::NAME,
                field: "TS name",
            });
        }

        let ts_name = decode_string(&data[2..2 + ts_name_length]);

        let mut offset = 2 + ts_name_length;
        let mut transmission_types = Vec::with_capacity(transmission_type_count);
        for _ in 0..transmission_type_count {
            if offset + 2 > data.len() {
                return Err(DecodeError::InvalidLength {
                    name: Self::NAME,
                    field: "transmission type",
                });
            }
            let info = data[offset];
            let count = data[offset + 1] as usize;
            offset += 2;
            if offset + 2 * count > data.len() {
                return Err(DecodeError::InvalidLength {
                    name: Self::NAME,
                    field: "service list",
                });
            }
            let services = data[offset..offset + 2 * count]
                .chunks(2)
                .map(|c| u16::from_be_bytes([c[0], c[1]]))
                .collect();
            offset += 2 * count;
            transmission_types.push((info, services));
        }

        Ok(TsInformationDescriptor {
            remote_control_key_id,
            ts_name,
            transmission_types,
        })
    }

    pub fn display(out: &mut dyn fmt::Write, data: &[u8], indent: usize) -> fmt::Result {
        let desc = match Self::parse(data) {
            Ok(desc) => desc,
            Err(e) => return writeln!(out, "{:indent$}{}", "", e, indent = indent),
        };
        writeln!(
            out,
            "{:indent$}Remote control key id: {}, TS name: \"{}\"",
            "",
            desc.remote_control_key_id,
            desc.ts_name,
            indent = indent
        )?;
        for (info, services) in &desc.transmission_types {
            write!(out, "{:indent$}Transmission type: 0x{:02X}, services:", "", info, indent = indent)?;
            for id in services {
                write!(out, " 0x{:04X}", id)?;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}

abstract_descriptor!(
    TsInformationDescriptor,
    TsInformationDescriptor::NAME,
    Standards::ISDB,
    did::ISDB_TS_INFO
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ts_information() {
        let data = [
            0x01, // remote_control_key_id
            (3 << 2) | 1, // ts_name_length = 3, one transmission type
            b'N', b'H', b'K',
            0x0F, 0x02, 0x04, 0x08, 0x04, 0x09,
        ];
        let desc = TsInformationDescriptor::parse(&data).unwrap();
        assert_eq!(desc.remote_control_key_id, 1);
        assert_eq!(desc.ts_name, "NHK");
        assert_eq!(desc.transmission_types, vec![(0x0F, vec![0x0408, 0x0409])]);
    }

    #[test]
    fn test_truncated_service_list() {
        let data = [0x01, 0x01, 0x0F, 0x02, 0x04];
        assert!(TsInformationDescriptor::parse(&data).is_err());
    }
}
