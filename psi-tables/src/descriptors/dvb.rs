//! DVB descriptors (ETSI EN 300 468 and related).

use std::fmt;
use std::net::Ipv4Addr;

use psi_repository::{
    did, pds, tid, AbstractDescriptor, DecodeError, DescriptorRegistration, Edid, Standards,
};

use super::{abstract_descriptor, decode_string, language_code};

/// Network name descriptor (0x40).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkNameDescriptor {
    /// Network name.
    pub network_name: String,
}

impl NetworkNameDescriptor {
    pub const NAME: &'static str = "network_name_descriptor";

    pub const REGISTRATION: DescriptorRegistration = DescriptorRegistration {
        name: Self::NAME,
        edid: Edid::Standard { tag: did::NETWORK_NAME },
        standards: Standards::DVB.union(Standards::ISDB),
        factory: Self::create,
        display: Self::display,
    };

    fn create() -> Box<dyn AbstractDescriptor> {
        Box::new(Self::default())
    }

    /// Parse a network name descriptor.
    pub fn parse(data: &[u8]) -> Result<Self, DecodeError> {
        Ok(NetworkNameDescriptor {
            network_name: decode_string(data),
        })
    }

    pub fn display(out: &mut dyn fmt::Write, data: &[u8], indent: usize) -> fmt::Result {
        writeln!(out, "{:indent$}Name: \"{}\"", "", decode_string(data), indent = indent)
    }
}

abstract_descriptor!(
    NetworkNameDescriptor,
    NetworkNameDescriptor::NAME,
    Standards::DVB.union(Standards::ISDB),
    did::NETWORK_NAME
);

/// Service descriptor (0x48).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceDescriptor {
    /// Service type.
    pub service_type: u8,
    /// Service provider name.
    pub provider_name: String,
    /// Service name.
    pub service_name: String,
}

impl ServiceDescriptor {
    pub const NAME: &'static str = "service_descriptor";

    pub const REGISTRATION: DescriptorRegistration = DescriptorRegistration {
        name: Self::NAME,
        edid: Edid::Standard { tag: did::SERVICE },
        standards: Standards::DVB.union(Standards::ISDB),
        factory: Self::create,
        display: Self::display,
    };

    fn create() -> Box<dyn AbstractDescriptor> {
        Box::new(Self::default())
    }

    /// Parse a service descriptor from raw bytes.
    pub fn parse(data: &[u8]) -> Result<Self, DecodeError> {
        if data.len() < 3 {
            return Err(DecodeError::TooShort {
                name: Self::NAME,
                needed: 3,
                actual: data.len(),
            });
        }

        let service_type = data[0];
        let provider_name_length = data[1] as usize;

        if data.len() < 2 + provider_name_length + 1 {
            return Err(DecodeError::InvalidLength {
                name: Self::NAME,
                field: "provider name",
            });
        }

        let provider_name = decode_string(&data[2..2 + provider_name_length]);

        let service_name_offset = 2 + provider_name_length;
        let service_name_length = data[service_name_offset] as usize;

        if data.len() < service_name_offset + 1 + service_name_length {
            return Err(DecodeError::InvalidLength {
                name: Self::NAME,
                field: "service name",
            });
        }

        let service_name = decode_string(
            &data[service_name_offset + 1..service_name_offset + 1 + service_name_length],
        );

        Ok(ServiceDescriptor {
            service_type,
            provider_name,
            service_name,
        })
    }

    /// Get human-readable service type name.
    pub fn service_type_name(&self) -> &'static str {
        match self.service_type {
            0x01 => "Digital TV",
            0x02 => "Digital Audio",
            0x0C => "Data Service",
            0xA1 => "Special Video (ISDB)",
            0xA2 => "Special Audio (ISDB)",
            0xA3 => "Special Data (ISDB)",
            0xA4 => "Engineering (ISDB)",
            0xA5 => "Promotional Video (ISDB)",
            0xA6 => "Promotional Audio (ISDB)",
            0xA7 => "Promotional Data (ISDB)",
            0xA8 => "For Advance Storage (ISDB)",
            0xA9 => "For Exclusive Storage (ISDB)",
            0xAA => "Bookmark List (ISDB)",
            0xAB => "Server Type Simultaneous (ISDB)",
            0xAC => "Independent File (ISDB)",
            0xC0 => "1seg (ISDB)",
            _ => "Unknown",
        }
    }

    pub fn display(out: &mut dyn fmt::Write, data: &[u8], indent: usize) -> fmt::Result {
        let desc = match Self::parse(data) {
            Ok(desc) => desc,
            Err(e) => return writeln!(out, "{:indent$}{}", "", e, indent = indent),
        };
        writeln!(
            out,
            "{:indent$}Service type: 0x{:02X} ({})",
            "",
            desc.service_type,
            desc.service_type_name(),
            indent = indent
        )?;
        writeln!(out, "{:indent$}Service: \"{}\", Provider: \"{}\"", "", desc.service_name, desc.provider_name, indent = indent)
    }
}

abstract_descriptor!(
    ServiceDescriptor,
    ServiceDescriptor::NAME,
    Standards::DVB.union(Standards::ISDB),
    did::SERVICE
);

/// Private data specifier descriptor (0x5F).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrivateDataSpecifierDescriptor {
    pub pds: u32,
}

impl PrivateDataSpecifierDescriptor {
    pub const NAME: &'static str = "private_data_specifier_descriptor";

    pub const REGISTRATION: DescriptorRegistration = DescriptorRegistration {
        name: Self::NAME,
        edid: Edid::Standard { tag: did::PRIV_DATA_SPECIF },
        standards: Standards::DVB,
        factory: Self::create,
        display: Self::display,
    };

    fn create() -> Box<dyn AbstractDescriptor> {
        Box::new(Self::default())
    }

    pub fn parse(data: &[u8]) -> Result<Self, DecodeError> {
        match data {
            [a, b, c, d] => Ok(PrivateDataSpecifierDescriptor {
                pds: u32::from_be_bytes([*a, *b, *c, *d]),
            }),
            _ => Err(DecodeError::InvalidLength {
                name: Self::NAME,
                field: "descriptor",
            }),
        }
    }

    pub fn display(out: &mut dyn fmt::Write, data: &[u8], indent: usize) -> fmt::Result {
        match Self::parse(data) {
            Ok(desc) => {
                let name = match desc.pds {
                    pds::EICTA => " (EACEM/EICTA)",
                    pds::EUTELSAT => " (Eutelsat)",
                    _ => "",
                };
                writeln!(out, "{:indent$}Specifier: 0x{:08X}{}", "", desc.pds, name, indent = indent)
            }
            Err(e) => writeln!(out, "{:indent$}{}", "", e, indent = indent),
        }
    }
}

abstract_descriptor!(
    PrivateDataSpecifierDescriptor,
    PrivateDataSpecifierDescriptor::NAME,
    Standards::DVB,
    did::PRIV_DATA_SPECIF
);

/// One service of a logical channel number descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicalChannel {
    pub service_id: u16,
    pub visible: bool,
    pub lcn: u16,
}

/// Logical channel number descriptor (0x83, EICTA private).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogicalChannelNumberDescriptor {
    pub entries: Vec<LogicalChannel>,
}

impl LogicalChannelNumberDescriptor {
    pub const NAME: &'static str = "logical_channel_number_descriptor";

    pub const REGISTRATION: DescriptorRegistration = DescriptorRegistration {
        name: Self::NAME,
        edid: Edid::Private {
            tag: did::LOGICAL_CHANNEL_NUM,
            pds: pds::EICTA,
        },
        standards: Standards::DVB,
        factory: Self::create,
        display: Self::display,
    };

    fn create() -> Box<dyn AbstractDescriptor> {
        Box::new(Self::default())
    }

    pub fn parse(data: &[u8]) -> Result<Self, DecodeError> {
        if data.len() % 4 != 0 {
            return Err(DecodeError::InvalidLength {
                name: Self::NAME,
                field: "descriptor",
            });
        }
        Ok(LogicalChannelNumberDescriptor {
            entries: data
                .chunks(4)
                .map(|c| LogicalChannel {
                    service_id: u16::from_be_bytes([c[0], c[1]]),
                    visible: c[2] & 0x80 != 0,
                    lcn: ((c[2] as u16 & 0x03) << 8) | c[3] as u16,
                })
                .collect(),
        })
    }

    pub fn display(out: &mut dyn fmt::Write, data: &[u8], indent: usize) -> fmt::Result {
        let desc = match Self::parse(data) {
            Ok(desc) => desc,
            Err(e) => return writeln!(out, "{:indent$}{}", "", e, indent = indent),
        };
        for e in &desc.entries {
            writeln!(
                out,
                "{:indent$}Service id: 0x{:04X} ({}), visible: {}, channel: {}",
                "",
                e.service_id,
                e.service_id,
                if e.visible { "yes" } else { "no" },
                e.lcn,
                indent = indent
            )?;
        }
        Ok(())
    }
}

abstract_descriptor!(
    LogicalChannelNumberDescriptor,
    LogicalChannelNumberDescriptor::NAME,
    Standards::DVB,
    did::LOGICAL_CHANNEL_NUM
);

/// Target IP address descriptor (0x09, only in INT).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetIpAddressDescriptor {
    pub mask: Ipv4Addr,
    pub addresses: Vec<Ipv4Addr>,
}

impl Default for TargetIpAddressDescriptor {
    fn default() -> Self {
        TargetIpAddressDescriptor {
            mask: Ipv4Addr::UNSPECIFIED,
            addresses: Vec::new(),
        }
    }
}

impl TargetIpAddressDescriptor {
    pub const NAME: &'static str = "target_IP_address_descriptor";

    pub const REGISTRATION: DescriptorRegistration = DescriptorRegistration {
        name: Self::NAME,
        edid: Edid::TableSpecific {
            tag: did::INT_TARGET_IP_ADDR,
            tids: &[tid::INT],
        },
        standards: Standards::DVB,
        factory: Self::create,
        display: Self::display,
    };

    fn create() -> Box<dyn AbstractDescriptor> {
        Box::new(Self::default())
    }

    pub fn parse(data: &[u8]) -> Result<Self, DecodeError> {
        if data.len() < 4 || data.len() % 4 != 0 {
            return Err(DecodeError::InvalidLength {
                name: Self::NAME,
                field: "descriptor",
            });
        }
        let mut chunks = data.chunks(4).map(|c| Ipv4Addr::new(c[0], c[1], c[2], c[3]));
        let mask = chunks.next().unwrap_or(Ipv4Addr::UNSPECIFIED);
        Ok(TargetIpAddressDescriptor {
            mask,
            addresses: chunks.collect(),
        })
    }

    pub fn display(out: &mut dyn fmt::Write, data: &[u8], indent: usize) -> fmt::Result {
        let desc = match Self::parse(data) {
            Ok(desc) => desc,
            Err(e) => return writeln!(out, "{:indent$}{}", "", e, indent = indent),
        };
        writeln!(out, "{:indent$}Address mask: {}", "", desc.mask, indent = indent)?;
        for addr in &desc.addresses {
            writeln!(out, "{:indent$}Address: {}", "", addr, indent = indent)?;
        }
        Ok(())
    }
}

abstract_descriptor!(
    TargetIpAddressDescriptor,
    TargetIpAddressDescriptor::NAME,
    Standards::DVB,
    did::INT_TARGET_IP_ADDR
);

/// Supplementary audio descriptor (DVB extension 0x06).
///
/// The payload starts with the extension tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupplementaryAudioDescriptor {
    pub mix_type: bool,
    pub editorial_classification: u8,
    pub language_code: Option<String>,
    pub private_data: Vec<u8>,
}

impl SupplementaryAudioDescriptor {
    pub const NAME: &'static str = "supplementary_audio_descriptor";

    pub const REGISTRATION: DescriptorRegistration = DescriptorRegistration {
        name: Self::NAME,
        edid: Edid::DvbExtension {
            ext: did::dvb_ext::SUPPLEMENTARY_AUDIO,
        },
        standards: Standards::DVB,
        factory: Self::create,
        display: Self::display,
    };

    fn create() -> Box<dyn AbstractDescriptor> {
        Box::new(Self::default())
    }

    pub fn parse(data: &[u8]) -> Result<Self, DecodeError> {
        if data.len() < 2 {
            return Err(DecodeError::TooShort {
                name: Self::NAME,
                needed: 2,
                actual: data.len(),
            });
        }
        let flags = data[1];
        let language_present = flags & 0x01 != 0;
        let mut offset = 2;
        let language = if language_present {
            if data.len() < 5 {
                return Err(DecodeError::InvalidLength {
                    name: Self::NAME,
                    field: "language code",
                });
            }
            offset = 5;
            Some(language_code(&data[2..5]))
        } else {
            None
        };
        Ok(SupplementaryAudioDescriptor {
            mix_type: flags & 0x80 != 0,
            editorial_classification: (flags >> 2) & 0x1F,
            language_code: language,
            private_data: data[offset..].to_vec(),
        })
    }

    pub fn display(out: &mut dyn fmt::Write, data: &[u8], indent: usize) -> fmt::Result {
        let desc = match Self::parse(data) {
            Ok(desc) => desc,
            Err(e) => return writeln!(out, "{:indent$}{}", "", e, indent = indent),
        };
        writeln!(
            out,
            "{:indent$}Mix type: {}, editorial classification: 0x{:02X}",
            "",
            if desc.mix_type { "independent" } else { "supplementary" },
            desc.editorial_classification,
            indent = indent
        )?;
        if let Some(lang) = &desc.language_code {
            writeln!(out, "{:indent$}Language: {}", "", lang, indent = indent)?;
        }
        Ok(())
    }
}

abstract_descriptor!(
    SupplementaryAudioDescriptor,
    SupplementaryAudioDescriptor::NAME,
    Standards::DVB,
    did::DVB_EXTENSION
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_service_descriptor() {
        let data = [
            0x01, // service_type = Digital TV
            0x04, // provider_name_length = 4
            b'T', b'E', b'S', b'T', // provider_name = "TEST"
            0x07, // service_name_length = 7
            b'C', b'H', b' ', b'N', b'A', b'M', b'E', // service_name = "CH NAME"
        ];

        let desc = ServiceDescriptor::parse(&data).unwrap();
        assert_eq!(desc.service_type, 0x01);
        assert_eq!(desc.provider_name, "TEST");
        assert_eq!(desc.service_name, "CH NAME");
        assert_eq!(desc.service_type_name(), "Digital TV");
    }

    #[test]
    fn test_service_descriptor_bad_length() {
        let err = ServiceDescriptor::parse(&[0x01, 0x10, b'A']).unwrap_err();
        assert_eq!(
            err,
            DecodeError::InvalidLength {
                name: ServiceDescriptor::NAME,
                field: "provider name"
            }
        );
    }

    #[test]
    fn test_parse_network_name_descriptor() {
        let desc = NetworkNameDescriptor::parse(b"Network1").unwrap();
        assert_eq!(desc.network_name, "Network1");
    }

    #[test]
    fn test_private_data_specifier() {
        let desc = PrivateDataSpecifierDescriptor::parse(&[0, 0, 0, 0x28]).unwrap();
        assert_eq!(desc.pds, pds::EICTA);
        assert!(PrivateDataSpecifierDescriptor::parse(&[0, 0x28]).is_err());
    }

    #[test]
    fn test_logical_channel_numbers() {
        let desc =
            LogicalChannelNumberDescriptor::parse(&[0x00, 0x01, 0xFC, 0x01, 0x00, 0x02, 0x7D, 0xFF])
                .unwrap();
        assert_eq!(
            desc.entries,
            vec![
                LogicalChannel { service_id: 1, visible: true, lcn: 1 },
                LogicalChannel { service_id: 2, visible: false, lcn: 0x1FF },
            ]
        );
    }

    #[test]
    fn test_target_ip_address() {
        let desc = TargetIpAddressDescriptor::parse(&[255, 255, 255, 0, 10, 0, 0, 1]).unwrap();
        assert_eq!(desc.mask, Ipv4Addr::new(255, 255, 255, 0));
        assert_eq!(desc.addresses, vec![Ipv4Addr::new(10, 0, 0, 1)]);
        assert!(TargetIpAddressDescriptor::parse(&[]).is_err());
    }

    #[test]
    fn test_supplementary_audio() {
        let desc = SupplementaryAudioDescriptor::parse(&[0x06, 0x85, b'e', b'n', b'g']).unwrap();
        assert!(desc.mix_type);
        assert_eq!(desc.editorial_classification, 0x01);
        assert_eq!(desc.language_code.as_deref(), Some("eng"));
        assert!(SupplementaryAudioDescriptor::parse(&[0x06, 0x01]).is_err());
    }
}
