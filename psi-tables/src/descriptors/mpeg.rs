//! MPEG-2 Systems descriptors (ISO/IEC 13818-1).

use std::fmt;

use psi_repository::{
    did, AbstractDescriptor, DecodeError, DescriptorRegistration, Edid, Standards,
};

use super::{abstract_descriptor, hex_dump, language_code};

/// Conditional access descriptor (0x09).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaDescriptor {
    /// CA system id.
    pub ca_system_id: u16,
    /// ECM or EMM PID, depending on the enclosing table.
    pub ca_pid: u16,
    /// CA system specific data.
    pub private_data: Vec<u8>,
}

impl CaDescriptor {
    pub const NAME: &'static str = "CA_descriptor";

    pub const REGISTRATION: DescriptorRegistration = DescriptorRegistration {
        name: Self::NAME,
        edid: Edid::Standard { tag: did::CA },
        standards: Standards::MPEG,
        factory: Self::create,
        display: Self::display,
    };

    fn create() -> Box<dyn AbstractDescriptor> {
        Box::new(Self::default())
    }

    /// Parse a CA descriptor payload.
    pub fn parse(data: &[u8]) -> Result<Self, DecodeError> {
        if data.len() < 4 {
            return Err(DecodeError::TooShort {
                name: Self::NAME,
                needed: 4,
                actual: data.len(),
            });
        }
        Ok(CaDescriptor {
            ca_system_id: u16::from_be_bytes([data[0], data[1]]),
            ca_pid: ((data[2] as u16 & 0x1F) << 8) | data[3] as u16,
            private_data: data[4..].to_vec(),
        })
    }

    pub fn display(out: &mut dyn fmt::Write, data: &[u8], indent: usize) -> fmt::Result {
        let desc = match Self::parse(data) {
            Ok(desc) => desc,
            Err(e) => return writeln!(out, "{:indent$}{}", "", e, indent = indent),
        };
        writeln!(
            out,
            "{:indent$}CA System Id: 0x{:04X}, CA PID: 0x{:04X} ({})",
            "",
            desc.ca_system_id,
            desc.ca_pid,
            desc.ca_pid,
            indent = indent
        )?;
        if !desc.private_data.is_empty() {
            writeln!(out, "{:indent$}Private CA data:", "", indent = indent)?;
            hex_dump(out, &desc.private_data, indent + 2)?;
        }
        Ok(())
    }
}

abstract_descriptor!(CaDescriptor, CaDescriptor::NAME, Standards::MPEG, did::CA);

/// Registration descriptor (0x05).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationDescriptor {
    /// Format identifier, usually four ASCII characters.
    pub format_identifier: u32,
    /// Additional identification info.
    pub additional_info: Vec<u8>,
}

impl RegistrationDescriptor {
    pub const NAME: &'static str = "registration_descriptor";

    pub const REGISTRATION: DescriptorRegistration = DescriptorRegistration {
        name: Self::NAME,
        edid: Edid::Standard { tag: did::REGISTRATION },
        standards: Standards::MPEG,
        factory: Self::create,
        display: Self::display,
    };

    fn create() -> Box<dyn AbstractDescriptor> {
        Box::new(Self::default())
    }

    pub fn parse(data: &[u8]) -> Result<Self, DecodeError> {
        if data.len() < 4 {
            return Err(DecodeError::TooShort {
                name: Self::NAME,
                needed: 4,
                actual: data.len(),
            });
        }
        Ok(RegistrationDescriptor {
            format_identifier: u32::from_be_bytes([data[0], data[1], data[2], data[3]]),
            additional_info: data[4..].to_vec(),
        })
    }

    /// Format identifier as text, e.g. `"HEVC"`.
    pub fn format_name(&self) -> String {
        self.format_identifier
            .to_be_bytes()
            .iter()
            .map(|&b| if b.is_ascii_graphic() { b as char } else { '.' })
            .collect()
    }

    pub fn display(out: &mut dyn fmt::Write, data: &[u8], indent: usize) -> fmt::Result {
        match Self::parse(data) {
            Ok(desc) => writeln!(
                out,
                "{:indent$}Format identifier: 0x{:08X} (\"{}\")",
                "",
                desc.format_identifier,
                desc.format_name(),
                indent = indent
            ),
            Err(e) => writeln!(out, "{:indent$}{}", "", e, indent = indent),
        }
    }
}

abstract_descriptor!(
    RegistrationDescriptor,
    RegistrationDescriptor::NAME,
    Standards::MPEG,
    did::REGISTRATION
);

/// One entry of an ISO-639 language descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageEntry {
    /// ISO-639-2 code.
    pub language_code: String,
    /// Audio type.
    pub audio_type: u8,
}

/// ISO-639 language descriptor (0x0A).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageDescriptor {
    pub entries: Vec<LanguageEntry>,
}

impl LanguageDescriptor {
    pub const NAME: &'static str = "ISO_639_language_descriptor";

    pub const REGISTRATION: DescriptorRegistration = DescriptorRegistration {
        name: Self::NAME,
        edid: Edid::Standard { tag: did::LANGUAGE },
        standards: Standards::MPEG,
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
        Ok(LanguageDescriptor {
            entries: data
                .chunks(4)
                .map(|chunk| LanguageEntry {
                    language_code: language_code(chunk),
                    audio_type: chunk[3],
                })
                .collect(),
        })
    }

    pub fn display(out: &mut dyn fmt::Write, data: &[u8], indent: usize) -> fmt::Result {
        let desc = match Self::parse(data) {
            Ok(desc) => desc,
            Err(e) => return writeln!(out, "{:indent$}{}", "", e, indent = indent),
        };
        for entry in &desc.entries {
            writeln!(
                out,
                "{:indent$}Language: {}, Type: 0x{:02X} ({})",
                "",
                entry.language_code,
                entry.audio_type,
                audio_type_name(entry.audio_type),
                indent = indent
            )?;
        }
        Ok(())
    }
}

abstract_descriptor!(LanguageDescriptor, LanguageDescriptor::NAME, Standards::MPEG, did::LANGUAGE);

fn audio_type_name(audio_type: u8) -> &'static str {
    match audio_type {
        0x00 => "undefined",
        0x01 => "clean effects",
        0x02 => "hearing impaired",
        0x03 => "visual impaired commentary",
        _ => "reserved",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ca_descriptor() {
        let desc = CaDescriptor::parse(&[0x05, 0x00, 0xE1, 0x23, 0xAA]).unwrap();
        assert_eq!(desc.ca_system_id, 0x0500);
        assert_eq!(desc.ca_pid, 0x0123);
        assert_eq!(desc.private_data, vec![0xAA]);
        assert!(CaDescriptor::parse(&[0x05, 0x00]).is_err());
    }

    #[test]
    fn test_registration_descriptor() {
        let desc = RegistrationDescriptor::parse(b"HEVC").unwrap();
        assert_eq!(desc.format_identifier, 0x48455643);
        assert_eq!(desc.format_name(), "HEVC");
    }

    #[test]
    fn test_language_descriptor() {
        let desc = LanguageDescriptor::parse(b"jpn\x00eng\x03").unwrap();
        assert_eq!(desc.entries.len(), 2);
        assert_eq!(desc.entries[0].language_code, "jpn");
        assert_eq!(desc.entries[1].audio_type, 3);
        assert!(LanguageDescriptor::parse(b"jpn").is_err());

        let mut out = String::new();
        LanguageDescriptor::display(&mut out, b"fra\x01", 0).unwrap();
        assert_eq!(out, "Language: fra, Type: 0x01 (clean effects)\n");
    }

    #[test]
    fn test_deserialize_through_trait() {
        let mut desc: Box<dyn AbstractDescriptor> = Box::new(CaDescriptor::default());
        desc.deserialize(&[0x18, 0x01, 0xE0, 0x40]).unwrap();
        assert_eq!(desc.tag(), did::CA);
        assert_eq!(desc.xml_name(), "CA_descriptor");
        assert_eq!(desc.defining_standards(), Standards::MPEG);
    }
}
