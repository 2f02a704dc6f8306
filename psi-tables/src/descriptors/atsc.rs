//! ATSC descriptors (A/65).

use std::fmt;

use psi_repository::{did, AbstractDescriptor, DecodeError, DescriptorRegistration, Edid, Standards};

use super::{abstract_descriptor, language_code};

/// One elementary stream of a service location descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceLocationElement {
    pub stream_type: u8,
    pub elementary_pid: u16,
    pub language_code: String,
}

/// Service location descriptor (0xA1).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceLocationDescriptor {
    pub pcr_pid: u16,
    pub elements: Vec<ServiceLocationElement>,
}

impl ServiceLocationDescriptor {
    pub const NAME: &'static str = "service_location_descriptor";

    pub const REGISTRATION: DescriptorRegistration = DescriptorRegistration {
        name: Self::NAME,
        edid: Edid::Standard { tag: did::ATSC_SERVICE_LOCATION },
        standards: Standards::ATSC,
        factory: Self::create,
        display: Self::display,
    };

    fn create() -> Box<dyn AbstractDescriptor> {
        Box::new(Self::default())
    }

    pub fn parse(data: &[u8]) -> Result<Self, DecodeError> {
        if data.len() < 3 {
            return Err(DecodeError::TooShort {
                name: Self::NAME,
                needed: 3,
                actual: data.len(),
            });
        }
        let pcr_pid = ((data[0] as u16 & 0x1F) << 8) | data[1] as u16;
        let count = data[2] as usize;
        let body = &data[3..];
        if body.len() < 6 * count {
            return Err(DecodeError::InvalidLength {
                name: Self::NAME,
                field: "elements",
            });
        }
        let elements = body
            .chunks(6)
            .take(count)
            .map(|c| ServiceLocationElement {
                stream_type: c[0],
                elementary_pid: ((c[1] as u16 & 0x1F) << 8) | c[2] as u16,
                language_code: language_code(&c[3..6]),
            })
            .collect();
        Ok(ServiceLocationDescriptor { pcr_pid, elements })
    }

    pub fn display(out: &mut dyn fmt::Write, data: &[u8], indent: usize) -> fmt::Result {
        let desc = match Self::parse(data) {
            Ok(desc) => desc,
            Err(e) => return writeln!(out, "{:indent$}{}", "", e, indent = indent),
        };
        writeln!(out, "{:indent$}PCR PID: 0x{:04X} ({})", "", desc.pcr_pid, desc.pcr_pid, indent = indent)?;
        for e in &desc.elements {
            writeln!(
                out,
                "{:indent$}Stream type: 0x{:02X}, PID: 0x{:04X} ({}), language: \"{}\"",
                "",
                e.stream_type,
                e.elementary_pid,
                e.elementary_pid,
                e.language_code,
                indent = indent
            )?;
        }
        Ok(())
    }
}

abstract_descriptor!(
    ServiceLocationDescriptor,
    ServiceLocationDescriptor::NAME,
    Standards::ATSC,
    did::ATSC_SERVICE_LOCATION
);
