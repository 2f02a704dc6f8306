//! Table ids, descriptor tags and private data specifiers.
//!
//! Several values appear under more than one name because regional
//! standards reuse the same numeric space, e.g. [`tid::MGT`] (ATSC) and
//! [`tid::LDT`] (ISDB) are both `0xC7`.

/// Table id, first byte of a PSI section.
pub type Tid = u8;

/// Descriptor tag, first byte of a descriptor.
pub type Did = u8;

/// Private data specifier value (DVB).
pub type Pds = u32;

/// Table ids for PSI/SI tables.
pub mod tid {
    use super::Tid;

    // ISO/IEC 13818-1
    /// Program Association Section.
    pub const PAT: Tid = 0x00;
    /// Conditional Access Section.
    pub const CAT: Tid = 0x01;
    /// Program Map Section.
    pub const PMT: Tid = 0x02;
    /// Transport Stream Description Section.
    pub const TSDT: Tid = 0x03;

    // ETSI EN 300 468 / TS 102 006 / TS 102 809
    /// Network Information Section - actual.
    pub const NIT_ACT: Tid = 0x40;
    /// Network Information Section - other.
    pub const NIT_OTH: Tid = 0x41;
    /// Service Description Section - actual.
    pub const SDT_ACT: Tid = 0x42;
    /// Service Description Section - other.
    pub const SDT_OTH: Tid = 0x46;
    /// Bouquet Association Section.
    pub const BAT: Tid = 0x4A;
    /// IP/MAC Notification Section.
    pub const INT: Tid = 0x4C;
    /// Event Information Section, present/following, actual.
    pub const EIT_PF_ACT: Tid = 0x4E;
    /// Event Information Section, present/following, other.
    pub const EIT_PF_OTH: Tid = 0x4F;
    /// Time and Date Section.
    pub const TDT: Tid = 0x70;
    /// Running Status Section.
    pub const RST: Tid = 0x71;
    /// Stuffing Section.
    pub const ST: Tid = 0x72;
    /// Time Offset Section.
    pub const TOT: Tid = 0x73;
    /// Application Information Section.
    pub const AIT: Tid = 0x74;
    /// Discontinuity Information Section.
    pub const DIT: Tid = 0x7E;
    /// Selection Information Section.
    pub const SIT: Tid = 0x7F;

    // ARIB STD-B10 / STD-B21
    /// Download Control Section.
    pub const DCT: Tid = 0xC0;
    /// Download Table Section.
    pub const DLT: Tid = 0xC1;
    /// Partial Content Announcement Section.
    pub const PCAT: Tid = 0xC2;
    /// Software Download Trigger Section.
    pub const SDTT: Tid = 0xC3;
    /// Broadcaster Information Section.
    pub const BIT: Tid = 0xC4;
    /// Network Board Information Section, body.
    pub const NBIT_BODY: Tid = 0xC5;
    /// Network Board Information Section, reference.
    pub const NBIT_REF: Tid = 0xC6;
    /// Linked Description Section.
    pub const LDT: Tid = 0xC7;
    /// Common Data Section.
    pub const CDT: Tid = 0xC8;
    /// Local event Information Section.
    pub const LIT: Tid = 0xD0;
    /// Event Relation Section.
    pub const ERT: Tid = 0xD1;
    /// Index Transmission information Section.
    pub const ITT: Tid = 0xD2;

    // ATSC A/65
    /// Master Guide Section.
    pub const MGT: Tid = 0xC7;
    /// Terrestrial Virtual Channel Section.
    pub const TVCT: Tid = 0xC8;
    /// Cable Virtual Channel Section.
    pub const CVCT: Tid = 0xC9;
    /// Rating Region Section.
    pub const RRT: Tid = 0xCA;
    /// ATSC Event Information Section.
    pub const ATSC_EIT: Tid = 0xCB;
    /// Extended Text Section.
    pub const ETT: Tid = 0xCC;
    /// System Time Section.
    pub const STT: Tid = 0xCD;
}

/// Descriptor tags.
pub mod did {
    use super::Did;

    // ISO/IEC 13818-1
    /// Video stream descriptor.
    pub const VIDEO_STREAM: Did = 0x02;
    /// Audio stream descriptor.
    pub const AUDIO_STREAM: Did = 0x03;
    /// Registration descriptor.
    pub const REGISTRATION: Did = 0x05;
    /// Conditional access descriptor.
    pub const CA: Did = 0x09;
    /// ISO-639 language descriptor.
    pub const LANGUAGE: Did = 0x0A;
    /// MPEG extension descriptor, actual tag in the first payload byte.
    pub const MPEG_EXTENSION: Did = 0x3F;

    // ETSI EN 300 468
    /// Network name descriptor.
    pub const NETWORK_NAME: Did = 0x40;
    /// Service descriptor.
    pub const SERVICE: Did = 0x48;
    /// Private data specifier descriptor.
    pub const PRIV_DATA_SPECIF: Did = 0x5F;
    /// DVB extension descriptor, actual tag in the first payload byte.
    pub const DVB_EXTENSION: Did = 0x7F;

    // EICTA/EACEM private, requires PDS 0x00000028
    /// Logical channel number descriptor.
    pub const LOGICAL_CHANNEL_NUM: Did = 0x83;

    // INT specific (table id 0x4C)
    /// Target IP address descriptor.
    pub const INT_TARGET_IP_ADDR: Did = 0x09;

    // ATSC A/65
    /// Service location descriptor.
    pub const ATSC_SERVICE_LOCATION: Did = 0xA1;

    // ARIB STD-B10
    /// TS information descriptor.
    pub const ISDB_TS_INFO: Did = 0xCD;

    /// DVB extension tags.
    pub mod dvb_ext {
        /// Supplementary audio descriptor.
        pub const SUPPLEMENTARY_AUDIO: u8 = 0x06;
    }
}

/// Private data specifiers.
pub mod pds {
    use super::Pds;

    /// EACEM / EICTA.
    pub const EICTA: Pds = 0x0000_0028;
    /// EUTELSAT S.A.
    pub const EUTELSAT: Pds = 0x0000_0055;
}
