use std::fmt;

/// A 64-bit IEEE extended address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExtendedAddress(pub u64);

impl fmt::Display for ExtendedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Wire-level discriminant for [`Address`], kept around because the byte
/// layout of a serialized address depends on it: 3 bytes for `Group`/`Nwk`,
/// 9 for `Ieee`, 11 for `Combined`, 1 for `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressMode {
    None = 0x00,
    Group = 0x01,
    Nwk = 0x02,
    Ieee = 0x03,
    Combined = 0x04,
}

impl AddressMode {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Self::None),
            0x01 => Some(Self::Group),
            0x02 => Some(Self::Nwk),
            0x03 => Some(Self::Ieee),
            0x04 => Some(Self::Combined),
            _ => None,
        }
    }
}

/// A Zigbee network address.
///
/// Unlike the wire format (a mode byte followed by up to two optional
/// fields), this is a proper sum type: each variant only carries the data
/// that applies to it. Wire encoding/decoding lives with each coordinator
/// family's codec, since the exact byte layout differs between ZNP and
/// ConBee framing (see each family's `frame`/`codec` module).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Address {
    /// Placeholder; no address information.
    #[default]
    None,
    /// A 16-bit group address.
    Group(u16),
    /// A 16-bit network (short) address.
    Nwk(u16),
    /// A 64-bit IEEE (extended) address.
    Ieee(ExtendedAddress),
    /// Both a short and an extended address.
    Combined {
        short: u16,
        extended: ExtendedAddress,
    },
}

impl Address {
    pub fn mode(&self) -> AddressMode {
        match self {
            Address::None => AddressMode::None,
            Address::Group(_) => AddressMode::Group,
            Address::Nwk(_) => AddressMode::Nwk,
            Address::Ieee(_) => AddressMode::Ieee,
            Address::Combined { .. } => AddressMode::Combined,
        }
    }

    pub fn short(&self) -> Option<u16> {
        match self {
            Address::Group(s) | Address::Nwk(s) => Some(*s),
            Address::Combined { short, .. } => Some(*short),
            _ => None,
        }
    }

    pub fn extended(&self) -> Option<ExtendedAddress> {
        match self {
            Address::Ieee(e) => Some(*e),
            Address::Combined { extended, .. } => Some(*extended),
            _ => None,
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::None => write!(f, "none"),
            Address::Group(s) => write!(f, "group:{s:04x}"),
            Address::Nwk(s) => write!(f, "nwk:{s:04x}"),
            Address::Ieee(e) => write!(f, "ieee:{e}"),
            Address::Combined { short, extended } => write!(f, "nwk:{short:04x}/ieee:{extended}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_roundtrips_through_byte() {
        for mode in [
            AddressMode::None,
            AddressMode::Group,
            AddressMode::Nwk,
            AddressMode::Ieee,
            AddressMode::Combined,
        ] {
            assert_eq!(AddressMode::from_byte(mode as u8), Some(mode));
        }
        assert_eq!(AddressMode::from_byte(0xFF), None);
    }

    #[test]
    fn accessors_match_variant() {
        let a = Address::Combined {
            short: 0x1234,
            extended: ExtendedAddress(0xdead_beef_0000_0001),
        };
        assert_eq!(a.mode(), AddressMode::Combined);
        assert_eq!(a.short(), Some(0x1234));
        assert_eq!(a.extended(), Some(ExtendedAddress(0xdead_beef_0000_0001)));

        let n = Address::Nwk(0x5678);
        assert_eq!(n.short(), Some(0x5678));
        assert_eq!(n.extended(), None);
    }

    #[test]
    fn display_formats() {
        assert_eq!(format!("{}", Address::None), "none");
        assert_eq!(format!("{}", Address::Nwk(0x0001)), "nwk:0001");
    }
}
