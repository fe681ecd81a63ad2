//! Tag registry for the closed set of operations.
//!
//! [`OpKind`] names an operation variant without its argument. The tag table
//! is a `const` array indexed by tag byte, built at compile time from
//! [`OpKind::ALL`], so lookup is a single index and an unregistered tag is
//! always `None`.

use std::fmt;

/// Wire tag of the SHA-1 operation.
pub const TAG_SHA1: u8 = 0x02;
/// Wire tag of the RIPEMD-160 operation.
pub const TAG_RIPEMD160: u8 = 0x03;
/// Wire tag of the SHA-256 operation.
pub const TAG_SHA256: u8 = 0x08;
/// Wire tag of the append operation.
pub const TAG_APPEND: u8 = 0xF0;
/// Wire tag of the prepend operation.
pub const TAG_PREPEND: u8 = 0xF1;
/// Wire tag of the reverse operation.
pub const TAG_REVERSE: u8 = 0xF2;
/// Wire tag of the hexlify operation.
pub const TAG_HEXLIFY: u8 = 0xF3;

/// Operation variant, without argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OpKind {
    Sha1,
    Ripemd160,
    Sha256,
    Append,
    Prepend,
    Reverse,
    Hexlify,
}

impl OpKind {
    /// Every registered operation, in tag order.
    pub const ALL: [Self; 7] = [
        Self::Sha1,
        Self::Ripemd160,
        Self::Sha256,
        Self::Append,
        Self::Prepend,
        Self::Reverse,
        Self::Hexlify,
    ];

    #[must_use]
    pub const fn tag(self) -> u8 {
        match self {
            Self::Sha1 => TAG_SHA1,
            Self::Ripemd160 => TAG_RIPEMD160,
            Self::Sha256 => TAG_SHA256,
            Self::Append => TAG_APPEND,
            Self::Prepend => TAG_PREPEND,
            Self::Reverse => TAG_REVERSE,
            Self::Hexlify => TAG_HEXLIFY,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Ripemd160 => "ripemd160",
            Self::Sha256 => "sha256",
            Self::Append => "append",
            Self::Prepend => "prepend",
            Self::Reverse => "reverse",
            Self::Hexlify => "hexlify",
        }
    }

    /// Binary operations carry one length-prefixed byte-string argument.
    #[must_use]
    pub const fn is_binary(self) -> bool {
        matches!(self, Self::Append | Self::Prepend)
    }

    #[must_use]
    pub const fn is_hash(self) -> bool {
        matches!(self, Self::Sha1 | Self::Ripemd160 | Self::Sha256)
    }

    /// Look up the operation registered under `tag`.
    #[must_use]
    pub const fn from_tag(tag: u8) -> Option<Self> {
        REGISTRY[tag as usize]
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const REGISTRY: [Option<OpKind>; 256] = build_registry();

const fn build_registry() -> [Option<OpKind>; 256] {
    let mut table = [None; 256];
    let mut i = 0;
    while i < OpKind::ALL.len() {
        let kind = OpKind::ALL[i];
        table[kind.tag() as usize] = Some(kind);
        i += 1;
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_kind_round_trips_through_its_tag() {
        for kind in OpKind::ALL {
            assert_eq!(OpKind::from_tag(kind.tag()), Some(kind));
        }
    }

    #[test]
    fn tags_are_unique() {
        let mut seen = HashSet::new();
        for kind in OpKind::ALL {
            assert!(seen.insert(kind.tag()), "duplicate tag for {kind}");
        }
    }

    #[test]
    fn reserved_tags_are_not_operations() {
        // 0x00 introduces an attestation, 0xff is the branch sentinel.
        assert_eq!(OpKind::from_tag(0x00), None);
        assert_eq!(OpKind::from_tag(0xFF), None);
        assert_eq!(OpKind::from_tag(0x7A), None);
    }

    #[test]
    fn registry_covers_exactly_the_known_kinds() {
        let registered = (0..=u8::MAX).filter_map(OpKind::from_tag).count();
        assert_eq!(registered, OpKind::ALL.len());
    }

    #[test]
    fn binary_and_hash_partition() {
        for kind in OpKind::ALL {
            assert!(!(kind.is_binary() && kind.is_hash()), "{kind}");
        }
        assert!(OpKind::Append.is_binary());
        assert!(OpKind::Prepend.is_binary());
        assert!(OpKind::Sha256.is_hash());
        assert!(!OpKind::Reverse.is_hash() && !OpKind::Reverse.is_binary());
    }
}
