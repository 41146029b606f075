//! Atari 2600 cartridge image container.
//!
//! A cartridge image is the raw ROM bytes plus the bank scheme the
//! cartridge hardware implements. The packaging step that produces
//! the persisted artifact tags the scheme explicitly (`A26` magic +
//! scheme byte); untagged raw dumps fall back to size inference,
//! which cannot tell F4 from FE at 32K.

use std::fmt;

/// Bytes visible through the console's 4K cartridge window at a time.
pub const BANK_SIZE: usize = 4096;

/// ROM lengths the cartridge hardware can serve.
pub const SUPPORTED_SIZES: [usize; 5] = [2048, 4096, 8192, 16384, 32768];

/// Magic prefix of the tagged container format.
pub const MAGIC: [u8; 4] = *b"A26\x1a";

/// Container format version this crate reads and writes.
pub const CONTAINER_VERSION: u8 = 1;

/// Header length of the tagged container: magic, version, scheme tag,
/// flags, reserved.
pub const HEADER_LEN: usize = 8;

/// Flag bit: cartridge carries SuperChip RAM.
const FLAG_SUPERCHIP: u8 = 0x01;

/// Bank-switch scheme a cartridge implements.
///
/// Named after the hotspot addresses that trigger the switch (F8 uses
/// $1FF8/$1FF9, and so on). `None` is a plain unbanked 2K or 4K ROM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankScheme {
    /// Unbanked 2K or 4K ROM.
    None,
    /// 8K, two banks, hotspots $1FF8-$1FF9.
    F8,
    /// 16K, four banks, hotspots $1FF6-$1FF9.
    F6,
    /// 32K, eight banks, hotspots $1FF4-$1FFB.
    F4,
    /// Activision FE: the bank is inferred from the fetch that follows
    /// a $01FE stack access, not from a fixed hotspot.
    Fe,
}

impl BankScheme {
    /// Image lengths this scheme can serve.
    #[must_use]
    pub const fn valid_sizes(self) -> &'static [usize] {
        match self {
            Self::None => &[2048, 4096],
            Self::F8 => &[8192],
            Self::F6 => &[16384],
            Self::F4 => &[32768],
            // 8192 is the shipped hardware configuration; 32768 is
            // accepted under an explicit tag (it shares the size with
            // F4 and must be disambiguated at packaging time).
            Self::Fe => &[8192, 32768],
        }
    }

    /// Bank selected at power-up.
    ///
    /// The F8 latch comes up on the high bank; the reset vector of F8
    /// cartridges lives there. The other latches come up on bank 0.
    #[must_use]
    pub const fn reset_bank(self) -> usize {
        match self {
            Self::F8 => 1,
            Self::None | Self::F6 | Self::F4 | Self::Fe => 0,
        }
    }

    /// Whether an SC (SuperChip RAM) variant of this scheme exists.
    #[must_use]
    pub const fn supports_superchip(self) -> bool {
        matches!(self, Self::F8 | Self::F6 | Self::F4)
    }

    /// Infer the scheme from the image length alone.
    ///
    /// 32K is refused: F4 and FE share the size and guessing between
    /// them silently produces wrong-but-plausible game behavior.
    pub fn infer(len: usize) -> Result<Self, A26Error> {
        match len {
            2048 | 4096 => Ok(Self::None),
            8192 => Ok(Self::F8),
            16384 => Ok(Self::F6),
            32768 => Err(A26Error::AmbiguousScheme),
            other => Err(A26Error::InvalidImageSize(other)),
        }
    }

    /// Scheme byte used in the tagged container.
    #[must_use]
    pub const fn tag_byte(self) -> u8 {
        match self {
            Self::None => 0,
            Self::F8 => 1,
            Self::F6 => 2,
            Self::F4 => 3,
            Self::Fe => 4,
        }
    }

    /// Decode a container scheme byte.
    pub fn from_tag_byte(tag: u8) -> Result<Self, A26Error> {
        match tag {
            0 => Ok(Self::None),
            1 => Ok(Self::F8),
            2 => Ok(Self::F6),
            3 => Ok(Self::F4),
            4 => Ok(Self::Fe),
            other => Err(A26Error::UnknownScheme(other)),
        }
    }
}

impl fmt::Display for BankScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::F8 => "F8",
            Self::F6 => "F6",
            Self::F4 => "F4",
            Self::Fe => "FE",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum A26Error {
    /// Length is not a supported cartridge size.
    InvalidImageSize(usize),
    /// 32K image with no scheme tag: F4 and FE share the size and
    /// cannot be told apart from length alone.
    AmbiguousScheme,
    /// Declared scheme cannot serve an image of this length.
    SchemeSizeMismatch { scheme: BankScheme, len: usize },
    /// Bank or offset outside the image.
    OutOfRange { bank: usize, offset: usize },
    /// Tagged container with a bad magic or truncated header.
    BadContainer,
    /// Tagged container names a scheme this crate does not know.
    UnknownScheme(u8),
    /// SuperChip flag on a scheme that has no RAM variant.
    SuperchipUnsupported(BankScheme),
}

impl fmt::Display for A26Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidImageSize(len) => {
                write!(f, "invalid image size: {len} bytes (supported: {SUPPORTED_SIZES:?})")
            }
            Self::AmbiguousScheme => {
                write!(f, "32K image without a scheme tag: cannot tell F4 from FE by size")
            }
            Self::SchemeSizeMismatch { scheme, len } => {
                write!(f, "scheme {scheme} cannot serve a {len}-byte image")
            }
            Self::OutOfRange { bank, offset } => {
                write!(f, "bank {bank} offset {offset:#06x} outside the image")
            }
            Self::BadContainer => write!(f, "not a tagged A26 container"),
            Self::UnknownScheme(tag) => write!(f, "unknown scheme tag {tag:#04x}"),
            Self::SuperchipUnsupported(scheme) => {
                write!(f, "scheme {scheme} has no SuperChip variant")
            }
        }
    }
}

impl std::error::Error for A26Error {}

/// An immutable cartridge ROM plus the scheme that serves it.
pub struct RomImage {
    data: Vec<u8>,
    scheme: BankScheme,
    superchip: bool,
}

impl RomImage {
    /// Validate and wrap raw ROM bytes.
    ///
    /// With a declared scheme the length is checked against that
    /// scheme; without one the scheme is inferred from the length,
    /// refusing untagged 32K images.
    pub fn load(data: Vec<u8>, declared: Option<BankScheme>) -> Result<Self, A26Error> {
        Self::load_with_options(data, declared, false)
    }

    /// As [`load`](Self::load), with the SuperChip RAM flag.
    pub fn load_with_options(
        data: Vec<u8>,
        declared: Option<BankScheme>,
        superchip: bool,
    ) -> Result<Self, A26Error> {
        let len = data.len();
        if !SUPPORTED_SIZES.contains(&len) {
            return Err(A26Error::InvalidImageSize(len));
        }
        let scheme = match declared {
            Some(scheme) => {
                if !scheme.valid_sizes().contains(&len) {
                    return Err(A26Error::SchemeSizeMismatch { scheme, len });
                }
                scheme
            }
            None => BankScheme::infer(len)?,
        };
        if superchip && !scheme.supports_superchip() {
            return Err(A26Error::SuperchipUnsupported(scheme));
        }
        Ok(Self {
            data,
            scheme,
            superchip,
        })
    }

    /// Parse a tagged container produced by the packaging step.
    pub fn from_tagged(bytes: &[u8]) -> Result<Self, A26Error> {
        if bytes.len() < HEADER_LEN || bytes[0..4] != MAGIC {
            return Err(A26Error::BadContainer);
        }
        if bytes[4] != CONTAINER_VERSION {
            return Err(A26Error::BadContainer);
        }
        let scheme = BankScheme::from_tag_byte(bytes[5])?;
        let superchip = bytes[6] & FLAG_SUPERCHIP != 0;
        let payload = bytes[HEADER_LEN..].to_vec();
        Self::load_with_options(payload, Some(scheme), superchip)
    }

    /// Serialize into the tagged container format.
    #[must_use]
    pub fn to_tagged(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.data.len());
        out.extend_from_slice(&MAGIC);
        out.push(CONTAINER_VERSION);
        out.push(self.scheme.tag_byte());
        out.push(if self.superchip { FLAG_SUPERCHIP } else { 0 });
        out.push(0); // reserved
        out.extend_from_slice(&self.data);
        out
    }

    #[must_use]
    pub fn scheme(&self) -> BankScheme {
        self.scheme
    }

    #[must_use]
    pub fn superchip(&self) -> bool {
        self.superchip
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of 4K banks (a 2K image counts as one short bank).
    #[must_use]
    pub fn bank_count(&self) -> usize {
        self.data.len().div_ceil(BANK_SIZE)
    }

    /// Mask that maps a window address to an offset within a bank.
    ///
    /// 2K images mirror across the 4K window, so their mask is one bit
    /// shorter.
    #[must_use]
    pub fn offset_mask(&self) -> u16 {
        if self.data.len() == 2048 { 0x07FF } else { 0x0FFF }
    }

    /// Bounds-checked byte lookup. No clamping: an out-of-range bank
    /// or offset is a state-machine defect, not something to mask.
    pub fn byte_at(&self, bank: usize, offset: usize) -> Result<u8, A26Error> {
        if bank >= self.bank_count() || offset > usize::from(self.offset_mask()) {
            return Err(A26Error::OutOfRange { bank, offset });
        }
        Ok(self.data[bank * BANK_SIZE + offset])
    }

    /// The raw ROM bytes.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}
