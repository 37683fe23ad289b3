use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

macro_rules! named_ids {
    (
        $(#[$meta:meta])*
        $name:ident, default $default:ident {
            $($variant:ident = $id:literal => $text:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
        pub enum $name {
            $(
                #[cfg_attr(feature = "serde", serde(rename = $text))]
                $variant = $id,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn id(self) -> u8 {
                self as u8
            }

            pub fn from_id(id: u8) -> Option<Self> {
                match id {
                    $($id => Some($name::$variant),)+
                    _ => None,
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!("unknown {} `{other}`", stringify!($name))),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

named_ids! {
    /// Color primaries / matrix standard of a dataspace
    Standard, default Unspecified {
        Unspecified = 0 => "UNSPECIFIED",
        Bt709 = 1 => "BT709",
        Bt601_625 = 2 => "BT601_625",
        Bt601_625Unadjusted = 3 => "BT601_625_UNADJUSTED",
        Bt601_525 = 4 => "BT601_525",
        Bt601_525Unadjusted = 5 => "BT601_525_UNADJUSTED",
        Bt2020 = 6 => "BT2020",
        Bt2020ConstantLuminance = 7 => "BT2020_CONSTANT_LUMINANCE",
        Bt470M = 8 => "BT470M",
        Film = 9 => "FILM",
        DciP3 = 10 => "DCI_P3",
        AdobeRgb = 11 => "ADOBE_RGB",
    }
}

named_ids! {
    /// Transfer function of a dataspace
    Transfer, default Unspecified {
        Unspecified = 0 => "UNSPECIFIED",
        Linear = 1 => "LINEAR",
        Srgb = 2 => "SRGB",
        Smpte170M = 3 => "SMPTE_170M",
        Gamma2_2 = 4 => "GAMMA2_2",
        Gamma2_6 = 5 => "GAMMA2_6",
        Gamma2_8 = 6 => "GAMMA2_8",
        St2084 = 7 => "ST2084",
        Hlg = 8 => "HLG",
    }
}

named_ids! {
    /// Display capability class of a target
    HdrCapa, default Unspecified {
        Unspecified = 0 => "UNSPECIFIED",
        Inner = 1 => "INNER",
        Outer = 2 => "OUTER",
    }
}

named_ids! {
    /// Bit depth class of a layer
    Bpc, default Bpc8 {
        Bpc8 = 0 => "BPC8",
        Bpc10 = 1 => "BPC10",
    }
}

/// Standard and transfer pair describing how pixel values are coded.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct Dataspace {
    #[cfg_attr(feature = "serde", serde(default))]
    pub standard: Standard,
    #[cfg_attr(feature = "serde", serde(default))]
    pub transfer: Transfer,
}

impl Dataspace {
    pub const fn new(standard: Standard, transfer: Transfer) -> Self {
        Self { standard, transfer }
    }

    /// Transfers the hardware cannot decode are treated as sRGB.
    pub fn resolved(self) -> Self {
        let transfer = match self.transfer {
            Transfer::Unspecified => Transfer::Srgb,
            other => other,
        };

        Self { transfer, ..self }
    }
}

impl fmt::Display for Dataspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.standard, self.transfer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for standard in Standard::ALL {
            assert_eq!(standard.name().parse::<Standard>(), Ok(*standard));
        }

        assert_eq!(Transfer::from_id(7), Some(Transfer::St2084));
        assert_eq!(Transfer::Hlg.id(), 8);
        assert!("BT2100".parse::<Standard>().is_err());
    }

    #[test]
    fn unspecified_transfer_resolves_to_srgb() {
        let ds = Dataspace::new(Standard::Bt709, Transfer::Unspecified);
        assert_eq!(ds.resolved().transfer, Transfer::Srgb);

        let pq = Dataspace::new(Standard::Bt2020, Transfer::St2084);
        assert_eq!(pq.resolved(), pq);
    }
}
