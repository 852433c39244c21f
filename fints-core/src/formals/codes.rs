//! Coded enumerations used by the security segments
//!
//! Each enumeration maps to a fixed set of wire codes. The code domain of a
//! type (`CODES`) is what the field schema validates coded fields against.

use crate::error::{FintsError, FintsResult};
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! coded_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident => $code:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Every valid wire code of this enumeration
            pub const CODES: &'static [&'static str] = &[$($code),+];

            /// Get the wire code
            pub fn code(&self) -> &'static str {
                match self {
                    $($name::$variant => $code),+
                }
            }

            /// Get the enumeration value from its wire code
            pub fn from_code(code: &str) -> FintsResult<Self> {
                match code {
                    $($code => Ok($name::$variant),)+
                    _ => Err(FintsError::InvalidData(format!(
                        concat!("Invalid ", stringify!($name), " code: {}"),
                        code
                    ))),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.code())
            }
        }
    };
}

coded_enum! {
    /// Security method of a security profile
    SecurityMethod {
        Ddv => "DDV",
        Rah => "RAH",
        Rdh => "RDH",
        /// PIN/TAN
        Pin => "PIN",
    }
}

coded_enum! {
    /// Role of the security supplier
    SecurityRole {
        /// Issuer (Erfasser)
        Iss => "1",
        /// Co-signer (Mitunterzeichner)
        Con => "3",
        /// Witness (Zeuge)
        Wit => "4",
    }
}

coded_enum! {
    /// Party identified in the security identification details
    IdentifiedRole {
        /// Message sender
        Ms => "1",
        /// Message receiver
        Mr => "2",
    }
}

coded_enum! {
    /// Meaning of a security timestamp
    DateTimeType {
        /// Security timestamp
        Sts => "1",
        /// Certificate revocation time
        Crt => "6",
    }
}

coded_enum! {
    /// Usage of the encryption algorithm
    UsageEncryption {
        /// Owner symmetric
        Osy => "2",
    }
}

coded_enum! {
    /// Operation mode of an encryption or signature algorithm
    OperationMode {
        Cbc => "2",
        Iso9796_1 => "16",
        Iso9796_2Random => "17",
        Pkcs1v15 => "18",
        Pkcs1Pss => "19",
        Zzz => "999",
    }
}

coded_enum! {
    /// Encryption algorithm
    EncryptionAlgorithmCoded {
        /// Two-key triple DES
        TwoKey3Des => "13",
        Aes256 => "14",
    }
}

coded_enum! {
    /// Name of the key parameter of an encryption algorithm
    AlgorithmParameterName {
        /// Symmetric key, encrypted with a symmetric key
        Kye => "5",
        /// Symmetric key, encrypted with a public key
        Kyp => "6",
    }
}

coded_enum! {
    /// Name of the initialization vector parameter
    AlgorithmParameterIvName {
        /// Initialization value, clear text
        Ivc => "1",
    }
}

coded_enum! {
    /// Key type of a key name
    KeyType {
        /// Key for signing with DS
        D => "D",
        /// Signing key
        S => "S",
        /// Encryption key
        V => "V",
    }
}

coded_enum! {
    /// Compression applied before encryption
    CompressionFunction {
        Null => "0",
        Lzw => "1",
        Com => "2",
        Lzss => "3",
        LzHuf => "4",
        Zip => "5",
        Gzip => "6",
        Bzip2 => "7",
        Zzz => "999",
    }
}

coded_enum! {
    /// Area covered by a signature
    SecurityApplicationArea {
        /// Signature header and business segments
        Shm => "1",
        /// From signature header to signature trailer
        Sht => "2",
    }
}
