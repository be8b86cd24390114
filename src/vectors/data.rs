//! Built-in test vectors.
//!
//! The `password`/`somesalt` vectors come from the Argon2 reference implementation; the vectors
//! with secret and associated data are the ones published in RFC 9106, section 5.

use super::{TestVector, VectorGroup};
use crate::params::{Argon2Type, Argon2Version};

// SHARED INPUTS
// ================================================================================================

const PASSWORD: &[u8] = b"password";
const SALT: &[u8] = b"somesalt";

const RFC_PASSWORD: &[u8] = &[0x01; 32];
const RFC_SALT: &[u8] = &[0x02; 16];
const RFC_SECRET: &[u8] = &[0x03; 8];
const RFC_ASSOCIATED_DATA: &[u8] = &[0x04; 12];

/// Returns a vector hashing `password` with `somesalt` and no secret or associated data.
const fn reference(t_cost: u32, m_cost: u32, lanes: u32, expected: &'static [u8]) -> TestVector<'static> {
    TestVector {
        t_cost,
        m_cost,
        lanes,
        password: PASSWORD,
        salt: SALT,
        secret: &[],
        associated_data: &[],
        expected,
    }
}

/// Returns the RFC 9106 vector (t=3, m=32, p=4) producing `expected`.
const fn rfc9106(expected: &'static [u8]) -> TestVector<'static> {
    TestVector {
        t_cost: 3,
        m_cost: 32,
        lanes: 4,
        password: RFC_PASSWORD,
        salt: RFC_SALT,
        secret: RFC_SECRET,
        associated_data: RFC_ASSOCIATED_DATA,
        expected,
    }
}

// VECTORS
// ================================================================================================
const ARGON2I_V10: &[TestVector<'static>] = &[
    reference(
        2,
        256,
        1,
        &[
            0xfd, 0x4d, 0xd8, 0x3d, 0x76, 0x2c, 0x49, 0xbd,
            0xea, 0xf5, 0x7c, 0x47, 0xbd, 0xcd, 0x0c, 0x2f,
            0x1b, 0xab, 0xf8, 0x63, 0xfd, 0xeb, 0x49, 0x0d,
            0xf6, 0x3e, 0xde, 0x99, 0x75, 0xfc, 0xcf, 0x06,
        ],
    ),
    reference(
        2,
        256,
        2,
        &[
            0xb6, 0xc1, 0x15, 0x60, 0xa6, 0xa9, 0xd6, 0x1e,
            0xac, 0x70, 0x6b, 0x79, 0xa2, 0xf9, 0x7d, 0x68,
            0xb4, 0x46, 0x3a, 0xa3, 0xad, 0x87, 0xe0, 0x0c,
            0x07, 0xe2, 0xb0, 0x1e, 0x90, 0xc5, 0x64, 0xfb,
        ],
    ),
    reference(
        2,
        65536,
        1,
        &[
            0xf6, 0xc4, 0xdb, 0x4a, 0x54, 0xe2, 0xa3, 0x70,
            0x62, 0x7a, 0xff, 0x3d, 0xb6, 0x17, 0x6b, 0x94,
            0xa2, 0xa2, 0x09, 0xa6, 0x2c, 0x8e, 0x36, 0x15,
            0x27, 0x11, 0x80, 0x2f, 0x7b, 0x30, 0xc6, 0x94,
        ],
    ),
];

const ARGON2I_V13: &[TestVector<'static>] = &[
    rfc9106(&[
        0xc8, 0x14, 0xd9, 0xd1, 0xdc, 0x7f, 0x37, 0xaa,
        0x13, 0xf0, 0xd7, 0x7f, 0x24, 0x94, 0xbd, 0xa1,
        0xc8, 0xde, 0x6b, 0x01, 0x6d, 0xd3, 0x88, 0xd2,
        0x99, 0x52, 0xa4, 0xc4, 0x67, 0x2b, 0x6c, 0xe8,
    ]),
    reference(
        2,
        65536,
        1,
        &[
            0xc1, 0x62, 0x88, 0x32, 0x14, 0x7d, 0x97, 0x20,
            0xc5, 0xbd, 0x1c, 0xfd, 0x61, 0x36, 0x70, 0x78,
            0x72, 0x9f, 0x6d, 0xfb, 0x6f, 0x8f, 0xea, 0x9f,
            0xf9, 0x81, 0x58, 0xe0, 0xd7, 0x81, 0x6e, 0xd0,
        ],
    ),
];

const ARGON2D_V13: &[TestVector<'static>] = &[
    rfc9106(&[
        0x51, 0x2b, 0x39, 0x1b, 0x6f, 0x11, 0x62, 0x97,
        0x53, 0x71, 0xd3, 0x09, 0x19, 0x73, 0x42, 0x94,
        0xf8, 0x68, 0xe3, 0xbe, 0x39, 0x84, 0xf3, 0xc1,
        0xa1, 0x3a, 0x4d, 0xb9, 0xfa, 0xbe, 0x4a, 0xcb,
    ]),
];

/// Every built-in vector, grouped by Argon2 variant and version.
pub const TEST_GROUPS: &[VectorGroup<'static>] = &[
    VectorGroup {
        variant: Argon2Type::I,
        version: Argon2Version::V10,
        vectors: ARGON2I_V10,
    },
    VectorGroup {
        variant: Argon2Type::I,
        version: Argon2Version::V13,
        vectors: ARGON2I_V13,
    },
    VectorGroup {
        variant: Argon2Type::D,
        version: Argon2Version::V13,
        vectors: ARGON2D_V13,
    },
];
