//! CID (Content Identifier) utilities
//!
//! Block and root identifiers for stored files, hashed with BLAKE3

use cid::{Cid, Version};
use multihash_codetable::{Code, MultihashDigest};

/// IPLD codecs used for file blocks and roots
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CidCodec {
    /// Raw binary data (0x55)
    #[default]
    Raw,
    /// DAG-PB/Protobuf (0x70)
    DagPb,
}

impl CidCodec {
    /// Get the multicodec code
    pub fn code(&self) -> u64 {
        match self {
            CidCodec::Raw => 0x55,
            CidCodec::DagPb => 0x70,
        }
    }

    /// Parse from multicodec code
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0x55 => Some(CidCodec::Raw),
            0x70 => Some(CidCodec::DagPb),
            _ => None,
        }
    }
}

/// Create a CIDv1 over `data` with a BLAKE3 multihash
pub fn create_cid(data: &[u8], codec: CidCodec) -> Cid {
    let multihash = Code::Blake3_256.digest(data);
    Cid::new_v1(codec.code(), multihash)
}

/// Derive the root identifier of a file from its block identifiers, in order
pub fn root_cid<'a>(blocks: impl IntoIterator<Item = &'a Cid>) -> Cid {
    let mut links = Vec::new();
    for block in blocks {
        links.extend_from_slice(&block.to_bytes());
    }
    create_cid(&links, CidCodec::DagPb)
}

/// Parse a CID from a string
pub fn parse_cid(s: &str) -> Result<Cid, crate::StorageError> {
    s.parse()
        .map_err(|e: cid::Error| crate::StorageError::Unknown(format!("invalid CID {s}: {e}")))
}

/// Whether a CID uses the given codec and CID version 1
pub fn is_v1_with_codec(cid: &Cid, codec: CidCodec) -> bool {
    cid.version() == Version::V1 && CidCodec::from_code(cid.codec()) == Some(codec)
}
