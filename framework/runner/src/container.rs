//! Decoding of the compressed scenario container.
//!
//! A scenario file is a gzip stream. Once inflated it starts with a 10 byte format header, then a
//! length prefixed name and a length prefixed description. Each prefix is a little endian `i32`
//! and the payload is ASCII. Nothing after the description is read.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use vcmi_autotest_core::prelude::PlayerColor;

/// Bytes of format and version magic at the start of the inflated container.
pub const HEADER_LEN: usize = 10;

/// Description marker telling the driver to track the blue player instead of red.
pub const BLUE_PLAYER_MARKER: &str = "PLAYER:BLUE";

const LENGTH_PREFIX_LEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum ContainerField {
    #[display("name")]
    Name,
    #[display("description")]
    Description,
}

#[derive(Debug, thiserror::Error)]
pub enum MalformedScenarioError {
    #[error("Failed to read scenario file: {0}")]
    Unreadable(#[source] std::io::Error),
    #[error("Scenario is not a valid gzip stream: {0}")]
    Decompression(#[source] std::io::Error),
    #[error("Scenario header is {actual} bytes, expected {expected}", expected = HEADER_LEN)]
    TruncatedHeader { actual: usize },
    #[error("Scenario ends before the {field} length prefix ({remaining} bytes left)")]
    MissingLengthPrefix {
        field: ContainerField,
        remaining: usize,
    },
    #[error("Scenario {field} has a negative length ({length})")]
    NegativeLength { field: ContainerField, length: i32 },
    #[error("Scenario {field} declares {declared} bytes but only {remaining} remain")]
    Truncated {
        field: ContainerField,
        declared: usize,
        remaining: usize,
    },
}

/// What the driver knows about a scenario before running it. Fixed once decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioDescriptor {
    pub display_name: String,
    pub description: String,
    pub tracked_player: PlayerColor,
}

impl ScenarioDescriptor {
    pub fn from_path(path: &Path) -> Result<Self, MalformedScenarioError> {
        let file = File::open(path).map_err(MalformedScenarioError::Unreadable)?;
        Self::decode(BufReader::new(file))
    }

    /// Decode a descriptor from a gzip compressed container.
    ///
    /// Every length prefix is checked against the bytes that are actually left, so a corrupt file
    /// is reported as [`MalformedScenarioError`] instead of driving an allocation or a read past
    /// the end.
    pub fn decode<R: Read>(reader: R) -> Result<Self, MalformedScenarioError> {
        let mut payload = Vec::new();
        GzDecoder::new(reader)
            .read_to_end(&mut payload)
            .map_err(MalformedScenarioError::Decompression)?;

        let mut fields = FieldReader::new(&payload);
        fields.skip_header()?;
        let display_name = fields.read_ascii(ContainerField::Name)?;
        let description = fields.read_ascii(ContainerField::Description)?;
        let tracked_player = tracked_player_for(&description);

        Ok(Self {
            display_name,
            description,
            tracked_player,
        })
    }
}

fn tracked_player_for(description: &str) -> PlayerColor {
    if description.contains(BLUE_PLAYER_MARKER) {
        PlayerColor::Blue
    } else {
        PlayerColor::Red
    }
}

struct FieldReader<'a> {
    payload: &'a [u8],
    position: usize,
}

impl<'a> FieldReader<'a> {
    fn new(payload: &'a [u8]) -> Self {
        Self {
            payload,
            position: 0,
        }
    }

    fn remaining(&self) -> &'a [u8] {
        &self.payload[self.position..]
    }

    fn skip_header(&mut self) -> Result<(), MalformedScenarioError> {
        let actual = self.remaining().len();
        if actual < HEADER_LEN {
            return Err(MalformedScenarioError::TruncatedHeader { actual });
        }
        self.position += HEADER_LEN;
        Ok(())
    }

    fn read_length(&mut self, field: ContainerField) -> Result<usize, MalformedScenarioError> {
        let remaining = self.remaining();
        let prefix: [u8; LENGTH_PREFIX_LEN] = remaining
            .get(..LENGTH_PREFIX_LEN)
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or(MalformedScenarioError::MissingLengthPrefix {
                field,
                remaining: remaining.len(),
            })?;
        self.position += LENGTH_PREFIX_LEN;

        let length = i32::from_le_bytes(prefix);
        usize::try_from(length)
            .map_err(|_| MalformedScenarioError::NegativeLength { field, length })
    }

    fn read_ascii(&mut self, field: ContainerField) -> Result<String, MalformedScenarioError> {
        let declared = self.read_length(field)?;
        let remaining = self.remaining();
        let bytes = remaining
            .get(..declared)
            .ok_or(MalformedScenarioError::Truncated {
                field,
                declared,
                remaining: remaining.len(),
            })?;
        self.position += declared;

        // Same substitution as an ASCII decoder, anything outside the range becomes '?'
        Ok(bytes
            .iter()
            .map(|&b| if b.is_ascii() { b as char } else { '?' })
            .collect())
    }
}
