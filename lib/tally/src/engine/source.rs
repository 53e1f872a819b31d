// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Where class definitions and packets come from.
//!
//! The engine never reads storage itself. A host hands it a
//! [`ClassSource`] and a [`PacketSource`]; `tallyadm` implements both
//! over files, tests implement them over vectors.

use tally_api::ClassSpec;
use tally_api::Packet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {what}")]
    Io {
        what: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed {what}: {msg}")]
    Parse { what: String, msg: String },
}

/// A provider of traffic class definitions.
pub trait ClassSource {
    fn classes(&self) -> Result<Vec<ClassSpec>, SourceError>;
}

/// A provider of captured packets.
pub trait PacketSource {
    fn packets(&self) -> Result<Vec<Packet>, SourceError>;
}

/// Classes and packets already in memory.
#[derive(Clone, Debug, Default)]
pub struct MemSource {
    pub classes: Vec<ClassSpec>,
    pub packets: Vec<Packet>,
}

impl MemSource {
    pub fn new(classes: Vec<ClassSpec>, packets: Vec<Packet>) -> Self {
        Self { classes, packets }
    }
}

impl ClassSource for MemSource {
    fn classes(&self) -> Result<Vec<ClassSpec>, SourceError> {
        Ok(self.classes.clone())
    }
}

impl PacketSource for MemSource {
    fn packets(&self) -> Result<Vec<Packet>, SourceError> {
        Ok(self.packets.clone())
    }
}
