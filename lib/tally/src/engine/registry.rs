// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! The class registry.
//!
//! A registry owns every class of one analysis run. Its shape is fixed
//! at construction; during dispatch only the class counters move. The
//! default class always sits at index 0 and catches whatever no other
//! class claims.

use super::class::ClassError;
use super::class::TrafficClass;
use std::collections::BTreeSet;
use tally_api::ClassSpec;
use tally_api::ClassStat;
use tally_api::Report;

/// The id of the default class.
pub const DEFAULT_CLASS_ID: u32 = 0;

/// The name of the default class.
pub const DEFAULT_CLASS_NAME: &str = "default";

#[derive(Debug)]
pub struct ClassRegistry {
    classes: Vec<TrafficClass>,
}

impl ClassRegistry {
    /// Build a registry from class definitions, in declaration order.
    ///
    /// Every definition is validated before any packet can be
    /// dispatched; a registry with a malformed class never exists.
    pub fn new(specs: &[ClassSpec]) -> Result<Self, ClassError> {
        let mut seen = BTreeSet::new();
        let mut classes = Vec::with_capacity(specs.len() + 1);
        classes.push(TrafficClass::new(
            DEFAULT_CLASS_ID,
            DEFAULT_CLASS_NAME,
            "traffic not claimed by any other class",
        ));

        for spec in specs {
            if spec.id == DEFAULT_CLASS_ID {
                return Err(ClassError::ReservedId(spec.id));
            }

            if !seen.insert(spec.id) {
                return Err(ClassError::DuplicateId(spec.id));
            }

            classes.push(TrafficClass::from_spec(spec)?);
        }

        Ok(Self { classes })
    }

    /// The fallback class, index 0.
    pub fn default_class(&self) -> &TrafficClass {
        &self.classes[0]
    }

    /// All classes in registry order, the default class first.
    pub fn classes(&self) -> &[TrafficClass] {
        &self.classes
    }

    /// The classes competing for packets: everything but the default.
    pub fn competitors(&self) -> &[TrafficClass] {
        &self.classes[1..]
    }

    /// The number of classes, including the default class.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Look up a class by id.
    pub fn get(&self, id: u32) -> Option<&TrafficClass> {
        self.classes.iter().find(|c| c.id() == id)
    }

    /// Snapshot the counters of every class, in registry order.
    ///
    /// Classes that saw no traffic are left out unless `include_idle`
    /// is set.
    pub fn report(&self, include_idle: bool) -> Report {
        let classes = self
            .classes
            .iter()
            .map(ClassStat::from)
            .filter(|stat| include_idle || !stat.is_idle())
            .collect();

        Report { classes }
    }
}
