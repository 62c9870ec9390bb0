//! Predicates deciding which manifest pairs become upgrade paths
//!
//! Evaluation order is fixed: definedness, variant targeting, protocol
//! compatibility. The first failing predicate decides the rejection and
//! later predicates are not evaluated.

use crate::upgrade::meta::{Variant, VersionMeta};
use tracing::debug;

/// Why a candidate pair was skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// One side is an absence marker (normal, not an error)
    Undefined,
    /// Not a variant/family combination this run targets
    UntargetedVariant,
    /// Origin cannot speak any protocol version the destination accepts
    ProtocolMismatch,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::Undefined => write!(f, "version undefined"),
            Rejection::UntargetedVariant => write!(f, "variant combination not targeted"),
            Rejection::ProtocolMismatch => write!(f, "no compatible protocol version"),
        }
    }
}

/// Inputs the variant-targeting predicate depends on
#[derive(Debug, Clone, Copy)]
pub struct PathFilter<'a> {
    local_family: &'a str,
    full_matrix: bool,
    override_active: bool,
}

impl<'a> PathFilter<'a> {
    pub fn new(local_family: &'a str, full_matrix: bool, override_active: bool) -> Self {
        Self {
            local_family,
            full_matrix,
            override_active,
        }
    }

    pub fn is_defined(origin: Option<&VersionMeta>, destination: Option<&VersionMeta>) -> bool {
        origin.is_some() && destination.is_some()
    }

    /// Released line upgrading to an in-development line
    ///
    /// An active override manifest bypasses variant filtering. Otherwise
    /// only `current -> indev` pairs qualify, and outside full-matrix mode
    /// the destination must belong to the local family.
    pub fn is_targeted_variant_combo(&self, origin: &VersionMeta, destination: &VersionMeta) -> bool {
        if self.override_active {
            return true;
        }

        if origin.variant != Variant::Current || destination.variant != Variant::Indev {
            return false;
        }

        if self.full_matrix {
            return true;
        }

        destination.family == self.local_family
    }

    /// Origin and destination share at least one protocol version
    pub fn is_protocol_compatible(origin: &VersionMeta, destination: &VersionMeta) -> bool {
        origin.max_proto_v >= destination.min_proto_v
    }

    /// Run all predicates in order, short-circuiting on the first rejection
    pub fn evaluate<'m>(
        &self,
        origin: Option<&'m VersionMeta>,
        destination: Option<&'m VersionMeta>,
    ) -> Result<(&'m VersionMeta, &'m VersionMeta), Rejection> {
        let (origin, destination) = match (origin, destination) {
            (Some(o), Some(d)) => (o, d),
            _ => {
                debug!(
                    origin = origin.map(|m| m.name.as_str()).unwrap_or("<none>"),
                    destination = destination.map(|m| m.name.as_str()).unwrap_or("<none>"),
                    "skipping upgrade path, a version is undefined (this is normal)"
                );
                return Err(Rejection::Undefined);
            }
        };

        if !self.is_targeted_variant_combo(origin, destination) {
            debug!(
                origin = %origin.name,
                destination = %destination.name,
                origin_variant = %origin.variant,
                destination_variant = %destination.variant,
                destination_family = %destination.family,
                local_family = %self.local_family,
                "skipping upgrade path, variant combination not targeted"
            );
            return Err(Rejection::UntargetedVariant);
        }

        if !Self::is_protocol_compatible(origin, destination) {
            debug!(
                origin = %origin.name,
                destination = %destination.name,
                origin_max_proto_v = origin.max_proto_v,
                destination_min_proto_v = destination.min_proto_v,
                "skipping upgrade path, no compatible protocol version"
            );
            return Err(Rejection::ProtocolMismatch);
        }

        Ok((origin, destination))
    }
}
