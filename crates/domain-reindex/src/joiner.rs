//! Joining a contiguous run of dimensions into one joint dimension, and
//! splitting it back.

use discrete_domain::{JointDomainIndexer, JointLayout};

use crate::error::Result;
use crate::reindexer::Endpoints;
use crate::scratch::IndicesScratch;

/// The run `[offset, offset + length)` of the wide side and the indexer of
/// the joint domain standing in for it on the narrow side.
#[derive(Debug, Clone)]
pub(crate) struct Joiner {
    offset: usize,
    length: usize,
    sub: JointDomainIndexer,
    layout: JointLayout,
}

impl PartialEq for Joiner {
    fn eq(&self, other: &Self) -> bool {
        self.offset == other.offset && self.sub == other.sub
    }
}

impl Joiner {
    pub(crate) fn new(offset: usize, sub: JointDomainIndexer) -> Result<Self> {
        let layout = sub.joint_layout()?.clone();
        Ok(Self {
            offset,
            length: sub.len(),
            sub,
            layout,
        })
    }

    pub(crate) fn length(&self) -> usize {
        self.length
    }

    /// True if joining leaves every joint index unchanged.
    pub(crate) fn is_identity(&self, ends: &Endpoints) -> bool {
        ends.canonical() && self.sub.has_canonical_domain_order()
    }

    pub(crate) fn join_indices(&self, scratch: &mut IndicesScratch) {
        let (o, n) = (self.offset, self.length);
        scratch.to[..o].copy_from_slice(&scratch.from[..o]);
        scratch.joined.copy_from_slice(&scratch.from[o..o + n]);
        scratch.to[o] = self.layout.encode(&scratch.joined);
        scratch.to[o + 1..].copy_from_slice(&scratch.from[o + n..]);
        scratch.unreachable = false;
    }

    pub(crate) fn split_indices(&self, scratch: &mut IndicesScratch) {
        let (o, n) = (self.offset, self.length);
        scratch.to[..o].copy_from_slice(&scratch.from[..o]);
        self.layout.decode(scratch.from[o], &mut scratch.joined);
        scratch.to[o..o + n].copy_from_slice(&scratch.joined);
        scratch.to[o + n..].copy_from_slice(&scratch.from[o + 1..]);
        scratch.unreachable = false;
    }
}
