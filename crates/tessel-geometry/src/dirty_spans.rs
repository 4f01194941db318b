//! Dirty-span tracking for partial buffer updates.
//!
//! In-place edits (recolor, leaf transforms) record the bytes they changed
//! per channel. Spans are merged on flush so each contiguous change is
//! uploaded with a single write.

use crate::Channel;
use bitflags::bitflags;
use std::ops::Range;
use tessel_core::alloc::HashMap;

bitflags! {
    /// Which channels have pending spans.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DirtyChannels: u32 {
        const FILL_POSITION = 1 << 0;
        const FILL_COLOR = 1 << 1;
        const FILL_NORMAL = 1 << 2;
        const FILL_TEXCOORD = 1 << 3;
        const FILL_AMBIENT = 1 << 4;
        const FILL_SPECULAR = 1 << 5;
        const FILL_EMISSIVE = 1 << 6;
        const FILL_SHININESS = 1 << 7;
        const FILL_INDEX = 1 << 8;
        const LINE_POSITION = 1 << 9;
        const LINE_COLOR = 1 << 10;
        const LINE_DIR_WIDTH = 1 << 11;
        const LINE_INDEX = 1 << 12;
        const POINT_POSITION = 1 << 13;
        const POINT_COLOR = 1 << 14;
        const POINT_OFFSET = 1 << 15;
        const POINT_INDEX = 1 << 16;
    }
}

impl DirtyChannels {
    pub fn from_channel(channel: Channel) -> Self {
        Self::from_bits_truncate(1 << channel as u32)
    }
}

/// Replacement bytes for one channel starting at byte `offset`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirtySpan {
    pub channel: Channel,
    pub offset: u64,
    pub data: Vec<u8>,
}

impl DirtySpan {
    pub fn byte_range(&self) -> Range<u64> {
        self.offset..self.offset + self.data.len() as u64
    }
}

/// Pending spans, kept sorted and non-overlapping per channel.
#[derive(Debug, Clone, Default)]
pub struct DirtySpanCache {
    spans: HashMap<Channel, Vec<DirtySpan>>,
    pending: DirtyChannels,
}

impl DirtySpanCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `data` replaces the bytes of `channel` at `offset`.
    ///
    /// Overlapping or adjacent spans are merged immediately; where they
    /// overlap the newer bytes win.
    pub fn record(&mut self, channel: Channel, offset: u64, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        self.pending |= DirtyChannels::from_channel(channel);
        let spans = self.spans.entry(channel).or_default();

        let start = offset;
        let end = offset + data.len() as u64;
        let mut insert_idx = spans.len();
        let mut merge: Option<Range<usize>> = None;

        for (i, span) in spans.iter().enumerate() {
            let range = span.byte_range();
            if range.start <= end && start <= range.end {
                merge = Some(match merge {
                    Some(m) => m.start..i + 1,
                    None => i..i + 1,
                });
            } else if range.start > end {
                if merge.is_none() {
                    insert_idx = i;
                }
                break;
            }
        }

        match merge {
            Some(merge) => {
                let merged_start = spans[merge.start].offset.min(start);
                let merged_end = spans[merge.end - 1].byte_range().end.max(end);
                let mut bytes = vec![0u8; (merged_end - merged_start) as usize];
                for span in &spans[merge.clone()] {
                    let at = (span.offset - merged_start) as usize;
                    bytes[at..at + span.data.len()].copy_from_slice(&span.data);
                }
                let at = (start - merged_start) as usize;
                bytes[at..at + data.len()].copy_from_slice(data);

                spans.drain(merge.clone());
                spans.insert(
                    merge.start,
                    DirtySpan {
                        channel,
                        offset: merged_start,
                        data: bytes,
                    },
                );
            }
            None => spans.insert(
                insert_idx,
                DirtySpan {
                    channel,
                    offset,
                    data: data.to_vec(),
                },
            ),
        }
    }

    /// Take every pending span, ordered by channel then offset.
    pub fn flush(&mut self) -> Vec<DirtySpan> {
        let mut channels: Vec<Channel> = self.spans.keys().copied().collect();
        channels.sort();
        let mut out = Vec::new();
        for channel in channels {
            if let Some(spans) = self.spans.remove(&channel) {
                out.extend(spans);
            }
        }
        self.pending = DirtyChannels::empty();
        out
    }

    /// Drop every pending span. Called before a structural upload.
    pub fn clear(&mut self) {
        self.spans.clear();
        self.pending = DirtyChannels::empty();
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending_channels(&self) -> DirtyChannels {
        self.pending
    }

    /// Number of spans pending for `channel`.
    pub fn span_count(&self, channel: Channel) -> usize {
        self.spans.get(&channel).map_or(0, Vec::len)
    }
}
