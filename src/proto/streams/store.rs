use std::collections::HashMap;

use slab::Slab;

use crate::frame::StreamId;

use super::stream::Stream;

/// Storage for the streams of one session.
///
/// Streams live in a slab; a side map resolves stream ids to slab keys. The
/// session keeps two of these, one for active streams and one for zombies,
/// and a stream is in exactly one of them at any time.
#[derive(Debug)]
pub(crate) struct StreamSet {
    slab: Slab<Stream>,
    ids: HashMap<StreamId, usize>,
}

impl StreamSet {
    pub fn new() -> Self {
        StreamSet {
            slab: Slab::new(),
            ids: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: StreamId) -> bool {
        self.ids.contains_key(&id)
    }

    /// Insert a stream. Fails if a stream with the same id is already
    /// present, handing the stream back to the caller.
    pub fn insert(&mut self, stream: Stream) -> Result<(), Stream> {
        let id = stream.id();
        if self.ids.contains_key(&id) {
            return Err(stream);
        }

        let key = self.slab.insert(stream);
        self.ids.insert(id, key);
        Ok(())
    }

    pub fn get(&self, id: StreamId) -> Option<&Stream> {
        self.ids.get(&id).map(|&key| &self.slab[key])
    }

    pub fn get_mut(&mut self, id: StreamId) -> Option<&mut Stream> {
        if let Some(&key) = self.ids.get(&id) {
            Some(&mut self.slab[key])
        } else {
            None
        }
    }

    pub fn remove(&mut self, id: StreamId) -> Option<Stream> {
        self.ids.remove(&id).map(|key| self.slab.remove(key))
    }

    /// Snapshot of the ids currently present. Iterating the snapshot
    /// tolerates removal of any element, including the current one.
    pub fn ids(&self) -> Vec<StreamId> {
        self.ids.keys().copied().collect()
    }

    /// Invoke `f` for each stream; `f` returning `false` stops the
    /// iteration.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&Stream) -> bool,
    {
        for &key in self.ids.values() {
            if !f(&self.slab[key]) {
                return;
            }
        }
    }

    /// First stream matching `pred`, or none.
    pub fn find<F>(&self, mut pred: F) -> Option<&Stream>
    where
        F: FnMut(&Stream) -> bool,
    {
        for &key in self.ids.values() {
            if pred(&self.slab[key]) {
                return Some(&self.slab[key]);
            }
        }
        None
    }
}
