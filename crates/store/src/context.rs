//! Execution context
//!
//! Carries the store, the block header values the engine needs, and the
//! events emitted so far.

use crate::cache::CacheStore;
use crate::error::StoreError;
use crate::event::Event;
use crate::kv::KvStore;
use chrono::{DateTime, NaiveDate, Utc};

pub struct Context<'a> {
    store: &'a mut dyn KvStore,
    block_time: DateTime<Utc>,
    block_height: u64,
    events: Vec<Event>,
}

impl<'a> Context<'a> {
    pub fn new(store: &'a mut dyn KvStore, block_time: DateTime<Utc>, block_height: u64) -> Self {
        Self {
            store,
            block_time,
            block_height,
            events: Vec::new(),
        }
    }

    pub fn store(&self) -> &dyn KvStore {
        &*self.store
    }

    pub fn store_mut(&mut self) -> &mut dyn KvStore {
        &mut *self.store
    }

    pub fn block_time(&self) -> DateTime<Utc> {
        self.block_time
    }

    pub fn block_height(&self) -> u64 {
        self.block_height
    }

    /// The UTC calendar day of the block
    pub fn block_day(&self) -> NaiveDate {
        self.block_time.date_naive()
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Run `f` against a cache branch of this context.
    ///
    /// On `Ok` the branch's writes are flushed and its events appended here.
    /// On `Err` both are dropped, leaving this context untouched.
    pub fn cache_context<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Context<'_>) -> Result<T, E>,
        E: From<StoreError>,
    {
        let block_time = self.block_time;
        let block_height = self.block_height;
        let mut cache = CacheStore::new(&mut *self.store);

        let (result, events) = {
            let mut child = Context::new(&mut cache, block_time, block_height);
            let result = f(&mut child);
            (result, child.events)
        };

        let value = result?;
        cache.write()?;
        self.events.extend(events);
        Ok(value)
    }
}
