//! Handle Table Module
//!
//! Provides the registry that maps opaque socket identifiers to live OS socket
//! descriptors. The host only ever sees the identifier; the descriptor never
//! crosses the C boundary.
//!
//! Identifiers are minted from a monotonically increasing counter starting at 1
//! and are keyed through a `HashMap`, so two live identifiers can never share a
//! slot regardless of their numeric distance.
//!
//! The table owns its descriptors. Releasing an identifier drops the descriptor,
//! which closes the underlying OS socket.

use std::collections::HashMap;
use thiserror::Error;
use tracing::{trace, warn};

/// Socket identifier handed to the host
///
/// Always positive for a live socket; `0` and negative values are never issued.
pub type SocketId = i32;

/// Default maximum number of simultaneously open sockets
pub const DEFAULT_MAX_SOCKETS: usize = 256;

/// Handle table configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleTableConfig {
    /// Maximum number of simultaneously registered sockets
    pub max_sockets: usize,
}

impl HandleTableConfig {
    /// Configuration with a custom socket limit
    ///
    /// A limit of `0` selects [`DEFAULT_MAX_SOCKETS`].
    pub fn with_max_sockets(max_sockets: usize) -> Self {
        let max_sockets = if max_sockets == 0 {
            DEFAULT_MAX_SOCKETS
        } else {
            // Leave room in the identifier space so minting always finds a free id.
            max_sockets.min(SocketId::MAX as usize - 1)
        };
        Self { max_sockets }
    }
}

impl Default for HandleTableConfig {
    fn default() -> Self {
        Self {
            max_sockets: DEFAULT_MAX_SOCKETS,
        }
    }
}

/// Errors that can occur when operating on the handle table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HandleTableError {
    /// Table is at maximum capacity
    #[error("socket table is full ({capacity} active sockets)")]
    TableFull { capacity: usize },
    /// Identifier is not registered
    #[error("socket id {0} is not registered")]
    InvalidId(SocketId),
}

/// A descriptor the table refused to register
///
/// The table never silently drops a resource it was asked to store: the
/// descriptor is handed back so the caller decides how to release it.
#[derive(Debug)]
pub struct Rejected<D> {
    reason: HandleTableError,
    descriptor: D,
}

impl<D> Rejected<D> {
    /// Why registration failed
    pub fn reason(&self) -> HandleTableError {
        self.reason
    }

    /// Take back ownership of the descriptor
    pub fn into_descriptor(self) -> D {
        self.descriptor
    }
}

/// Socket handle table
///
/// Maps socket identifiers to descriptors of type `D`. The table assumes a
/// single owner; callers that share it across threads wrap it in a lock.
#[derive(Debug)]
pub struct HandleTable<D> {
    /// Registered descriptors by identifier
    slots: HashMap<SocketId, D>,
    /// Next identifier to mint
    next_id: SocketId,
    /// Maximum number of registered descriptors
    max_sockets: usize,
}

impl<D> HandleTable<D> {
    /// Create an empty table with the default capacity of 256 sockets
    ///
    /// # Examples
    /// ```
    /// use entities_socket_handles::HandleTable;
    ///
    /// let table: HandleTable<u32> = HandleTable::new();
    /// assert_eq!(table.active_count(), 0);
    /// assert_eq!(table.capacity(), 256);
    /// ```
    pub fn new() -> Self {
        Self::with_config(HandleTableConfig::default())
    }

    /// Create an empty table with a custom configuration
    pub fn with_config(config: HandleTableConfig) -> Self {
        let config = HandleTableConfig::with_max_sockets(config.max_sockets);
        Self {
            slots: HashMap::new(),
            next_id: 1,
            max_sockets: config.max_sockets,
        }
    }

    /// Maximum number of simultaneously registered descriptors
    pub fn capacity(&self) -> usize {
        self.max_sockets
    }

    /// Number of currently registered descriptors
    pub fn active_count(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() >= self.max_sockets
    }

    /// Register a descriptor and mint its identifier
    ///
    /// # Arguments
    /// * `descriptor` - Live descriptor to take ownership of
    ///
    /// # Returns
    /// * `Ok(SocketId)` - Newly minted identifier
    /// * `Err(Rejected)` - The table is full; the descriptor is handed back
    ///
    /// # Examples
    /// ```
    /// use entities_socket_handles::{HandleTable, HandleTableConfig};
    ///
    /// let mut table = HandleTable::with_config(HandleTableConfig::with_max_sockets(1));
    /// let id = table.allocate("first").unwrap();
    /// assert_eq!(id, 1);
    ///
    /// let rejected = table.allocate("second").unwrap_err();
    /// assert_eq!(rejected.into_descriptor(), "second");
    /// ```
    pub fn allocate(&mut self, descriptor: D) -> Result<SocketId, Rejected<D>> {
        if self.is_full() {
            warn!(capacity = self.max_sockets, "socket table exhausted");
            return Err(Rejected {
                reason: HandleTableError::TableFull {
                    capacity: self.max_sockets,
                },
                descriptor,
            });
        }

        let id = self.mint_id();
        self.slots.insert(id, descriptor);
        trace!(id, active = self.slots.len(), "socket registered");
        Ok(id)
    }

    /// Look up the descriptor registered under `id`
    pub fn lookup(&self, id: SocketId) -> Option<&D> {
        self.slots.get(&id)
    }

    /// Look up the descriptor or report the identifier as invalid
    pub fn get(&self, id: SocketId) -> Result<&D, HandleTableError> {
        self.lookup(id).ok_or(HandleTableError::InvalidId(id))
    }

    pub fn contains(&self, id: SocketId) -> bool {
        self.slots.contains_key(&id)
    }

    /// Remove `id` from the table and hand its descriptor to the caller
    pub fn take(&mut self, id: SocketId) -> Option<D> {
        let removed = self.slots.remove(&id);
        if removed.is_some() {
            trace!(id, active = self.slots.len(), "socket unregistered");
        }
        removed
    }

    /// Release `id`, dropping (and thereby closing) its descriptor
    ///
    /// Releasing an identifier that is not registered is a no-op.
    ///
    /// # Returns
    /// `true` if a descriptor was released
    pub fn release(&mut self, id: SocketId) -> bool {
        self.take(id).is_some()
    }

    /// Identifiers of all registered descriptors
    pub fn ids(&self) -> Vec<SocketId> {
        let mut ids: Vec<_> = self.slots.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Release every registered descriptor
    ///
    /// # Returns
    /// Number of descriptors released
    pub fn clear(&mut self) -> usize {
        let released = self.slots.len();
        self.slots.clear();
        released
    }

    /// Mint the next unused identifier
    ///
    /// The counter wraps from `SocketId::MAX` back to 1 and skips identifiers
    /// that are still live. The capacity is always below the identifier space,
    /// so a free identifier exists.
    fn mint_id(&mut self) -> SocketId {
        loop {
            let id = self.next_id;
            self.next_id = if id == SocketId::MAX { 1 } else { id + 1 };
            if !self.slots.contains_key(&id) {
                return id;
            }
        }
    }
}

impl<D> Default for HandleTable<D> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Descriptor that counts how many times it has been closed
    #[derive(Debug)]
    struct CountingDescriptor {
        closed: Rc<Cell<usize>>,
    }

    impl Drop for CountingDescriptor {
        fn drop(&mut self) {
            self.closed.set(self.closed.get() + 1);
        }
    }

    fn counting(closed: &Rc<Cell<usize>>) -> CountingDescriptor {
        CountingDescriptor {
            closed: Rc::clone(closed),
        }
    }

    #[test]
    fn test_handle_table_new() {
        let table: HandleTable<u32> = HandleTable::new();
        assert!(table.is_empty());
        assert_eq!(table.capacity(), DEFAULT_MAX_SOCKETS);
    }

    #[test]
    fn test_allocate_mints_sequential_ids_from_one() {
        let mut table = HandleTable::new();
        assert_eq!(table.allocate(10u32).unwrap(), 1);
        assert_eq!(table.allocate(20u32).unwrap(), 2);
        assert_eq!(table.allocate(30u32).unwrap(), 3);
        assert_eq!(table.active_count(), 3);
    }

    #[test]
    fn test_lookup() {
        let mut table = HandleTable::new();
        let id = table.allocate(42u32).unwrap();
        assert_eq!(table.lookup(id), Some(&42));
        assert_eq!(table.lookup(id + 1), None);
        assert_eq!(table.get(99), Err(HandleTableError::InvalidId(99)));
    }

    #[test]
    fn test_non_positive_ids_are_never_found() {
        let mut table = HandleTable::new();
        table.allocate(1u32).unwrap();
        assert!(table.lookup(0).is_none());
        assert!(table.lookup(-1).is_none());
    }

    #[test]
    fn test_release_closes_descriptor() {
        let closed = Rc::new(Cell::new(0));
        let mut table = HandleTable::new();
        let id = table.allocate(counting(&closed)).unwrap();

        assert!(table.release(id));
        assert_eq!(closed.get(), 1);
        assert!(table.is_empty());
    }

    #[test]
    fn test_release_missing_is_noop() {
        let mut table: HandleTable<u32> = HandleTable::new();
        assert!(!table.release(5));
        let id = table.allocate(1).unwrap();
        assert!(table.release(id));
        assert!(!table.release(id));
        assert_eq!(table.active_count(), 0);
    }

    #[test]
    fn test_ids_do_not_collide_across_capacity_multiples() {
        let mut table = HandleTable::with_config(HandleTableConfig::with_max_sockets(4));
        let first = table.allocate("first").unwrap();
        // Churn the counter well past a multiple of the capacity.
        for _ in 0..7 {
            let id = table.allocate("churn").unwrap();
            table.release(id);
        }
        let later = table.allocate("later").unwrap();
        assert_eq!((later - first) % 4, 0);
        assert_eq!(table.lookup(first), Some(&"first"));
        assert_eq!(table.lookup(later), Some(&"later"));
    }

    #[test]
    fn test_full_table_hands_descriptor_back() {
        let closed = Rc::new(Cell::new(0));
        let mut table = HandleTable::with_config(HandleTableConfig::with_max_sockets(2));
        table.allocate(counting(&closed)).unwrap();
        table.allocate(counting(&closed)).unwrap();

        let rejected = table.allocate(counting(&closed)).unwrap_err();
        assert_eq!(
            rejected.reason(),
            HandleTableError::TableFull { capacity: 2 }
        );
        // Still owned by the caller, not dropped by the table.
        assert_eq!(closed.get(), 0);
        drop(rejected.into_descriptor());
        assert_eq!(closed.get(), 1);
        assert_eq!(table.active_count(), 2);
    }

    #[test]
    fn test_capacity_frees_after_release() {
        let mut table = HandleTable::with_config(HandleTableConfig::with_max_sockets(1));
        let id = table.allocate(1u32).unwrap();
        assert!(table.allocate(2u32).is_err());
        table.release(id);
        let next = table.allocate(3u32).unwrap();
        assert_ne!(next, id);
    }

    #[test]
    fn test_counter_wraps_and_skips_live_ids() {
        let mut table = HandleTable::new();
        let one = table.allocate("one").unwrap();
        table.next_id = SocketId::MAX;
        assert_eq!(table.allocate("max").unwrap(), SocketId::MAX);
        // 1 is still live, so the wrapped counter moves on to 2.
        assert_eq!(table.allocate("wrapped").unwrap(), 2);
        assert_eq!(table.lookup(one), Some(&"one"));
    }

    #[test]
    fn test_clear_releases_everything() {
        let closed = Rc::new(Cell::new(0));
        let mut table = HandleTable::new();
        for _ in 0..3 {
            table.allocate(counting(&closed)).unwrap();
        }
        assert_eq!(table.clear(), 3);
        assert_eq!(closed.get(), 3);
        assert!(table.is_empty());
    }

    #[test]
    fn test_ids_sorted() {
        let mut table = HandleTable::new();
        for value in 0..5u32 {
            table.allocate(value).unwrap();
        }
        table.release(3);
        assert_eq!(table.ids(), vec![1, 2, 4, 5]);
    }

    #[test]
    fn test_zero_max_sockets_selects_default() {
        let config = HandleTableConfig::with_max_sockets(0);
        assert_eq!(config.max_sockets, DEFAULT_MAX_SOCKETS);
    }
}
