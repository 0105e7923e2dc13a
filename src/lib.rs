//! rcu-idmap: a concurrent, read-optimized map keyed by integer identity,
//! with lock-free reads and copy-on-write updates published RCU-style.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: cache derived data per distinct identity (for example, per type
//!   or object address) in a long-running process where lookups dominate
//!   and inserts are rare.
//! - Layers:
//!   - LinearTable<V>: fixed-capacity open-addressing table with linear
//!     probing. Point lookup, insertion into a private copy, and
//!     capacity-doubling rehash.
//!   - RcuMap<V>: holds the current LinearTable behind an `ArcSwap` and a
//!     writer mutex. Reads load the table and probe it; writes
//!     copy, update, and swap in the successor under the mutex.
//!
//! Constraints
//! - Keys are non-zero `usize` identities (`Key`); zero marks empty slots.
//! - Reads never block and never see a table under construction.
//! - Every write copies the whole table: O(capacity) per write.
//! - No removal, no eviction, no iteration. Entries live as long as the map.
//!
//! Publication and reclamation
//! - A table is only mutated while it is owned by one writer. Publishing
//!   moves it into an `Arc`; from then on it is shared and read-only.
//! - `ArcSwap` reference-counts published tables. A reader that loaded the
//!   previous table keeps it alive until its probe (or its `Snapshot`) is
//!   done; the last holder frees it.
//! - Superseded tables are dropped after the writer lock is released.
//!
//! Growth
//! - Initial capacity is `INITIAL_CAPACITY` (4096) slots. Before an insert
//!   that would push occupancy above `LOAD_FACTOR` (0.5), the copy is
//!   rehashed into twice the capacity.
//! - Probing starts at `key & (capacity - 1)`; the key's value is its own
//!   hash.
//!
//! Write semantics
//! - `store` is an upsert: an existing key has its value replaced in the
//!   copy, so a key is never present twice and `load` is deterministic.
//! - `load_or_store` answers present keys without locking and re-checks
//!   under the writer lock before inserting; all writers share that lock,
//!   so at most one value is inserted for an absent key.
//!
//! Failure
//! - Running out of slots during insertion means the growth bookkeeping
//!   is broken; it panics. The failed copy is never published and the
//!   `parking_lot` mutex does not poison, so the map keeps serving the
//!   last published table.
//!
//! Logging
//! - Growth is reported through `log::debug!` and each publication through
//!   `log::trace!`. The crate installs no logger.

mod key;
#[cfg(feature = "bench_internal")]
pub mod linear_table;
#[cfg(not(feature = "bench_internal"))]
mod linear_table;
mod linear_table_proptest;
mod rcu_map;

// Public surface
pub use key::{Key, KeyError};
pub use linear_table::{INITIAL_CAPACITY, LOAD_FACTOR};
pub use rcu_map::{RcuMap, Snapshot};
