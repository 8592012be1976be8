//! # Gridnote Architecture
//!
//! Gridnote is a **UI-agnostic table engine**. It gives a note-taking
//! application typed columns, rows of string-valued cells, and an
//! interactively sortable/filterable view of them—without knowing anything
//! about the host's widgets, documents, or event loop.
//!
//! ## The Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Host application (not this crate)                          │
//! │  - Owns documents, widgets, pointer events                  │
//! │  - Forwards user interaction to the controller              │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Controller Layer (controller.rs)                           │
//! │  - Owns the Table, popup slot, gesture slot, save queue     │
//! │  - Runs the redraw pipeline: sort → filter → frame → draw   │
//! │  - Structural column/row ops, cell edits, persistence calls │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Engine Layer (sort.rs, filter.rs, editors.rs)              │
//! │  - Pure functions over the data model                       │
//! │  - No I/O, no state, no host assumptions                    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/)                                     │
//! │  - Abstract TableStore trait                                │
//! │  - FileStore / EmbeddedStore (production), InMemoryStore    │
//! │    (testing and headless hosts)                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Principle: Redraw Before Persist
//!
//! Every mutation re-evaluates the full pipeline against the in-memory
//! table and hands a fresh [`render::GridFrame`] to the renderer *before*
//! the save is attempted. A failed save is reported and remembered, never
//! rolled back—the grid always reflects the user's latest intent.
//!
//! ## Identity
//!
//! Rows carry a synthetic [`uuid::Uuid`] assigned at creation and never
//! persisted. All row-level operations address rows by id, so visual
//! position and identity stay decoupled even though the canonical row
//! order is mutated in place by the sort engine.
//!
//! ## Testing Strategy
//!
//! - **Engines** (`sort.rs`, `filter.rs`, `editors.rs`): thorough unit
//!   tests of the comparison and predicate semantics. This is where the
//!   lion's share of testing lives.
//! - **Controller** (`controller.rs`): scenario tests against
//!   [`store::memory::InMemoryStore`] and [`render::RecordingRenderer`],
//!   asserting on emitted frames instead of a real widget tree.
//! - **Stores** (`store/`): round-trip tests; the file-backed ones run
//!   against temp directories.
//!
//! ## Module Overview
//!
//! - [`model`]: Core data types (`Table`, `Column`, `Row`, `View`, rules)
//! - [`normalize`]: Load-time validation and legacy-shape migration
//! - [`sort`]: The in-place sort engine
//! - [`filter`]: The read-only filter engine
//! - [`editors`]: Per-column-type cell value conversion strategies
//! - [`render`]: The frame view-model and the renderer seam
//! - [`controller`]: The stateful orchestrator
//! - [`store`]: Storage abstraction and implementations
//! - [`links`]: Note-link suggestion seam and the link-maintenance sweep
//! - [`error`]: Error types

pub mod controller;
pub mod editors;
pub mod error;
pub mod filter;
pub mod links;
pub mod model;
pub mod normalize;
pub mod render;
pub mod sort;
pub mod store;
