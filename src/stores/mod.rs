//! Record stores — typed CRUD facades over a pluggable data-access seam.
//!
//! Every store carries the same discipline: a record list, an optional
//! current record, a loading flag, and a last-error message, mutated only by
//! the store's own actions. The backing data access is injected, so the
//! in-memory dataset and a real REST backend are interchangeable without
//! touching store logic.

pub mod artworks;
pub mod backend;
pub mod contacts;
pub mod pipeline;
pub mod reports;

pub use artworks::{Artwork, ArtworkStatus, ArtworksStore, NewArtwork};
pub use backend::{HttpBackend, MemoryBackend, Record, RecordBackend, StoreError};
pub use contacts::{Contact, ContactCategory, ContactsStore, NewContact};
pub use pipeline::{Deal, DealStage, NewDeal, PipelineStore};
pub use reports::{BusinessSummary, ReportsStore};
