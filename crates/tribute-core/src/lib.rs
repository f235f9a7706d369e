//! tribute-core - Core library for memorial tribute archives
//!
//! This crate owns everything about tribute records that does not involve
//! HTML:
//! - The [`Tribute`] record schema and its field normalization
//! - The [`RecordStore`], a single JSON document holding every record
//! - Slug allocation ([`allocate_slug`]) with collision suffixing
//! - The [`DisplayOrder`] policy (one pinned record, then newest first)
//! - Page planning ([`paginate`], [`PageLinks`]) for listing pages
//!
//! # Loading and ordering records
//!
//! ```ignore
//! use tribute_core::{DisplayOrder, RecordStore, paginate};
//!
//! let store = RecordStore::new("output/pet-tributes/data.json");
//! let mut records = store.load()?;
//! let order = DisplayOrder::compute(&mut records);
//! let ordered = order.records(&records);
//! for page in paginate(&ordered, 15) {
//!     println!("{} tributes on this page", page.len());
//! }
//! ```
//!
//! # Allocating slugs
//!
//! ```
//! use std::collections::HashSet;
//! use tribute_core::allocate_slug;
//!
//! let mut taken = HashSet::new();
//! taken.insert("biscuit-dog-beagle".to_string());
//!
//! let slug = allocate_slug("Biscuit", "Dog", "Beagle", &taken);
//! assert_eq!(slug, "biscuit-dog-beagle-2");
//! ```

mod excerpt;
mod ordering;
mod pagination;
mod record;
mod slug;
mod store;

pub use excerpt::{EXCERPT_LIMIT, derive_excerpt, normalize_life_span};
pub use ordering::DisplayOrder;
pub use pagination::{PAGE_SIZE, PageLinks, page_count, page_dir_name, paginate, parse_page_dir};
pub use record::{Tribute, format_timestamp, normalize_timestamp, parse_timestamp};
pub use slug::{allocate_slug, slugify};
pub use store::RecordStore;
