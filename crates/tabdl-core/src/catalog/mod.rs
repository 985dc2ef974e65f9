//! Catalog data model and the on-disk job store.
//!
//! A [`JobGroup`] is one band with its tabs ([`Job`]s) in discovery order.
//! Each group is persisted as one `band_<id>.json` record.

mod filter;
mod model;
mod ordered;
mod store;

pub use filter::{letter_category, JobFilter, LETTER_CATEGORIES};
pub use model::{Job, JobGroup, TabType};
pub use store::{
    group_id_from_record_path, group_record_path, list_group_records, load_group, save_group,
    GroupRef,
};
