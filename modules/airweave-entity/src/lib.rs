pub mod breadcrumb;
pub mod chunk_entity;
pub mod entity;
pub mod file_entity;
pub mod lazy;
pub mod provenance;

pub use breadcrumb::Breadcrumb;
pub use chunk_entity::ChunkEntity;
pub use entity::{Entity, UNSTABLE_PAYLOAD_FIELDS};
pub use file_entity::FileEntity;
pub use lazy::{LazyEntity, LazyOperation};
pub use provenance::Provenance;
