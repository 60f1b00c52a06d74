use airweave_entity::{Entity, LazyEntity};

/// What a source adapter's generator yields (spec §3's `LazyEntity`): either
/// a fully-formed entity, or one whose expensive per-item API calls are
/// deferred to worker materialization.
pub enum ProducedEntity {
    Entity(Entity),
    Lazy(LazyEntity),
}

impl ProducedEntity {
    pub fn entity_id(&self) -> &str {
        match self {
            ProducedEntity::Entity(e) => &e.entity_id,
            ProducedEntity::Lazy(l) => &l.base.entity_id,
        }
    }
}

impl From<Entity> for ProducedEntity {
    fn from(entity: Entity) -> Self {
        ProducedEntity::Entity(entity)
    }
}

impl From<LazyEntity> for ProducedEntity {
    fn from(lazy: LazyEntity) -> Self {
        ProducedEntity::Lazy(lazy)
    }
}
