use crate::block_type::{BlockType, BlockTypeDef};
use crate::error::RubbleError;
use crate::types::BlockTypeId;

/// Ordered, append-only registry of BlockTypes.
///
/// Built once during world setup and then shared read-only (usually behind
/// an `Arc`) by every cluster of the world.
#[derive(Debug, Clone, Default)]
pub struct BlockCatalog {
    types: Vec<BlockType>,
}

impl BlockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a derived archetype. Ids follow registration order.
    pub fn register(&mut self, block_type: BlockType) -> BlockTypeId {
        let id = BlockTypeId(self.types.len() as u32);
        self.types.push(block_type);
        id
    }

    /// Derive and append an archetype from its authored definition.
    pub fn register_def(&mut self, def: BlockTypeDef) -> Result<BlockTypeId, RubbleError> {
        let block_type = BlockType::from_def(def)?;
        Ok(self.register(block_type))
    }

    /// Look up an archetype by id.
    pub fn get(&self, id: BlockTypeId) -> Result<&BlockType, RubbleError> {
        self.types
            .get(id.index())
            .ok_or(RubbleError::InvalidReference {
                id: id.0,
                registered: self.types.len() as u32,
            })
    }

    /// Id of the first archetype with the given name.
    pub fn find(&self, name: &str) -> Option<BlockTypeId> {
        self.types
            .iter()
            .position(|t| t.name() == name)
            .map(|i| BlockTypeId(i as u32))
    }

    pub fn contains(&self, id: BlockTypeId) -> bool {
        id.index() < self.types.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BlockTypeId, &BlockType)> {
        self.types
            .iter()
            .enumerate()
            .map(|(i, t)| (BlockTypeId(i as u32), t))
    }

    /// Number of registered archetypes.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::ShapeDescriptor;
    use crate::types::MeshRef;

    fn def(name: &str) -> BlockTypeDef {
        BlockTypeDef::from_density(
            name,
            ShapeDescriptor::square(1.0),
            MeshRef::new(name),
            1.0,
            1.0,
        )
    }

    #[test]
    fn test_ids_follow_registration_order() {
        let mut catalog = BlockCatalog::new();
        let a = catalog.register_def(def("a")).expect("valid");
        let b = catalog.register_def(def("b")).expect("valid");
        assert_eq!(a, BlockTypeId(0));
        assert_eq!(b, BlockTypeId(1));
        assert_eq!(catalog.get(b).expect("registered").name(), "b");
    }

    #[test]
    fn test_unknown_id_is_invalid_reference() {
        let mut catalog = BlockCatalog::new();
        catalog.register_def(def("a")).expect("valid");
        assert_eq!(
            catalog.get(BlockTypeId(4)).expect_err("out of range"),
            RubbleError::InvalidReference {
                id: 4,
                registered: 1
            }
        );
    }

    #[test]
    fn test_invalid_def_leaves_catalog_unchanged() {
        let mut catalog = BlockCatalog::new();
        let bad = BlockTypeDef {
            density: None,
            ..def("bad")
        };
        assert!(catalog.register_def(bad).is_err());
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_find_by_name() {
        let mut catalog = BlockCatalog::new();
        catalog.register_def(def("wood")).expect("valid");
        catalog.register_def(def("steel")).expect("valid");
        assert_eq!(catalog.find("steel"), Some(BlockTypeId(1)));
        assert_eq!(catalog.find("glass"), None);
    }
}
