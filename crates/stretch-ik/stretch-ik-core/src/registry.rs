//! Node-type registry handed to host adapters at plugin load.

use std::sync::Arc;

use hashbrown::HashMap;
use tracing::debug;

use crate::config::Config;
use crate::error::RegistryError;
use crate::node::StretchIkNode;
use crate::schema::{stretch_ik_schema, NodeTypeInfo, Schema};

#[derive(Debug, Clone)]
pub struct RegisteredType {
    pub info: NodeTypeInfo,
    pub schema: Arc<Schema>,
    pub config: Config,
}

/// Registered node types keyed by type id. Owned by the host adapter; there is no global
/// instance.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    types: HashMap<u32, RegisteredType>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Register `schema` under its node type. The config is validated first.
    pub fn register(
        &mut self,
        schema: Schema,
        config: Config,
    ) -> Result<&RegisteredType, RegistryError> {
        config.validate()?;
        let info = schema.node_type;
        if self.types.contains_key(&info.type_id) {
            return Err(RegistryError::DuplicateTypeId {
                type_id: info.type_id,
            });
        }
        if self.get(info.name).is_some() {
            return Err(RegistryError::DuplicateTypeName {
                name: info.name.to_string(),
            });
        }
        debug!(type_id = info.type_id, name = info.name, "registered node type");
        let registered = self.types.entry(info.type_id).or_insert(RegisteredType {
            info,
            schema: Arc::new(schema),
            config,
        });
        Ok(&*registered)
    }

    /// Remove the type registered under `type_id`.
    pub fn deregister(&mut self, type_id: u32) -> Option<RegisteredType> {
        let removed = self.types.remove(&type_id);
        if removed.is_some() {
            debug!(type_id, "deregistered node type");
        }
        removed
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredType> {
        self.types.values().find(|t| t.info.name == name)
    }

    pub fn get_by_id(&self, type_id: u32) -> Option<&RegisteredType> {
        self.types.get(&type_id)
    }

    /// Create a fresh node of the named type.
    pub fn instantiate(&self, name: &str) -> Result<StretchIkNode, RegistryError> {
        let registered = self.get(name).ok_or_else(|| RegistryError::UnknownType {
            name: name.to_string(),
        })?;
        Ok(StretchIkNode::new(
            Arc::clone(&registered.schema),
            registered.config.solver,
        )?)
    }
}

/// Plugin entry point: build the stretch IK schema for `config` and register it.
pub fn register_stretch_ik(
    registry: &mut NodeRegistry,
    config: Config,
) -> Result<NodeTypeInfo, RegistryError> {
    let schema = stretch_ik_schema(config.affects)?;
    Ok(registry.register(schema, config)?.info)
}
