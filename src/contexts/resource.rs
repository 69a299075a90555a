use crate::{
    ast::Path,
    context::TransformContext,
    contexts::common::{ResourceAccess, ResourcePath},
    evaluator::{BindError, EvalError},
    pdata::Resource,
    value::Value,
};

/// Statements run once per resource. Paths are the resource's own fields
/// without a `resource.` prefix.
#[derive(Debug, Clone, Copy)]
pub struct ResourceContext;

pub struct ResourceRecord<'a> {
    pub resource: &'a mut Resource,
}

impl<'a> ResourceRecord<'a> {
    pub fn new(resource: &'a mut Resource) -> Self {
        ResourceRecord { resource }
    }
}

impl ResourceAccess for ResourceRecord<'_> {
    fn resource(&self) -> &Resource {
        self.resource
    }

    fn resource_mut(&mut self) -> &mut Resource {
        self.resource
    }
}

impl TransformContext for ResourceContext {
    type Record<'a> = ResourceRecord<'a>;
    type Accessor = ResourcePath;

    const NAME: &'static str = "resource";

    fn parse_path(path: &Path) -> Result<ResourcePath, BindError> {
        ResourcePath::parse(&path.fields).map_err(|reason| BindError::invalid_path(path, Self::NAME, reason))
    }

    fn parse_enum(_symbol: &str) -> Option<i64> {
        None
    }

    fn get(accessor: &ResourcePath, record: &ResourceRecord<'_>) -> Result<Value, EvalError> {
        Ok(accessor.get(record))
    }

    fn set(accessor: &ResourcePath, record: &mut ResourceRecord<'_>, value: Value) -> Result<(), EvalError> {
        accessor.set(record, value)
    }
}
