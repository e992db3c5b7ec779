use crate::error::Result;
use crate::services::EntityClassResolver;

use super::ParameterFilter;

/// Decodes an URL-safe entity class name into its canonical form.
pub struct EntityNameFilter<'a> {
    resolver: &'a dyn EntityClassResolver,
}

impl<'a> EntityNameFilter<'a> {
    pub fn new(resolver: &'a dyn EntityClassResolver) -> Self {
        Self { resolver }
    }
}

impl ParameterFilter for EntityNameFilter<'_> {
    type Output = String;

    fn filter(&self, raw: &str) -> Result<String> {
        self.resolver.resolve_entity_class(raw)
    }
}
