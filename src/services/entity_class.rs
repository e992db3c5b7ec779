use crate::error::{AppError, Result};

/// Turns a class name as encoded in a URL back into its canonical form.
pub trait EntityClassResolver: Send + Sync {
    fn resolve_entity_class(&self, encoded: &str) -> Result<String>;
}

/// Decodes `_` into the namespace separator, so
/// `Acme_Bundle_Entity_Contact` becomes `Acme\Bundle\Entity\Contact`.
#[derive(Debug, Clone, Copy)]
pub struct NamespaceClassResolver {
    separator: char,
}

impl NamespaceClassResolver {
    pub fn new(separator: char) -> Self {
        Self { separator }
    }
}

impl Default for NamespaceClassResolver {
    fn default() -> Self {
        Self::new('\\')
    }
}

impl EntityClassResolver for NamespaceClassResolver {
    fn resolve_entity_class(&self, encoded: &str) -> Result<String> {
        if encoded.is_empty() {
            return Err(AppError::BadRequest("Entity class name is empty".into()));
        }
        Ok(encoded.replace('_', &self.separator.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_underscores() {
        let resolver = NamespaceClassResolver::default();
        assert_eq!(
            resolver.resolve_entity_class("Acme_Bundle_Entity_Contact").unwrap(),
            "Acme\\Bundle\\Entity\\Contact"
        );
    }

    #[test]
    fn test_name_without_separator_is_unchanged() {
        let resolver = NamespaceClassResolver::default();
        assert_eq!(resolver.resolve_entity_class("Contact").unwrap(), "Contact");
    }

    #[test]
    fn test_custom_separator() {
        let resolver = NamespaceClassResolver::new('.');
        assert_eq!(
            resolver.resolve_entity_class("acme_crm_Contact").unwrap(),
            "acme.crm.Contact"
        );
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let resolver = NamespaceClassResolver::default();
        assert!(matches!(
            resolver.resolve_entity_class(""),
            Err(AppError::BadRequest(_))
        ));
    }
}
