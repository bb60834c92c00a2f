//! Instance-name expansion.
//!
//! A reference field rendered by display name depends on every property the
//! referenced class's name is computed from, although the mapping only names
//! the reference itself.

use index_tracking_shared::{InstanceNameProvider, MetamodelError, PropertyPath};

/// Widens reference paths by the instance-name properties of their target.
pub struct InstanceNameExpansion<'a, N: ?Sized> {
    names: &'a N,
}

impl<'a, N> InstanceNameExpansion<'a, N>
where
    N: InstanceNameProvider + ?Sized,
{
    pub fn new(names: &'a N) -> Self {
        Self { names }
    }

    /// One path per instance-name related property of the referenced class,
    /// each equal to `path` extended by that property.
    ///
    /// Returns an empty list when the last hop is not a reference.
    pub fn expand(&self, path: &PropertyPath) -> Result<Vec<PropertyPath>, MetamodelError> {
        match path.last().range.as_class() {
            Some(target) => {
                let related = self.names.instance_name_related_properties(target);
                Self::append(path, &related)
            }
            None => Ok(Vec::new()),
        }
    }

    /// Same as [`expand`](Self::expand) with an instance-name list the loader
    /// already computed, bypassing the provider.
    pub fn expand_with(
        &self,
        path: &PropertyPath,
        related: &[PropertyPath],
    ) -> Result<Vec<PropertyPath>, MetamodelError> {
        if path.last().range.as_class().is_none() {
            return Ok(Vec::new());
        }
        Self::append(path, related)
    }

    fn append(
        path: &PropertyPath,
        related: &[PropertyPath],
    ) -> Result<Vec<PropertyPath>, MetamodelError> {
        related.iter().map(|suffix| path.extend(suffix)).collect()
    }
}
