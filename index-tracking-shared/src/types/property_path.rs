//! Property path type.
//!
//! A [`PropertyPath`] is the forward chain `Root.a.b.c` an index field reads
//! its value through. Paths are immutable; every operation returns a new path.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::errors::MetamodelError;
use crate::interfaces::MetamodelProvider;
use crate::types::metamodel::{ClassId, MetaProperty, Range};

/// One hop of a property path: a property together with its declaring class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathHop {
    pub domain: ClassId,
    pub property: String,
    pub range: Range,
}

impl From<&MetaProperty> for PathHop {
    fn from(property: &MetaProperty) -> Self {
        Self {
            domain: property.domain,
            property: property.name.clone(),
            range: property.range.clone(),
        }
    }
}

/// An ordered, non-empty sequence of hops rooted at an entity class.
///
/// Invariant: for every pair of consecutive hops, the later hop is declared on
/// the class the earlier hop references.
///
/// Equality, ordering and hashing only consider the root class and the hop
/// property names.
#[derive(Debug, Clone)]
pub struct PropertyPath {
    root: ClassId,
    hops: Vec<PathHop>,
}

impl PropertyPath {
    /// Resolve a sequence of property names against the metamodel.
    ///
    /// # Errors
    ///
    /// * [`MetamodelError::EmptyPath`] - `names` is empty
    /// * [`MetamodelError::UnknownProperty`] - a hop names a missing property
    /// * [`MetamodelError::NotAReference`] - a scalar or enum hop is followed by another hop
    pub fn resolve<M, S>(metamodel: &M, root: ClassId, names: &[S]) -> Result<Self, MetamodelError>
    where
        M: MetamodelProvider + ?Sized,
        S: AsRef<str>,
    {
        let root_class = metamodel
            .class(root)
            .ok_or_else(|| MetamodelError::unknown_class(root.to_string()))?;

        if names.is_empty() {
            return Err(MetamodelError::EmptyPath(root_class.name.clone()));
        }

        let dotted = std::iter::once(root_class.name.as_str())
            .chain(names.iter().map(|n| n.as_ref()))
            .collect::<Vec<_>>()
            .join(".");

        let mut hops: Vec<PathHop> = Vec::with_capacity(names.len());
        let mut current = root_class;
        for name in names {
            let name = name.as_ref();
            if let Some(previous) = hops.last() {
                let target = previous.range.as_class().ok_or_else(|| {
                    MetamodelError::not_a_reference(&current.name, &previous.property, &dotted)
                })?;
                current = metamodel
                    .class(target)
                    .ok_or_else(|| MetamodelError::unknown_class(target.to_string()))?;
            }
            let property = current
                .property(name)
                .ok_or_else(|| MetamodelError::unknown_property(&current.name, name, &dotted))?;
            hops.push(PathHop::from(property));
        }

        Ok(Self { root, hops })
    }

    /// Resolve a dotted path such as `"owner.address.zip"`.
    ///
    /// # Errors
    ///
    /// Those of [`resolve`](Self::resolve), plus
    /// [`MetamodelError::EmptySegment`] when a segment between dots is empty.
    pub fn parse<M>(metamodel: &M, root: ClassId, dotted: &str) -> Result<Self, MetamodelError>
    where
        M: MetamodelProvider + ?Sized,
    {
        if dotted.is_empty() {
            return Self::resolve::<M, &str>(metamodel, root, &[]);
        }
        let names: Vec<&str> = dotted.split('.').collect();
        if names.iter().any(|name| name.is_empty()) {
            return Err(MetamodelError::EmptySegment {
                class: metamodel.class_name(root),
                path: dotted.to_string(),
            });
        }
        Self::resolve(metamodel, root, &names)
    }

    /// Class the path is rooted at (the domain of the first hop).
    pub fn root_class(&self) -> ClassId {
        self.root
    }

    pub fn hops(&self) -> &[PathHop] {
        &self.hops
    }

    pub fn len(&self) -> usize {
        self.hops.len()
    }

    /// Always false for a constructed path; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    pub fn last(&self) -> &PathHop {
        // Construction rejects empty paths and `parent` never produces one.
        &self.hops[self.hops.len() - 1]
    }

    /// The path with its last hop removed, or `None` for a single-hop path.
    pub fn parent(&self) -> Option<PropertyPath> {
        if self.hops.len() <= 1 {
            return None;
        }
        Some(Self {
            root: self.root,
            hops: self.hops[..self.hops.len() - 1].to_vec(),
        })
    }

    /// Append one hop, resolved on the class the last hop references.
    pub fn child<M>(&self, metamodel: &M, name: &str) -> Result<PropertyPath, MetamodelError>
    where
        M: MetamodelProvider + ?Sized,
    {
        let last = self.last();
        let target = last.range.as_class().ok_or_else(|| {
            MetamodelError::not_a_reference(
                metamodel.class_name(last.domain),
                &last.property,
                self.describe(metamodel),
            )
        })?;
        let property = metamodel.property(target, name).ok_or_else(|| {
            MetamodelError::unknown_property(
                metamodel.class_name(target),
                name,
                format!("{}.{}", self.describe(metamodel), name),
            )
        })?;

        let mut hops = self.hops.clone();
        hops.push(PathHop::from(property));
        Ok(Self {
            root: self.root,
            hops,
        })
    }

    /// Append a path rooted at the class the last hop references.
    pub fn extend(&self, suffix: &PropertyPath) -> Result<PropertyPath, MetamodelError> {
        if self.last().range.as_class() != Some(suffix.root) {
            return Err(MetamodelError::DisjointPaths {
                path: self.to_string(),
                suffix: suffix.to_string(),
            });
        }
        let mut hops = self.hops.clone();
        hops.extend(suffix.hops.iter().cloned());
        Ok(Self {
            root: self.root,
            hops,
        })
    }

    /// Property names joined with dots, without the root class.
    pub fn dotted(&self) -> String {
        self.hops
            .iter()
            .map(|h| h.property.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }

    /// `Root.a.b.c` using class names from the metamodel.
    pub fn describe<M>(&self, metamodel: &M) -> String
    where
        M: MetamodelProvider + ?Sized,
    {
        format!("{}.{}", metamodel.class_name(self.root), self.dotted())
    }

    fn key(&self) -> impl Iterator<Item = &str> {
        self.hops.iter().map(|h| h.property.as_str())
    }
}

impl PartialEq for PropertyPath {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root && self.key().eq(other.key())
    }
}

impl Eq for PropertyPath {}

impl Hash for PropertyPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.root.hash(state);
        for name in self.key() {
            name.hash(state);
        }
    }
}

impl PartialOrd for PropertyPath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PropertyPath {
    fn cmp(&self, other: &Self) -> Ordering {
        self.root
            .cmp(&other.root)
            .then_with(|| self.key().cmp(other.key()))
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.root, self.dotted())
    }
}
