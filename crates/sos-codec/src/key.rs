//! Format keys describing requested or provided payload shapes.

use sos_common::SosOperation;

use crate::hierarchy::{CategoryHierarchy, CategoryId};

/// A media type tag, e.g. `application/xml`. Comparison is exact after
/// lowercasing at construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaType(String);

impl MediaType {
    pub fn new(s: impl AsRef<str>) -> Self {
        Self(s.as_ref().trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Payload category plus its collection shape. A request for a list of a
/// category never matches a candidate declaring the scalar category, and
/// vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadShape {
    Single(CategoryId),
    ListOf(CategoryId),
}

impl PayloadShape {
    pub fn category(&self) -> CategoryId {
        match self {
            PayloadShape::Single(c) | PayloadShape::ListOf(c) => *c,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, PayloadShape::ListOf(_))
    }
}

/// Operation binding for operation-keyed codecs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationKey {
    pub service: String,
    pub version: String,
    pub operation: SosOperation,
}

impl OperationKey {
    pub fn new(service: impl Into<String>, version: impl Into<String>, operation: SosOperation) -> Self {
        Self {
            service: service.into(),
            version: version.into(),
            operation,
        }
    }
}

/// Descriptor of a requested or registered codec capability.
///
/// `None` on an optional field is a wildcard and matches anything on the
/// other side. Equality is structural.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FormatKey {
    /// XML namespace or service identifier the payload belongs to.
    pub namespace: Option<String>,

    /// Payload category and collection shape.
    pub shape: PayloadShape,

    /// Wire media type.
    pub media_type: Option<MediaType>,

    /// Operation binding; present on operation-keyed registrations.
    pub operation: Option<OperationKey>,
}

impl FormatKey {
    /// Namespace-keyed format key.
    pub fn for_namespace(namespace: impl Into<String>, shape: PayloadShape) -> Self {
        Self {
            namespace: Some(namespace.into()),
            shape,
            media_type: None,
            operation: None,
        }
    }

    /// Operation-keyed format key.
    pub fn for_operation(operation: OperationKey, shape: PayloadShape) -> Self {
        Self {
            namespace: None,
            shape,
            media_type: None,
            operation: Some(operation),
        }
    }

    pub fn with_media_type(mut self, media_type: MediaType) -> Self {
        self.media_type = Some(media_type);
        self
    }

    /// Whether this key is operation-keyed (as opposed to namespace-keyed).
    pub fn is_operation_keyed(&self) -> bool {
        self.operation.is_some()
    }

    /// Similarity between this requested key and a candidate registration.
    ///
    /// `None` means incompatible. Otherwise the value is the category
    /// hierarchy distance between the candidate's declared category and the
    /// requested one; lower is better, 0 is an exact category match. The
    /// relation is not symmetric.
    pub fn similarity(&self, candidate: &FormatKey, hierarchy: &CategoryHierarchy) -> Option<u32> {
        if !wildcard_compatible(&self.namespace, &candidate.namespace) {
            return None;
        }
        if !wildcard_compatible(&self.media_type, &candidate.media_type) {
            return None;
        }
        if !operation_compatible(&self.operation, &candidate.operation) {
            return None;
        }

        match (self.shape, candidate.shape) {
            (PayloadShape::Single(requested), PayloadShape::Single(declared))
            | (PayloadShape::ListOf(requested), PayloadShape::ListOf(declared)) => {
                hierarchy.distance(declared, requested)
            }
            _ => None,
        }
    }

    /// Short human-readable rendering for errors and logs.
    pub fn describe(&self, hierarchy: &CategoryHierarchy) -> String {
        let category = hierarchy.name(self.shape.category());
        let shape = if self.shape.is_list() {
            format!("[{}]", category)
        } else {
            category.to_string()
        };
        let namespace = self.namespace.as_deref().unwrap_or("*");
        let media = self
            .media_type
            .as_ref()
            .map(|m| m.as_str())
            .unwrap_or("*");
        match &self.operation {
            Some(op) => format!(
                "{}/{} {} {} ({}, {})",
                op.service, op.version, op.operation, shape, namespace, media
            ),
            None => format!("{} ({}, {})", shape, namespace, media),
        }
    }
}

/// A field present on both sides must agree; an absent side is a wildcard.
fn wildcard_compatible<T: PartialEq>(requested: &Option<T>, candidate: &Option<T>) -> bool {
    match (requested, candidate) {
        (Some(r), Some(c)) => r == c,
        _ => true,
    }
}

fn operation_compatible(requested: &Option<OperationKey>, candidate: &Option<OperationKey>) -> bool {
    match (requested, candidate) {
        (Some(r), Some(c)) => {
            r.operation == c.operation && r.service == c.service && r.version == c.version
        }
        _ => true,
    }
}
