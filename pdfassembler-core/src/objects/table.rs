use crate::error::{PdfError, Result};
use crate::objects::{Dictionary, Object, ObjectId, Stream};
use std::collections::BTreeMap;

/// A numbered object as it appears between `obj` and `endobj`.
#[derive(Debug, Clone, PartialEq)]
pub struct IndirectObject {
    id: ObjectId,
    value: Object,
}

impl IndirectObject {
    pub fn new(id: ObjectId, value: Object) -> Self {
        Self { id, value }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn value(&self) -> &Object {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut Object {
        &mut self.value
    }

    pub fn stream(&self) -> Option<&Stream> {
        self.value.as_stream()
    }

    pub fn is_stream(&self) -> bool {
        matches!(self.value, Object::Stream(_))
    }
}

/// Arena of indirect objects keyed by object number.
///
/// Lookups ignore the generation number: a document holds at most one live
/// object per number. Missing objects surface as [`PdfError::DanglingReference`]
/// at the point of dereference.
#[derive(Debug, Clone, Default)]
pub struct ObjectTable {
    objects: BTreeMap<u32, IndirectObject>,
}

impl ObjectTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn contains(&self, number: u32) -> bool {
        self.objects.contains_key(&number)
    }

    /// Highest object number in use, 0 for an empty table.
    pub fn max_id(&self) -> u32 {
        self.objects.keys().next_back().copied().unwrap_or(0)
    }

    /// Objects in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &IndirectObject> {
        self.objects.values()
    }

    pub fn get(&self, id: ObjectId) -> Result<&IndirectObject> {
        self.objects
            .get(&id.number())
            .ok_or(PdfError::DanglingReference(id.number(), id.generation()))
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Result<&mut IndirectObject> {
        self.objects
            .get_mut(&id.number())
            .ok_or(PdfError::DanglingReference(id.number(), id.generation()))
    }

    /// Follows `obj` through the table if it is a reference, otherwise returns it.
    pub fn resolve<'a>(&'a self, obj: &'a Object) -> Result<&'a Object> {
        match obj {
            Object::Reference(id) => Ok(self.get(*id)?.value()),
            other => Ok(other),
        }
    }

    /// Dictionary held by object `id` (or the header of its stream).
    pub fn dict(&self, id: ObjectId) -> Result<&Dictionary> {
        self.get(id)?
            .value()
            .as_dict()
            .ok_or_else(|| PdfError::Format(format!("object {id} is not a dictionary")))
    }

    pub fn dict_mut(&mut self, id: ObjectId) -> Result<&mut Dictionary> {
        self.get_mut(id)?
            .value_mut()
            .as_dict_mut()
            .ok_or_else(|| PdfError::Format(format!("object {id} is not a dictionary")))
    }

    /// Inserts or replaces the object with the same number, returning the old one.
    pub(crate) fn insert(&mut self, object: IndirectObject) -> Option<IndirectObject> {
        self.objects.insert(object.id().number(), object)
    }
}
