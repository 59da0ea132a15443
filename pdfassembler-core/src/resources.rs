//! Object id issuance and per-page resource binding.
//!
//! [`ResourceAllocator`] is the only code that creates new indirect objects
//! or adds names to a page's `/Font` and `/XObject` tables.

use crate::error::Result;
use crate::objects::{Dictionary, IndirectObject, Object, ObjectId, ObjectTable};

/// Issues element ids of the form `p{page}_el{n}`, with `n` unique per document.
#[derive(Debug, Clone, Default)]
pub struct ElementIdCounter {
    issued: u64,
}

impl ElementIdCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self, page_index: usize) -> String {
        self.issued += 1;
        format!("p{page_index}_el{}", self.issued)
    }

    /// Number of ids handed out so far.
    pub fn issued(&self) -> u64 {
        self.issued
    }
}

#[derive(Debug, Clone)]
pub struct ResourceAllocator {
    next_id: u32,
}

impl ResourceAllocator {
    pub fn new(objects: &ObjectTable) -> Self {
        Self {
            next_id: objects.max_id() + 1,
        }
    }

    /// Number the next allocated object will get.
    pub fn next_object_number(&self) -> u32 {
        self.next_id
    }

    /// Stores `value` under a fresh id (current maximum + 1).
    pub fn allocate(&mut self, objects: &mut ObjectTable, value: Object) -> ObjectId {
        let number = self.next_id.max(objects.max_id() + 1);
        let id = ObjectId::new(number, 0);
        objects.insert(IndirectObject::new(id, value));
        self.next_id = number + 1;
        id
    }

    /// Returns a font resource name usable on `page`. Reuses the first font the
    /// page already has, otherwise creates a Helvetica Type1 font object.
    pub fn bind_font(&mut self, objects: &mut ObjectTable, page: ObjectId) -> Result<String> {
        if let Some(fonts) = lookup_resources(objects, page, "Font")? {
            if let Some(name) = fonts.keys().next() {
                return Ok(name.clone());
            }
        }

        let mut font = Dictionary::new();
        font.set("Type", Object::name("Font"));
        font.set("Subtype", Object::name("Type1"));
        font.set("BaseFont", Object::name("Helvetica"));
        let font_id = self.allocate(objects, Object::Dictionary(font));

        let fonts = resource_category_mut(objects, page, "Font")?;
        let name = format!("F{}", fonts.len() + 1);
        fonts.set(name.clone(), font_id);
        tracing::debug!(page = page.number(), font = %name, object = font_id.number(), "created font resource");
        Ok(name)
    }

    /// Binds `xobject` into the page's `/XObject` table. Uses `requested` when
    /// it is free, otherwise `<prefix><n>` with the smallest free `n`.
    pub fn bind_image(
        &mut self,
        objects: &mut ObjectTable,
        page: ObjectId,
        requested: &str,
        xobject: ObjectId,
    ) -> Result<String> {
        let table = resource_category_mut(objects, page, "XObject")?;
        let name = unique_name(table, requested);
        table.set(name.clone(), xobject);
        Ok(name)
    }

    /// Creates an image XObject and binds it to `page`.
    pub(crate) fn add_image_object(
        &mut self,
        objects: &mut ObjectTable,
        page: ObjectId,
        requested: &str,
        stream: crate::objects::Stream,
    ) -> Result<(String, ObjectId)> {
        let id = self.allocate(objects, Object::Stream(stream));
        let name = self.bind_image(objects, page, requested, id)?;
        Ok((name, id))
    }
}

fn unique_name(table: &Dictionary, requested: &str) -> String {
    if !requested.is_empty() && !table.contains_key(requested) {
        return requested.to_string();
    }

    let prefix = requested.trim_end_matches(|c: char| c.is_ascii_digit());
    let prefix = if prefix.is_empty() { "Im" } else { prefix };
    (1u32..)
        .map(|n| format!("{prefix}{n}"))
        .find(|candidate| !table.contains_key(candidate))
        .unwrap_or_else(|| format!("{prefix}{}", table.len() + 1))
}

/// Resolves `/Resources/<category>` of a page, following references at
/// either level.
pub(crate) fn lookup_resources<'a>(
    objects: &'a ObjectTable,
    page: ObjectId,
    category: &str,
) -> Result<Option<&'a Dictionary>> {
    let Some(resources) = objects.dict(page)?.get("Resources") else {
        return Ok(None);
    };
    let Some(resources) = objects.resolve(resources)?.as_dict() else {
        return Ok(None);
    };
    let Some(entry) = resources.get(category) else {
        return Ok(None);
    };
    Ok(objects.resolve(entry)?.as_dict())
}

/// Mutable `/Resources/<category>` of a page, creating inline dictionaries
/// where none exist. Referenced dictionaries are edited in their own object.
fn resource_category_mut<'a>(
    objects: &'a mut ObjectTable,
    page: ObjectId,
    category: &str,
) -> Result<&'a mut Dictionary> {
    let resources_ref = objects
        .dict(page)?
        .get("Resources")
        .and_then(|r| r.as_reference());

    let category_ref = match resources_ref {
        Some(id) => objects.dict(id)?.get(category).and_then(|c| c.as_reference()),
        None => objects
            .dict(page)?
            .get_dict("Resources")
            .and_then(|res| res.get(category))
            .and_then(|c| c.as_reference()),
    };
    if let Some(id) = category_ref {
        return objects.dict_mut(id);
    }

    let resources = match resources_ref {
        Some(id) => objects.dict_mut(id)?,
        None => objects.dict_mut(page)?.get_or_insert_dict("Resources"),
    };
    Ok(resources.get_or_insert_dict(category))
}
