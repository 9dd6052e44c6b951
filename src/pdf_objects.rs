// Small lopdf helpers: reference chasing, numbers, inherited page keys
use lopdf::{Dictionary, Document, Object};

const MAX_REFERENCE_DEPTH: usize = 32;

/// Follow indirect references until a direct object is reached.
///
/// Reference cycles stop after a fixed depth and hand back the last
/// reference, which callers then reject as the wrong type.
pub fn resolve<'a>(doc: &'a Document, mut obj: &'a Object) -> lopdf::Result<&'a Object> {
    for _ in 0..MAX_REFERENCE_DEPTH {
        match obj {
            Object::Reference(id) => obj = doc.get_object(*id)?,
            _ => break,
        }
    }
    Ok(obj)
}

/// Resolved value of `key`, or `None` when absent or dangling.
pub fn get_resolved<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    dict.get(key).ok().and_then(|obj| resolve(doc, obj).ok())
}

pub fn get_dict<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Dictionary> {
    get_resolved(doc, dict, key).and_then(|obj| obj.as_dict().ok())
}

pub fn get_array<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Vec<Object>> {
    get_resolved(doc, dict, key).and_then(|obj| obj.as_array().ok())
}

pub fn get_name<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a [u8]> {
    match get_resolved(doc, dict, key)? {
        Object::Name(name) => Some(name.as_slice()),
        _ => None,
    }
}

pub fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(f) => Some((*f).into()),
        _ => None,
    }
}

/// Every element as a number, or `None` if any element is not one.
pub fn numbers(doc: &Document, items: &[Object]) -> Option<Vec<f64>> {
    items
        .iter()
        .map(|item| resolve(doc, item).ok().and_then(number))
        .collect()
}

/// Look up a page attribute, walking `/Parent` links for inherited keys.
pub fn inherited<'a>(doc: &'a Document, page: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    let mut node = page;
    for _ in 0..MAX_REFERENCE_DEPTH {
        if let Some(obj) = get_resolved(doc, node, key) {
            return Some(obj);
        }
        node = get_dict(doc, node, b"Parent")?;
    }
    None
}

/// Concatenated, decompressed bytes of a `/Contents` entry.
pub fn content_bytes(doc: &Document, contents: &Object) -> lopdf::Result<Vec<u8>> {
    match resolve(doc, contents)? {
        Object::Stream(stream) => Ok(stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone())),
        Object::Array(parts) => {
            let mut data = Vec::new();
            for part in parts {
                data.extend(content_bytes(doc, part)?);
                // streams may split mid-token without this
                data.push(b'\n');
            }
            Ok(data)
        }
        _ => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    #[test]
    fn test_number_accepts_integers_and_reals() {
        assert_eq!(number(&Object::Integer(3)), Some(3.0));
        assert_eq!(number(&Object::Real(0.5)), Some(0.5));
        assert_eq!(number(&Object::Name(b"X".to_vec())), None);
    }

    #[test]
    fn test_resolve_follows_references() {
        let mut doc = Document::with_version("1.5");
        let inner = doc.add_object(Object::Integer(7));
        let outer = doc.add_object(Object::Reference(inner));
        let obj = Object::Reference(outer);
        assert_eq!(resolve(&doc, &obj).ok().and_then(number), Some(7.0));
    }

    #[test]
    fn test_inherited_walks_parents() {
        let mut doc = Document::with_version("1.5");
        let parent = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Resources" => dictionary! { "Marker" => 1i64 },
        });
        let page = dictionary! { "Type" => "Page", "Parent" => parent };
        let resources = inherited(&doc, &page, b"Resources").and_then(|o| o.as_dict().ok());
        assert!(resources.is_some_and(|d| d.has(b"Marker")));
        assert!(inherited(&doc, &page, b"MediaBox").is_none());
    }

    #[test]
    fn test_numbers_rejects_mixed_arrays() {
        let doc = Document::with_version("1.5");
        let items = vec![Object::Integer(1), Object::Real(0.5)];
        assert_eq!(numbers(&doc, &items), Some(vec![1.0, 0.5]));
        let mixed = vec![Object::Integer(1), Object::Name(b"Red".to_vec())];
        assert_eq!(numbers(&doc, &mixed), None);
    }
}
