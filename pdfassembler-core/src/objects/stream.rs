use crate::error::Result;
use crate::objects::{Dictionary, Object};

#[derive(Debug, Clone, PartialEq)]
pub struct Stream {
    dictionary: Dictionary,
    data: Vec<u8>,
}

impl Stream {
    pub fn new(data: Vec<u8>) -> Self {
        let mut dictionary = Dictionary::new();
        dictionary.set("Length", data.len());

        Self { dictionary, data }
    }

    pub fn with_dictionary(dictionary: Dictionary, data: Vec<u8>) -> Self {
        let mut dict = dictionary;
        dict.set("Length", data.len());

        Self {
            dictionary: dict,
            data,
        }
    }

    /// Builds a stream from parsed parts without touching `Length`. The writer
    /// corrects it on output.
    pub(crate) fn from_parts(dictionary: Dictionary, data: Vec<u8>) -> Self {
        Self { dictionary, data }
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn dictionary_mut(&mut self) -> &mut Dictionary {
        &mut self.dictionary
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Replaces the payload and keeps `Length` in step with it.
    pub fn set_data(&mut self, data: Vec<u8>) {
        self.dictionary.set("Length", data.len());
        self.data = data;
    }

    pub fn set_filter(&mut self, filter: &str) {
        self.dictionary.set("Filter", Object::name(filter));
    }

    /// First filter name, whether `Filter` is a single name or an array.
    pub fn filter(&self) -> Option<&str> {
        match self.dictionary.get("Filter")? {
            Object::Name(name) => Some(name),
            Object::Array(filters) => filters.first().and_then(|f| f.as_name()),
            _ => None,
        }
    }

    pub fn compress_flate(&mut self) -> Result<()> {
        let compressed = crate::compression::compress(&self.data)?;
        self.set_data(compressed);
        self.set_filter("FlateDecode");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_new() {
        let data = vec![1, 2, 3, 4, 5];
        let stream = Stream::new(data.clone());

        assert_eq!(stream.data(), &data);
        assert_eq!(stream.dictionary().get("Length"), Some(&Object::Integer(5)));
    }

    #[test]
    fn test_stream_with_dictionary() {
        let mut dict = Dictionary::new();
        dict.set("Type", Object::name("XObject"));
        dict.set("Subtype", Object::name("Image"));

        let stream = Stream::with_dictionary(dict, vec![0xFF, 0xD8, 0xFF]);

        assert_eq!(stream.dictionary().get("Length"), Some(&Object::Integer(3)));
        assert_eq!(stream.dictionary().get_type(), Some("XObject"));
    }

    #[test]
    fn test_from_parts_keeps_declared_length() {
        let mut dict = Dictionary::new();
        dict.set("Length", Object::Reference(crate::objects::ObjectId::new(9, 0)));
        let stream = Stream::from_parts(dict, b"abc".to_vec());

        assert!(stream.dictionary().get("Length").unwrap().as_reference().is_some());
    }

    #[test]
    fn test_set_data_updates_length() {
        let mut stream = Stream::new(vec![1, 2, 3]);
        stream.set_data(b"BT ET".to_vec());
        assert_eq!(stream.dictionary().get("Length"), Some(&Object::Integer(5)));
    }

    #[test]
    fn test_filter_single_and_array() {
        let mut stream = Stream::new(vec![]);
        assert_eq!(stream.filter(), None);

        stream.set_filter("DCTDecode");
        assert_eq!(stream.filter(), Some("DCTDecode"));

        stream.dictionary_mut().set(
            "Filter",
            vec![Object::name("FlateDecode"), Object::name("DCTDecode")],
        );
        assert_eq!(stream.filter(), Some("FlateDecode"));
    }

    #[test]
    fn test_compress_flate() {
        let data: Vec<u8> = std::iter::repeat(0x7F).take(300).collect();
        let mut stream = Stream::new(data.clone());
        stream.compress_flate().unwrap();

        assert_eq!(stream.filter(), Some("FlateDecode"));
        assert!(stream.data().len() < data.len());
        assert_eq!(
            stream.dictionary().get("Length"),
            Some(&Object::Integer(stream.data().len() as i64))
        );
        assert_eq!(crate::compression::decompress(stream.data()).unwrap(), data);
    }
}
