mod dictionary;
mod primitive;
mod stream;
mod table;

pub use dictionary::Dictionary;
pub use primitive::{Object, ObjectId, PdfString, StringFormat};
pub(crate) use primitive::{decode_latin1, encode_latin1};
pub use stream::Stream;
pub use table::{IndirectObject, ObjectTable};
