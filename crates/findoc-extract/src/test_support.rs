//! Test support: an in-memory page reader and a small PDF builder.
//!
//! `build_pdf` writes one text line per `BT`/`ET` block so lopdf's text
//! extraction yields a newline per line. An empty page string produces a page
//! that only paints a rectangle, which stands in for a scanned image page.
//! `build_encrypted_pdf` applies the RC4 standard security handler on top.

use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::encryption::{decrypt_object, get_encryption_key, DecryptionError};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};

use crate::error::ExtractError;
use crate::reader::PageReader;

/// Returns the same pages for any path.
pub struct InMemoryPages {
    pages: Vec<String>,
}

impl InMemoryPages {
    pub fn new(pages: Vec<String>) -> Self {
        Self { pages }
    }
}

impl PageReader for InMemoryPages {
    fn read_pages(&self, _path: &Path) -> Result<Vec<String>, ExtractError> {
        Ok(self.pages.clone())
    }
}

fn page_operations(text: &str) -> Vec<Operation> {
    if text.is_empty() {
        return vec![
            Operation::new("re", vec![50.into(), 50.into(), 400.into(), 600.into()]),
            Operation::new("f", vec![]),
        ];
    }

    let mut ops = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let y = 780 - (i as i64) * 14;
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new("Tf", vec!["F1".into(), 11.into()]));
        ops.push(Operation::new("Td", vec![50.into(), y.into()]));
        ops.push(Operation::new("Tj", vec![Object::string_literal(line)]));
        ops.push(Operation::new("ET", vec![]));
    }
    ops
}

fn build_document(pages: &[&str]) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for text in pages {
        let content = Content {
            operations: page_operations(text),
        };
        let encoded = content.encode().unwrap_or_default();
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

fn save(mut doc: Document) -> Vec<u8> {
    let mut bytes = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = doc.save_to(&mut bytes);
    bytes
}

/// Build a PDF with one page per entry.
pub fn build_pdf(pages: &[&str]) -> Vec<u8> {
    save(build_document(pages))
}

const PASSWORD_PADDING: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01, 0x08,
    0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53, 0x69, 0x7A,
];

fn rc4(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut state: Vec<u8> = (0..=255).collect();
    let mut j = 0u8;
    for i in 0..256 {
        j = j.wrapping_add(state[i]).wrapping_add(key[i % key.len()]);
        state.swap(i, j as usize);
    }

    let (mut i, mut j) = (0u8, 0u8);
    data.iter()
        .map(|byte| {
            i = i.wrapping_add(1);
            j = j.wrapping_add(state[i as usize]);
            state.swap(i as usize, j as usize);
            byte ^ state[state[i as usize].wrapping_add(state[j as usize]) as usize]
        })
        .collect()
}

/// Build a PDF like [`build_pdf`], encrypted with 40-bit RC4 (revision 2)
/// under `user_password`. An empty password gives the common "owner password
/// only" file that viewers open without prompting.
pub fn build_encrypted_pdf(
    pages: &[&str],
    user_password: &str,
) -> Result<Vec<u8>, DecryptionError> {
    fn hex(bytes: &[u8]) -> Object {
        Object::String(bytes.to_vec(), StringFormat::Hexadecimal)
    }

    let mut doc = build_document(pages);
    let encrypt_id = doc.add_object(dictionary! {
        "Filter" => "Standard",
        "V" => 1,
        "R" => 2,
        "Length" => 40,
        "O" => hex(&[0x5A; 32]),
        "P" => -4,
    });
    doc.trailer.set("Encrypt", encrypt_id);
    let file_id = hex(b"findoc-encrypted-fixture");
    doc.trailer.set("ID", vec![file_id.clone(), file_id]);

    let key = get_encryption_key(&doc, user_password, false)?;
    if let Ok(dict) = doc.get_object_mut(encrypt_id).and_then(Object::as_dict_mut) {
        dict.set("U", hex(&rc4(&key, &PASSWORD_PADDING)));
    }

    // RC4 is symmetric, so the decryption routine also encrypts.
    for (&id, obj) in doc.objects.iter_mut() {
        if id == encrypt_id {
            continue;
        }
        let sealed = match decrypt_object(&key, id, obj) {
            Ok(sealed) => sealed,
            Err(DecryptionError::NotDecryptable) => continue,
            Err(e) => return Err(e),
        };
        match obj {
            Object::Stream(stream) => stream.set_content(sealed),
            Object::String(content, _) => *content = sealed,
            _ => {}
        }
    }

    Ok(save(doc))
}

/// Write a PDF built by [`build_pdf`] to `path`.
pub fn write_pdf(path: &Path, pages: &[&str]) -> std::io::Result<()> {
    std::fs::write(path, build_pdf(pages))
}
