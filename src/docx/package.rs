// OOXML package access: reading and replacing zip parts
use std::io::{Cursor, Read, Write};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::types::{DocmarkError, DocumentFormat, Result};

pub const DOCUMENT_PART: &str = "word/document.xml";

fn zip_error(format: DocumentFormat) -> impl Fn(ZipError) -> DocmarkError {
    move |e| DocmarkError::malformed(format, e)
}

pub fn open(bytes: &[u8], format: DocumentFormat) -> Result<ZipArchive<Cursor<&[u8]>>> {
    ZipArchive::new(Cursor::new(bytes)).map_err(zip_error(format))
}

/// Names of all entries, in archive order.
pub fn part_names(bytes: &[u8], format: DocumentFormat) -> Result<Vec<String>> {
    let mut archive = open(bytes, format)?;
    let mut names = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let file = archive.by_index_raw(i).map_err(zip_error(format))?;
        names.push(file.name().to_string());
    }
    Ok(names)
}

/// Read one part as text, repairing invalid UTF-8. `None` when the part is absent.
pub fn read_part(bytes: &[u8], name: &str, format: DocumentFormat) -> Result<Option<String>> {
    let mut archive = open(bytes, format)?;
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(DocmarkError::malformed(format, e)),
    };
    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)
        .map_err(|e| DocmarkError::malformed(format, e))?;
    let text = match String::from_utf8(buffer) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("{} is not valid UTF-8, decoding lossily", name);
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    };
    Ok(Some(text))
}

/// Rewrite the package with one part replaced; every other entry is copied untouched.
pub fn replace_part(bytes: &[u8], name: &str, content: &[u8], format: DocumentFormat) -> Result<Vec<u8>> {
    let mut archive = open(bytes, format)?;
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for i in 0..archive.len() {
        let file = archive.by_index_raw(i).map_err(zip_error(format))?;
        if file.name() == name {
            writer.start_file(name, options).map_err(zip_error(format))?;
            writer.write_all(content)?;
        } else {
            writer.raw_copy_file(file).map_err(zip_error(format))?;
        }
    }
    let cursor = writer.finish().map_err(zip_error(format))?;
    Ok(cursor.into_inner())
}

/// Build a package from `(name, content)` pairs.
pub fn write_package(parts: &[(&str, &str)], format: DocumentFormat) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, content) in parts {
        writer.start_file(*name, options).map_err(zip_error(format))?;
        writer.write_all(content.as_bytes())?;
    }
    let cursor = writer.finish().map_err(zip_error(format))?;
    Ok(cursor.into_inner())
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

/// Minimal word document body around the given paragraph XML.
pub fn document_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}<w:sectPr/></w:body></w:document>"#,
        body
    )
}

/// A valid DOCX holding a single empty paragraph.
pub fn blank_docx() -> Result<Vec<u8>> {
    let document = document_xml("<w:p/>");
    write_package(
        &[
            ("[Content_Types].xml", CONTENT_TYPES),
            ("_rels/.rels", ROOT_RELS),
            (DOCUMENT_PART, &document),
        ],
        DocumentFormat::Docx,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_docx_parts() {
        let bytes = blank_docx().unwrap();
        let names = part_names(&bytes, DocumentFormat::Docx).unwrap();
        assert!(names.contains(&DOCUMENT_PART.to_string()));
        assert!(names.contains(&"[Content_Types].xml".to_string()));
        let body = read_part(&bytes, DOCUMENT_PART, DocumentFormat::Docx)
            .unwrap()
            .unwrap();
        assert!(body.contains("<w:p/>"));
        assert!(read_part(&bytes, "word/missing.xml", DocumentFormat::Docx)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_replace_part_keeps_other_entries() {
        let bytes = write_package(&[("a.txt", "alpha"), ("b.txt", "beta")], DocumentFormat::Docx).unwrap();
        let replaced = replace_part(&bytes, "b.txt", b"gamma", DocumentFormat::Docx).unwrap();
        assert_eq!(
            part_names(&replaced, DocumentFormat::Docx).unwrap(),
            vec!["a.txt", "b.txt"]
        );
        let read = |name| read_part(&replaced, name, DocumentFormat::Docx).unwrap().unwrap();
        assert_eq!(read("a.txt"), "alpha");
        assert_eq!(read("b.txt"), "gamma");
    }

    #[test]
    fn test_non_zip_is_malformed() {
        assert!(matches!(
            read_part(b"plain text", DOCUMENT_PART, DocumentFormat::Docx),
            Err(DocmarkError::MalformedDocument { .. })
        ));
    }
}
