//! Placeholder artifacts for pages the engine could not process.
//!
//! Both stand-ins describe an ordinary page with no text, so downstream
//! consumers never need a "missing page" branch.

use crate::error::{OcrError, Result};
use crate::util::remove_stale;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::path::Path;
use tracing::debug;

/// hOCR document for one page of `width`×`height` pixels with no words.
pub fn null_hocr(width: u32, height: u32) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Transitional//EN"
    "http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd">
<html xmlns="http://www.w3.org/1999/xhtml" xml:lang="en" lang="en">
 <head>
  <title></title>
  <meta http-equiv="Content-Type" content="text/html; charset=utf-8" />
  <meta name='ocr-system' content='tesseract' />
  <meta name='ocr-capabilities' content='ocr_page ocr_carea ocr_par ocr_line ocrx_word'/>
 </head>
 <body>
  <div class='ocr_page' id='page_1' title='image " "; bbox 0 0 {width} {height}; ppageno 0'>
   <div class='ocr_carea' id='block_1_1' title="bbox 0 1 {width} {height}">
    <p class='ocr_par' dir='ltr' id='par_1' title="bbox 0 1 {width} {height}">
     <span class='ocr_line' id='line_1' title="bbox 0 1 {width} {height}"><span class='ocrx_word' id='word_1' title="bbox 0 1 {width} {height}"> </span>
     </span>
    </p>
   </div>
  </div>
 </body>
</html>
"#
    )
}

/// Write a null hOCR document sized to the pixel dimensions of `image`.
pub fn write_null_hocr(image: &Path, output: &Path) -> Result<()> {
    let (width, height) = image::image_dimensions(image)?;
    debug!(
        "null hOCR {}x{} for {} -> {}",
        width,
        height,
        image.display(),
        output.display()
    );
    std::fs::write(output, null_hocr(width, height))?;
    Ok(())
}

/// MediaBox of the first page of `pdf`, following inherited page-tree
/// attributes when the page itself does not carry one.
pub fn first_page_media_box(pdf: &Path) -> Result<[f32; 4]> {
    let doc = Document::load(pdf)?;
    let page_id = doc
        .get_pages()
        .values()
        .next()
        .copied()
        .ok_or_else(|| OcrError::MalformedPdf {
            path: pdf.to_path_buf(),
            reason: "document has no pages".into(),
        })?;
    media_box(&doc, page_id, pdf).map_err(|err| match err {
        OcrError::Pdf(inner) => OcrError::MalformedPdf {
            path: pdf.to_path_buf(),
            reason: format!("unreadable MediaBox: {inner}"),
        },
        other => other,
    })
}

/// Page-tree depth past which a missing MediaBox is treated as malformed.
const MAX_TREE_DEPTH: usize = 32;

fn media_box(doc: &Document, page_id: ObjectId, pdf: &Path) -> Result<[f32; 4]> {
    let mut node = doc.get_dictionary(page_id)?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(obj) = node.get(b"MediaBox") {
            let arr = resolve(doc, obj)?.as_array()?;
            if arr.len() != 4 {
                return Err(OcrError::MalformedPdf {
                    path: pdf.to_path_buf(),
                    reason: format!("MediaBox has {} entries", arr.len()),
                });
            }
            let mut rect = [0f32; 4];
            for (slot, value) in rect.iter_mut().zip(arr) {
                *slot = resolve(doc, value)?.as_float()?;
            }
            return Ok(rect);
        }
        let parent = node.get(b"Parent")?.as_reference()?;
        node = doc.get_dictionary(parent)?;
    }
    Err(OcrError::MalformedPdf {
        path: pdf.to_path_buf(),
        reason: "no MediaBox in page tree".into(),
    })
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Result<&'a Object> {
    match obj {
        Object::Reference(id) => Ok(doc.get_object(*id)?),
        other => Ok(other),
    }
}

/// Write a one-page PDF with nothing drawn on it and the given MediaBox.
pub fn write_blank_pdf(media_box: [f32; 4], output: &Path) -> Result<()> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let content_id = doc.add_object(Stream::new(Dictionary::new(), Vec::new()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => media_box.iter().map(|v| Object::Real(*v)).collect::<Vec<_>>(),
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(output)?;
    Ok(())
}

/// Replace a page that could not be rendered with a blank page the size
/// of `skip_pdf`.
pub fn write_blank_like(skip_pdf: &Path, output: &Path) -> Result<()> {
    let rect = first_page_media_box(skip_pdf)?;
    debug!(?rect, "blank text-only page from {}", skip_pdf.display());
    // Never write through a link left by an earlier full-render fallback.
    remove_stale(output)?;
    write_blank_pdf(rect, output)
}
