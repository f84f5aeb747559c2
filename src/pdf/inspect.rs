use std::path::Path;

use lopdf::{Document as LoDocument, Object as LoObject, ObjectId};

use crate::foundation::error::{TexlapseError, TexlapseResult};

/// Displayed size of a page in PDF user-space units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }
}

/// Page count of a document plus the size of its first page, if it has one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DocumentGeometry {
    pub page_count: u32,
    pub first_page: Option<PageSize>,
}

/// Reads page count and geometry from a paginated document.
pub trait PageReader {
    fn inspect(&self, path: &Path) -> TexlapseResult<DocumentGeometry>;
}

/// [`PageReader`] that parses the PDF with `lopdf`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LopdfReader;

impl PageReader for LopdfReader {
    fn inspect(&self, path: &Path) -> TexlapseResult<DocumentGeometry> {
        let data = std::fs::read(path)
            .map_err(|e| TexlapseError::pdf(format!("read '{}': {e}", path.display())))?;
        inspect_pdf_bytes(&data)
            .map_err(|e| TexlapseError::pdf(format!("'{}': {e}", path.display())))
    }
}

pub fn inspect_pdf_bytes(bytes: &[u8]) -> TexlapseResult<DocumentGeometry> {
    let doc = LoDocument::load_mem(bytes).map_err(lopdf_err)?;
    let pages = doc.get_pages();
    let page_count = u32::try_from(pages.len())
        .map_err(|_| TexlapseError::pdf("page count does not fit in u32"))?;
    let first_page = match pages.values().next() {
        Some(&id) => Some(page_size_for_id(&doc, id)?),
        None => None,
    };
    Ok(DocumentGeometry {
        page_count,
        first_page,
    })
}

fn lopdf_err(err: lopdf::Error) -> TexlapseError {
    TexlapseError::pdf(format!("pdf parse error: {err}"))
}

/// `MediaBox` and `Rotate` are inheritable, so walk up through `Parent` until found.
fn page_size_for_id(doc: &LoDocument, page_id: ObjectId) -> TexlapseResult<PageSize> {
    let mut media_box = None;
    let mut rotate = None;
    let mut id = page_id;
    loop {
        let dict = doc
            .get_object(id)
            .and_then(LoObject::as_dict)
            .map_err(lopdf_err)?;
        if media_box.is_none()
            && let Ok(obj) = dict.get(b"MediaBox")
        {
            media_box = resolve(doc, obj).and_then(parse_box);
        }
        if rotate.is_none()
            && let Ok(obj) = dict.get(b"Rotate")
        {
            rotate = resolve(doc, obj).and_then(obj_to_f64);
        }
        if media_box.is_some() && rotate.is_some() {
            break;
        }
        id = match dict.get(b"Parent").and_then(LoObject::as_reference) {
            Ok(parent) if parent != id => parent,
            _ => break,
        };
    }

    let size = media_box.ok_or_else(|| TexlapseError::pdf("first page has no usable MediaBox"))?;
    let quarter_turns = (rotate.unwrap_or(0.0) / 90.0).round() as i64;
    if quarter_turns.rem_euclid(2) == 1 {
        Ok(PageSize {
            width: size.height,
            height: size.width,
        })
    } else {
        Ok(size)
    }
}

fn resolve<'a>(doc: &'a LoDocument, obj: &'a LoObject) -> Option<&'a LoObject> {
    match obj {
        LoObject::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

fn parse_box(obj: &LoObject) -> Option<PageSize> {
    let arr = obj.as_array().ok()?;
    if arr.len() < 4 {
        return None;
    }
    let x0 = obj_to_f64(&arr[0])?;
    let y0 = obj_to_f64(&arr[1])?;
    let x1 = obj_to_f64(&arr[2])?;
    let y1 = obj_to_f64(&arr[3])?;
    let width = (x1 - x0).abs();
    let height = (y1 - y0).abs();
    if width > 0.0 && height > 0.0 {
        Some(PageSize { width, height })
    } else {
        None
    }
}

fn obj_to_f64(obj: &LoObject) -> Option<f64> {
    match obj {
        LoObject::Integer(v) => Some(*v as f64),
        LoObject::Real(v) => Some(*v as f64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Dictionary as LoDictionary, Stream as LoStream, dictionary};

    fn media_box(width: i64, height: i64) -> LoObject {
        LoObject::Array(vec![0.into(), 0.into(), width.into(), height.into()])
    }

    fn make_pdf_bytes(page_count: usize, media_box_on_pages: bool, rotate: Option<i64>) -> Vec<u8> {
        let mut doc = LoDocument::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut kids: Vec<LoObject> = Vec::new();
        for _ in 0..page_count {
            let content_id = doc.add_object(LoStream::new(dictionary! {}, Vec::new()));
            let mut page = dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            };
            if media_box_on_pages {
                page.set("MediaBox", media_box(612, 792));
            }
            if let Some(r) = rotate {
                page.set("Rotate", r);
            }
            kids.push(doc.add_object(page).into());
        }
        let mut pages: LoDictionary = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count as i64,
        };
        if !media_box_on_pages {
            pages.set("MediaBox", media_box(595, 842));
        }
        doc.objects.insert(pages_id, LoObject::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out).expect("save");
        out
    }

    #[test]
    fn reads_page_count_and_letter_geometry() {
        let geom = inspect_pdf_bytes(&make_pdf_bytes(3, true, None)).unwrap();
        assert_eq!(geom.page_count, 3);
        let page = geom.first_page.unwrap();
        assert_eq!((page.width, page.height), (612.0, 792.0));
        assert!((page.aspect_ratio() - 612.0 / 792.0).abs() < 1e-12);
    }

    #[test]
    fn media_box_is_inherited_from_page_tree() {
        let geom = inspect_pdf_bytes(&make_pdf_bytes(1, false, None)).unwrap();
        let page = geom.first_page.unwrap();
        assert_eq!((page.width, page.height), (595.0, 842.0));
    }

    #[test]
    fn quarter_rotation_swaps_dimensions() {
        let geom = inspect_pdf_bytes(&make_pdf_bytes(1, true, Some(90))).unwrap();
        let page = geom.first_page.unwrap();
        assert_eq!((page.width, page.height), (792.0, 612.0));
    }

    #[test]
    fn empty_document_has_no_first_page() {
        let geom = inspect_pdf_bytes(&make_pdf_bytes(0, true, None)).unwrap();
        assert_eq!(geom.page_count, 0);
        assert!(geom.first_page.is_none());
    }

    #[test]
    fn malformed_data_is_a_pdf_error() {
        let err = inspect_pdf_bytes(b"not a pdf").unwrap_err();
        assert!(matches!(err, TexlapseError::Pdf(_)));
    }
}
