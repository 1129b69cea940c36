// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output document: the growing PDF that receives one page per image, built
// with the `lopdf` crate.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId, dictionary};
use pagepress_core::error::PagepressError;
use tracing::{debug, info, instrument, warn};

use crate::image::ImageProcessor;
use crate::pdf::writer::PageRenderer;

/// Append-only PDF under construction.
///
/// Pages are added as blank pages of the configured paper size, then the
/// rendered single-image page is merged on top.
pub struct OutputDocument {
    /// The underlying lopdf document.
    document: Document,
    /// Root of the page tree (`/Pages`).
    pages_id: ObjectId,
    /// Page objects in page order.
    page_ids: Vec<ObjectId>,
    renderer: PageRenderer,
}

impl OutputDocument {
    // -- Construction ---------------------------------------------------------

    /// Start an empty document whose pages will use the renderer's paper size.
    pub fn new(renderer: PageRenderer) -> Self {
        let mut document = Document::with_version("1.5");
        let pages_id = document.new_object_id();
        document.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => Vec::<Object>::new(),
                "Count" => Object::Integer(0),
            }),
        );
        let catalog_id = document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        document.trailer.set("Root", catalog_id);

        Self {
            document,
            pages_id,
            page_ids: Vec::new(),
            renderer,
        }
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages added so far.
    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Borrow the underlying lopdf document.
    pub fn as_lopdf(&self) -> &Document {
        &self.document
    }

    // -- Composition ----------------------------------------------------------

    /// Decode `image_path`, turn it upright, and add it as page `index`.
    ///
    /// `index` must be the next free position: pages are only ever appended.
    #[instrument(skip_all, fields(path = %image_path.as_ref().display(), index))]
    pub fn insert_image_page(
        &mut self,
        image_path: impl AsRef<Path>,
        index: usize,
    ) -> Result<(), PagepressError> {
        self.check_index(index)?;

        let staged = ImageProcessor::open(image_path.as_ref())?
            .auto_orient()
            .stage()?;
        let dimensions = staged.dimensions()?;
        let image = staged.load()?;
        debug!(?dimensions, "Staged image read back");

        let rendered = self.renderer.render(&image)?;
        // `staged` is dropped here or on any early return above, removing the
        // temporary file.
        drop(staged);

        let page_id = self.add_blank_page(index)?;
        self.merge_rendered_page(page_id, &rendered)?;

        info!(index, "Page added");
        Ok(())
    }

    /// Append an empty page of the configured paper size at `index`.
    pub fn add_blank_page(&mut self, index: usize) -> Result<ObjectId, PagepressError> {
        self.check_index(index)?;

        let (width, height) = self.renderer.paper_size().dimensions_pt();
        let page_id = self.document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(width),
                Object::Real(height),
            ],
        });

        let pages_dict = self
            .document
            .get_object_mut(self.pages_id)
            .and_then(Object::as_dict_mut)
            .map_err(|err| PagepressError::PdfError(format!("no /Pages node: {}", err)))?;
        if let Ok(Object::Array(kids)) = pages_dict.get_mut(b"Kids") {
            kids.push(Object::Reference(page_id));
        }
        pages_dict.set("Count", Object::Integer(self.page_ids.len() as i64 + 1));

        self.page_ids.push(page_id);
        Ok(page_id)
    }

    /// Merge the first page of `rendered` (a serialised PDF) onto `page_id`:
    /// its content streams are appended and its resources copied across.
    pub fn merge_rendered_page(
        &mut self,
        page_id: ObjectId,
        rendered: &[u8],
    ) -> Result<(), PagepressError> {
        let source = Document::load_mem(rendered).map_err(|err| {
            PagepressError::PdfError(format!("failed to load rendered page: {}", err))
        })?;
        let source_page_id = *source
            .get_pages()
            .get(&1)
            .ok_or_else(|| PagepressError::PdfError("rendered page is empty".into()))?;
        let source_page = source.get_dictionary(source_page_id).map_err(|err| {
            PagepressError::PdfError(format!("cannot read rendered page: {}", err))
        })?;

        let mut copier = ObjectCopier::new(&source);
        let contents = source_page
            .get(b"Contents")
            .ok()
            .map(|obj| copier.copy(&mut self.document, obj));
        let resources = match source_page.get(b"Resources") {
            Ok(obj) => {
                let (_, resolved) = source.dereference(obj).map_err(|err| {
                    PagepressError::PdfError(format!("cannot resolve /Resources: {}", err))
                })?;
                match copier.copy(&mut self.document, resolved) {
                    Object::Dictionary(dict) => Some(dict),
                    _ => None,
                }
            }
            Err(_) => None,
        };

        let page = self
            .document
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(|err| PagepressError::PdfError(format!("cannot open page: {}", err)))?;

        if let Some(contents) = contents {
            append_contents(page, contents);
        }
        if let Some(resources) = resources {
            merge_resources(page, resources);
        }

        debug!(?page_id, "Rendered page merged");
        Ok(())
    }

    // -- Output ---------------------------------------------------------------

    /// Serialise the document into `writer`.
    #[instrument(skip_all, fields(pages = self.page_count()))]
    pub fn save_to<W: Write>(&mut self, writer: &mut W) -> Result<(), PagepressError> {
        self.document.compress();
        self.document.save_to(writer).map_err(|err| {
            PagepressError::PdfError(format!("failed to serialise document: {}", err))
        })?;
        info!("Document serialised");
        Ok(())
    }

    // -- Helpers --------------------------------------------------------------

    fn check_index(&self, index: usize) -> Result<(), PagepressError> {
        let expected = self.page_count();
        if index != expected {
            return Err(PagepressError::PageIndex {
                expected,
                actual: index,
            });
        }
        Ok(())
    }
}

impl Default for OutputDocument {
    fn default() -> Self {
        Self::new(PageRenderer::default())
    }
}

/// Add `contents` (a stream reference or an array of them) after whatever the
/// page already draws.
fn append_contents(page: &mut Dictionary, contents: Object) {
    let mut merged = match page.get(b"Contents") {
        Ok(Object::Array(existing)) => existing.clone(),
        Ok(existing) => vec![existing.clone()],
        Err(_) => Vec::new(),
    };
    match contents {
        Object::Array(items) => merged.extend(items),
        other => merged.push(other),
    }

    let value = if merged.len() == 1 {
        merged.remove(0)
    } else {
        Object::Array(merged)
    };
    page.set("Contents", value);
}

/// Fold the resource categories of `incoming` into the page's own
/// `/Resources`. Existing names win over incoming ones.
fn merge_resources(page: &mut Dictionary, incoming: Dictionary) {
    let mut resources = match page.get(b"Resources") {
        Ok(Object::Dictionary(existing)) => existing.clone(),
        _ => Dictionary::new(),
    };

    for (category, value) in incoming.into_iter() {
        if !resources.has(&category) {
            resources.set(category, value);
            continue;
        }
        match (resources.get_mut(&category), value) {
            (Ok(Object::Dictionary(mine)), Object::Dictionary(theirs)) => {
                for (name, entry) in theirs.into_iter() {
                    if !mine.has(&name) {
                        mine.set(name, entry);
                    }
                }
            }
            _ => warn!(
                category = %String::from_utf8_lossy(&category),
                "Resource category already present, keeping page's own"
            ),
        }
    }

    page.set("Resources", Object::Dictionary(resources));
}

/// Copies objects out of a rendered page into the output document.
///
/// Every source object is copied at most once: later references to it reuse
/// the id it was given the first time. `/Parent` links are dropped so the
/// source's page tree is never pulled across.
struct ObjectCopier<'a> {
    source: &'a Document,
    copied: BTreeMap<ObjectId, ObjectId>,
}

impl<'a> ObjectCopier<'a> {
    fn new(source: &'a Document) -> Self {
        Self {
            source,
            copied: BTreeMap::new(),
        }
    }

    fn copy(&mut self, target: &mut Document, object: &Object) -> Object {
        match object {
            Object::Reference(id) => self.copy_reference(target, *id),
            Object::Array(items) => {
                Object::Array(items.iter().map(|item| self.copy(target, item)).collect())
            }
            Object::Dictionary(dict) => Object::Dictionary(self.copy_dict(target, dict, true)),
            Object::Stream(stream) => {
                // Encoded bytes are kept as-is; the dictionary still names the filter.
                let dict = self.copy_dict(target, &stream.dict, false);
                let mut copy = lopdf::Stream::new(dict, stream.content.clone());
                copy.allows_compression = stream.allows_compression;
                Object::Stream(copy)
            }
            other => other.clone(),
        }
    }

    fn copy_reference(&mut self, target: &mut Document, id: ObjectId) -> Object {
        if let Some(&existing) = self.copied.get(&id) {
            return Object::Reference(existing);
        }
        let Ok(referenced) = self.source.get_object(id) else {
            warn!(?id, "Dangling reference in rendered page, using Null");
            return Object::Null;
        };
        // Reserve the id first so cycles resolve to it.
        let new_id = target.new_object_id();
        self.copied.insert(id, new_id);
        let copy = self.copy(target, referenced);
        target.objects.insert(new_id, copy);
        Object::Reference(new_id)
    }

    fn copy_dict(
        &mut self,
        target: &mut Document,
        dict: &Dictionary,
        skip_parent: bool,
    ) -> Dictionary {
        let mut copy = Dictionary::new();
        for (key, value) in dict.iter() {
            if skip_parent && key == b"Parent" {
                continue;
            }
            copy.set(key.clone(), self.copy(target, value));
        }
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use pagepress_core::PaperSize;

    fn write_image(dir: &Path, name: &str, width: u32, height: u32) -> std::path::PathBuf {
        let path = dir.join(name);
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([90, 160, 30])))
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();
        path
    }

    /// Pixel size of the first image XObject drawn on each page.
    fn image_sizes(doc: &Document) -> Vec<(i64, i64)> {
        let mut sizes = Vec::new();
        for (_, page_id) in doc.get_pages() {
            let page = doc.get_dictionary(page_id).unwrap();
            let (_, resources) = doc.dereference(page.get(b"Resources").unwrap()).unwrap();
            let xobjects = resources.as_dict().unwrap().get(b"XObject").unwrap();
            let (_, xobjects) = doc.dereference(xobjects).unwrap();
            let (_, first) = xobjects
                .as_dict()
                .unwrap()
                .iter()
                .next()
                .unwrap();
            let (_, stream) = doc.dereference(first).unwrap();
            let dict = &stream.as_stream().unwrap().dict;
            sizes.push((
                dict.get(b"Width").unwrap().as_i64().unwrap(),
                dict.get(b"Height").unwrap().as_i64().unwrap(),
            ));
        }
        sizes
    }

    #[test]
    fn empty_document_serialises() {
        let mut doc = OutputDocument::default();
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        assert_eq!(Document::load_mem(&bytes).unwrap().get_pages().len(), 0);
    }

    #[test]
    fn blank_pages_are_a5() {
        let mut doc = OutputDocument::default();
        let page_id = doc.add_blank_page(0).unwrap();
        assert_eq!(doc.page_count(), 1);

        let page = doc.as_lopdf().get_dictionary(page_id).unwrap();
        let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
        let (w, h) = PaperSize::A5.dimensions_pt();
        assert_eq!(media_box[2].as_float().unwrap(), w);
        assert_eq!(media_box[3].as_float().unwrap(), h);
    }

    #[test]
    fn out_of_order_index_is_rejected() {
        let mut doc = OutputDocument::default();
        match doc.add_blank_page(1) {
            Err(PagepressError::PageIndex { expected, actual }) => {
                assert_eq!((expected, actual), (0, 1));
            }
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
        assert_eq!(doc.page_count(), 0);
    }

    #[test]
    fn pages_follow_insertion_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_image(dir.path(), "first.png", 11, 20);
        let second = write_image(dir.path(), "second.png", 23, 10);
        let third = write_image(dir.path(), "third.png", 37, 37);

        let mut doc = OutputDocument::default();
        for (index, path) in [&first, &second, &third].into_iter().enumerate() {
            doc.insert_image_page(path, index).unwrap();
        }
        assert_eq!(doc.page_count(), 3);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        let reloaded = Document::load_mem(&bytes).unwrap();
        assert_eq!(reloaded.get_pages().len(), 3);
        let widths: Vec<i64> = image_sizes(&reloaded).into_iter().map(|(w, _)| w).collect();
        assert_eq!(widths, vec![11, 23, 37]);
    }

    #[test]
    fn exif_rotated_jpeg_is_embedded_upright() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sideways.jpg");
        crate::image::processor::tests::write_oriented_jpeg(&path, 40, 20, 6);

        let mut doc = OutputDocument::default();
        doc.insert_image_page(&path, 0).unwrap();
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();

        let reloaded = Document::load_mem(&bytes).unwrap();
        assert_eq!(image_sizes(&reloaded), vec![(20, 40)]);
    }

    #[test]
    fn undecodable_image_adds_no_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.gif");
        std::fs::write(&path, b"GIF89a garbage").unwrap();

        let mut doc = OutputDocument::default();
        assert!(doc.insert_image_page(&path, 0).is_err());
        assert_eq!(doc.page_count(), 0);
    }

    #[test]
    fn merge_appends_to_existing_contents() {
        let mut page = Dictionary::new();
        page.set("Contents", Object::Reference((4, 0)));
        append_contents(&mut page, Object::Reference((9, 0)));
        let contents = page.get(b"Contents").unwrap().as_array().unwrap();
        assert_eq!(contents.len(), 2);
    }

    #[test]
    fn merge_resources_keeps_existing_names() {
        let mut page = Dictionary::new();
        page.set(
            "Resources",
            dictionary! { "XObject" => dictionary! { "Im1" => Object::Reference((1, 0)) } },
        );
        let incoming = dictionary! {
            "XObject" => dictionary! {
                "Im1" => Object::Reference((7, 0)),
                "Im2" => Object::Reference((8, 0)),
            },
            "ProcSet" => vec![Object::Name(b"PDF".to_vec())],
        };

        merge_resources(&mut page, incoming);

        let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
        let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
        assert_eq!(xobjects.get(b"Im1").unwrap().as_reference().unwrap(), (1, 0));
        assert_eq!(xobjects.get(b"Im2").unwrap().as_reference().unwrap(), (8, 0));
        assert!(resources.has(b"ProcSet"));
    }

    #[test]
    fn shared_objects_are_copied_once() {
        let mut source = Document::with_version("1.5");
        let shared = source.add_object(dictionary! { "Kind" => "Shared" });
        let pair = Object::Array(vec![Object::Reference(shared), Object::Reference(shared)]);

        let mut target = Document::with_version("1.5");
        let copied = ObjectCopier::new(&source).copy(&mut target, &pair);

        let refs = copied.as_array().unwrap();
        assert_eq!(refs[0].as_reference().unwrap(), refs[1].as_reference().unwrap());
        assert_eq!(target.objects.len(), 1);
    }

    #[test]
    fn cyclic_references_terminate() {
        let mut source = Document::with_version("1.5");
        let first = source.new_object_id();
        let second = source.add_object(dictionary! { "Next" => first });
        source
            .objects
            .insert(first, Object::Dictionary(dictionary! { "Next" => second }));

        let mut target = Document::with_version("1.5");
        let copied = ObjectCopier::new(&source).copy(&mut target, &Object::Reference(first));

        assert_eq!(target.objects.len(), 2);
        let head = copied.as_reference().unwrap();
        let next = target.get_dictionary(head).unwrap().get(b"Next").unwrap();
        let back = target
            .get_dictionary(next.as_reference().unwrap())
            .unwrap()
            .get(b"Next")
            .unwrap();
        assert_eq!(back.as_reference().unwrap(), head);
    }

    #[test]
    fn parent_links_are_not_followed() {
        let mut source = Document::with_version("1.5");
        let tree = source.add_object(dictionary! { "Type" => "Pages" });
        let page = Object::Dictionary(dictionary! {
            "Parent" => tree,
            "Rotate" => Object::Integer(0),
        });

        let mut target = Document::with_version("1.5");
        let copied = ObjectCopier::new(&source).copy(&mut target, &page);

        assert!(!copied.as_dict().unwrap().has(b"Parent"));
        assert!(target.objects.is_empty());
    }
}
